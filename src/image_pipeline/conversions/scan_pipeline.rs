use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{info, instrument};

use crate::image_pipeline::{
    codec::{ImageReader, ImageWriter, StandardImageReader, StandardImageWriter},
    common::error::{PipelineError, Result},
    conversions::{
        config::{PipelineConfig, XrfOutput},
        output::{OutputKind, OutputLayout},
        progress::{ProgressSink, ProgressTracker},
        result::{PipelineResult, PipelineVariant, WrittenOutput},
    },
    raster::{BitDepth, Image},
    transform::{
        ColorPolicy, adjust_contrast_to, append_ruler, color_model::narrow_to_8,
        ensure_ruler_length, ensure_uniform, merge_with_ruler, normalize_ruler, rotate90_ccw,
        rotate90_cw, rotate180, scale_proportional, trim_column_count, trim_leading_columns,
    },
};

/// Core-scan, radiograph and merge pipelines over one codec.
pub struct ScanPipeline<R: ImageReader, W: ImageWriter> {
    reader: R,
    writer: W,
}

impl ScanPipeline<StandardImageReader, StandardImageWriter> {
    pub fn new() -> Self {
        Self {
            reader: StandardImageReader,
            writer: StandardImageWriter,
        }
    }
}

impl Default for ScanPipeline<StandardImageReader, StandardImageWriter> {
    fn default() -> Self {
        Self::new()
    }
}

fn source_name(path: &Path) -> String {
    path.display().to_string()
}

/// Fails early when trimming would consume the whole depth axis.
fn ensure_trim_fits(config: &PipelineConfig, depth_pixels: usize) -> Result<usize> {
    let trim_columns = trim_column_count(config.dpi, config.trim_inches)?;
    if trim_columns >= depth_pixels {
        return Err(PipelineError::TrimOutOfRange {
            trim_columns,
            width: depth_pixels,
        });
    }
    Ok(trim_columns)
}

impl<R: ImageReader, W: ImageWriter> ScanPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn load(&self, path: &Path) -> Result<Image> {
        let _span = tracing::info_span!("load", path = %path.display()).entered();
        let data = std::fs::read(path).map_err(|e| {
            PipelineError::InputReadError(format!("{}: {}", path.display(), e))
        })?;
        let image = self
            .reader
            .read_image(&data)
            .map_err(|e| e.for_source(path))?;
        info!(
            width = image.width(),
            height = image.height(),
            bits = image.bit_depth().bits(),
            components = image.components(),
            "Loaded {}",
            path.display()
        );
        Ok(image)
    }

    fn write(
        &self,
        kind: OutputKind,
        image: &Image,
        config: &PipelineConfig,
        result: &mut PipelineResult,
    ) -> Result<()> {
        let layout = OutputLayout::new(&config.destination_root);
        let path = layout.path_for(kind, &config.output_base_name);
        let _span = tracing::info_span!("write", path = %path.display()).entered();

        let file = File::create(&path).map_err(|e| {
            PipelineError::OutputWriteError(format!("{}: {}", path.display(), e))
        })?;
        let mut output = BufWriter::new(file);
        let options = config.encode_options();
        match kind {
            OutputKind::Tiff | OutputKind::RadiographTiff => {
                self.writer.write_tiff(image, &mut output, &options)?
            }
            OutputKind::Jpeg | OutputKind::IcdJpeg | OutputKind::RadiographJpeg => {
                self.writer.write_jpeg(image, &mut output, &options)?
            }
        }
        output.flush().map_err(|e| {
            PipelineError::OutputWriteError(format!("{}: {}", path.display(), e))
        })?;

        info!(
            width = image.width(),
            height = image.height(),
            "Wrote {}",
            path.display()
        );
        result.outputs.push(WrittenOutput {
            kind,
            path,
            width: image.width(),
            height: image.height(),
        });
        Ok(())
    }

    /// Rotates an 8-bit composite back to core-top-up and scales it for ICD.
    fn write_icd(
        &self,
        composite8: &Image,
        config: &PipelineConfig,
        result: &mut PipelineResult,
    ) -> Result<()> {
        let icd = {
            let _span = tracing::info_span!("icd_derivative").entered();
            let upright = rotate90_cw(composite8)?;
            scale_proportional(&upright, config.icd_scaling_percent)?
        };
        self.write(OutputKind::IcdJpeg, &icd, config, result)
    }

    /// Single core-scan image: rotate CCW, trim the core top, add the ruler,
    /// then write TIFF, JPEG and the ICD derivative.
    #[instrument(skip_all, fields(image = %image_path.as_ref().display()))]
    pub fn run_core<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        image_path: P,
        ruler_path: Q,
        config: &PipelineConfig,
        progress: &mut dyn ProgressSink,
    ) -> Result<PipelineResult> {
        config.validate_core()?;
        let image_path = image_path.as_ref();
        let ruler_path = ruler_path.as_ref();
        let mut progress =
            ProgressTracker::new(progress, format!("Processing {}...", image_path.display()));
        progress.step(0, "loading");

        let image = self.load(image_path)?;
        let ruler = self.load(ruler_path)?;

        // The depth axis is vertical until the image is rotated.
        let depth_pixels = image.height();
        ensure_ruler_length(ruler.width(), depth_pixels)?;
        ensure_trim_fits(config, depth_pixels)?;

        let image = config.color_policy.apply(&image, &source_name(image_path))?;
        let ruler = normalize_ruler(&image, &ruler, config.color_policy, &source_name(ruler_path))?;

        progress.step(10, "rotating");
        let rotated = {
            let _span = tracing::info_span!("rotate").entered();
            rotate90_ccw(&image)?
        };

        progress.step(30, &format!("trimming {} inches from core top", config.trim_inches));
        let trimmed = {
            let _span = tracing::info_span!("trim", trim_inches = config.trim_inches).entered();
            trim_leading_columns(&rotated, config.dpi, config.trim_inches)?
        };

        progress.step(60, "adding ruler");
        let composite = {
            let _span = tracing::info_span!("composite").entered();
            append_ruler(&trimmed, &ruler)?
        };

        let mut result = PipelineResult::new(PipelineVariant::CoreScan);
        OutputLayout::new(&config.destination_root).prepare(&[
            OutputKind::Tiff,
            OutputKind::Jpeg,
            OutputKind::IcdJpeg,
        ])?;

        progress.step(70, "writing TIFF");
        self.write(OutputKind::Tiff, &composite, config, &mut result)?;

        progress.step(80, "writing JPEG");
        let composite8 = narrow_to_8(&composite)?;
        self.write(OutputKind::Jpeg, &composite8, config, &mut result)?;

        progress.step(90, "writing ICD JPEG");
        self.write_icd(&composite8, config, &mut result)?;

        progress.step(100, "done");
        info!(
            width = composite.width(),
            height = composite.height(),
            "Core image conversion complete"
        );
        Ok(result)
    }

    /// Grayscale radiograph: rotate 180 degrees, stretch contrast, add the
    /// ruler and write a single radiograph file.
    #[instrument(skip_all, fields(image = %image_path.as_ref().display()))]
    pub fn run_xrf<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        image_path: P,
        ruler_path: Q,
        config: &PipelineConfig,
        progress: &mut dyn ProgressSink,
    ) -> Result<PipelineResult> {
        config.validate_xrf()?;
        let image_path = image_path.as_ref();
        let ruler_path = ruler_path.as_ref();
        let mut progress =
            ProgressTracker::new(progress, format!("Processing {}...", image_path.display()));
        progress.step(0, "loading");

        let image = self.load(image_path)?;
        let image = ColorPolicy::GrayscaleOnly.apply(&image, &source_name(image_path))?;
        let ruler = self.load(ruler_path)?;
        let ruler = ColorPolicy::GrayscaleOnly.apply(&ruler, &source_name(ruler_path))?;
        ensure_ruler_length(ruler.width(), image.width())?;

        let (output_depth, policy, kind) = match config.xrf_output {
            XrfOutput::Tiff => (
                image.bit_depth(),
                ColorPolicy::GrayscaleOnly,
                OutputKind::RadiographTiff,
            ),
            XrfOutput::LegacyJpeg => (
                BitDepth::Eight,
                ColorPolicy::RgbUniform,
                OutputKind::RadiographJpeg,
            ),
        };

        progress.step(10, "rotating");
        let rotated = {
            let _span = tracing::info_span!("rotate").entered();
            rotate180(&image)?
        };

        progress.step(25, "adjusting levels");
        let adjusted = {
            let _span = tracing::info_span!("adjust_contrast", gamma = config.gamma).entered();
            adjust_contrast_to(&rotated, config.gamma, output_depth)?
        };
        let adjusted = policy.apply(&adjusted, &source_name(image_path))?;

        progress.step(50, "adding ruler");
        let composite = {
            let _span = tracing::info_span!("composite").entered();
            let ruler = normalize_ruler(&adjusted, &ruler, policy, &source_name(ruler_path))?;
            append_ruler(&adjusted, &ruler)?
        };

        progress.step(75, "writing radiograph");
        let mut result = PipelineResult::new(PipelineVariant::Xrf);
        OutputLayout::new(&config.destination_root).prepare(&[kind])?;
        self.write(kind, &composite, config, &mut result)?;

        progress.step(100, "done");
        info!(
            width = composite.width(),
            height = composite.height(),
            "Radiograph conversion complete"
        );
        Ok(result)
    }

    /// Rolled-core merge: every image is rotated and trimmed identically,
    /// stacked in the given order and finished with one ruler. The ICD
    /// derivative shows only the first image.
    #[instrument(skip_all, fields(images = image_paths.len()))]
    pub fn run_merge<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        image_paths: &[P],
        ruler_path: Q,
        config: &PipelineConfig,
        progress: &mut dyn ProgressSink,
    ) -> Result<PipelineResult> {
        config.validate_core()?;
        if image_paths.is_empty() {
            return Err(PipelineError::invalid(
                "image_paths",
                "at least one core image is required",
            ));
        }
        let ruler_path = ruler_path.as_ref();
        let mut progress = ProgressTracker::new(
            progress,
            format!("Merging {} rotated images...", image_paths.len()),
        );
        progress.step(0, "");

        progress.step(10, "loading image data");
        let cores = image_paths
            .iter()
            .map(|p| self.load(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        progress.step(20, "validating image properties");
        let named: Vec<(String, &Image)> = image_paths
            .iter()
            .map(|p| source_name(p.as_ref()))
            .zip(cores.iter())
            .collect();
        ensure_uniform(&named)?;

        let depth_pixels = named.first().map(|(_, img)| img.height()).unwrap_or_default();

        progress.step(30, "loading ruler image");
        let ruler = self.load(ruler_path)?;
        ensure_ruler_length(ruler.width(), depth_pixels)?;
        let trim_columns = ensure_trim_fits(config, depth_pixels)?;

        let cores = named
            .iter()
            .map(|(name, img)| config.color_policy.apply(img, name))
            .collect::<Result<Vec<_>>>()?;
        let Some(first) = cores.first() else {
            return Err(PipelineError::invalid("image_paths", "no core images loaded"));
        };
        let ruler = normalize_ruler(first, &ruler, config.color_policy, &source_name(ruler_path))?;

        progress.step(40, "rotating core images");
        let rotated = cores
            .iter()
            .map(rotate90_ccw)
            .collect::<Result<Vec<_>>>()?;

        progress.step(
            60,
            &format!(
                "trimming {} inches ({} pixels) from core tops",
                config.trim_inches, trim_columns
            ),
        );
        let trimmed = rotated
            .iter()
            .map(|img| trim_leading_columns(img, config.dpi, config.trim_inches))
            .collect::<Result<Vec<_>>>()?;

        progress.step(70, "merging core images vertically and adding ruler");
        let merged = {
            let _span = tracing::info_span!("merge", parts = trimmed.len()).entered();
            merge_with_ruler(&trimmed, &ruler)?
        };

        let mut result = PipelineResult::new(PipelineVariant::Merge);
        OutputLayout::new(&config.destination_root).prepare(&[
            OutputKind::Tiff,
            OutputKind::Jpeg,
            OutputKind::IcdJpeg,
        ])?;

        progress.step(85, "writing TIFF");
        self.write(OutputKind::Tiff, &merged, config, &mut result)?;

        progress.step(90, "writing JPEG");
        self.write(OutputKind::Jpeg, &narrow_to_8(&merged)?, config, &mut result)?;

        progress.step(95, "writing ICD JPEG");
        let Some(first_trimmed) = trimmed.first() else {
            return Err(PipelineError::invalid("image_paths", "no core images loaded"));
        };
        let icd_source = narrow_to_8(&append_ruler(first_trimmed, &ruler)?)?;
        self.write_icd(&icd_source, config, &mut result)?;

        progress.step(100, "done");
        info!(
            width = merged.width(),
            height = merged.height(),
            parts = trimmed.len(),
            "Merge complete"
        );
        Ok(result)
    }
}

/// Runs the core-scan pipeline with the standard codec.
pub fn run_core_pipeline<P: AsRef<Path>, Q: AsRef<Path>>(
    image_path: P,
    ruler_path: Q,
    config: &PipelineConfig,
    progress: &mut dyn ProgressSink,
) -> Result<PipelineResult> {
    ScanPipeline::new().run_core(image_path, ruler_path, config, progress)
}

/// Runs the radiograph pipeline with the standard codec.
pub fn run_xrf_pipeline<P: AsRef<Path>, Q: AsRef<Path>>(
    image_path: P,
    ruler_path: Q,
    config: &PipelineConfig,
    progress: &mut dyn ProgressSink,
) -> Result<PipelineResult> {
    ScanPipeline::new().run_xrf(image_path, ruler_path, config, progress)
}

/// Runs the rolled-core merge pipeline with the standard codec.
pub fn run_merge_pipeline<P: AsRef<Path>, Q: AsRef<Path>>(
    image_paths: &[P],
    ruler_path: Q,
    config: &PipelineConfig,
    progress: &mut dyn ProgressSink,
) -> Result<PipelineResult> {
    ScanPipeline::new().run_merge(image_paths, ruler_path, config, progress)
}
