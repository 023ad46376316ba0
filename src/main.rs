use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use corescan_converter::image_pipeline::{
    BatchPolicy, BatchReport, ColorPolicy, OutputNaming, PipelineConfig, ScanPipeline,
    TiffCompression, XrfOutput, run_batch,
};
use corescan_converter::logger;

use tracing::{error, info};

/// Composite core-scan and radiograph images with a ruler
#[derive(Parser, Debug)]
#[command(name = "corescan_converter", version, about)]
struct Cli {
    /// Log at debug level, including per-stage timings
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rotate, trim and ruler-annotate core-scan images, one output set each
    Core {
        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        geometry: GeometryArgs,

        #[command(flatten)]
        batch: BatchArgs,

        /// Core images to convert
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Contrast-stretch radiographs and append the ruler
    Xrf {
        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        batch: BatchArgs,

        /// Contrast exponent
        #[arg(long, default_value_t = 1.4)]
        gamma: f64,

        /// Write an 8-bit RGB JPEG instead of a TIFF
        #[arg(long, default_value_t = false)]
        legacy_jpeg: bool,

        /// Radiographs to convert
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Stack several rolled-core images into one composite
    Merge {
        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        geometry: GeometryArgs,

        /// Output base name, defaults to the first image's file stem
        #[arg(long)]
        name: Option<String>,

        /// Core images, top to bottom
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Ruler image appended below the composite
    #[arg(long)]
    ruler: PathBuf,

    /// Destination root for the output subdirectories
    #[arg(long, default_value = ".")]
    dest: PathBuf,

    /// TIFF compression for archival output
    #[arg(long, value_enum, default_value_t = Compression::None)]
    compression: Compression,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 95)]
    quality: u8,
}

#[derive(Args, Debug)]
struct GeometryArgs {
    /// Pixels per inch of the core images and ruler
    #[arg(long, default_value_t = 508.0)]
    dpi: f64,

    /// Inches trimmed from the core top
    #[arg(long, default_value_t = 0.25)]
    trim: f64,

    /// ICD derivative size as a percentage of the composite
    #[arg(long, default_value_t = 30.0)]
    icd_scaling: f64,

    /// Keep grayscale cores single-component instead of expanding to RGB
    #[arg(long, default_value_t = false)]
    grayscale: bool,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Where each output base name comes from
    #[arg(long, value_enum, default_value_t = Naming::File)]
    naming: Naming,

    /// Keep going when an image fails
    #[arg(long, default_value_t = false)]
    continue_on_error: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Compression {
    None,
    Lzw,
    Deflate,
}

impl From<Compression> for TiffCompression {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => TiffCompression::None,
            Compression::Lzw => TiffCompression::Lzw,
            Compression::Deflate => TiffCompression::Deflate,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Naming {
    /// Input file stem
    File,
    /// Name of the input's parent directory
    Parent,
}

impl From<Naming> for OutputNaming {
    fn from(value: Naming) -> Self {
        match value {
            Naming::File => OutputNaming::InputFileName,
            Naming::Parent => OutputNaming::ParentDirectory,
        }
    }
}

impl OutputArgs {
    fn config(&self) -> PipelineConfig {
        PipelineConfig::builder()
            .destination_root(&self.dest)
            .compression(self.compression.into())
            .jpeg_quality(self.quality)
            .build()
    }
}

impl GeometryArgs {
    fn apply(&self, config: PipelineConfig) -> PipelineConfig {
        PipelineConfig {
            dpi: self.dpi,
            trim_inches: self.trim,
            icd_scaling_percent: self.icd_scaling,
            color_policy: if self.grayscale {
                ColorPolicy::GrayscaleOnly
            } else {
                ColorPolicy::RgbUniform
            },
            ..config
        }
    }
}

impl BatchArgs {
    fn policy(&self) -> BatchPolicy {
        if self.continue_on_error {
            BatchPolicy::SkipAndContinue
        } else {
            BatchPolicy::AbortOnError
        }
    }
}

fn log_progress(percent: u8, status: &str) {
    info!(percent, "{}", status);
}

fn summarize(report: &BatchReport) -> anyhow::Result<()> {
    for (path, result) in &report.succeeded {
        for output in &result.outputs {
            info!("{} -> {}", path.display(), output.path.display());
        }
    }
    for (path, e) in &report.failed {
        error!("{}: {}", path.display(), e);
    }
    if !report.is_complete_success() {
        bail!(
            "{} of {} image(s) failed",
            report.failed.len(),
            report.failed.len() + report.succeeded.len()
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(if cli.verbose { "debug" } else { "info" });

    info!("Starting corescan_converter...");
    let pipeline = ScanPipeline::new();

    match cli.command {
        Command::Core {
            output,
            geometry,
            batch,
            images,
        } => {
            let config = geometry.apply(output.config());
            let naming = OutputNaming::from(batch.naming);
            let report = run_batch(&images, batch.policy(), |path| {
                let config = config.with_output_base_name(naming.base_name_for(path)?);
                pipeline.run_core(path, &output.ruler, &config, &mut log_progress)
            })?;
            summarize(&report)
        }
        Command::Xrf {
            output,
            batch,
            gamma,
            legacy_jpeg,
            images,
        } => {
            let config = PipelineConfig {
                gamma,
                xrf_output: if legacy_jpeg {
                    XrfOutput::LegacyJpeg
                } else {
                    XrfOutput::Tiff
                },
                ..output.config()
            };
            let naming = OutputNaming::from(batch.naming);
            let report = run_batch(&images, batch.policy(), |path| {
                let config = config.with_output_base_name(naming.base_name_for(path)?);
                pipeline.run_xrf(path, &output.ruler, &config, &mut log_progress)
            })?;
            summarize(&report)
        }
        Command::Merge {
            output,
            geometry,
            name,
            images,
        } => {
            let name = match name {
                Some(name) => name,
                None => {
                    let first = images.first().context("no core images given")?;
                    OutputNaming::InputFileName.base_name_for(first)?
                }
            };
            let config = geometry
                .apply(output.config())
                .with_output_base_name(name);
            let result = pipeline.run_merge(&images, &output.ruler, &config, &mut log_progress)?;
            for written in &result.outputs {
                info!("Wrote {}", written.path.display());
            }
            Ok(())
        }
    }
}
