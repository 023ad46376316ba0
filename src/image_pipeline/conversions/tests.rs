use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::image_pipeline::codec::{
    EncodeOptions, ImageReader, ImageWriter, StandardImageReader, StandardImageWriter,
};
use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::conversions::{
    NoProgress, OutputKind, PipelineConfig, PipelineVariant, ScanPipeline, XrfOutput,
    run_core_pipeline,
};
use crate::image_pipeline::raster::{BitDepth, ColorLayout, Image};
use crate::image_pipeline::transform::ColorPolicy;

/// Returns a canned image for each file, keyed by the file's contents.
struct MockReader {
    images: HashMap<Vec<u8>, Image>,
}

impl ImageReader for MockReader {
    fn read_image(&self, data: &[u8]) -> Result<Image> {
        self.images
            .get(data)
            .cloned()
            .ok_or_else(|| PipelineError::DecodeError("Mock decode error".to_string()))
    }
}

type Written = Arc<Mutex<Vec<(&'static str, Image)>>>;

struct MockWriter {
    fail_on: Option<&'static str>,
    written: Written,
}

impl MockWriter {
    fn record(&self, format: &'static str, image: &Image) -> Result<()> {
        if self.fail_on == Some(format) {
            return Err(PipelineError::EncodeError("Mock encode error".to_string()));
        }
        self.written.lock().unwrap().push((format, image.clone()));
        Ok(())
    }
}

impl ImageWriter for MockWriter {
    fn write_tiff(&self, image: &Image, _output: &mut dyn Write, _options: &EncodeOptions) -> Result<()> {
        self.record("tiff", image)
    }

    fn write_jpeg(&self, image: &Image, _output: &mut dyn Write, _options: &EncodeOptions) -> Result<()> {
        self.record("jpeg", image)
    }
}

struct Fixture {
    dir: tempfile::TempDir,
    images: HashMap<Vec<u8>, Image>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            images: HashMap::new(),
        }
    }

    /// Registers `image` under a file named `name` and returns its path.
    fn add(&mut self, name: &str, image: Image) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, name.as_bytes()).unwrap();
        self.images.insert(name.as_bytes().to_vec(), image);
        path
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig::builder()
            .dpi(10.0)
            .trim_inches(0.5)
            .output_base_name("sample")
            .destination_root(self.out())
            .build()
    }

    fn pipeline(self, fail_on: Option<&'static str>) -> (ScanPipeline<MockReader, MockWriter>, Written, tempfile::TempDir) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let pipeline = ScanPipeline::with_custom(
            MockReader {
                images: self.images,
            },
            MockWriter {
                fail_on,
                written: written.clone(),
            },
        );
        (pipeline, written, self.dir)
    }
}

fn gray16(width: usize, height: usize, value: u16) -> Image {
    Image::filled(width, height, BitDepth::Sixteen, ColorLayout::Gray, value).unwrap()
}

#[test]
fn test_core_scan_end_to_end_dimensions() {
    let mut fx = Fixture::new();
    let core = fx.add("core.tif", gray16(2000, 3000, 30000));
    let ruler = fx.add("ruler.tif", gray16(3200, 100, 1000));
    let config = PipelineConfig::builder()
        .dpi(508.0)
        .trim_inches(0.25)
        .icd_scaling_percent(25.0)
        .color_policy(ColorPolicy::GrayscaleOnly)
        .output_base_name("core1")
        .destination_root(fx.out())
        .build();
    let (pipeline, written, dir) = fx.pipeline(None);

    let mut seen = Vec::new();
    let mut progress = |p: u8, _: &str| seen.push(p);
    let result = pipeline.run_core(&core, &ruler, &config, &mut progress).unwrap();

    assert_eq!(result.variant, PipelineVariant::CoreScan);
    let tiff = result.output(OutputKind::Tiff).unwrap();
    assert_eq!((tiff.width, tiff.height), (3000 - 127, 2000 + 100));
    let jpeg = result.output(OutputKind::Jpeg).unwrap();
    assert_eq!((jpeg.width, jpeg.height), (2873, 2100));
    let icd = result.output(OutputKind::IcdJpeg).unwrap();
    assert_eq!((icd.width, icd.height), (525, 718));

    let out = dir.path().join("out");
    assert_eq!(tiff.path, out.join("tiff").join("core1.tif"));
    assert_eq!(jpeg.path, out.join("jpeg").join("core1.jpg"));
    assert_eq!(icd.path, out.join("ICD").join("core1.jpg"));
    for o in &result.outputs {
        assert!(o.path.is_file(), "{}", o.path.display());
    }

    let written = written.lock().unwrap();
    let formats: Vec<_> = written.iter().map(|(f, _)| *f).collect();
    assert_eq!(formats, vec!["tiff", "jpeg", "jpeg"]);
    assert_eq!(written[0].1.bit_depth(), BitDepth::Sixteen);
    assert_eq!(written[1].1.bit_depth(), BitDepth::Eight);
    // 30000 / 256 truncates to 117
    assert_eq!(written[1].1.pixel(0, 0), &[117]);
    assert_eq!(written[1].1.pixel(0, 2099), &[3]);

    assert_eq!(seen.first(), Some(&0));
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
}

#[test]
fn test_core_scan_with_standard_codec() {
    let dir = tempfile::tempdir().unwrap();
    let write_fixture = |name: &str, image: &Image| -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        StandardImageWriter
            .write_tiff(image, &mut file, &EncodeOptions::default())
            .unwrap();
        path
    };
    let core = Image::from_fn(4, 6, BitDepth::Eight, ColorLayout::Gray, |x, y, _| {
        (y * 10 + x) as u16
    })
    .unwrap();
    let core_path = write_fixture("core.tif", &core);
    let ruler_path = write_fixture(
        "ruler.tif",
        &Image::filled(8, 2, BitDepth::Eight, ColorLayout::Gray, 200).unwrap(),
    );
    let config = PipelineConfig::builder()
        .dpi(2.0)
        .trim_inches(0.5)
        .icd_scaling_percent(50.0)
        .output_base_name("small")
        .destination_root(dir.path().join("out"))
        .build();

    let result = run_core_pipeline(&core_path, &ruler_path, &config, &mut NoProgress).unwrap();

    let tiff_bytes = std::fs::read(result.path(OutputKind::Tiff).unwrap()).unwrap();
    let composite = StandardImageReader.read_image(&tiff_bytes).unwrap();
    assert_eq!(composite.dimensions(), (5, 6));
    assert_eq!(composite.layout(), ColorLayout::Rgb);
    // Core top is on the left and the first trimmed column held row 1.
    assert_eq!(composite.pixel(0, 0), &[13, 13, 13]);
    assert_eq!(composite.pixel(4, 3), &[50, 50, 50]);
    assert_eq!(composite.pixel(2, 4), &[200, 200, 200]);
    assert_eq!(composite.pixel(4, 5), &[200, 200, 200]);

    let jpeg = image::open(result.path(OutputKind::Jpeg).unwrap()).unwrap();
    assert_eq!((jpeg.width(), jpeg.height()), (5, 6));
    assert_eq!(jpeg.color(), image::ColorType::Rgb8);

    let icd = image::open(result.path(OutputKind::IcdJpeg).unwrap()).unwrap();
    assert_eq!((icd.width(), icd.height()), (3, 3));
}

#[test]
fn test_ruler_too_short_fails_before_any_write() {
    let mut fx = Fixture::new();
    let core = fx.add("core.tif", gray16(10, 40, 0));
    let ruler = fx.add("ruler.tif", gray16(39, 5, 0));
    let config = fx.config();
    let (pipeline, written, dir) = fx.pipeline(None);

    let err = pipeline
        .run_core(&core, &ruler, &config, &mut NoProgress)
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::RulerTooShort {
            ruler_width: 39,
            core_width: 40
        }
    ));
    assert!(written.lock().unwrap().is_empty());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_trim_consuming_whole_core_is_rejected() {
    let mut fx = Fixture::new();
    let core = fx.add("core.tif", gray16(10, 40, 0));
    let ruler = fx.add("ruler.tif", gray16(50, 5, 0));
    let config = PipelineConfig::builder()
        .dpi(10.0)
        .trim_inches(4.0)
        .output_base_name("x")
        .destination_root(fx.out())
        .build();
    let (pipeline, written, _dir) = fx.pipeline(None);

    let err = pipeline
        .run_core(&core, &ruler, &config, &mut NoProgress)
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::TrimOutOfRange {
            trim_columns: 40,
            width: 40
        }
    ));
    assert!(written.lock().unwrap().is_empty());
}

#[test]
fn test_invalid_parameters_are_rejected_before_io() {
    let missing = Path::new("/definitely/not/here.tif");
    let base = PipelineConfig::builder().output_base_name("x").build();
    let pipeline = ScanPipeline::new();

    let cases = [
        (PipelineConfig { dpi: 0.0, ..base.clone() }, "dpi"),
        (PipelineConfig { trim_inches: -0.1, ..base.clone() }, "trim_inches"),
        (PipelineConfig { icd_scaling_percent: 0.0, ..base.clone() }, "icd_scaling_percent"),
        (PipelineConfig { output_base_name: String::new(), ..base.clone() }, "output_base_name"),
    ];
    for (config, expected) in cases {
        let err = pipeline
            .run_core(missing, missing, &config, &mut NoProgress)
            .unwrap_err();
        assert!(
            matches!(err, PipelineError::InvalidParameter { name, .. } if name == expected),
            "{expected}: {err:?}"
        );
    }

    let bad_gamma = PipelineConfig { gamma: 0.0, ..base };
    let err = pipeline
        .run_xrf(missing, missing, &bad_gamma, &mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidParameter { name: "gamma", .. }));
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::builder()
        .output_base_name("x")
        .destination_root(dir.path())
        .build();

    let err = run_core_pipeline(
        dir.path().join("nope.tif"),
        dir.path().join("ruler.tif"),
        &config,
        &mut NoProgress,
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::InputReadError(_)));
    assert!(err.is_io());
}

#[test]
fn test_writer_failure_keeps_earlier_outputs() {
    let mut fx = Fixture::new();
    let core = fx.add("core.tif", gray16(10, 40, 0));
    let ruler = fx.add("ruler.tif", gray16(40, 5, 0));
    let config = fx.config();
    let (pipeline, written, dir) = fx.pipeline(Some("jpeg"));

    let err = pipeline
        .run_core(&core, &ruler, &config, &mut NoProgress)
        .unwrap_err();

    assert!(matches!(err, PipelineError::EncodeError(_)));
    assert_eq!(written.lock().unwrap().len(), 1);
    let out = dir.path().join("out");
    assert!(out.join("tiff").join("sample.tif").is_file());
    assert!(!out.join("ICD").join("sample.jpg").exists());
}

#[test]
fn test_merge_stacks_in_order_and_icd_uses_first_image() {
    let mut fx = Fixture::new();
    let paths = vec![
        fx.add("rot1.tif", gray16(10, 40, 1000)),
        fx.add("rot2.tif", gray16(10, 40, 2000)),
        fx.add("rot3.tif", gray16(10, 40, 3000)),
    ];
    let ruler = fx.add("ruler.tif", gray16(50, 5, 9000));
    let config = PipelineConfig::builder()
        .dpi(10.0)
        .trim_inches(0.5)
        .icd_scaling_percent(20.0)
        .output_base_name("merged")
        .destination_root(fx.out())
        .build();
    let (pipeline, written, _dir) = fx.pipeline(None);

    let result = pipeline
        .run_merge(&paths, &ruler, &config, &mut NoProgress)
        .unwrap();

    assert_eq!(result.variant, PipelineVariant::Merge);
    let tiff = result.output(OutputKind::Tiff).unwrap();
    assert_eq!((tiff.width, tiff.height), (35, 35));
    let icd = result.output(OutputKind::IcdJpeg).unwrap();
    assert_eq!((icd.width, icd.height), (3, 7));

    let written = written.lock().unwrap();
    let merged = &written[0].1;
    assert_eq!(merged.layout(), ColorLayout::Rgb);
    assert_eq!(merged.pixel(0, 0)[0], 1000);
    assert_eq!(merged.pixel(0, 10)[0], 2000);
    assert_eq!(merged.pixel(34, 29)[0], 3000);
    assert_eq!(merged.pixel(0, 30)[0], 9000);
}

#[test]
fn test_merge_depth_axis_mismatch_writes_nothing() {
    let mut fx = Fixture::new();
    let paths = vec![
        fx.add("rot1.tif", gray16(10, 100, 0)),
        fx.add("rot2.tif", gray16(10, 100, 0)),
        fx.add("rot3.tif", gray16(10, 99, 0)),
    ];
    let ruler = fx.add("ruler.tif", gray16(200, 5, 0));
    let config = fx.config();
    let (pipeline, written, dir) = fx.pipeline(None);

    let err = pipeline
        .run_merge(&paths, &ruler, &config, &mut NoProgress)
        .unwrap_err();

    match err {
        PipelineError::DimensionMismatch { details, .. } => {
            assert!(details.contains("rot3.tif = 99"), "{details}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(written.lock().unwrap().is_empty());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_merge_bit_depth_mismatch() {
    let mut fx = Fixture::new();
    let paths = vec![
        fx.add("a.tif", gray16(10, 40, 0)),
        fx.add("b.tif", Image::filled(10, 40, BitDepth::Eight, ColorLayout::Gray, 0).unwrap()),
    ];
    let ruler = fx.add("ruler.tif", gray16(50, 5, 0));
    let config = fx.config();
    let (pipeline, _written, _dir) = fx.pipeline(None);

    let err = pipeline
        .run_merge(&paths, &ruler, &config, &mut NoProgress)
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::DimensionMismatch { property: "Color depth", .. }
    ));
}

#[test]
fn test_merge_requires_images() {
    let pipeline = ScanPipeline::new();
    let config = PipelineConfig::builder().output_base_name("x").build();
    let none: Vec<PathBuf> = Vec::new();

    let err = pipeline
        .run_merge(&none, "ruler.tif", &config, &mut NoProgress)
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidParameter { name: "image_paths", .. }));
}

/// 4x2 16-bit radiograph holding 100..=107, row-major.
fn radiograph() -> Image {
    Image::from_fn(4, 2, BitDepth::Sixteen, ColorLayout::Gray, |x, y, _| {
        (100 + x + 4 * y) as u16
    })
    .unwrap()
}

#[test]
fn test_xrf_rotates_stretches_and_appends_ruler() {
    let mut fx = Fixture::new();
    let xr = fx.add("radiograph.tif", radiograph());
    let ruler = fx.add("ruler.tif", gray16(6, 1, 500));
    let config = PipelineConfig::builder()
        .gamma(1.0)
        .output_base_name("xr")
        .destination_root(fx.out())
        .build();
    let (pipeline, written, dir) = fx.pipeline(None);

    let result = pipeline.run_xrf(&xr, &ruler, &config, &mut NoProgress).unwrap();

    assert_eq!(result.variant, PipelineVariant::Xrf);
    assert_eq!(result.outputs.len(), 1);
    let out = result.output(OutputKind::RadiographTiff).unwrap();
    assert_eq!(out.path, dir.path().join("out").join("radiograph").join("xr.tif"));
    assert!(out.path.is_file());

    let written = written.lock().unwrap();
    let (format, composite) = &written[0];
    assert_eq!(*format, "tiff");
    assert_eq!(composite.dimensions(), (4, 3));
    assert_eq!(composite.layout(), ColorLayout::Gray);
    assert_eq!(composite.bit_depth(), BitDepth::Sixteen);
    // The brightest source pixel was bottom-right before the 180 degree turn.
    assert_eq!(composite.pixel(0, 0), &[65535]);
    assert_eq!(composite.pixel(3, 1), &[0]);
    assert_eq!(composite.row(2), &[500, 500, 500, 500]);
}

#[test]
fn test_xrf_legacy_jpeg_output() {
    let mut fx = Fixture::new();
    let xr = fx.add("radiograph.tif", radiograph());
    let ruler = fx.add("ruler.tif", gray16(6, 1, 500));
    let config = PipelineConfig::builder()
        .gamma(1.0)
        .xrf_output(XrfOutput::LegacyJpeg)
        .output_base_name("xr")
        .destination_root(fx.out())
        .build();
    let (pipeline, written, _dir) = fx.pipeline(None);

    let result = pipeline.run_xrf(&xr, &ruler, &config, &mut NoProgress).unwrap();

    assert!(result.path(OutputKind::RadiographJpeg).unwrap().ends_with("radiograph/xr.jpg"));
    let written = written.lock().unwrap();
    let (format, composite) = &written[0];
    assert_eq!(*format, "jpeg");
    assert_eq!(composite.layout(), ColorLayout::Rgb);
    assert_eq!(composite.bit_depth(), BitDepth::Eight);
    assert_eq!(composite.pixel(0, 0), &[255, 255, 255]);
    // 500 / 256 truncates to 1
    assert_eq!(composite.pixel(1, 2), &[1, 1, 1]);
}

#[test]
fn test_xrf_rejects_rgb_radiograph() {
    let mut fx = Fixture::new();
    let xr = fx.add(
        "radiograph.tif",
        Image::filled(4, 2, BitDepth::Sixteen, ColorLayout::Rgb, 0).unwrap(),
    );
    let ruler = fx.add("ruler.tif", gray16(6, 1, 0));
    let config = fx.config();
    let (pipeline, _written, _dir) = fx.pipeline(None);

    let err = pipeline
        .run_xrf(&xr, &ruler, &config, &mut NoProgress)
        .unwrap_err();

    match err {
        PipelineError::UnexpectedComponentCount {
            source_name,
            components,
            ..
        } => {
            assert!(source_name.ends_with("radiograph.tif"));
            assert_eq!(components, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_xrf_rejects_rgb_ruler() {
    let mut fx = Fixture::new();
    let xr = fx.add("radiograph.tif", radiograph());
    let ruler = fx.add(
        "ruler.tif",
        Image::filled(6, 1, BitDepth::Eight, ColorLayout::Rgb, 0).unwrap(),
    );
    let config = fx.config();
    let (pipeline, written, _dir) = fx.pipeline(None);

    let err = pipeline
        .run_xrf(&xr, &ruler, &config, &mut NoProgress)
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::UnexpectedComponentCount { ref source_name, .. } if source_name.ends_with("ruler.tif")
    ));
    assert!(written.lock().unwrap().is_empty());
}

#[test]
fn test_config_builder_defaults() {
    let config = PipelineConfig::builder().output_base_name("a").build();

    assert_eq!(config.dpi, 508.0);
    assert_eq!(config.trim_inches, 0.25);
    assert_eq!(config.icd_scaling_percent, 30.0);
    assert_eq!(config.gamma, 1.4);
    assert_eq!(config.color_policy, ColorPolicy::RgbUniform);
    assert_eq!(config.xrf_output, XrfOutput::Tiff);
    assert!(config.validate_core().is_ok());
    assert!(config.validate_xrf().is_ok());

    let renamed = config.with_output_base_name("b");
    assert_eq!(renamed.output_base_name, "b");
    assert_eq!(renamed.dpi, config.dpi);
}

#[test]
fn test_config_rejects_path_like_base_name() {
    let config = PipelineConfig::builder().output_base_name("../escape").build();
    assert!(matches!(
        config.validate_core(),
        Err(PipelineError::InvalidParameter { name: "output_base_name", .. })
    ));
}

#[test]
fn test_xrf_ruler_shorter_than_radiograph_fails_before_any_write() {
    let mut fx = Fixture::new();
    let xr = fx.add("radiograph.tif", radiograph());
    let ruler = fx.add("ruler.tif", gray16(3, 1, 500));
    let config = fx.config();
    let (pipeline, written, dir) = fx.pipeline(None);

    let err = pipeline
        .run_xrf(&xr, &ruler, &config, &mut NoProgress)
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::RulerTooShort {
            ruler_width: 3,
            core_width: 4
        }
    ));
    assert!(written.lock().unwrap().is_empty());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_xrf_reports_each_stage() {
    let mut fx = Fixture::new();
    let xr = fx.add("radiograph.tif", radiograph());
    let ruler = fx.add("ruler.tif", gray16(6, 1, 500));
    let config = fx.config();
    let (pipeline, _written, _dir) = fx.pipeline(None);

    let mut seen = Vec::new();
    let mut progress = |p: u8, status: &str| seen.push((p, status.to_string()));
    pipeline.run_xrf(&xr, &ruler, &config, &mut progress).unwrap();

    let percents: Vec<u8> = seen.iter().map(|(p, _)| *p).collect();
    assert_eq!(percents, vec![0, 10, 25, 50, 75, 100]);
    assert!(seen[1].1.ends_with("rotating"), "{}", seen[1].1);
}

#[test]
fn test_unsupported_depth_names_the_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let deep = dir.path().join("deep.tif");
    let mut file = std::fs::File::create(&deep).unwrap();
    tiff::encoder::TiffEncoder::new(&mut file)
        .unwrap()
        .write_image::<tiff::encoder::colortype::Gray32>(4, 4, &[1u32; 16])
        .unwrap();
    drop(file);
    let config = PipelineConfig::builder()
        .dpi(1.0)
        .trim_inches(0.0)
        .output_base_name("deep")
        .destination_root(dir.path().join("out"))
        .build();

    let err = run_core_pipeline(&deep, dir.path().join("ruler.tif"), &config, &mut NoProgress)
        .unwrap_err();

    match err {
        PipelineError::UnexpectedColorDepth { source_name, bits } => {
            assert_eq!(bits, 32);
            assert!(source_name.ends_with("deep.tif"), "{source_name}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!dir.path().join("out").exists());
}
