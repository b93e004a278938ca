//! End-to-end tests for the export pipeline and template store

use image::{DynamicImage, Rgba, RgbaImage};
use photo_watermark_core::{
    Anchor, Color, ExportJob, Exporter, ImageWatermark, NamingPolicy, OutputFormat, Placement,
    ResizePolicy, ScaleMode, ShadowSpec, StrokeSpec, Template, TemplateStore, TextWatermark,
    WatermarkContent, WatermarkSource, WatermarkSpec,
};
use std::path::PathBuf;
use tempfile::tempdir;

fn base_image(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbaImage::new(width, height);
    for pixel in img.pixels_mut() {
        *pixel = Rgba([40, 80, 120, 255]);
    }
    DynamicImage::ImageRgba8(img)
}

fn logo(width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    for pixel in img.pixels_mut() {
        *pixel = Rgba([250, 250, 250, 255]);
    }
    img
}

#[test]
fn export_resizes_base_and_rerenders_watermark() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("IMG_0042.png");
    std::fs::write(&source, b"placeholder").unwrap();
    let out_dir = dir.path().join("exported");

    let base = base_image(1000, 500);
    let spec = WatermarkSpec {
        content: WatermarkContent::Image(ImageWatermark {
            image: logo(10, 10),
            opacity: 1.0,
            scale: ScaleMode::Percent(100.0),
        }),
        placement: Placement::Anchor(Anchor::BottomRight),
        margin: 4.0,
        rotation_degrees: 0.0,
        shadow: None,
        stroke: None,
    };

    let outcome = Exporter::default()
        .export(&ExportJob {
            source_path: &source,
            base: &base,
            spec: Some(&spec),
            resize: ResizePolicy::Width(200),
            naming: &NamingPolicy::Suffix("_wm".to_string()),
            format: OutputFormat::Png,
            output_dir: &out_dir,
        })
        .unwrap();

    assert_eq!(outcome.output_path, out_dir.join("IMG_0042_wm.png"));
    assert_eq!((outcome.width, outcome.height), (200, 100));

    let decoded = image::open(&outcome.output_path).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (200, 100));
    // The watermark was rendered onto the already-resized base: the logo
    // occupies its full 10x10 near the bottom-right margin, not a
    // scaled-down smudge of a pre-rendered composite.
    let pixel = *decoded.get_pixel(200 - 4 - 5, 100 - 4 - 5);
    assert!(pixel[0] > 200, "expected bright logo pixel, got {:?}", pixel);
}

#[test]
fn export_jpeg_writes_decodable_file() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("photo.png");
    std::fs::write(&source, b"placeholder").unwrap();
    let out_dir = dir.path().join("out");

    let base = base_image(64, 64);
    let outcome = Exporter::default()
        .export(&ExportJob {
            source_path: &source,
            base: &base,
            spec: None,
            resize: ResizePolicy::None,
            naming: &NamingPolicy::Original,
            format: OutputFormat::Jpeg { quality: 80 },
            output_dir: &out_dir,
        })
        .unwrap();

    assert_eq!(outcome.output_path, out_dir.join("photo.jpg"));
    let decoded = image::open(&outcome.output_path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 64));
}

#[test]
fn same_directory_export_is_refused_before_any_write() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("photo.png");
    std::fs::write(&source, b"placeholder").unwrap();

    let base = base_image(16, 16);
    let err = Exporter::default()
        .export(&ExportJob {
            source_path: &source,
            base: &base,
            spec: None,
            resize: ResizePolicy::None,
            naming: &NamingPolicy::Prefix("wm_".to_string()),
            format: OutputFormat::Png,
            output_dir: dir.path(),
        })
        .unwrap_err();

    assert!(err.is_policy_violation());
    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(entries.len(), 1, "no output or temp file may be written");
}

#[test]
fn template_survives_store_round_trip_and_drives_export() {
    let dir = tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("store"));

    let template = Template {
        source: WatermarkSource::Text(TextWatermark {
            text: "2023-08-15".to_string(),
            font_family: String::new(),
            font_size: 18.0,
            bold: false,
            italic: false,
            color: Color::white(),
            opacity: 0.85,
        }),
        placement: Placement::Anchor(Anchor::BottomLeft),
        margin: 12.0,
        rotation_degrees: 0.0,
        shadow: Some(ShadowSpec::default()),
        stroke: Some(StrokeSpec::default()),
        resize: ResizePolicy::None,
        naming: NamingPolicy::Suffix("_stamped".to_string()),
        format: OutputFormat::Png,
        export_dir: Some(dir.path().join("exported")),
    };
    store.save_template("date-stamp", &template).unwrap();
    let loaded = store.load_template("date-stamp").unwrap();
    assert_eq!(loaded, template);

    let source = dir.path().join("photo.png");
    std::fs::write(&source, b"placeholder").unwrap();
    let base = base_image(320, 240);
    let spec = loaded.to_spec(None).unwrap();
    let out_dir = loaded.export_dir.clone().unwrap();

    let outcome = Exporter::default()
        .export(&ExportJob {
            source_path: &source,
            base: &base,
            spec: Some(&spec),
            resize: loaded.resize,
            naming: &loaded.naming,
            format: loaded.format,
            output_dir: &out_dir,
        })
        .unwrap();
    assert_eq!(outcome.output_path, out_dir.join("photo_stamped.png"));

    // Successful export overwrites the last-session slot; next startup
    // prefers it
    store.save_last_session(&loaded).unwrap();
    assert_eq!(store.load_startup(), Some(template));
}

#[test]
fn unresolved_image_watermark_slot_still_exports_base() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("photo.png");
    std::fs::write(&source, b"placeholder").unwrap();
    let out_dir = dir.path().join("out");

    let template = Template {
        source: WatermarkSource::Image {
            path: PathBuf::from("does/not/exist.png"),
            opacity: 0.5,
            scale: ScaleMode::Percent(50.0),
        },
        ..Template::default()
    };
    // The decode collaborator failed: no raster for the slot
    let spec = template.to_spec(None);
    assert!(spec.is_none());

    let base = base_image(32, 32);
    let outcome = Exporter::default()
        .export(&ExportJob {
            source_path: &source,
            base: &base,
            spec: spec.as_ref(),
            resize: ResizePolicy::None,
            naming: &NamingPolicy::Original,
            format: OutputFormat::Png,
            output_dir: &out_dir,
        })
        .unwrap();

    let decoded = image::open(&outcome.output_path).unwrap().to_rgba8();
    assert_eq!(*decoded.get_pixel(16, 16), Rgba([40, 80, 120, 255]));
}
