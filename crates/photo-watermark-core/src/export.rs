//! Batch export pipeline
//!
//! Drives one image through resize plan -> watermark re-render -> output
//! naming -> encode -> atomic write. The directory-safety check runs
//! before anything touches the filesystem, and batch jobs are fully
//! independent: one failure never aborts the remaining images.

use crate::compositor::Compositor;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::models::{NamingPolicy, ResizePolicy, WatermarkSpec};
use crate::naming;
use crate::resize::ResizePlanner;
use crate::utils::file;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// One image to export
pub struct ExportJob<'a> {
    pub source_path: &'a Path,
    pub base: &'a DynamicImage,
    /// `None` when the watermark slot could not be resolved; the base
    /// image is exported unwatermarked (soft degradation)
    pub spec: Option<&'a WatermarkSpec>,
    pub resize: ResizePolicy,
    pub naming: &'a NamingPolicy,
    pub format: OutputFormat,
    pub output_dir: &'a Path,
}

/// Result of a successful export
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub output_path: PathBuf,
    pub file_size: u64,
    pub width: u32,
    pub height: u32,
}

/// Export pipeline driver
#[derive(Debug, Default)]
pub struct Exporter {
    compositor: Compositor,
}

impl Exporter {
    pub fn new(compositor: Compositor) -> Self {
        Self { compositor }
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Export a single image.
    ///
    /// The base is resized first and the watermark re-rendered at the
    /// export resolution; a pre-rendered preview composite is never
    /// scaled.
    #[instrument(skip(self, job), fields(source = %job.source_path.display()))]
    pub fn export(&self, job: &ExportJob<'_>) -> Result<ExportOutcome> {
        // Policy check before any write
        let output_path = naming::resolve_output_path(
            job.source_path,
            job.output_dir,
            job.naming,
            job.format,
        )?;

        let base = ResizePlanner::apply(job.base, job.resize);
        let composited = match job.spec {
            Some(spec) => self.compositor.render(&base, spec),
            None => {
                warn!("watermark slot unresolved; exporting base image unwatermarked");
                base.to_rgba8()
            }
        };
        let (width, height) = composited.dimensions();

        let bytes = encode_image(&composited, job.format)?;
        file::ensure_directory_exists(job.output_dir)?;
        file::atomic_write(&output_path, &bytes)?;

        let file_size = bytes.len() as u64;
        info!(
            output = %output_path.display(),
            file_size,
            width,
            height,
            "exported image"
        );
        Ok(ExportOutcome {
            output_path,
            file_size,
            width,
            height,
        })
    }

    /// Export a batch of independent jobs, collecting per-image results
    pub fn export_batch<'a>(
        &self,
        jobs: impl IntoIterator<Item = ExportJob<'a>>,
    ) -> Vec<Result<ExportOutcome>> {
        jobs.into_iter().map(|job| self.export(&job)).collect()
    }
}

/// Encode a composited raster to PNG or JPEG bytes.
///
/// PNG keeps the alpha channel; JPEG has none, so transparency is
/// flattened over white before encoding at the clamped quality.
pub fn encode_image(image: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    let mut bytes = Vec::new();
    match format {
        OutputFormat::Png => {
            PngEncoder::new(Cursor::new(&mut bytes)).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            )?;
        }
        OutputFormat::Jpeg { .. } => {
            let rgb = flatten_onto_white(image);
            let mut encoder =
                JpegEncoder::new_with_quality(Cursor::new(&mut bytes), format.quality());
            encoder.encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)?;
        }
    }
    Ok(bytes)
}

/// Composite straight-alpha RGBA over a white background
fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    let mut rgb = RgbImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let alpha = pixel[3] as f32 / 255.0;
        let blend = |channel: u8| -> u8 {
            (channel as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8
        };
        rgb.put_pixel(x, y, image::Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    rgb
}
