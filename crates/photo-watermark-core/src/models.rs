//! Core data models for watermark rendering and export

use crate::config::OutputFormat;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A size in image space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A point in image space (origin bottom-left, y-up)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Color representation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// This color with its alpha channel replaced by `opacity` in [0, 1].
    ///
    /// The configured opacity fully overrides any pre-existing alpha;
    /// out-of-range values are clamped here, at the point of use.
    pub fn with_opacity(self, opacity: f32) -> Self {
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { a: alpha, ..self }
    }
}

/// The nine fixed anchor positions for watermark alignment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    /// All anchors, grid order
    pub fn all() -> [Anchor; 9] {
        [
            Anchor::TopLeft,
            Anchor::TopCenter,
            Anchor::TopRight,
            Anchor::CenterLeft,
            Anchor::Center,
            Anchor::CenterRight,
            Anchor::BottomLeft,
            Anchor::BottomCenter,
            Anchor::BottomRight,
        ]
    }
}

/// Watermark placement: one of the nine anchors, or an explicit center
/// point in image space (origin bottom-left). Manual placement bypasses
/// the anchor/margin logic unconditionally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Anchor(Anchor),
    Manual { x: f32, y: f32 },
}

impl Default for Placement {
    fn default() -> Self {
        Placement::Anchor(Anchor::BottomRight)
    }
}

/// Shadow attached to a watermark.
///
/// Offsets share the y-up image space: positive `offset_y` moves the
/// shadow toward the top of the image. Offsets are unclamped; the blur
/// radius and opacity are clamped at point of use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ShadowSpec {
    pub blur_radius: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub color: Color,
    pub opacity: f32,
}

impl Default for ShadowSpec {
    fn default() -> Self {
        Self {
            blur_radius: 2.0,
            offset_x: 1.0,
            offset_y: -1.0,
            color: Color::black(),
            opacity: 0.35,
        }
    }
}

/// Stroke attached to a text watermark. A width > 0 means "fill the
/// interior and outline the edge", not outline-only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StrokeSpec {
    pub width: f32,
    pub color: Color,
}

impl Default for StrokeSpec {
    fn default() -> Self {
        Self {
            width: 1.0,
            color: Color::black(),
        }
    }
}

/// Sizing policy for an image watermark
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleMode {
    /// Uniform scale, in percent of the original size
    Percent(f32),
    /// Independent axes, aspect ratio not preserved
    Free { width: u32, height: u32 },
}

impl Default for ScaleMode {
    fn default() -> Self {
        ScaleMode::Percent(100.0)
    }
}

/// Text watermark content and style parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TextWatermark {
    pub text: String,
    /// Font family name; an empty string requests the platform default
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
    /// Replaces the color's alpha at render time, clamped to [0, 1]
    pub opacity: f32,
}

impl Default for TextWatermark {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: String::new(),
            font_size: 36.0,
            bold: false,
            italic: false,
            color: Color::white(),
            opacity: 0.85,
        }
    }
}

/// Image watermark content: a decoded raster plus sizing and opacity
#[derive(Debug, Clone, PartialEq)]
pub struct ImageWatermark {
    pub image: RgbaImage,
    /// Multiplies each source pixel's alpha at render time, clamped to [0, 1]
    pub opacity: f32,
    pub scale: ScaleMode,
}

/// Watermark content: exactly one of text or image per render call
#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkContent {
    Text(TextWatermark),
    Image(ImageWatermark),
}

/// Full render-time watermark specification, constructed per render call
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkSpec {
    pub content: WatermarkContent,
    pub placement: Placement,
    /// Inset from the canvas edges for anchor placement, in pixels
    pub margin: f32,
    /// Rotation about the watermark's own center; positive degrees rotate
    /// counterclockwise in the y-up image space
    pub rotation_degrees: f32,
    pub shadow: Option<ShadowSpec>,
    pub stroke: Option<StrokeSpec>,
}

/// Resize policy for the exported base image; always preserves aspect
/// ratio (a single constrained axis, or a uniform percent)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizePolicy {
    None,
    Width(u32),
    Height(u32),
    /// Percent of the original size, expected in [10, 400]
    Percent(f32),
}

impl Default for ResizePolicy {
    fn default() -> Self {
        ResizePolicy::None
    }
}

/// Rule transforming a source base filename into an output base filename
#[derive(Debug, Clone, PartialEq)]
pub enum NamingPolicy {
    Original,
    Prefix(String),
    Suffix(String),
}

impl Default for NamingPolicy {
    fn default() -> Self {
        NamingPolicy::Suffix("_watermark".to_string())
    }
}

/// Durable watermark source: text parameters, or an image referenced by
/// path (decoded by the embedding application at render time)
#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkSource {
    Text(TextWatermark),
    Image {
        path: PathBuf,
        opacity: f32,
        scale: ScaleMode,
    },
}

/// A durable bundle of watermark + export configuration.
///
/// Templates are stored by name in a [`crate::settings::TemplateStore`];
/// [`Template::to_spec`] builds the render-time [`WatermarkSpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub source: WatermarkSource,
    pub placement: Placement,
    pub margin: f32,
    pub rotation_degrees: f32,
    pub shadow: Option<ShadowSpec>,
    pub stroke: Option<StrokeSpec>,
    pub resize: ResizePolicy,
    pub naming: NamingPolicy,
    pub format: OutputFormat,
    /// Remembered export directory, if the user chose one
    pub export_dir: Option<PathBuf>,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            source: WatermarkSource::Text(TextWatermark::default()),
            placement: Placement::default(),
            margin: 16.0,
            rotation_degrees: 0.0,
            shadow: Some(ShadowSpec::default()),
            stroke: None,
            resize: ResizePolicy::default(),
            naming: NamingPolicy::default(),
            format: OutputFormat::default(),
            export_dir: None,
        }
    }
}

impl Template {
    /// Build the render-time spec. For an image-mode template the decoded
    /// watermark raster must be supplied; `None` means the slot could not
    /// be resolved and the caller should skip watermark drawing.
    pub fn to_spec(&self, watermark_image: Option<RgbaImage>) -> Option<WatermarkSpec> {
        let content = match &self.source {
            WatermarkSource::Text(text) => WatermarkContent::Text(text.clone()),
            WatermarkSource::Image { opacity, scale, .. } => {
                WatermarkContent::Image(ImageWatermark {
                    image: watermark_image?,
                    opacity: *opacity,
                    scale: *scale,
                })
            }
        };
        Some(WatermarkSpec {
            content,
            placement: self.placement,
            margin: self.margin,
            rotation_degrees: self.rotation_degrees,
            shadow: self.shadow,
            stroke: self.stroke,
        })
    }

    /// Path of the image watermark, if this is an image-mode template
    pub fn watermark_image_path(&self) -> Option<&PathBuf> {
        match &self.source {
            WatermarkSource::Image { path, .. } => Some(path),
            WatermarkSource::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_creation() {
        let color = Color::rgb(255, 128, 64);
        assert_eq!(color.r, 255);
        assert_eq!(color.g, 128);
        assert_eq!(color.b, 64);
        assert_eq!(color.a, 255);

        let black = Color::black();
        assert_eq!(black.r, 0);
        assert_eq!(black.a, 255);
    }

    #[test]
    fn test_opacity_replaces_alpha() {
        let color = Color::new(10, 20, 30, 40);
        assert_eq!(color.with_opacity(1.0).a, 255);
        assert_eq!(color.with_opacity(0.0).a, 0);
        // Out-of-range opacity is clamped, never multiplied into the
        // pre-existing alpha
        assert_eq!(color.with_opacity(1.7).a, 255);
        assert_eq!(color.with_opacity(-0.3).a, 0);
    }

    #[test]
    fn test_anchor_serialization() {
        let json = serde_json::to_string(&Anchor::BottomRight).unwrap();
        assert_eq!(json, "\"bottomRight\"");
        let back: Anchor = serde_json::from_str("\"topCenter\"").unwrap();
        assert_eq!(back, Anchor::TopCenter);
    }

    #[test]
    fn test_template_to_spec_text() {
        let template = Template::default();
        let spec = template.to_spec(None).unwrap();
        assert!(matches!(spec.content, WatermarkContent::Text(_)));
        assert_eq!(spec.placement, Placement::Anchor(Anchor::BottomRight));
    }

    #[test]
    fn test_template_to_spec_image_requires_raster() {
        let template = Template {
            source: WatermarkSource::Image {
                path: PathBuf::from("logo.png"),
                opacity: 0.5,
                scale: ScaleMode::Percent(50.0),
            },
            ..Template::default()
        };
        assert!(template.to_spec(None).is_none());

        let raster = RgbaImage::new(4, 4);
        let spec = template.to_spec(Some(raster)).unwrap();
        match spec.content {
            WatermarkContent::Image(img) => {
                assert_eq!(img.opacity, 0.5);
                assert_eq!(img.scale, ScaleMode::Percent(50.0));
            }
            _ => panic!("expected image content"),
        }
    }
}
