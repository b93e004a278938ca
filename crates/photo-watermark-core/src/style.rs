//! Text style resolution and measurement
//!
//! Resolves font family / weight / slant requests against configured font
//! directories, normalizes color, shadow and stroke parameters into a
//! drawing style, and measures the styled text for the layout resolver.
//! Resolution never fails with an error: a missing family degrades to the
//! platform default font, and a missing true variant is synthesized by
//! the compositor (tracked via the `synthetic_*` flags).

use crate::models::{Color, ShadowSpec, Size, StrokeSpec, TextWatermark};
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Horizontal shear applied per pixel of height when a true italic
/// variant is unavailable (roughly a 14 degree oblique)
pub(crate) const OBLIQUE_SKEW: f32 = 0.25;

/// Well-known font files tried when a requested family cannot be found
const FALLBACK_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

/// Directories scanned for `Family[-Variant].{ttf,otf}` files
const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/TTF",
    "/usr/local/share/fonts",
    "/System/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
    "/Library/Fonts",
    "C:\\Windows\\Fonts",
];

/// A font resolved for drawing, with flags for emphasis the compositor
/// must synthesize because no true variant file was found
#[derive(Debug, Clone)]
pub struct ResolvedFont {
    pub font: FontArc,
    pub synthetic_bold: bool,
    pub synthetic_italic: bool,
}

/// Shadow normalized for drawing: blur clamped, color alpha replaced by
/// the clamped shadow opacity
#[derive(Debug, Clone, Copy)]
pub struct ResolvedShadow {
    pub blur_radius: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub color: Color,
}

/// Normalized drawing style for a text watermark
#[derive(Debug, Clone)]
pub struct TextStyle {
    pub font: FontArc,
    pub synthetic_bold: bool,
    pub synthetic_italic: bool,
    pub size: f32,
    /// Base color with its alpha replaced by the clamped opacity
    pub fill: Color,
    pub shadow: Option<ResolvedShadow>,
    /// Present only when enabled with width > 0: fill interior and
    /// outline edge
    pub stroke: Option<StrokeSpec>,
}

/// Explicit font lookup handle: configured directories plus fixed system
/// fallback paths. Loaded fonts are cached by path.
#[derive(Debug)]
pub struct FontCatalog {
    font_dirs: Vec<PathBuf>,
    cache: Mutex<HashMap<PathBuf, Option<FontArc>>>,
}

impl FontCatalog {
    /// Catalog over explicit font directories (searched before the
    /// system directories)
    pub fn new(font_dirs: Vec<PathBuf>) -> Self {
        let mut dirs = font_dirs;
        dirs.extend(SYSTEM_FONT_DIRS.iter().map(PathBuf::from));
        Self {
            font_dirs: dirs,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a family name plus requested emphasis to a usable font.
    ///
    /// A missing family falls back to the platform default; `None` is
    /// returned only when no font file at all can be loaded, in which
    /// case the caller skips text drawing entirely.
    pub fn resolve(&self, family: &str, bold: bool, italic: bool) -> Option<ResolvedFont> {
        if !family.is_empty() {
            for (suffix, has_bold, has_italic) in variant_suffixes(bold, italic) {
                for dir in &self.font_dirs {
                    for ext in ["ttf", "otf"] {
                        let path = dir.join(format!("{}{}.{}", family, suffix, ext));
                        if let Some(font) = self.load(&path) {
                            debug!(path = %path.display(), "resolved font");
                            return Some(ResolvedFont {
                                font,
                                synthetic_bold: bold && !has_bold,
                                synthetic_italic: italic && !has_italic,
                            });
                        }
                    }
                }
            }
            warn!(family, "font family not found, falling back to platform default");
        }

        for path in FALLBACK_FONT_PATHS.iter().copied() {
            if let Some(font) = self.load(Path::new(path)) {
                return Some(ResolvedFont {
                    font,
                    synthetic_bold: bold,
                    synthetic_italic: italic,
                });
            }
        }
        warn!("no usable font could be loaded");
        None
    }

    /// Resolve the full drawing style and measure the styled text.
    ///
    /// Returns `None` only when no font at all is available.
    pub fn resolve_style(
        &self,
        params: &TextWatermark,
        shadow: Option<&ShadowSpec>,
        stroke: Option<&StrokeSpec>,
    ) -> Option<(TextStyle, Size)> {
        let resolved = self.resolve(&params.font_family, params.bold, params.italic)?;

        let style = TextStyle {
            font: resolved.font,
            synthetic_bold: resolved.synthetic_bold,
            synthetic_italic: resolved.synthetic_italic,
            size: params.font_size.max(1.0),
            fill: params.color.with_opacity(params.opacity),
            shadow: shadow.map(|s| ResolvedShadow {
                blur_radius: s.blur_radius.max(0.0),
                offset_x: s.offset_x,
                offset_y: s.offset_y,
                color: s.color.with_opacity(s.opacity),
            }),
            stroke: stroke.filter(|s| s.width > 0.0).copied(),
        };
        let size = measure_styled(&style, &params.text);
        Some((style, size))
    }

    fn load(&self, path: &Path) -> Option<FontArc> {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(cached) = cache.get(path) {
            return cached.clone();
        }
        let loaded = std::fs::read(path)
            .ok()
            .and_then(|bytes| FontArc::try_from_vec(bytes).ok());
        cache.insert(path.to_path_buf(), loaded.clone());
        loaded
    }
}

impl Default for FontCatalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Candidate file suffixes for the requested emphasis, most specific
/// first; the flags record which emphasis a matching file truly carries
fn variant_suffixes(bold: bool, italic: bool) -> Vec<(&'static str, bool, bool)> {
    let mut suffixes = Vec::new();
    if bold && italic {
        suffixes.push(("-BoldItalic", true, true));
        suffixes.push(("-BoldOblique", true, true));
    }
    if bold {
        suffixes.push(("-Bold", true, false));
    }
    if italic {
        suffixes.push(("-Italic", false, true));
        suffixes.push(("-Oblique", false, true));
    }
    suffixes.push(("", false, false));
    suffixes.push(("-Regular", false, false));
    suffixes
}

/// Horizontal shift for a synthesized bold double-stamp
pub(crate) fn bold_shift(size: f32) -> f32 {
    (size / 24.0).max(1.0)
}

/// Advance width and line height of unadorned text under the font
pub fn measure_text(font: &FontArc, size: f32, text: &str) -> Size {
    let scaled = font.as_scaled(PxScale::from(size.max(1.0)));
    let mut width = 0.0f32;
    let mut last: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = last {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        last = Some(id);
    }
    let height = scaled.ascent() - scaled.descent();
    Size::new(width, height)
}

/// Measured bounding box of the styled text, including the extra width
/// occupied by a synthetic oblique shear or bold double-stamp
pub fn measure_styled(style: &TextStyle, text: &str) -> Size {
    let mut size = measure_text(&style.font, style.size, text);
    if style.synthetic_italic {
        size.width += size.height * OBLIQUE_SKEW;
    }
    if style.synthetic_bold {
        size.width += bold_shift(style.size);
    }
    size
}
