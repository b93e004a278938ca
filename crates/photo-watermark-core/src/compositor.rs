//! Watermark compositing engine
//!
//! Renders the base image into a fresh RGBA surface and draws the text or
//! image watermark at the resolved position, rotation and opacity. The
//! watermark is first rendered into its own tile (with shadow and stroke
//! baked in for text), the tile is rotated about its center, and the
//! result is alpha-composited over the base. The input raster is never
//! mutated; on an unresolvable font the base is returned unchanged.

use crate::layout::LayoutResolver;
use crate::models::{ImageWatermark, ScaleMode, Size, WatermarkContent, WatermarkSpec};
use crate::style::{bold_shift, FontCatalog, TextStyle, OBLIQUE_SKEW};
use ab_glyph::{Font, GlyphId, PxScale, ScaleFont};
use image::{imageops, DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use tracing::{debug, instrument, warn};

/// Watermark compositing engine
#[derive(Debug, Default)]
pub struct Compositor {
    fonts: FontCatalog,
}

impl Compositor {
    pub fn new(fonts: FontCatalog) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &FontCatalog {
        &self.fonts
    }

    /// Composite the watermark described by `spec` over `base`,
    /// returning a new raster of the same dimensions.
    #[instrument(skip(self, base, spec), fields(rotation = spec.rotation_degrees))]
    pub fn render(&self, base: &DynamicImage, spec: &WatermarkSpec) -> RgbaImage {
        let mut canvas = base.to_rgba8();
        let (canvas_w, canvas_h) = canvas.dimensions();
        let canvas_size = Size::new(canvas_w as f32, canvas_h as f32);

        let (tile, content) = match &spec.content {
            WatermarkContent::Text(text) => {
                let resolved =
                    self.fonts
                        .resolve_style(text, spec.shadow.as_ref(), spec.stroke.as_ref());
                let Some((style, measured)) = resolved else {
                    warn!("no usable font could be loaded; skipping text watermark");
                    return canvas;
                };
                if text.text.is_empty() || measured.width < 1.0 {
                    return canvas;
                }
                (render_text_tile(&style, &text.text, measured), measured)
            }
            WatermarkContent::Image(mark) => {
                let (tile, (draw_w, draw_h)) = image_tile(mark);
                (tile, Size::new(draw_w as f32, draw_h as f32))
            }
        };

        let origin = LayoutResolver::resolve(canvas_size, content, spec.placement, spec.margin);
        // Convert the y-up content center to pixel rows; rotation and
        // stamping both work from the center so the rotation pivot is
        // the watermark's own geometric center.
        let center_x = origin.x + content.width / 2.0;
        let center_y = canvas_h as f32 - (origin.y + content.height / 2.0);

        let tile = rotate_tile(tile, spec.rotation_degrees);
        overlay_centered(&mut canvas, &tile, center_x, center_y);
        debug!(width = canvas_w, height = canvas_h, "composited watermark");
        canvas
    }
}

/// Compute the draw size for an image watermark.
///
/// `Percent` scales uniformly (clamped to [1, 400] percent); `Free` sets
/// each axis independently without preserving aspect ratio. Each axis is
/// floored at 1 pixel so the result is always drawable.
pub fn scaled_draw_size(original: (u32, u32), mode: ScaleMode) -> (u32, u32) {
    match mode {
        ScaleMode::Percent(percent) => {
            let factor = percent.clamp(1.0, 400.0) / 100.0;
            let width = (original.0 as f32 * factor).round().max(1.0) as u32;
            let height = (original.1 as f32 * factor).round().max(1.0) as u32;
            (width, height)
        }
        ScaleMode::Free { width, height } => (width.max(1), height.max(1)),
    }
}

/// Scale the watermark raster and apply its opacity.
///
/// Image-mode opacity multiplies each source pixel's own alpha (unlike
/// text mode, where the opacity replaces the fill color's alpha).
fn image_tile(mark: &ImageWatermark) -> (RgbaImage, (u32, u32)) {
    let (orig_w, orig_h) = mark.image.dimensions();
    let (draw_w, draw_h) = scaled_draw_size((orig_w, orig_h), mark.scale);

    let mut tile = if (draw_w, draw_h) != (orig_w, orig_h) {
        debug!(
            from_w = orig_w,
            from_h = orig_h,
            to_w = draw_w,
            to_h = draw_h,
            "scaling image watermark"
        );
        imageops::resize(&mark.image, draw_w, draw_h, imageops::FilterType::Lanczos3)
    } else {
        mark.image.clone()
    };

    let opacity = mark.opacity.clamp(0.0, 1.0);
    if opacity < 1.0 {
        for pixel in tile.pixels_mut() {
            pixel[3] = (pixel[3] as f32 * opacity).round() as u8;
        }
    }
    (tile, (draw_w, draw_h))
}

/// Render styled text into a tile whose center coincides with the center
/// of the measured text box (padding for shadow and stroke is symmetric,
/// so rotating the tile about its center rotates the text about its own
/// center).
fn render_text_tile(style: &TextStyle, text: &str, content: Size) -> RgbaImage {
    let mask_w = (content.width.ceil() as u32).max(1);
    let mask_h = (content.height.ceil() as u32).max(1);
    let mask = glyph_coverage(style, text, mask_w, mask_h);

    let stroke_pad = style
        .stroke
        .map(|s| s.width.ceil() as u32)
        .unwrap_or(0);
    let shadow_pad = style
        .shadow
        .map(|s| (2.0 * s.blur_radius + s.offset_x.abs().max(s.offset_y.abs())).ceil() as u32)
        .unwrap_or(0);
    let pad = stroke_pad + shadow_pad;

    let tile_w = mask_w + 2 * pad;
    let tile_h = mask_h + 2 * pad;
    let mut tile = RgbaImage::new(tile_w, tile_h);

    // Text mask placed at the symmetric padding offset, in tile space
    let mut tile_mask = vec![0.0f32; (tile_w * tile_h) as usize];
    for y in 0..mask_h {
        for x in 0..mask_w {
            tile_mask[((y + pad) * tile_w + (x + pad)) as usize] =
                mask[(y * mask_w + x) as usize];
        }
    }

    let stroke_mask = style
        .stroke
        .map(|s| dilate(&tile_mask, tile_w, tile_h, s.width));

    if let Some(shadow) = &style.shadow {
        let silhouette = stroke_mask.as_deref().unwrap_or(&tile_mask);
        let offset_x = shadow.offset_x.round() as i32;
        // Shadow offsets are y-up like the rest of the image space
        let offset_y = (-shadow.offset_y).round() as i32;

        let mut shadow_layer = RgbaImage::new(tile_w, tile_h);
        stamp_mask(
            &mut shadow_layer,
            silhouette,
            tile_w,
            tile_h,
            shadow.color,
            offset_x,
            offset_y,
        );
        if shadow.blur_radius > 0.0 {
            shadow_layer = gaussian_blur(shadow_layer, shadow.blur_radius);
        }
        blend_over(&mut tile, &shadow_layer);
    }

    // Stroke first (covers the full dilated silhouette), then the fill
    // on top: outline edge plus filled interior
    if let Some(stroke) = &style.stroke {
        if let Some(stroke_mask) = &stroke_mask {
            stamp_mask(&mut tile, stroke_mask, tile_w, tile_h, stroke.color, 0, 0);
        }
    }
    stamp_mask(&mut tile, &tile_mask, tile_w, tile_h, style.fill, 0, 0);

    tile
}

/// Rasterize the glyph run into a coverage mask, applying synthetic bold
/// (double stamp) and synthetic oblique (row shear) when the resolved
/// font has no true variant
fn glyph_coverage(style: &TextStyle, text: &str, mask_w: u32, mask_h: u32) -> Vec<f32> {
    let mut mask = vec![0.0f32; (mask_w * mask_h) as usize];
    let scale = PxScale::from(style.size);
    let scaled = style.font.as_scaled(scale);
    let ascent = scaled.ascent();

    let bold_passes: &[f32] = if style.synthetic_bold {
        &[0.0, 1.0]
    } else {
        &[0.0]
    };
    let shift = bold_shift(style.size);

    let mut caret = 0.0f32;
    let mut last: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = last {
            caret += scaled.kern(prev, id);
        }
        for pass in bold_passes {
            let glyph =
                id.with_scale_and_position(scale, ab_glyph::point(caret + pass * shift, ascent));
            if let Some(outlined) = style.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let x = bounds.min.x as i32 + px as i32;
                    let y = bounds.min.y as i32 + py as i32;
                    if x >= 0 && y >= 0 && (x as u32) < mask_w && (y as u32) < mask_h {
                        let idx = (y as u32 * mask_w + x as u32) as usize;
                        mask[idx] = mask[idx].max(coverage);
                    }
                });
            }
        }
        caret += scaled.h_advance(id);
        last = Some(id);
    }

    if style.synthetic_italic {
        shear_rows(&mask, mask_w, mask_h, ascent)
    } else {
        mask
    }
}

/// Faux-oblique row shear: rows above the baseline shift right, rows
/// below shift left, normalized so the leftmost row lands at x = 0 (the
/// measured width already accounts for the added slant width)
fn shear_rows(mask: &[f32], mask_w: u32, mask_h: u32, ascent: f32) -> Vec<f32> {
    let mut sheared = vec![0.0f32; mask.len()];
    let min_raw = (ascent - (mask_h as f32 - 1.0)) * OBLIQUE_SKEW;
    for y in 0..mask_h {
        let raw = (ascent - y as f32) * OBLIQUE_SKEW;
        let shift = (raw - min_raw).round() as u32;
        for x in 0..mask_w {
            let coverage = mask[(y * mask_w + x) as usize];
            if coverage <= 0.0 {
                continue;
            }
            let nx = x + shift;
            if nx < mask_w {
                sheared[(y * mask_w + nx) as usize] = coverage;
            }
        }
    }
    sheared
}

/// Dilate a coverage mask by a circular structuring element
fn dilate(mask: &[f32], width: u32, height: u32, radius: f32) -> Vec<f32> {
    let r = radius.ceil() as i32;
    let mut out = vec![0.0f32; mask.len()];
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let coverage = mask[(y * width as i32 + x) as usize];
            if coverage <= 0.0 {
                continue;
            }
            for dy in -r..=r {
                for dx in -r..=r {
                    if ((dx * dx + dy * dy) as f32).sqrt() > radius {
                        continue;
                    }
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx >= 0 && ny >= 0 && nx < width as i32 && ny < height as i32 {
                        let idx = (ny * width as i32 + nx) as usize;
                        out[idx] = out[idx].max(coverage);
                    }
                }
            }
        }
    }
    out
}

/// Stamp a coverage mask onto a layer in the given color; the mask
/// coverage multiplies the color's alpha
fn stamp_mask(
    layer: &mut RgbaImage,
    mask: &[f32],
    width: u32,
    height: u32,
    color: crate::models::Color,
    offset_x: i32,
    offset_y: i32,
) {
    for y in 0..height {
        for x in 0..width {
            let coverage = mask[(y * width + x) as usize];
            if coverage <= 0.0 {
                continue;
            }
            let tx = x as i32 + offset_x;
            let ty = y as i32 + offset_y;
            if tx < 0 || ty < 0 || tx >= width as i32 || ty >= height as i32 {
                continue;
            }
            let alpha = (coverage * color.a as f32).round().clamp(0.0, 255.0) as u8;
            let overlay = Rgba([color.r, color.g, color.b, alpha]);
            let base = *layer.get_pixel(tx as u32, ty as u32);
            layer.put_pixel(tx as u32, ty as u32, blend_pixel(base, overlay));
        }
    }
}

/// Alpha-composite `overlay` over `base`, in place
fn blend_over(base: &mut RgbaImage, overlay: &RgbaImage) {
    for (x, y, pixel) in overlay.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        let under = *base.get_pixel(x, y);
        base.put_pixel(x, y, blend_pixel(under, *pixel));
    }
}

/// Standard alpha-over blending of two straight-alpha RGBA pixels
fn blend_pixel(base: Rgba<u8>, overlay: Rgba<u8>) -> Rgba<u8> {
    let overlay_alpha = overlay[3] as f32 / 255.0;
    if overlay_alpha == 0.0 {
        return base;
    }
    let base_alpha = base[3] as f32 / 255.0;
    let final_alpha = overlay_alpha + base_alpha * (1.0 - overlay_alpha);
    if final_alpha == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let inv = base_alpha * (1.0 - overlay_alpha);
    let r = (overlay[0] as f32 * overlay_alpha + base[0] as f32 * inv) / final_alpha;
    let g = (overlay[1] as f32 * overlay_alpha + base[1] as f32 * inv) / final_alpha;
    let b = (overlay[2] as f32 * overlay_alpha + base[2] as f32 * inv) / final_alpha;

    Rgba([
        r.clamp(0.0, 255.0) as u8,
        g.clamp(0.0, 255.0) as u8,
        b.clamp(0.0, 255.0) as u8,
        (final_alpha * 255.0).round() as u8,
    ])
}

/// Rotate a tile about its own center.
///
/// The tile is first padded to a canvas large enough for its diagonal
/// (with even padding per axis so the center is exactly preserved), then
/// rotated with bilinear interpolation. Positive degrees rotate
/// counterclockwise in the y-up image space.
fn rotate_tile(tile: RgbaImage, degrees: f32) -> RgbaImage {
    if degrees.rem_euclid(360.0) == 0.0 {
        return tile;
    }
    let (w, h) = tile.dimensions();
    let diag = ((w * w + h * h) as f32).sqrt().ceil() as u32;
    let pad_x = (diag.saturating_sub(w) + 1) / 2;
    let pad_y = (diag.saturating_sub(h) + 1) / 2;

    let mut padded = RgbaImage::new(w + 2 * pad_x, h + 2 * pad_y);
    imageops::overlay(&mut padded, &tile, pad_x as i64, pad_y as i64);

    // Counterclockwise in y-up image space is negative theta in pixel rows
    rotate_about_center(
        &padded,
        -degrees.to_radians(),
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
    )
}

/// Stamp a tile onto the canvas with its center at the given pixel
/// position. Out-of-canvas portions are clipped silently: partially or
/// fully off-canvas watermarks are accepted behavior.
fn overlay_centered(canvas: &mut RgbaImage, tile: &RgbaImage, center_x: f32, center_y: f32) {
    let (tile_w, tile_h) = tile.dimensions();
    let x0 = (center_x - tile_w as f32 / 2.0).round() as i64;
    let y0 = (center_y - tile_h as f32 / 2.0).round() as i64;

    for (x, y, pixel) in tile.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        let cx = x0 + x as i64;
        let cy = y0 + y as i64;
        if cx < 0 || cy < 0 || cx >= canvas.width() as i64 || cy >= canvas.height() as i64 {
            continue;
        }
        let base = *canvas.get_pixel(cx as u32, cy as u32);
        canvas.put_pixel(cx as u32, cy as u32, blend_pixel(base, *pixel));
    }
}

/// Separable Gaussian blur over an RGBA layer
fn gaussian_blur(mut image: RgbaImage, radius: f32) -> RgbaImage {
    if radius <= 0.0 {
        return image;
    }

    let width = image.width();
    let height = image.height();
    let kernel_size = (radius * 2.0) as usize + 1;
    let sigma = radius / 3.0;
    let center = kernel_size / 2;

    let mut kernel = vec![0.0f32; kernel_size];
    let mut sum = 0.0;
    for (i, k) in kernel.iter_mut().enumerate() {
        let x = (i as f32 - center as f32) / sigma;
        *k = (-0.5 * x * x).exp();
        sum += *k;
    }
    for k in &mut kernel {
        *k /= sum;
    }

    let mut horizontal = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0f32; 4];
            for (i, &weight) in kernel.iter().enumerate() {
                let sample_x = (x as i32 + i as i32 - center as i32).clamp(0, width as i32 - 1);
                let pixel = *image.get_pixel(sample_x as u32, y);
                for c in 0..4 {
                    acc[c] += pixel[c] as f32 * weight;
                }
            }
            horizontal.put_pixel(
                x,
                y,
                Rgba(acc.map(|v| v.clamp(0.0, 255.0) as u8)),
            );
        }
    }

    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0f32; 4];
            for (i, &weight) in kernel.iter().enumerate() {
                let sample_y = (y as i32 + i as i32 - center as i32).clamp(0, height as i32 - 1);
                let pixel = *horizontal.get_pixel(x, sample_y as u32);
                for c in 0..4 {
                    acc[c] += pixel[c] as f32 * weight;
                }
            }
            image.put_pixel(
                x,
                y,
                Rgba(acc.map(|v| v.clamp(0.0, 255.0) as u8)),
            );
        }
    }

    image
}
