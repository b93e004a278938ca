//! Watermark placement resolution
//!
//! All coordinates are in image space with the origin at the bottom-left
//! corner (y-up). The compositor converts to pixel rows when stamping.

use crate::models::{Anchor, Placement, Point, Size};

/// Position calculator for watermark placement
#[derive(Debug)]
pub struct LayoutResolver;

impl LayoutResolver {
    /// Resolve the draw origin (lower-left corner of the content box).
    ///
    /// Anchor placement insets the content by `margin` from the relevant
    /// canvas edges and centers it on "center" axes. Manual placement
    /// returns the content box centered on the given point, ignoring the
    /// margin and without clamping to the canvas bounds: content may
    /// render partially or fully off-canvas.
    pub fn resolve(canvas: Size, content: Size, placement: Placement, margin: f32) -> Point {
        match placement {
            Placement::Manual { x, y } => {
                Point::new(x - content.width / 2.0, y - content.height / 2.0)
            }
            Placement::Anchor(anchor) => Self::resolve_anchor(canvas, content, anchor, margin),
        }
    }

    fn resolve_anchor(canvas: Size, content: Size, anchor: Anchor, margin: f32) -> Point {
        let left = margin;
        let right = canvas.width - content.width - margin;
        let center_x = (canvas.width - content.width) / 2.0;
        let bottom = margin;
        let top = canvas.height - content.height - margin;
        let center_y = (canvas.height - content.height) / 2.0;

        match anchor {
            Anchor::TopLeft => Point::new(left, top),
            Anchor::TopCenter => Point::new(center_x, top),
            Anchor::TopRight => Point::new(right, top),
            Anchor::CenterLeft => Point::new(left, center_y),
            Anchor::Center => Point::new(center_x, center_y),
            Anchor::CenterRight => Point::new(right, center_y),
            Anchor::BottomLeft => Point::new(left, bottom),
            Anchor::BottomCenter => Point::new(center_x, bottom),
            Anchor::BottomRight => Point::new(right, bottom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CANVAS: Size = Size {
        width: 800.0,
        height: 600.0,
    };
    const CONTENT: Size = Size {
        width: 120.0,
        height: 40.0,
    };
    const MARGIN: f32 = 10.0;

    fn resolve(anchor: Anchor) -> Point {
        LayoutResolver::resolve(CANVAS, CONTENT, Placement::Anchor(anchor), MARGIN)
    }

    #[test]
    fn test_corner_anchors_touch_margin() {
        let p = resolve(Anchor::BottomRight);
        assert_eq!(p.x, CANVAS.width - CONTENT.width - MARGIN);
        assert_eq!(p.y, MARGIN);

        let p = resolve(Anchor::TopLeft);
        assert_eq!(p.x, MARGIN);
        assert_eq!(p.y, CANVAS.height - CONTENT.height - MARGIN);

        let p = resolve(Anchor::TopRight);
        assert_eq!(p.x, CANVAS.width - CONTENT.width - MARGIN);
        assert_eq!(p.y, CANVAS.height - CONTENT.height - MARGIN);

        let p = resolve(Anchor::BottomLeft);
        assert_eq!(p.x, MARGIN);
        assert_eq!(p.y, MARGIN);
    }

    #[test]
    fn test_center_anchors_center_orthogonal_axis() {
        let p = resolve(Anchor::Center);
        assert_eq!(p.x, (CANVAS.width - CONTENT.width) / 2.0);
        assert_eq!(p.y, (CANVAS.height - CONTENT.height) / 2.0);

        let p = resolve(Anchor::TopCenter);
        assert_eq!(p.x, (CANVAS.width - CONTENT.width) / 2.0);
        assert_eq!(p.y, CANVAS.height - CONTENT.height - MARGIN);

        let p = resolve(Anchor::CenterLeft);
        assert_eq!(p.x, MARGIN);
        assert_eq!(p.y, (CANVAS.height - CONTENT.height) / 2.0);

        let p = resolve(Anchor::BottomCenter);
        assert_eq!(p.x, (CANVAS.width - CONTENT.width) / 2.0);
        assert_eq!(p.y, MARGIN);

        let p = resolve(Anchor::CenterRight);
        assert_eq!(p.x, CANVAS.width - CONTENT.width - MARGIN);
        assert_eq!(p.y, (CANVAS.height - CONTENT.height) / 2.0);
    }

    #[test]
    fn test_all_anchors_edge_distance_equals_margin() {
        for anchor in Anchor::all() {
            let p = resolve(anchor);
            let left = p.x;
            let right = CANVAS.width - (p.x + CONTENT.width);
            let bottom = p.y;
            let top = CANVAS.height - (p.y + CONTENT.height);

            match anchor {
                Anchor::TopLeft | Anchor::CenterLeft | Anchor::BottomLeft => {
                    assert_eq!(left, MARGIN, "{anchor:?}")
                }
                Anchor::TopRight | Anchor::CenterRight | Anchor::BottomRight => {
                    assert_eq!(right, MARGIN, "{anchor:?}")
                }
                _ => {}
            }
            match anchor {
                Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight => {
                    assert_eq!(top, MARGIN, "{anchor:?}")
                }
                Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight => {
                    assert_eq!(bottom, MARGIN, "{anchor:?}")
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_manual_placement_ignores_margin_and_bounds() {
        let p = LayoutResolver::resolve(
            CANVAS,
            CONTENT,
            Placement::Manual { x: 30.0, y: 10.0 },
            MARGIN,
        );
        // Centered on the point even though the content hangs off-canvas
        assert_eq!(p.x, 30.0 - CONTENT.width / 2.0);
        assert_eq!(p.y, 10.0 - CONTENT.height / 2.0);
    }

    proptest! {
        #[test]
        fn prop_manual_placement_centers_content(
            cx in -2000.0f32..2000.0,
            cy in -2000.0f32..2000.0,
            w in 0.0f32..1000.0,
            h in 0.0f32..1000.0,
            margin in 0.0f32..200.0,
        ) {
            let p = LayoutResolver::resolve(
                CANVAS,
                Size::new(w, h),
                Placement::Manual { x: cx, y: cy },
                margin,
            );
            prop_assert_eq!(p.x, cx - w / 2.0);
            prop_assert_eq!(p.y, cy - h / 2.0);
        }
    }
}
