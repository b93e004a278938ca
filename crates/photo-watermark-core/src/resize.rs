//! Export resize planning
//!
//! Computes the target canvas size for an export. The plan always
//! preserves aspect ratio: one constrained axis, or a uniform percent.
//! The export pipeline resizes the *base* image first and re-renders the
//! watermark at the new resolution, so watermark crispness never depends
//! on the base resize.

use crate::models::ResizePolicy;
use image::{imageops::FilterType, DynamicImage};
use tracing::debug;

/// Resize planner for the export pipeline
#[derive(Debug)]
pub struct ResizePlanner;

impl ResizePlanner {
    /// Compute the target size for `original` under `policy`.
    ///
    /// Never fails: degenerate inputs floor at 1 pixel per axis. The
    /// percent value is expected in [10, 400] but only floored, not
    /// hard-enforced.
    pub fn plan(original: (u32, u32), policy: ResizePolicy) -> (u32, u32) {
        let (orig_w, orig_h) = original;
        match policy {
            ResizePolicy::None => original,
            ResizePolicy::Width(value) => {
                let width = value.max(1);
                let height = scaled_axis(orig_h, width, orig_w);
                (width, height)
            }
            ResizePolicy::Height(value) => {
                let height = value.max(1);
                let width = scaled_axis(orig_w, height, orig_h);
                (width, height)
            }
            ResizePolicy::Percent(value) => {
                let factor = value.max(1.0) / 100.0;
                let width = ((orig_w as f64 * factor as f64).round() as u32).max(1);
                let height = ((orig_h as f64 * factor as f64).round() as u32).max(1);
                (width, height)
            }
        }
    }

    /// Apply the plan to a base image, returning it untouched when no
    /// resize is needed
    pub fn apply(base: &DynamicImage, policy: ResizePolicy) -> DynamicImage {
        let original = (base.width(), base.height());
        let (target_w, target_h) = Self::plan(original, policy);
        if (target_w, target_h) == original {
            return base.clone();
        }
        debug!(
            from_w = original.0,
            from_h = original.1,
            to_w = target_w,
            to_h = target_h,
            "resizing base image"
        );
        base.resize_exact(target_w, target_h, FilterType::Lanczos3)
    }
}

/// The unconstrained axis scaled by the constrained axis's ratio,
/// floored at 1
fn scaled_axis(other: u32, constrained: u32, constrained_orig: u32) -> u32 {
    if constrained_orig == 0 {
        return 1;
    }
    let ratio = constrained as f64 / constrained_orig as f64;
    ((other as f64 * ratio).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_none_is_identity() {
        assert_eq!(ResizePlanner::plan((1000, 500), ResizePolicy::None), (1000, 500));
    }

    #[test]
    fn test_plan_width_preserves_aspect() {
        assert_eq!(
            ResizePlanner::plan((1000, 500), ResizePolicy::Width(200)),
            (200, 100)
        );
        assert_eq!(
            ResizePlanner::plan((1000, 500), ResizePolicy::Width(0)),
            (1, 1)
        );
    }

    #[test]
    fn test_plan_height_preserves_aspect() {
        assert_eq!(
            ResizePlanner::plan((1000, 500), ResizePolicy::Height(100)),
            (200, 100)
        );
        assert_eq!(
            ResizePlanner::plan((500, 1000), ResizePolicy::Height(200)),
            (100, 200)
        );
    }

    #[test]
    fn test_plan_percent() {
        assert_eq!(
            ResizePlanner::plan((1000, 500), ResizePolicy::Percent(50.0)),
            (500, 250)
        );
        assert_eq!(
            ResizePlanner::plan((1000, 500), ResizePolicy::Percent(200.0)),
            (2000, 1000)
        );
        // Floored at 1 per axis, value floored at 1
        assert_eq!(
            ResizePlanner::plan((10, 10), ResizePolicy::Percent(0.0)),
            (1, 1)
        );
    }

    #[test]
    fn test_apply_resizes_base() {
        let base = DynamicImage::new_rgba8(1000, 500);
        let resized = ResizePlanner::apply(&base, ResizePolicy::Width(200));
        assert_eq!((resized.width(), resized.height()), (200, 100));

        let untouched = ResizePlanner::apply(&base, ResizePolicy::None);
        assert_eq!((untouched.width(), untouched.height()), (1000, 500));
    }
}
