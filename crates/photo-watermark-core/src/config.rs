//! Output format and application directory configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default JPEG quality when none is configured
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Supported export formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg { quality: u8 },
}

impl OutputFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg { .. } => "jpg",
        }
    }

    /// Get the MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg { .. } => "image/jpeg",
        }
    }

    /// Check if this format supports transparency
    pub fn supports_transparency(&self) -> bool {
        matches!(self, OutputFormat::Png)
    }

    /// JPEG quality clamped to 0-100; PNG reports 100
    pub fn quality(&self) -> u8 {
        match self {
            OutputFormat::Png => 100,
            OutputFormat::Jpeg { quality } => (*quality).min(100),
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Png
    }
}

/// Default root directory for the template store
///
/// The store itself takes the root as an explicit constructor argument;
/// this is only the conventional location an embedding application can use.
pub fn default_store_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photo-watermark")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_properties() {
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::Jpeg { quality: 85 }.extension(), "jpg");
        assert_eq!(OutputFormat::Png.mime_type(), "image/png");
        assert!(OutputFormat::Png.supports_transparency());
        assert!(!OutputFormat::Jpeg { quality: 85 }.supports_transparency());
    }

    #[test]
    fn test_quality_clamp() {
        assert_eq!(OutputFormat::Jpeg { quality: 250 }.quality(), 100);
        assert_eq!(OutputFormat::Jpeg { quality: 85 }.quality(), 85);
        assert_eq!(OutputFormat::Png.quality(), 100);
    }

    #[test]
    fn test_default_store_root() {
        let root = default_store_root();
        assert!(root.ends_with("photo-watermark"));
    }
}
