//! # Photo Watermark Core
//!
//! Watermark layout and rendering engine plus the batch export pipeline:
//! placement resolution, text/image compositing, resize planning, output
//! naming with directory-safety checks, and durable template storage.

pub mod compositor;
pub mod config;
pub mod error;
pub mod exif;
pub mod export;
pub mod layout;
pub mod logging;
pub mod models;
pub mod naming;
pub mod resize;
pub mod settings;
pub mod style;
pub mod utils;

// Re-export commonly used types
pub use compositor::Compositor;
pub use config::*;
pub use error::*;
pub use export::{ExportJob, ExportOutcome, Exporter};
pub use layout::LayoutResolver;
pub use models::*;
pub use resize::ResizePlanner;
pub use settings::{SettingsRecord, TemplateStore};
pub use style::FontCatalog;

/// Initialize the core library
pub fn init() -> error::Result<()> {
    logging::init_logging()?;
    tracing::debug!("photo watermark core initialized");
    Ok(())
}

/// Get the version of the core library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
