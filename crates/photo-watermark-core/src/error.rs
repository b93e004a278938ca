//! Error types for the watermarking library

use std::path::PathBuf;

/// Main error type for watermarking and export operations
#[derive(Debug, thiserror::Error)]
pub enum WatermarkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("destination directory {dir} is the same as the source directory")]
    SameDirectory { dir: PathBuf },

    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("logging initialization failed: {message}")]
    LoggingError { message: String },
}

impl WatermarkError {
    /// Get the error type as a string for categorization
    pub fn error_type(&self) -> &'static str {
        match self {
            WatermarkError::Io(_) => "io_error",
            WatermarkError::SameDirectory { .. } => "same_directory",
            WatermarkError::CreateDirectory { .. } => "create_directory",
            WatermarkError::WriteFile { .. } => "write_file",
            WatermarkError::ReadFile { .. } => "read_file",
            WatermarkError::Image(_) => "image_error",
            WatermarkError::TemplateNotFound { .. } => "template_not_found",
            WatermarkError::InvalidInput { .. } => "invalid_input",
            WatermarkError::Serialization(_) => "serialization_error",
            WatermarkError::LoggingError { .. } => "logging_error",
        }
    }

    /// Check if the error is a policy violation (refused before any write)
    pub fn is_policy_violation(&self) -> bool {
        matches!(self, WatermarkError::SameDirectory { .. })
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, WatermarkError>;
