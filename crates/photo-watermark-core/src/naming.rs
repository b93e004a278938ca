//! Output naming and directory-safety rules

use crate::config::OutputFormat;
use crate::error::{Result, WatermarkError};
use crate::models::NamingPolicy;
use std::path::{Path, PathBuf};

/// Compute the output file name for a source base name (no extension).
/// The extension always comes from the target format, overriding
/// whatever extension the source carried.
pub fn file_name(source_base: &str, policy: &NamingPolicy, format: OutputFormat) -> String {
    let base = match policy {
        NamingPolicy::Original => source_base.to_string(),
        NamingPolicy::Prefix(prefix) => format!("{}{}", prefix, source_base),
        NamingPolicy::Suffix(suffix) => format!("{}{}", source_base, suffix),
    };
    format!("{}.{}", base, format.extension())
}

/// Resolve the full output path for a source file, refusing to export
/// into the source's own directory.
///
/// The directories are compared as canonicalized paths; equality is a
/// hard policy violation surfaced before any filesystem write.
pub fn resolve_output_path(
    source: &Path,
    output_dir: &Path,
    policy: &NamingPolicy,
    format: OutputFormat,
) -> Result<PathBuf> {
    let source_base = source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| WatermarkError::InvalidInput {
            message: format!("source path has no file name: {}", source.display()),
        })?;

    let source_dir = source.parent().unwrap_or_else(|| Path::new("."));
    if canonical_or_raw(source_dir) == canonical_or_raw(output_dir) {
        return Err(WatermarkError::SameDirectory {
            dir: output_dir.to_path_buf(),
        });
    }

    Ok(output_dir.join(file_name(source_base, policy, format)))
}

/// Canonicalize when possible; a destination that does not exist yet
/// cannot be the (existing) source directory, so the raw path suffices
fn canonical_or_raw(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
