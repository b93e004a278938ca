//! Settings persistence: the flat record codec and the template store
//!
//! Configuration bundles are stored as flat, field-named JSON records so
//! the schema can evolve: every field added after the first revision
//! carries a default and old records keep decoding. The store itself is
//! an explicit handle over an injected root directory holding
//! `templates/<name>.json`, a single `last_session.json` slot
//! (overwritten on every successful export) and `config.json` with the
//! default-template pointer.

use crate::config::{OutputFormat, DEFAULT_JPEG_QUALITY};
use crate::error::{Result, WatermarkError};
use crate::models::{
    Anchor, Color, NamingPolicy, Placement, ResizePolicy, ScaleMode, ShadowSpec, StrokeSpec,
    Template, TextWatermark, WatermarkSource,
};
use crate::utils::file;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const TEMPLATES_DIR: &str = "templates";
const LAST_SESSION_FILE: &str = "last_session.json";
const CONFIG_FILE: &str = "config.json";

/// Stored watermark kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkKind {
    Text,
    Image,
}

/// Stored image-watermark scale mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    Percent,
    Free,
}

/// Stored naming rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NamingRule {
    Original,
    Prefix,
    Suffix,
}

impl Default for NamingRule {
    fn default() -> Self {
        NamingRule::Suffix
    }
}

/// Stored output format kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Png,
    Jpeg,
}

impl Default for FormatKind {
    fn default() -> Self {
        FormatKind::Png
    }
}

/// Stored resize mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResizeKind {
    None,
    Width,
    Height,
    Percent,
}

impl Default for ResizeKind {
    fn default() -> Self {
        ResizeKind::None
    }
}

fn default_margin() -> f32 {
    16.0
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_name_prefix() -> String {
    "wm_".to_string()
}

fn default_name_suffix() -> String {
    "_watermark".to_string()
}

fn default_resize_value() -> f32 {
    100.0
}

/// Flat, versionable record of a full watermark + export configuration.
///
/// Both the text and image field groups are always present; which group
/// is live is selected by `watermark_type`. Decoding resets the inert
/// group to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    pub watermark_type: WatermarkKind,
    pub watermark_text: String,

    pub font_family: String,
    pub font_size: f32,
    pub is_bold: bool,
    pub is_italic: bool,
    pub font_color: Color,
    pub opacity: f32,

    pub position: Anchor,
    pub use_manual_position: bool,
    pub manual_x: f32,
    pub manual_y: f32,
    pub rotation_degrees: f32,

    pub enable_shadow: bool,
    pub shadow_blur_radius: f32,
    pub shadow_offset_x: f32,
    pub shadow_offset_y: f32,
    pub shadow_color: Color,
    pub shadow_opacity: f32,

    pub enable_stroke: bool,
    pub stroke_width: f32,
    pub stroke_color: Color,

    #[serde(default)]
    pub image_watermark_path: Option<PathBuf>,
    pub image_opacity: f32,
    pub image_scale_mode: ScaleKind,
    pub image_scale_percent: f32,
    pub image_target_width: u32,
    pub image_target_height: u32,

    // Fields below were added after the first schema revision; absent
    // values decode to these defaults so old records stay loadable.
    #[serde(default = "default_margin")]
    pub margin: f32,
    #[serde(default)]
    pub output_format: FormatKind,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default)]
    pub naming_rule: NamingRule,
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    #[serde(default = "default_name_suffix")]
    pub name_suffix: String,
    #[serde(default)]
    pub resize_mode: ResizeKind,
    #[serde(default = "default_resize_value")]
    pub resize_value: f32,
    #[serde(default)]
    pub export_directory_path: Option<PathBuf>,
}

impl SettingsRecord {
    /// Flatten a template into the stored record
    pub fn from_template(template: &Template) -> Self {
        let text = match &template.source {
            WatermarkSource::Text(text) => text.clone(),
            WatermarkSource::Image { .. } => TextWatermark::default(),
        };
        let watermark_type = match &template.source {
            WatermarkSource::Text(_) => WatermarkKind::Text,
            WatermarkSource::Image { .. } => WatermarkKind::Image,
        };
        let (image_watermark_path, image_opacity, scale) = match &template.source {
            WatermarkSource::Image {
                path,
                opacity,
                scale,
            } => (Some(path.clone()), *opacity, *scale),
            WatermarkSource::Text(_) => (None, 1.0, ScaleMode::default()),
        };
        let (image_scale_mode, image_scale_percent, image_target_width, image_target_height) =
            match scale {
                ScaleMode::Percent(percent) => (ScaleKind::Percent, percent, 0, 0),
                ScaleMode::Free { width, height } => (ScaleKind::Free, 100.0, width, height),
            };

        let (use_manual_position, manual_x, manual_y, position) = match template.placement {
            Placement::Manual { x, y } => (true, x, y, Anchor::BottomRight),
            Placement::Anchor(anchor) => (false, 0.0, 0.0, anchor),
        };

        let shadow = template.shadow.unwrap_or_default();
        let stroke = template.stroke.unwrap_or_default();

        let (resize_mode, resize_value) = match template.resize {
            ResizePolicy::None => (ResizeKind::None, default_resize_value()),
            ResizePolicy::Width(value) => (ResizeKind::Width, value as f32),
            ResizePolicy::Height(value) => (ResizeKind::Height, value as f32),
            ResizePolicy::Percent(value) => (ResizeKind::Percent, value),
        };

        let (naming_rule, name_prefix, name_suffix) = match &template.naming {
            NamingPolicy::Original => {
                (NamingRule::Original, default_name_prefix(), default_name_suffix())
            }
            NamingPolicy::Prefix(prefix) => {
                (NamingRule::Prefix, prefix.clone(), default_name_suffix())
            }
            NamingPolicy::Suffix(suffix) => {
                (NamingRule::Suffix, default_name_prefix(), suffix.clone())
            }
        };

        let (output_format, jpeg_quality) = match template.format {
            OutputFormat::Png => (FormatKind::Png, default_jpeg_quality()),
            OutputFormat::Jpeg { quality } => (FormatKind::Jpeg, quality),
        };

        Self {
            watermark_type,
            watermark_text: text.text,
            font_family: text.font_family,
            font_size: text.font_size,
            is_bold: text.bold,
            is_italic: text.italic,
            font_color: text.color,
            opacity: text.opacity,
            position,
            use_manual_position,
            manual_x,
            manual_y,
            rotation_degrees: template.rotation_degrees,
            enable_shadow: template.shadow.is_some(),
            shadow_blur_radius: shadow.blur_radius,
            shadow_offset_x: shadow.offset_x,
            shadow_offset_y: shadow.offset_y,
            shadow_color: shadow.color,
            shadow_opacity: shadow.opacity,
            enable_stroke: template.stroke.is_some(),
            stroke_width: stroke.width,
            stroke_color: stroke.color,
            image_watermark_path,
            image_opacity,
            image_scale_mode,
            image_scale_percent,
            image_target_width,
            image_target_height,
            margin: template.margin,
            output_format,
            jpeg_quality,
            naming_rule,
            name_prefix,
            name_suffix,
            resize_mode,
            resize_value,
            export_directory_path: template.export_dir.clone(),
        }
    }

    /// Rebuild the typed template from the stored record
    pub fn into_template(self) -> Template {
        let source = match self.watermark_type {
            WatermarkKind::Text => WatermarkSource::Text(TextWatermark {
                text: self.watermark_text,
                font_family: self.font_family,
                font_size: self.font_size,
                bold: self.is_bold,
                italic: self.is_italic,
                color: self.font_color,
                opacity: self.opacity,
            }),
            WatermarkKind::Image => WatermarkSource::Image {
                path: self.image_watermark_path.unwrap_or_default(),
                opacity: self.image_opacity,
                scale: match self.image_scale_mode {
                    ScaleKind::Percent => ScaleMode::Percent(self.image_scale_percent),
                    ScaleKind::Free => ScaleMode::Free {
                        width: self.image_target_width,
                        height: self.image_target_height,
                    },
                },
            },
        };

        let placement = if self.use_manual_position {
            Placement::Manual {
                x: self.manual_x,
                y: self.manual_y,
            }
        } else {
            Placement::Anchor(self.position)
        };

        let shadow = self.enable_shadow.then_some(ShadowSpec {
            blur_radius: self.shadow_blur_radius,
            offset_x: self.shadow_offset_x,
            offset_y: self.shadow_offset_y,
            color: self.shadow_color,
            opacity: self.shadow_opacity,
        });
        let stroke = self.enable_stroke.then_some(StrokeSpec {
            width: self.stroke_width,
            color: self.stroke_color,
        });

        let resize = match self.resize_mode {
            ResizeKind::None => ResizePolicy::None,
            ResizeKind::Width => ResizePolicy::Width(self.resize_value as u32),
            ResizeKind::Height => ResizePolicy::Height(self.resize_value as u32),
            ResizeKind::Percent => ResizePolicy::Percent(self.resize_value),
        };
        let naming = match self.naming_rule {
            NamingRule::Original => NamingPolicy::Original,
            NamingRule::Prefix => NamingPolicy::Prefix(self.name_prefix),
            NamingRule::Suffix => NamingPolicy::Suffix(self.name_suffix),
        };
        let format = match self.output_format {
            FormatKind::Png => OutputFormat::Png,
            FormatKind::Jpeg => OutputFormat::Jpeg {
                quality: self.jpeg_quality,
            },
        };

        Template {
            source,
            placement,
            margin: self.margin,
            rotation_degrees: self.rotation_degrees,
            shadow,
            stroke,
            resize,
            naming,
            format,
            export_dir: self.export_directory_path,
        }
    }
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self::from_template(&Template::default())
    }
}

/// Singleton application config record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppConfigRecord {
    #[serde(default)]
    default_template_name: Option<String>,
}

/// Durable store for named templates plus the last-session and
/// default-template singleton records.
///
/// The root directory is injected at construction; nothing reads a
/// process-global location. All writes are atomic (temp file + rename).
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn templates_dir(&self) -> PathBuf {
        self.root.join(TEMPLATES_DIR)
    }

    fn template_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
            || name.starts_with('.')
        {
            return Err(WatermarkError::InvalidInput {
                message: format!("invalid template name: {:?}", name),
            });
        }
        Ok(self.templates_dir().join(format!("{}.json", name)))
    }

    fn ensure_dirs(&self) -> Result<()> {
        file::ensure_directory_exists(&self.root)?;
        file::ensure_directory_exists(&self.templates_dir())
    }

    /// Save or overwrite a named template
    pub fn save_template(&self, name: &str, template: &Template) -> Result<()> {
        let path = self.template_path(name)?;
        self.ensure_dirs()?;
        let record = SettingsRecord::from_template(template);
        let bytes = serde_json::to_vec_pretty(&record)?;
        file::atomic_write(&path, &bytes)?;
        info!(name, path = %path.display(), "saved template");
        Ok(())
    }

    /// Load a named template
    pub fn load_template(&self, name: &str) -> Result<Template> {
        let path = self.template_path(name)?;
        let bytes = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WatermarkError::TemplateNotFound {
                    name: name.to_string(),
                }
            } else {
                WatermarkError::ReadFile { path, source: e }
            }
        })?;
        let record: SettingsRecord = serde_json::from_slice(&bytes)?;
        Ok(record.into_template())
    }

    /// Delete a named template
    pub fn delete_template(&self, name: &str) -> Result<()> {
        let path = self.template_path(name)?;
        std::fs::remove_file(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WatermarkError::TemplateNotFound {
                    name: name.to_string(),
                }
            } else {
                WatermarkError::Io(e)
            }
        })
    }

    /// List all template names, sorted
    pub fn list_templates(&self) -> Result<Vec<String>> {
        let dir = self.templates_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = std::fs::read_dir(&dir)
            .map_err(|e| WatermarkError::ReadFile {
                path: dir.clone(),
                source: e,
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("json"))
                    .unwrap_or(false)
            })
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Name of the template to load when no last-session record exists
    pub fn default_template_name(&self) -> Option<String> {
        let bytes = std::fs::read(self.root.join(CONFIG_FILE)).ok()?;
        let config: AppConfigRecord = serde_json::from_slice(&bytes).ok()?;
        config.default_template_name
    }

    /// Set or clear the default-template pointer
    pub fn set_default_template_name(&self, name: Option<&str>) -> Result<()> {
        self.ensure_dirs()?;
        let config = AppConfigRecord {
            default_template_name: name.map(String::from),
        };
        let bytes = serde_json::to_vec_pretty(&config)?;
        file::atomic_write(&self.root.join(CONFIG_FILE), &bytes)
    }

    /// Overwrite the single last-session slot (called on every
    /// successful export)
    pub fn save_last_session(&self, template: &Template) -> Result<()> {
        self.ensure_dirs()?;
        let record = SettingsRecord::from_template(template);
        let bytes = serde_json::to_vec_pretty(&record)?;
        file::atomic_write(&self.root.join(LAST_SESSION_FILE), &bytes)
    }

    /// Load the last-session record, if one exists
    pub fn load_last_session(&self) -> Result<Option<Template>> {
        let path = self.root.join(LAST_SESSION_FILE);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(WatermarkError::ReadFile { path, source: e }),
        };
        let record: SettingsRecord = serde_json::from_slice(&bytes)?;
        Ok(Some(record.into_template()))
    }

    /// Startup load priority: last session, else the named default
    /// template, else nothing (the caller supplies built-in defaults).
    /// Unreadable records are skipped with a warning rather than
    /// aborting startup.
    pub fn load_startup(&self) -> Option<Template> {
        match self.load_last_session() {
            Ok(Some(template)) => return Some(template),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "ignoring unreadable last-session record"),
        }
        let name = self.default_template_name()?;
        match self.load_template(&name) {
            Ok(template) => Some(template),
            Err(e) => {
                warn!(name = %name, error = %e, "ignoring unreadable default template");
                None
            }
        }
    }
}
