//! Command-line interface for photo watermarking and export

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use photo_watermark_core::{
    default_store_root, exif, version, Anchor, ExportJob, Exporter, NamingPolicy, OutputFormat,
    Placement, ResizePolicy, ScaleMode, SettingsRecord, Template, TemplateStore, TextWatermark,
    WatermarkSource,
};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "photo-watermark")]
#[command(about = "Batch photo watermarking and export tool")]
#[command(version = version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Template store directory (defaults to the per-user config dir)
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watermark and export one or more images
    Export {
        /// Input image files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (must differ from each source's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Named template to start from (default: last session, then the
        /// default template, then built-in defaults)
        #[arg(short, long)]
        template: Option<String>,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Manage stored templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// List stored template names
    List,

    /// Print a stored template as JSON
    Show { name: String },

    /// Save a template built from defaults plus the given overrides
    Save {
        name: String,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Delete a stored template
    Delete { name: String },

    /// Set the default template name, or clear it when omitted
    SetDefault { name: Option<String> },
}

/// Watermark and export overrides shared by `export` and `template save`
#[derive(Args)]
struct StyleArgs {
    /// Watermark text
    #[arg(long)]
    text: Option<String>,

    /// Raw EXIF or ISO date string to seed the watermark text
    /// (normalized to YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,

    /// Image file to use as the watermark instead of text
    #[arg(long)]
    watermark_image: Option<PathBuf>,

    /// Uniform image-watermark scale in percent
    #[arg(long)]
    scale_percent: Option<f32>,

    /// Anchor position, e.g. bottom-right, top-left, center
    #[arg(short, long)]
    position: Option<String>,

    /// Manual center x coordinate (origin bottom-left)
    #[arg(long, requires = "manual_y")]
    manual_x: Option<f32>,

    /// Manual center y coordinate (origin bottom-left)
    #[arg(long, requires = "manual_x")]
    manual_y: Option<f32>,

    /// Watermark opacity (0.0-1.0)
    #[arg(long)]
    opacity: Option<f32>,

    /// Margin from the canvas edges for anchor placement
    #[arg(long)]
    margin: Option<f32>,

    /// Rotation in degrees about the watermark center
    #[arg(long)]
    rotation: Option<f32>,

    /// Font size for text watermarks
    #[arg(long)]
    font_size: Option<f32>,

    /// Font family for text watermarks
    #[arg(long)]
    font_family: Option<String>,

    /// Output format: png or jpeg
    #[arg(short, long)]
    format: Option<String>,

    /// JPEG quality (0-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Resize the exported base to this width (aspect preserved)
    #[arg(long)]
    resize_width: Option<u32>,

    /// Resize the exported base to this height (aspect preserved)
    #[arg(long, conflicts_with = "resize_width")]
    resize_height: Option<u32>,

    /// Resize the exported base by percent
    #[arg(long, conflicts_with_all = ["resize_width", "resize_height"])]
    resize_percent: Option<f32>,

    /// Output naming: keep, or prepend this prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Output naming: append this suffix to the base name
    #[arg(long, conflicts_with = "prefix")]
    suffix: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let store = TemplateStore::new(cli.store_dir.clone().unwrap_or_else(default_store_root));

    match cli.command {
        Commands::Export {
            inputs,
            output_dir,
            template,
            style,
        } => run_export(&store, inputs, output_dir, template, &style),
        Commands::Template { command } => run_template(&store, command),
    }
}

fn run_export(
    store: &TemplateStore,
    inputs: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    template_name: Option<String>,
    style: &StyleArgs,
) -> Result<()> {
    let base_template = match &template_name {
        Some(name) => store
            .load_template(name)
            .with_context(|| format!("loading template {:?}", name))?,
        None => store.load_startup().unwrap_or_default(),
    };
    let template = apply_overrides(base_template, style)?;

    let output_dir = output_dir
        .or_else(|| template.export_dir.clone())
        .context("no output directory: pass --output-dir or use a template that stores one")?;

    // The image-watermark raster is decoded once and reused per input; a
    // failed decode degrades to exporting unwatermarked.
    let watermark_raster = template.watermark_image_path().and_then(|path| {
        match image::open(path) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot decode watermark image; skipping watermark");
                None
            }
        }
    });

    let exporter = Exporter::default();
    let mut failures = 0usize;
    let mut successes = 0usize;

    for input in &inputs {
        let base = match image::open(input) {
            Ok(img) => img,
            Err(e) => {
                error!(input = %input.display(), error = %e, "failed to decode source image");
                failures += 1;
                continue;
            }
        };
        let spec = template.to_spec(watermark_raster.clone());

        let result = exporter.export(&ExportJob {
            source_path: input,
            base: &base,
            spec: spec.as_ref(),
            resize: template.resize,
            naming: &template.naming,
            format: template.format,
            output_dir: &output_dir,
        });
        match result {
            Ok(outcome) => {
                println!(
                    "{} -> {} ({} bytes)",
                    input.display(),
                    outcome.output_path.display(),
                    outcome.file_size
                );
                successes += 1;
            }
            Err(e) => {
                error!(input = %input.display(), error = %e, "export failed");
                eprintln!("{}: {}", input.display(), e);
                failures += 1;
            }
        }
    }

    if successes > 0 {
        let mut session = template.clone();
        session.export_dir = Some(output_dir);
        if let Err(e) = store.save_last_session(&session) {
            warn!(error = %e, "failed to save last-session record");
        }
    }

    info!(successes, failures, "export finished");
    if failures > 0 {
        bail!("{} of {} exports failed", failures, inputs.len());
    }
    Ok(())
}

fn run_template(store: &TemplateStore, command: TemplateCommands) -> Result<()> {
    match command {
        TemplateCommands::List => {
            for name in store.list_templates()? {
                println!("{}", name);
            }
        }
        TemplateCommands::Show { name } => {
            let template = store.load_template(&name)?;
            let record = SettingsRecord::from_template(&template);
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        TemplateCommands::Save { name, style } => {
            let template = apply_overrides(Template::default(), &style)?;
            store.save_template(&name, &template)?;
            println!("saved template {}", name);
        }
        TemplateCommands::Delete { name } => {
            store.delete_template(&name)?;
            println!("deleted template {}", name);
        }
        TemplateCommands::SetDefault { name } => {
            store.set_default_template_name(name.as_deref())?;
            match name {
                Some(name) => println!("default template: {}", name),
                None => println!("default template cleared"),
            }
        }
    }
    Ok(())
}

fn apply_overrides(mut template: Template, style: &StyleArgs) -> Result<Template> {
    if let Some(path) = &style.watermark_image {
        template.source = WatermarkSource::Image {
            path: path.clone(),
            opacity: style.opacity.unwrap_or(1.0),
            scale: ScaleMode::Percent(style.scale_percent.unwrap_or(100.0)),
        };
    } else if style.text.is_some()
        || style.date.is_some()
        || style.font_size.is_some()
        || style.font_family.is_some()
    {
        let mut text = match template.source {
            WatermarkSource::Text(text) => text,
            WatermarkSource::Image { .. } => TextWatermark::default(),
        };
        if let Some(value) = &style.text {
            text.text = value.clone();
        } else if let Some(raw) = &style.date {
            match exif::normalize_date_text(raw) {
                Some(date) => text.text = date,
                None => warn!(raw = %raw, "unrecognized date string; keeping existing watermark text"),
            }
        }
        if let Some(size) = style.font_size {
            text.font_size = size;
        }
        if let Some(family) = &style.font_family {
            text.font_family = family.clone();
        }
        template.source = WatermarkSource::Text(text);
    }

    if let Some(value) = style.opacity {
        match &mut template.source {
            WatermarkSource::Text(text) => text.opacity = value,
            WatermarkSource::Image { opacity, .. } => *opacity = value,
        }
    }

    if let (Some(x), Some(y)) = (style.manual_x, style.manual_y) {
        template.placement = Placement::Manual { x, y };
    } else if let Some(position) = &style.position {
        template.placement = Placement::Anchor(parse_anchor(position)?);
    }

    if let Some(margin) = style.margin {
        template.margin = margin;
    }
    if let Some(rotation) = style.rotation {
        template.rotation_degrees = rotation;
    }

    if let Some(format) = &style.format {
        template.format = match format.to_ascii_lowercase().as_str() {
            "png" => OutputFormat::Png,
            "jpg" | "jpeg" => OutputFormat::Jpeg {
                quality: style.quality.unwrap_or(template.format.quality()),
            },
            other => bail!("unknown output format {:?} (expected png or jpeg)", other),
        };
    } else if let Some(quality) = style.quality {
        template.format = OutputFormat::Jpeg { quality };
    }

    if let Some(width) = style.resize_width {
        template.resize = ResizePolicy::Width(width);
    } else if let Some(height) = style.resize_height {
        template.resize = ResizePolicy::Height(height);
    } else if let Some(percent) = style.resize_percent {
        template.resize = ResizePolicy::Percent(percent);
    }

    if let Some(prefix) = &style.prefix {
        template.naming = NamingPolicy::Prefix(prefix.clone());
    } else if let Some(suffix) = &style.suffix {
        template.naming = NamingPolicy::Suffix(suffix.clone());
    }

    Ok(template)
}

fn parse_anchor(value: &str) -> Result<Anchor> {
    let anchor = match value.to_ascii_lowercase().as_str() {
        "top-left" | "topleft" => Anchor::TopLeft,
        "top-center" | "topcenter" | "top" => Anchor::TopCenter,
        "top-right" | "topright" => Anchor::TopRight,
        "center-left" | "centerleft" | "left" => Anchor::CenterLeft,
        "center" => Anchor::Center,
        "center-right" | "centerright" | "right" => Anchor::CenterRight,
        "bottom-left" | "bottomleft" => Anchor::BottomLeft,
        "bottom-center" | "bottomcenter" | "bottom" => Anchor::BottomCenter,
        "bottom-right" | "bottomright" => Anchor::BottomRight,
        other => bail!("unknown position {:?}", other),
    };
    Ok(anchor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["photo-watermark", "template", "list"]);
        assert!(cli.is_ok());

        let cli = Cli::try_parse_from([
            "photo-watermark",
            "export",
            "photo.jpg",
            "--output-dir",
            "out",
            "--text",
            "hello",
            "--position",
            "bottom-right",
        ]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_conflicting_resize_flags_rejected() {
        let cli = Cli::try_parse_from([
            "photo-watermark",
            "export",
            "photo.jpg",
            "--resize-width",
            "100",
            "--resize-percent",
            "50",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_parse_anchor() {
        assert_eq!(parse_anchor("bottom-right").unwrap(), Anchor::BottomRight);
        assert_eq!(parse_anchor("Center").unwrap(), Anchor::Center);
        assert!(parse_anchor("middle-ish").is_err());
    }

    #[test]
    fn test_overrides_seed_text_from_date() {
        let style = StyleArgs {
            text: None,
            date: Some("2023:08:15 10:22:31".to_string()),
            watermark_image: None,
            scale_percent: None,
            position: None,
            manual_x: None,
            manual_y: None,
            opacity: None,
            margin: None,
            rotation: None,
            font_size: None,
            font_family: None,
            format: None,
            quality: None,
            resize_width: None,
            resize_height: None,
            resize_percent: None,
            prefix: None,
            suffix: None,
        };
        let template = apply_overrides(Template::default(), &style).unwrap();
        match template.source {
            WatermarkSource::Text(text) => assert_eq!(text.text, "2023-08-15"),
            _ => panic!("expected text watermark"),
        }
    }
}
