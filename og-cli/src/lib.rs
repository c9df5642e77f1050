//! # OG Studio CLI
//!
//! Command-line front end for the OG image editor.
//!
//! Every invocation opens the editor state stored in the data directory,
//! applies one command and persists the result, so a sequence of commands
//! behaves like a session in the editor.
//!
//! ## Usage
//!
//! ```bash
//! og-studio template new "Launch post"
//! og-studio element --template <id> add text
//! og-studio var --template <id> add title --default "Hello"
//! og-studio export png <id> --var title="Shipping Rust"
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `StudioConfig` - Data directory, export and font settings
//! - `Studio` - Runs a [`Command`] against the persisted editor
//! - `GoogleFontsLoader` - Fetches Google fonts into the data directory

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod error;
mod fonts;

pub use commands::Studio;
pub use error::CliError;
pub use fonts::{parse_stylesheet, FaceSource, GoogleFontsLoader};

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use og_core::{Direction, ElementId, ElementKind, TemplateId, DEFAULT_WEIGHTS};
use og_renderer::{ExportConfig, DEFAULT_PIXEL_RATIO};
use url::Url;

/// Command-line arguments for og-studio.
#[derive(Debug, Clone, Parser)]
#[command(name = "og-studio")]
#[command(about = "Design 1200x630 Open Graph images from reusable templates")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding the editor state and downloaded fonts
    #[arg(long, global = true, env = "OG_STUDIO_DATA_DIR", default_value = ".og-studio")]
    pub data_dir: PathBuf,

    /// Output pixels per canvas pixel for PNG export
    #[arg(
        long,
        global = true,
        env = "OG_STUDIO_PIXEL_RATIO",
        default_value_t = DEFAULT_PIXEL_RATIO
    )]
    pub pixel_ratio: f32,

    /// Base directory for relative image paths
    #[arg(long, global = true, env = "OG_STUDIO_ASSET_DIR")]
    pub asset_dir: Option<PathBuf>,

    /// Only use downloaded and bundled fonts when exporting
    #[arg(long, global = true, env = "OG_STUDIO_NO_SYSTEM_FONTS")]
    pub no_system_fonts: bool,

    /// Alternative host serving the Google Fonts css2 API
    #[arg(long, global = true, env = "OG_STUDIO_FONTS_URL")]
    pub fonts_url: Option<Url>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create, inspect and edit templates
    #[command(subcommand)]
    Template(TemplateCommand),

    /// Edit the elements of a template
    Element {
        /// Template to edit
        #[arg(long)]
        template: TemplateId,
        /// Element action
        #[command(subcommand)]
        action: ElementCommand,
    },

    /// Edit the variables of a template
    Var {
        /// Template to edit
        #[arg(long)]
        template: TemplateId,
        /// Variable action
        #[command(subcommand)]
        action: VarCommand,
    },

    /// Manage the font registry
    #[command(subcommand)]
    Font(FontCommand),

    /// Show or change grid settings
    Grid {
        /// Snap positions and sizes to the grid
        #[arg(long)]
        enabled: Option<bool>,
        /// Grid cell size in pixels (8 to 96)
        #[arg(long)]
        size: Option<u32>,
        /// Draw the grid overlay in the editor
        #[arg(long)]
        show: Option<bool>,
    },

    /// Report placeholders that reference undefined variables
    Lint {
        /// Only check this template
        #[arg(long)]
        template: Option<TemplateId>,
    },

    /// Import a template from a JSON file
    Import {
        /// Path of the JSON file
        file: PathBuf,
    },

    /// Export a template as JSON, PNG or SVG
    #[command(subcommand)]
    Export(ExportCommand),
}

/// Template commands.
#[derive(Debug, Clone, Subcommand)]
pub enum TemplateCommand {
    /// Create a template
    New {
        /// Template name
        name: String,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },
    /// List templates
    List,
    /// Print a template as JSON
    Show {
        /// Template id
        id: TemplateId,
    },
    /// Delete a template
    Delete {
        /// Template id
        id: TemplateId,
    },
    /// Copy a template with fresh ids
    Duplicate {
        /// Template id
        id: TemplateId,
    },
    /// Change template metadata
    Update {
        /// Template id
        id: TemplateId,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// Preset name (Dark, Light, Blue, Purple, Green, Orange) or CSS background
        #[arg(long)]
        background: Option<String>,
    },
}

/// Element commands, scoped to the template given with `--template`.
#[derive(Debug, Clone, Subcommand)]
pub enum ElementCommand {
    /// Add an element with default content
    Add {
        /// text, image, badge or container
        kind: ElementKind,
    },
    /// List elements in draw order
    List,
    /// Delete an element
    Delete {
        /// Element id
        id: ElementId,
    },
    /// Copy an element, offset by 20px
    Duplicate {
        /// Element id
        id: ElementId,
    },
    /// Move an element to a position
    #[command(allow_negative_numbers = true)]
    Move {
        /// Element id
        id: ElementId,
        /// Left edge
        x: f32,
        /// Top edge
        y: f32,
    },
    /// Resize an element
    #[command(allow_negative_numbers = true)]
    Resize {
        /// Element id
        id: ElementId,
        /// Width
        width: f32,
        /// Height
        height: f32,
    },
    /// Drag an element by a screen-space delta
    #[command(allow_negative_numbers = true)]
    Drag {
        /// Element id
        id: ElementId,
        /// Horizontal delta
        dx: f32,
        /// Vertical delta
        dy: f32,
    },
    /// Move an element one step up or down the stack
    Reorder {
        /// Element id
        id: ElementId,
        /// up or down
        direction: Direction,
    },
    /// Apply a JSON patch, e.g. '{"content": {"type": "text", "text": "Hi"}}'
    Update {
        /// Element id
        id: ElementId,
        /// Patch document
        patch: String,
    },
}

/// Variable commands, scoped to the template given with `--template`.
#[derive(Debug, Clone, Subcommand)]
pub enum VarCommand {
    /// Define a variable
    Add {
        /// Key used as {{key}}
        key: String,
        /// Display label (defaults to the key)
        #[arg(long)]
        label: Option<String>,
        /// Default value
        #[arg(long, default_value = "")]
        default: String,
        /// Help text
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a variable
    Remove {
        /// Variable key
        key: String,
    },
    /// Change a variable's metadata
    Update {
        /// Variable key
        key: String,
        /// New label
        #[arg(long)]
        label: Option<String>,
        /// New default value
        #[arg(long)]
        default: Option<String>,
        /// New help text
        #[arg(long)]
        description: Option<String>,
    },
}

/// Font commands.
#[derive(Debug, Clone, Subcommand)]
pub enum FontCommand {
    /// List known font families
    List,
    /// Fetch a Google font and register it
    Add {
        /// Family name, e.g. "Open Sans"
        family: String,
        /// Weights to fetch
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_WEIGHTS)]
        weights: Vec<u16>,
    },
    /// Fetch every registered Google font that is not on disk yet
    Reload,
}

/// Export commands.
#[derive(Debug, Clone, Subcommand)]
pub enum ExportCommand {
    /// Write the template as pretty-printed JSON
    Json {
        /// Template id
        id: TemplateId,
        /// Output path (defaults to <template-name>.json)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Render the template to PNG
    Png {
        /// Template id
        id: TemplateId,
        /// Output path (defaults to <template-name>.png)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Variable value for this export, as key=value
        #[arg(long = "var", value_parser = parse_key_value)]
        vars: Vec<(String, String)>,
    },
    /// Render the template to SVG
    Svg {
        /// Template id
        id: TemplateId,
        /// Output path (defaults to <template-name>.svg)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Variable value for this export, as key=value
        #[arg(long = "var", value_parser = parse_key_value)]
        vars: Vec<(String, String)>,
    },
}

fn parse_key_value(input: &str) -> Result<(String, String), String> {
    input
        .split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got {input:?}"))
}

/// Studio configuration.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Directory holding the editor state and downloaded fonts.
    pub data_dir: PathBuf,
    /// Output pixels per canvas pixel for PNG export.
    pub pixel_ratio: f32,
    /// Base directory for relative image paths.
    pub asset_dir: Option<PathBuf>,
    /// Whether installed system fonts are used when exporting.
    pub load_system_fonts: bool,
    /// Alternative Google Fonts host.
    pub fonts_url: Option<Url>,
}

impl StudioConfig {
    /// Create a configuration with default settings for `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            pixel_ratio: DEFAULT_PIXEL_RATIO,
            asset_dir: None,
            load_system_fonts: true,
            fonts_url: None,
        }
    }

    /// Directory where downloaded font faces are stored.
    #[must_use]
    pub fn fonts_dir(&self) -> PathBuf {
        self.data_dir.join("fonts")
    }

    /// Export settings derived from this configuration.
    #[must_use]
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            font_dirs: vec![self.fonts_dir()],
            load_system_fonts: self.load_system_fonts,
            asset_root: self.asset_dir.clone(),
            ..ExportConfig::default()
        }
        .with_pixel_ratio(self.pixel_ratio)
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self::new(".og-studio")
    }
}

impl From<&CliArgs> for StudioConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            data_dir: args.data_dir.clone(),
            pixel_ratio: args.pixel_ratio,
            asset_dir: args.asset_dir.clone(),
            load_system_fonts: !args.no_system_fonts,
            fonts_url: args.fonts_url.clone(),
        }
    }
}
