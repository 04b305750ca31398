//! Configuration for the pocketwm scene core.
//!
//! The config is a KDL document decoded with knuffel. Every section is optional, an empty file
//! yields [`Config::default()`].

#[macro_use]
extern crate tracing;

use std::ffi::OsStr;
use std::path::Path;

use miette::{Context, IntoDiagnostic};

mod output;

pub use crate::output::{OutputConfig, OutputTransform, Outputs, Position};

pub const DEFAULT_BORDER_WIDTH: i32 = 4;
pub const DEFAULT_TITLEBAR_HEIGHT: i32 = 12;
pub const DEFAULT_OSK_NAMESPACE: &str = "osk";

#[derive(knuffel::Decode, Debug, Default, Clone, PartialEq)]
pub struct Config {
    #[knuffel(children(name = "output"))]
    pub outputs: Outputs,
    #[knuffel(child, default)]
    pub decorations: Decorations,
    /// Maximize parentless toplevels and keep them maximized.
    #[knuffel(child)]
    pub auto_maximize: bool,
    /// Shrink views that do not fit their output.
    #[knuffel(child)]
    pub scale_to_fit: bool,
    #[knuffel(child, unwrap(argument))]
    pub osk_namespace: Option<String>,
    #[knuffel(child, default)]
    pub debug: DebugConfig,
}

/// Server-side decoration metrics, in logical pixels.
#[derive(knuffel::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decorations {
    #[knuffel(child, unwrap(argument), default = DEFAULT_BORDER_WIDTH)]
    pub border_width: i32,
    #[knuffel(child, unwrap(argument), default = DEFAULT_TITLEBAR_HEIGHT)]
    pub titlebar_height: i32,
}

impl Default for Decorations {
    fn default() -> Self {
        Self {
            border_width: DEFAULT_BORDER_WIDTH,
            titlebar_height: DEFAULT_TITLEBAR_HEIGHT,
        }
    }
}

#[derive(knuffel::Decode, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DebugConfig {
    /// Repaint whole outputs every frame and tint the damaged area.
    #[knuffel(child)]
    pub damage_tracking: bool,
}

impl Config {
    pub fn parse(filename: &str, text: &str) -> Result<Self, knuffel::Error> {
        let _span = tracy_client::span!("Config::parse");
        knuffel::parse(filename, text)
    }

    pub fn load(path: &Path) -> miette::Result<Self> {
        let _span = tracy_client::span!("Config::load");

        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .with_context(|| format!("error reading {path:?}"))?;

        let filename = path
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or("config.kdl");
        let config = Self::parse(filename, &contents).context("error parsing")?;
        debug!("loaded config from {path:?}");

        Ok(config)
    }

    /// Namespace that identifies the on-screen keyboard layer surface.
    pub fn osk_namespace(&self) -> &str {
        self.osk_namespace.as_deref().unwrap_or(DEFAULT_OSK_NAMESPACE)
    }
}
