//! `lab2dae.toml` configuration
//!
//! ```toml
//! [space]
//! up_axis = "y"        # "y" or "z"
//! unit_scale = 1.0
//! flip_winding = false
//!
//! [collada]
//! author = "Art Team"
//! authoring_tool = "lab-export"
//! ```
//!
//! Every key is optional; command-line flags override file values.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

use crate::convert::ConvertOptions;
use crate::space::UpAxis;

/// Default config file name looked up next to the working directory
pub const CONFIG_FILE_NAME: &str = "lab2dae.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub space: SpaceSection,
    #[serde(default)]
    pub collada: ColladaSection,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpaceSection {
    pub up_axis: Option<UpAxis>,
    pub unit_scale: Option<f32>,
    pub flip_winding: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColladaSection {
    pub author: Option<String>,
    pub authoring_tool: Option<String>,
}

/// Load and parse a config file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {:?}", path))?;
    parse_config(&content).with_context(|| format!("Invalid config: {:?}", path))
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse TOML")?;
    Ok(config)
}

/// `path` if given, else `lab2dae.toml` in the working directory when present
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None => {
            let default = Path::new(CONFIG_FILE_NAME);
            if default.is_file() {
                tracing::debug!("Using {:?}", default);
                load_config(default)
            } else {
                Ok(Config::default())
            }
        }
    }
}

impl Config {
    /// Layer `overrides` on top of the file values and validate the result
    pub fn resolve(&self, overrides: &SpaceSection) -> Result<ConvertOptions> {
        let mut options = ConvertOptions::default();

        let space = &mut options.space;
        if let Some(up_axis) = overrides.up_axis.or(self.space.up_axis) {
            space.up_axis = up_axis;
        }
        if let Some(unit_scale) = overrides.unit_scale.or(self.space.unit_scale) {
            space.unit_scale = unit_scale;
        }
        if let Some(flip_winding) = overrides.flip_winding.or(self.space.flip_winding) {
            space.flip_winding = flip_winding;
        }
        if !(space.unit_scale.is_finite() && space.unit_scale > 0.0) {
            bail!(
                "unit_scale must be a positive finite number, got {}",
                space.unit_scale
            );
        }

        if let Some(author) = &self.collada.author {
            options.collada.author = author.clone();
        }
        if let Some(tool) = &self.collada.authoring_tool {
            options.collada.authoring_tool = tool.clone();
        }

        Ok(options)
    }
}
