//! Configuration handling for the readstack CLI
//!
//! Supports loading configuration from readstack.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use readstack_core::{DetailThresholds, LayoutParams};
use readstack_render::Theme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "readstack.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub detail: DetailThresholds,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Minimum pixel gap between templates in one stack
    #[serde(default = "default_spacing_px")]
    pub spacing_px: f64,

    /// Minimum gap between templates in one stack, in bases
    #[serde(default = "default_spacing_bp")]
    pub spacing_bp: f64,

    #[serde(default = "default_max_row_height")]
    pub max_row_height: u32,

    #[serde(default = "default_min_readable_row_height")]
    pub min_readable_row_height: u32,

    /// Canvas height the row sizer aims for
    #[serde(default = "default_canvas_height_budget")]
    pub canvas_height_budget: u32,

    #[serde(default = "default_min_insertion_px")]
    pub min_insertion_px: f64,

    #[serde(default = "default_max_selectable_templates")]
    pub max_selectable_templates: usize,

    #[serde(default = "default_message_row_height")]
    pub message_row_height: u32,

    /// Record cap per request
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Group mates into templates by default
    #[serde(default)]
    pub paired: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Default pixel width of each region
    #[serde(default = "default_width")]
    pub width: u32,

    /// Colour for forward strand reads
    #[serde(default = "default_forward_color")]
    pub forward_color: String,

    /// Colour for reverse strand reads
    #[serde(default = "default_reverse_color")]
    pub reverse_color: String,

    #[serde(default = "default_background_color")]
    pub background_color: String,
}

// Default value functions
fn default_spacing_px() -> f64 { LayoutParams::default().spacing_px }
fn default_spacing_bp() -> f64 { LayoutParams::default().spacing_bp }
fn default_max_row_height() -> u32 { LayoutParams::default().max_row_height }
fn default_min_readable_row_height() -> u32 { LayoutParams::default().min_readable_row_height }
fn default_canvas_height_budget() -> u32 { LayoutParams::default().canvas_height_budget }
fn default_min_insertion_px() -> f64 { LayoutParams::default().min_insertion_px }
fn default_max_selectable_templates() -> usize { LayoutParams::default().max_selectable_templates }
fn default_message_row_height() -> u32 { LayoutParams::default().message_row_height }
fn default_max_records() -> usize { readstack_core::request::DEFAULT_MAX_RECORDS }
fn default_width() -> u32 { 1000 }
fn default_forward_color() -> String { "#2a6fef".to_string() }
fn default_reverse_color() -> String { "#e53935".to_string() }
fn default_background_color() -> String { "#ffffff".to_string() }

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spacing_px: default_spacing_px(),
            spacing_bp: default_spacing_bp(),
            max_row_height: default_max_row_height(),
            min_readable_row_height: default_min_readable_row_height(),
            canvas_height_budget: default_canvas_height_budget(),
            min_insertion_px: default_min_insertion_px(),
            max_selectable_templates: default_max_selectable_templates(),
            message_row_height: default_message_row_height(),
            max_records: default_max_records(),
            paired: false,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            forward_color: default_forward_color(),
            reverse_color: default_reverse_color(),
            background_color: default_background_color(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default()).context("Failed to serialize default configuration")
    }

    /// Layout tunables for a request
    pub fn layout_params(&self) -> LayoutParams {
        let l = &self.layout;
        LayoutParams {
            spacing_px: l.spacing_px,
            spacing_bp: l.spacing_bp,
            max_row_height: l.max_row_height,
            min_readable_row_height: l.min_readable_row_height,
            canvas_height_budget: l.canvas_height_budget,
            min_insertion_px: l.min_insertion_px,
            max_selectable_templates: l.max_selectable_templates,
            message_row_height: l.message_row_height,
            detail: self.detail.clone(),
        }
    }

    pub fn theme(&self) -> Result<Theme> {
        let r = &self.render;
        Theme::from_hex(&r.forward_color, &r.reverse_color, &r.background_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.layout.max_row_height, 15);
        assert_eq!(config.render.width, 1000);
        assert_eq!(config.render.forward_color, "#2a6fef");
        assert_eq!(config.layout_params(), LayoutParams::default());
    }

    #[test]
    fn test_config_roundtrip() -> Result<()> {
        let mut config = Config::default();
        config.layout.max_records = 250;
        config.detail.letters_min_nt_width = 9.0;
        let temp_file = NamedTempFile::new()?;

        config.save_to_file(temp_file.path())?;
        let loaded_config = Config::load_from_file(temp_file.path())?;

        assert_eq!(loaded_config.layout.max_records, 250);
        assert_eq!(loaded_config.detail.letters_min_nt_width, 9.0);
        assert_eq!(config.render.reverse_color, loaded_config.render.reverse_color);

        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        std::fs::write(temp_file.path(), "[render]\nwidth = 640\n\n[layout]\npaired = true\n")?;

        let config = Config::load(Some(temp_file.path()))?;
        assert_eq!(config.render.width, 640);
        assert!(config.layout.paired);
        assert_eq!(config.render.background_color, "#ffffff");
        assert_eq!(config.layout.spacing_px, 2.0);
        assert_eq!(config.detail.mismatch_min_nt_width, 1.0);

        Ok(())
    }

    #[test]
    fn test_example_toml_generation() -> Result<()> {
        let example = Config::example_toml()?;
        assert!(example.contains("[layout]"));
        assert!(example.contains("[detail]"));
        assert!(example.contains("[render]"));
        Ok(())
    }

    #[test]
    fn test_bad_colour_is_rejected() {
        let mut config = Config::default();
        config.render.background_color = "white".to_string();
        assert!(config.theme().is_err());
        assert!(Config::default().theme().is_ok());
    }
}
