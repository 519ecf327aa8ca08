//! Configuration for rendering, number display and upstream deadlines.
//!
//! Loaded from a JSON file; every key is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::table::NumberFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

/// Largest accepted width or height, in pixels.
pub const MAX_DIMENSION: u32 = 10_000;

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}

impl RenderOptions {
    /// Reject sizes that cannot produce an image.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if value == 0 || value > MAX_DIMENSION {
                anyhow::bail!("render {name} must be between 1 and {MAX_DIMENSION}, got {value}");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaperConfig {
    #[serde(default)]
    pub render: RenderOptions,

    #[serde(default)]
    pub number_format: NumberFormat,

    /// Deadline for each prompt-view call, in seconds.
    #[serde(default = "default_prompt_timeout")]
    pub prompt_timeout_secs: u64,

    /// Deadline for running the generated query, in seconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    /// Model hosting the chat and summary prompt views.
    #[serde(default = "default_prompt_model")]
    pub prompt_model: String,
}

fn default_prompt_timeout() -> u64 { 15 }
fn default_query_timeout() -> u64 { 60 }

fn default_prompt_model() -> String {
    "chatter".to_string()
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            number_format: NumberFormat::default(),
            prompt_timeout_secs: default_prompt_timeout(),
            query_timeout_secs: default_query_timeout(),
            prompt_model: default_prompt_model(),
        }
    }
}

impl ShaperConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.render.validate()?;
        Ok(config)
    }

    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ShaperConfig::parse("{}").unwrap();
        assert_eq!(config, ShaperConfig::default());
        assert_eq!(config.prompt_timeout(), Duration::from_secs(15));
        assert_eq!(config.query_timeout(), Duration::from_secs(60));
        assert_eq!(config.render.width, 800);
    }

    #[test]
    fn test_partial_config() {
        let config = ShaperConfig::parse(
            r#"{"render": {"type": "svg", "width": 400},
                "number_format": {"grouping": ".", "decimal": ","},
                "prompt_timeout_secs": 5}"#,
        )
        .unwrap();
        assert_eq!(config.render.format, OutputFormat::Svg);
        assert_eq!(config.render.width, 400);
        assert_eq!(config.render.height, 600);
        assert_eq!(config.number_format.format(1234.5), "1.234,5");
        assert_eq!(config.prompt_timeout_secs, 5);
        assert_eq!(config.query_timeout_secs, 60);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(ShaperConfig::parse(r#"{"render": {"width": 0}}"#).is_err());
    }

    #[test]
    fn test_oversized_render_rejected() {
        let huge = RenderOptions {
            width: 40_000,
            height: 40_000,
            ..RenderOptions::default()
        };
        let err = huge.validate().unwrap_err();
        assert!(err.to_string().contains("width"));
        assert!(ShaperConfig::parse(r#"{"render": {"height": 40000}}"#).is_err());
        assert!(RenderOptions::default().validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ShaperConfig::load_from_file(Path::new("/nonexistent/shaper.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
