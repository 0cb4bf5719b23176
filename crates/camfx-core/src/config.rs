use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::filter::{FilterCode, FilterSettings, TextureTarget};

/// Render-session configuration.
///
/// Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Filters the registry compiles at startup.
    #[serde(default = "default_filters")]
    pub filters: Vec<FilterCode>,

    /// Filter active on the first tick, with its settings.
    #[serde(default)]
    pub initial: FilterSettings,

    /// RGBA clear colour applied before every draw.
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],

    /// Binding target of the producer's texture.
    #[serde(default)]
    pub texture_target: TextureTarget,

    /// Requested GLES major version (2 or 3).
    #[serde(default = "default_gles_major")]
    pub gles_major: u8,
}

fn default_filters() -> Vec<FilterCode> {
    FilterCode::ALL.to_vec()
}
fn default_clear_color() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}
fn default_gles_major() -> u8 {
    2
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            filters: default_filters(),
            initial: FilterSettings::default(),
            clear_color: default_clear_color(),
            texture_target: TextureTarget::default(),
            gles_major: default_gles_major(),
        }
    }
}

impl RendererConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.filters.is_empty() {
            return Err(ConfigError::Invalid("filters must not be empty".into()));
        }
        if !self.filters.contains(&self.initial.code()) {
            return Err(ConfigError::Invalid(format!(
                "initial filter `{}` is not in the enabled filter list",
                self.initial.code()
            )));
        }
        if !matches!(self.gles_major, 2 | 3) {
            return Err(ConfigError::Invalid(format!(
                "gles_major must be 2 or 3, got {}",
                self.gles_major
            )));
        }
        Ok(())
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: RendererConfig = serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: "<inline>".into(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: RendererConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }
}
