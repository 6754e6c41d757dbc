//! Player configuration loaded from TOML

use harbor_core::{HarborError, Result};
use harbor_render::BloomParameters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Harbor".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub window: WindowConfig,
    pub bloom: BloomParameters,
    /// Directory holding `objects/` and `textures/`
    pub resources: PathBuf,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            bloom: BloomParameters::default(),
            resources: PathBuf::from("resources"),
        }
    }
}

impl PlayerConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(HarborError::ValidationError(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        self.bloom.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_demo() {
        let config = PlayerConfig::default();
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(config.bloom.blur_iterations, 10);
        assert_eq!(config.resources, PathBuf::from("resources"));
    }

    #[test]
    fn test_partial_file() {
        let config = PlayerConfig::from_toml(
            r#"
            resources = "assets"

            [bloom]
            exposure = 0.8
            bloom_enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.resources, PathBuf::from("assets"));
        assert_eq!(config.bloom.exposure, 0.8);
        assert!(!config.bloom.bloom_enabled);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(PlayerConfig::from_toml("[window]\nwidth = 0").is_err());
        assert!(PlayerConfig::from_toml("[bloom]\nexposure = -1.0").is_err());
        assert!(matches!(
            PlayerConfig::from_toml("[window]\nwidth = \"wide\""),
            Err(HarborError::TomlParseError(_))
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlayerConfig::load(&dir.path().join("harbor.toml")).unwrap();
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window]\ntitle = \"Night Harbor\"\nwidth = 1280").unwrap();
        let config = PlayerConfig::load(file.path()).unwrap();
        assert_eq!(config.window.title, "Night Harbor");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 600);
    }
}
