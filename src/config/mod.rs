//! Configuration knobs (§6), loaded from an optional TOML file and
//! layered over built-in defaults the way the rest of the pack's config
//! loaders do: defaults first, file overlay second.

pub mod knobs;

pub use knobs::*;

use crate::error::{Error, Result};
use std::path::Path;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub cache: CacheConfig,
    pub database: DatabaseConfig,
    pub monitoring: MonitoringConfig,
    pub learning: LearningConfig,
    pub feedback: FeedbackConfig,
    pub evolution: EvolutionConfig,
    pub team: TeamConfig,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults only; used when no config file is present.
    pub fn defaults() -> CoreConfig {
        CoreConfig::default()
    }

    /// Load defaults, then overlay a TOML file if it exists.
    pub fn load(path: impl AsRef<Path>) -> Result<CoreConfig> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(CoreConfig::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let config: CoreConfig = toml::from_str(&text)?;
        Ok(config)
    }

    /// Default config search path: `~/.config/codeintel/config.toml`.
    pub fn default_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|d| d.join("codeintel").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = ConfigLoader::load("/nonexistent/path/config.toml").unwrap();
        assert_eq!(cfg.cache.strategy, CacheStrategy::Memory);
    }

    #[test]
    fn toml_overlay_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\nstrategy = \"hybrid\"\n").unwrap();
        let cfg = ConfigLoader::load(&path).unwrap();
        assert_eq!(cfg.cache.strategy, CacheStrategy::Hybrid);
    }
}
