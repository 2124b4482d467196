use std::path::{Path, PathBuf};

use fixkit_common::{Error, Result};
use fixkit_security::RuleSet;
use tracing::info;

use crate::model::AppConfig;

pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Result<Self> {
        let config_dir = Self::default_config_dir();
        Ok(Self { config_dir })
    }

    pub fn default_config_dir() -> PathBuf {
        let home_config = dirs::home_dir().map(|h| h.join(".fixkit"));
        let xdg_config = dirs::config_dir().map(|c| c.join("fixkit"));

        match (xdg_config, home_config) {
            (Some(xdg), Some(home)) => {
                // If XDG exists, prefer it.
                if xdg.exists() {
                    xdg
                }
                // If Home exists (and XDG doesn't), use Home (migration/legacy case).
                else if home.exists() {
                    home
                }
                // If neither exists, prefer XDG for new installs.
                else {
                    xdg
                }
            }
            (Some(xdg), None) => xdg,
            (None, Some(home)) => home,
            (None, None) => PathBuf::from(".fixkit"),
        }
    }

    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns true if a config file (YAML or TOML) exists on disk.
    pub fn config_file_exists(&self) -> bool {
        self.config_dir.join("config.yml").exists() || self.config_dir.join("config.toml").exists()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let yaml_path = self.config_dir.join("config.yml");
        let toml_path = self.config_dir.join("config.toml");

        if yaml_path.exists() {
            info!("loading config from {}", yaml_path.display());
            let contents = std::fs::read_to_string(&yaml_path)?;
            serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("failed to parse YAML config: {e}")))
        } else if toml_path.exists() {
            info!("loading config from {}", toml_path.display());
            let contents = std::fs::read_to_string(&toml_path)?;
            toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("failed to parse TOML config: {e}")))
        } else {
            info!("no config file found, using defaults");
            Ok(AppConfig::default())
        }
    }

    /// Load the packaged malicious rules from `<config dir>/rules.json`.
    /// Returns an empty set if the file is missing or unreadable.
    pub fn load_rules_json(&self) -> RuleSet {
        let rules_path = self.config_dir.join("rules.json");
        if !rules_path.exists() {
            return RuleSet::default();
        }

        let contents = match std::fs::read_to_string(&rules_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("failed to read rules.json: {e}");
                return RuleSet::default();
            }
        };

        #[derive(serde::Deserialize)]
        struct RulesFile {
            #[serde(default)]
            malicious: RuleSet,
        }

        match serde_json::from_str::<RulesFile>(&contents) {
            Ok(file) => {
                info!("loaded {} scan rule(s) from rules.json", file.malicious.len());
                file.malicious
            }
            Err(e) => {
                tracing::warn!("failed to parse rules.json: {e}");
                RuleSet::default()
            }
        }
    }

    /// Merge user rules from the main config with the packaged rules.
    /// Rule order is scan priority, so the user's rules come first.
    pub fn merged_rules(&self, config: &AppConfig) -> RuleSet {
        let mut merged = config.malicious.clone();
        merged.extend(self.load_rules_json());
        merged
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }
}
