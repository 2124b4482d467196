use fixkit_security::RuleSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-defined malicious command rules. These take priority over the
    /// packaged rules from `rules.json`.
    #[serde(default)]
    pub malicious: RuleSet,

    /// Directories scanned for `<name>.plugin/` entries, in shadowing
    /// order. Empty means the built-in locations.
    #[serde(default)]
    pub plugin_dirs: Vec<PathBuf>,

    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            malicious: RuleSet::default(),
            plugin_dirs: Vec::new(),
            log_level: Some("info".to_string()),
        }
    }
}

impl AppConfig {
    /// The plugin directories to scan: configured ones if present,
    /// otherwise `./plugins` (system) and the user data directory.
    pub fn resolved_plugin_dirs(&self) -> Vec<PathBuf> {
        if !self.plugin_dirs.is_empty() {
            return self.plugin_dirs.clone();
        }
        default_plugin_dirs()
    }
}

pub fn default_plugin_dirs() -> Vec<PathBuf> {
    let mut plugin_dirs = vec![PathBuf::from("plugins")];
    if let Some(data) = dirs::data_dir() {
        plugin_dirs.push(data.join("fixkit").join("plugins"));
    }
    plugin_dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert!(config.malicious.is_empty());
        assert_eq!(config.log_level.as_deref(), Some("info"));
        assert!(!config.resolved_plugin_dirs().is_empty());
    }

    #[test]
    fn configured_plugin_dirs_win() {
        let config = AppConfig {
            plugin_dirs: vec![PathBuf::from("/opt/fixkit/plugins")],
            ..Default::default()
        };
        assert_eq!(
            config.resolved_plugin_dirs(),
            vec![PathBuf::from("/opt/fixkit/plugins")]
        );
    }
}
