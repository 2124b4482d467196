use crate::descriptor::PluginDescriptor;
use crate::registry::PluginRegistry;
use fixkit_common::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Discovers plugins from a list of directories. Each plugin lives in a
/// `<name>.plugin/` directory containing a `metadata.json` manifest.
/// Later directories shadow earlier ones, so list the system directory
/// first and the user directory last.
pub struct PluginLoader {
    plugin_dirs: Vec<PathBuf>,
}

impl PluginLoader {
    pub fn new(plugin_dirs: Vec<PathBuf>) -> Self {
        Self { plugin_dirs }
    }

    /// Scan every configured directory and return the merged registry.
    /// Invalid manifests are warned and skipped; a missing or unreadable
    /// directory is not an error.
    pub fn discover(&self) -> Result<PluginRegistry> {
        let mut registry = PluginRegistry::new();

        for dir in &self.plugin_dirs {
            if !dir.exists() {
                continue;
            }

            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("cannot read plugin directory {}: {e}", dir.display());
                    continue;
                }
            };

            for entry in entries {
                let entry = entry?;
                let path = entry.path();

                if !path.is_dir() {
                    continue;
                }
                let is_plugin_dir = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".plugin"));
                if !is_plugin_dir {
                    continue;
                }

                match load_descriptor(&path) {
                    Ok(descriptor) => {
                        info!(
                            "discovered plugin {}::{}",
                            descriptor.category, descriptor.label
                        );
                        registry.insert(descriptor)?;
                    }
                    Err(e) => {
                        warn!("skipping invalid plugin at {}: {e}", path.display());
                    }
                }
            }
        }

        Ok(registry)
    }
}

fn load_descriptor(plugin_dir: &Path) -> Result<PluginDescriptor> {
    let content = std::fs::read_to_string(plugin_dir.join("metadata.json"))?;
    let mut descriptor: PluginDescriptor = serde_json::from_str(&content)?;
    descriptor.validate()?;

    descriptor.name = plugin_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.trim_end_matches(".plugin").to_string())
        .unwrap_or_default();
    descriptor.path = plugin_dir.to_path_buf();

    Ok(descriptor)
}
