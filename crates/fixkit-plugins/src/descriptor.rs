use fixkit_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Describes one plugin: a labeled tweak backed by shell commands.
///
/// Parsed from the plugin directory's `metadata.json`. `name` and `path`
/// are not part of the manifest; the loader fills them in from the
/// directory the manifest was found in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub category: String,
    pub label: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub license: Option<LicenseField>,
    #[serde(default)]
    pub scripts: ActionSet,
    pub flatpak: Option<FlatpakRef>,

    #[serde(skip)]
    pub name: String,
    #[serde(skip)]
    pub path: PathBuf,
}

/// The action scripts a plugin may provide. All optional; a plugin with
/// none of them is a purely informational row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionSet {
    pub exec: Option<ActionScript>,
    pub undo: Option<ActionScript>,
    pub status: Option<ActionScript>,
    pub show: Option<ActionScript>,
}

/// A single action: a button label and the command behind it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionScript {
    #[serde(default)]
    pub label: String,
    pub command: Option<String>,
}

impl ActionScript {
    /// Whether this action can actually run. An empty command string
    /// counts as absent.
    pub fn has_command(&self) -> bool {
        self.command.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// License metadata: manifests write either a single string or a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LicenseField {
    One(String),
    Many(Vec<String>),
}

impl LicenseField {
    pub fn summary(&self) -> String {
        match self {
            LicenseField::One(license) => license.clone(),
            LicenseField::Many(licenses) => licenses.join(", "),
        }
    }
}

/// Reference to a Flatpak application this plugin installs or removes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatpakRef {
    pub app_id: String,
}

impl PluginDescriptor {
    /// Check invariants the manifest schema cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.category.is_empty() {
            return Err(Error::Plugin("plugin category must not be empty".into()));
        }
        if self.label.is_empty() {
            return Err(Error::Plugin("plugin label must not be empty".into()));
        }
        if let Some(flatpak) = &self.flatpak {
            if flatpak.app_id.is_empty() {
                return Err(Error::Plugin("flatpak app_id must not be empty".into()));
            }
            // App ids end up inside engine-built flatpak command lines
            if !flatpak
                .app_id
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_')
            {
                return Err(Error::Plugin(format!(
                    "flatpak app_id '{}' contains invalid characters",
                    flatpak.app_id
                )));
            }
        }
        Ok(())
    }

    /// `category/name` key used for registry and controller lookups.
    pub fn key(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }
}
