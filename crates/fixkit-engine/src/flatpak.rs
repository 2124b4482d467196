use std::sync::Arc;

use fixkit_common::{ConfirmRequest, Notification};
use fixkit_plugins::PluginDescriptor;
use tracing::{debug, warn};

use crate::traits::{CommandRunner, ConfirmationPrompt, Notifier};

/// Which way the next flatpak toggle goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatpakDirection {
    Install,
    Uninstall,
}

impl FlatpakDirection {
    pub fn verb(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Uninstall => "uninstall",
        }
    }

    pub fn verb_past(self) -> &'static str {
        match self {
            Self::Install => "installed",
            Self::Uninstall => "uninstalled",
        }
    }
}

/// Installs and removes a plugin's flatpak app in the user installation.
///
/// Command lines here are engine-built from the validated app id, never
/// plugin-supplied, so they run on the direct spawner and skip both the
/// scanner and the queue.
pub struct FlatpakToggle {
    runner: Arc<dyn CommandRunner>,
    prompt: Arc<dyn ConfirmationPrompt>,
    notifier: Arc<dyn Notifier>,
}

impl FlatpakToggle {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        prompt: Arc<dyn ConfirmationPrompt>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            runner,
            prompt,
            notifier,
        }
    }

    /// Probe the user installation and report the next toggle direction.
    /// `None` when the plugin carries no flatpak ref.
    pub async fn probe(&self, plugin: &PluginDescriptor) -> Option<FlatpakDirection> {
        let flatpak = plugin.flatpak.as_ref()?;
        let command = format!("flatpak info --user {}", flatpak.app_id);
        let outcome = self.runner.run(None, &command).await;
        debug!(
            "flatpak probe for {} exited {}",
            flatpak.app_id, outcome.status
        );

        if outcome.status == 0 {
            Some(FlatpakDirection::Uninstall)
        } else {
            Some(FlatpakDirection::Install)
        }
    }

    /// Run the toggle in the given direction. Success notifies and returns
    /// true so the caller can flip its button; failure raises an alert.
    pub async fn toggle(&self, plugin: &PluginDescriptor, direction: FlatpakDirection) -> bool {
        let Some(flatpak) = plugin.flatpak.as_ref() else {
            return false;
        };

        let command = format!("flatpak {} --user -y {}", direction.verb(), flatpak.app_id);
        let outcome = self.runner.run(None, &command).await;

        if outcome.ok() {
            self.notifier.notify(Notification::normal(
                "Task completed!",
                format!(
                    "{} ({}) successfully.",
                    plugin.label,
                    direction.verb_past()
                ),
            ));
            true
        } else {
            warn!(
                "flatpak {} failed for {} with status {}",
                direction.verb(),
                flatpak.app_id,
                outcome.status
            );
            self.prompt
                .alert(&ConfirmRequest::other(format!(
                    "Failed to {} {}",
                    direction.verb(),
                    flatpak.app_id
                )))
                .await;
            false
        }
    }
}
