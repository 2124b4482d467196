use fixkit_plugins::{ActionScript, PluginDescriptor};
use std::sync::Arc;
use tracing::debug;

use crate::gate::TaskGate;
use crate::traits::CommandRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Apply the plugin's forward effect.
    Exec,
    /// Roll the effect back.
    Undo,
}

/// What activating the plugin would do right now.
#[derive(Debug, Clone)]
pub struct ResolvedAction {
    pub kind: ActionKind,
    pub script: Option<ActionScript>,
    /// Exit status of the status probe; 1 when the plugin has no probe.
    pub probe_status: i32,
}

impl ResolvedAction {
    pub fn is_runnable(&self) -> bool {
        self.script.as_ref().is_some_and(ActionScript::has_command)
    }

    pub fn command(&self) -> Option<&str> {
        self.script
            .as_ref()
            .and_then(|script| script.command.as_deref())
            .filter(|command| !command.is_empty())
    }

    pub fn label(&self) -> Option<&str> {
        self.script.as_ref().map(|script| script.label.as_str())
    }
}

/// Decides between a plugin's `exec` and `undo` actions by running its
/// status probe. Probes are defined to be read-only, so they skip the
/// queue and run directly, but they are still scanned and gated like any
/// other plugin command.
pub struct StatusResolver {
    gate: Arc<TaskGate>,
    probe_runner: Arc<dyn CommandRunner>,
}

impl StatusResolver {
    pub fn new(gate: Arc<TaskGate>, probe_runner: Arc<dyn CommandRunner>) -> Self {
        Self { gate, probe_runner }
    }

    /// Probe exit 0 means the effect is already applied, so the next
    /// action is `undo`; any other exit (or no probe at all) selects
    /// `exec`.
    pub async fn resolve(&self, plugin: &PluginDescriptor) -> ResolvedAction {
        let scripts = &plugin.scripts;

        if let Some(status) = &scripts.status
            && let Some(probe) = status.command.as_deref()
            && !probe.is_empty()
        {
            let outcome = self
                .gate
                .run_gated(plugin, probe, self.probe_runner.as_ref())
                .await;
            debug!(
                "status probe for {}::{} exited {}",
                plugin.category, plugin.label, outcome.status
            );

            if outcome.status == 0 {
                ResolvedAction {
                    kind: ActionKind::Undo,
                    script: scripts.undo.clone(),
                    probe_status: 0,
                }
            } else {
                ResolvedAction {
                    kind: ActionKind::Exec,
                    script: scripts.exec.clone(),
                    probe_status: outcome.status,
                }
            }
        } else {
            ResolvedAction {
                kind: ActionKind::Exec,
                script: scripts.exec.clone(),
                probe_status: 1,
            }
        }
    }

    /// Run the plugin's `show` probe; exit 0 keeps the plugin visible.
    /// Plugins without one are always visible.
    pub async fn resolve_visible(&self, plugin: &PluginDescriptor) -> bool {
        if let Some(show) = &plugin.scripts.show
            && let Some(probe) = show.command.as_deref()
            && !probe.is_empty()
        {
            let outcome = self
                .gate
                .run_gated(plugin, probe, self.probe_runner.as_ref())
                .await;
            outcome.status == 0
        } else {
            true
        }
    }
}
