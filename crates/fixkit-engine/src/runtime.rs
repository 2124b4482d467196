use std::sync::Arc;

use dashmap::DashMap;
use fixkit_plugins::PluginDescriptor;
use fixkit_security::{CommandScanner, RuleSet};
use tracing::debug;

use crate::controller::TaskController;
use crate::flatpak::FlatpakToggle;
use crate::gate::TaskGate;
use crate::queue::CommandQueue;
use crate::spawn::ProcessSpawner;
use crate::status::StatusResolver;
use crate::traits::{CommandRunner, ConfirmationPrompt, HostWindow, Notifier, TaskView};

/// Owns the execution pipeline and hands out per-plugin controllers.
///
/// One engine per process. Status probes run on the direct spawner;
/// everything a task cycle executes goes through the shared queue, so at
/// most one plugin command is in flight at a time.
pub struct Engine {
    gate: Arc<TaskGate>,
    queue: Arc<CommandQueue>,
    resolver: Arc<StatusResolver>,
    flatpak: Arc<FlatpakToggle>,
    notifier: Arc<dyn Notifier>,
    host: Arc<dyn HostWindow>,
    controllers: DashMap<String, Arc<TaskController>>,
}

impl Engine {
    /// Wire the pipeline from a compiled rule set and the UI-boundary
    /// implementations. Must run inside a tokio runtime; the queue worker
    /// starts immediately.
    pub fn new(
        rules: &RuleSet,
        prompt: Arc<dyn ConfirmationPrompt>,
        notifier: Arc<dyn Notifier>,
        host: Arc<dyn HostWindow>,
    ) -> Self {
        let spawner: Arc<dyn CommandRunner> = Arc::new(ProcessSpawner::default());
        let queue = Arc::new(CommandQueue::new(spawner.clone()));
        let gate = Arc::new(TaskGate::new(CommandScanner::new(rules), prompt.clone()));
        let resolver = Arc::new(StatusResolver::new(gate.clone(), spawner.clone()));
        let flatpak = Arc::new(FlatpakToggle::new(spawner, prompt, notifier.clone()));

        Self {
            gate,
            queue,
            resolver,
            flatpak,
            notifier,
            host,
            controllers: DashMap::new(),
        }
    }

    /// The controller for a plugin, created on first request. The view
    /// handed in on later calls for the same plugin is ignored.
    pub fn controller(
        &self,
        plugin: Arc<PluginDescriptor>,
        view: Arc<dyn TaskView>,
    ) -> Arc<TaskController> {
        self.controllers
            .entry(plugin.key())
            .or_insert_with(|| {
                debug!("building task controller for {}", plugin.key());
                Arc::new(TaskController::new(
                    plugin.clone(),
                    self.resolver.clone(),
                    self.gate.clone(),
                    self.queue.clone(),
                    view,
                    self.notifier.clone(),
                    self.host.clone(),
                ))
            })
            .clone()
    }

    pub fn queue(&self) -> &Arc<CommandQueue> {
        &self.queue
    }

    pub fn resolver(&self) -> &Arc<StatusResolver> {
        &self.resolver
    }

    pub fn flatpak(&self) -> &Arc<FlatpakToggle> {
        &self.flatpak
    }
}
