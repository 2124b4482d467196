use std::sync::{Arc, Mutex};
use std::time::Duration;

use fixkit_common::{ExecError, ExecOutcome, Notification, stable_notification_id};
use fixkit_plugins::PluginDescriptor;
use tracing::debug;

use crate::gate::TaskGate;
use crate::queue::CommandQueue;
use crate::status::{ResolvedAction, StatusResolver};
use crate::traits::{Accent, HostWindow, Notifier, TaskView};

/// How long the Finished!/Error! label stays up before the button
/// returns to its resolved state.
const SETTLED_DISPLAY: Duration = Duration::from_millis(1000);

/// Lifecycle of one plugin's action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    /// Running the status probe to pick between exec and undo.
    Resolving,
    /// The chosen command is queued or executing.
    Running,
    /// Outcome delivered, label frozen on Finished!/Error!.
    Settled,
}

/// Drives one plugin's task cycle end to end: resolve the action, run it
/// through the gate and the queue, notify, then restore the button.
///
/// One controller per plugin. The state guard makes double activations
/// no-ops on top of the disabled button, so a queued-up click storm
/// cannot start overlapping cycles.
pub struct TaskController {
    plugin: Arc<PluginDescriptor>,
    resolver: Arc<StatusResolver>,
    gate: Arc<TaskGate>,
    queue: Arc<CommandQueue>,
    view: Arc<dyn TaskView>,
    notifier: Arc<dyn Notifier>,
    host: Arc<dyn HostWindow>,
    state: Mutex<TaskState>,
}

impl TaskController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        plugin: Arc<PluginDescriptor>,
        resolver: Arc<StatusResolver>,
        gate: Arc<TaskGate>,
        queue: Arc<CommandQueue>,
        view: Arc<dyn TaskView>,
        notifier: Arc<dyn Notifier>,
        host: Arc<dyn HostWindow>,
    ) -> Self {
        Self {
            plugin,
            resolver,
            gate,
            queue,
            view,
            notifier,
            host,
            state: Mutex::new(TaskState::Idle),
        }
    }

    pub fn plugin(&self) -> &PluginDescriptor {
        &self.plugin
    }

    pub fn state(&self) -> TaskState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, next: TaskState) {
        *self.state.lock().unwrap() = next;
    }

    /// Claim the idle slot. Returns false when a cycle is already in
    /// flight.
    fn begin(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if *state == TaskState::Idle {
            *state = TaskState::Resolving;
            true
        } else {
            false
        }
    }

    /// Fire the cycle from a button handler without waiting on it.
    pub fn trigger(self: &Arc<Self>) {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            controller.activate().await;
        });
    }

    /// One full activation cycle. Returns the settled outcome, or `None`
    /// when a cycle was already in flight and this activation was ignored.
    pub async fn activate(&self) -> Option<ExecOutcome> {
        if !self.begin() {
            debug!(
                "ignoring activation for {}::{} while a cycle is in flight",
                self.plugin.category, self.plugin.label
            );
            return None;
        }

        self.view.set_busy(true);
        self.view.set_label("Working...");
        self.view.set_accent(Accent::None);
        self.view.set_enabled(false);

        let action = self.resolver.resolve(&self.plugin).await;

        let outcome = match action.command() {
            Some(command) => {
                self.set_state(TaskState::Running);
                self.gate
                    .run_gated(&self.plugin, command, self.queue.as_ref())
                    .await
            }
            None => ExecOutcome::failed(ExecError::Spawn(
                "no runnable command for this action".into(),
            )),
        };

        self.set_state(TaskState::Settled);
        self.notifier
            .notify(self.outcome_notification(&action, &outcome));

        // A hidden window with a drained queue means the user already left;
        // skip the label updates and let the host shut down.
        if !self.host.is_visible() && self.queue.is_idle() {
            self.host.request_quit();
            self.set_state(TaskState::Idle);
            return Some(outcome);
        }

        self.view.set_busy(false);
        if outcome.ok() {
            self.view.set_label("Finished!");
        } else {
            self.view.set_label("Error!");
        }

        tokio::time::sleep(SETTLED_DISPLAY).await;
        self.refresh().await;

        Some(outcome)
    }

    /// Re-resolve the plugin and restore the button for the next cycle.
    /// Also sets the initial button state at startup.
    pub async fn refresh(&self) {
        let action = self.resolver.resolve(&self.plugin).await;

        self.view.set_label(action.label().unwrap_or_default());
        self.view.set_accent(if action.probe_status == 0 {
            Accent::Destructive
        } else {
            Accent::Suggested
        });
        self.view.set_enabled(action.is_runnable());

        self.set_state(TaskState::Idle);
    }

    fn outcome_notification(
        &self,
        action: &ResolvedAction,
        outcome: &ExecOutcome,
    ) -> Notification {
        let plugin = &self.plugin;
        let action_label = action.label().unwrap_or_default();

        let notification = if let Some(error) = &outcome.error {
            Notification::critical(
                "Task failed!",
                format!(
                    "{} ({}) failed with error: {}",
                    plugin.label, action_label, error
                ),
            )
        } else if outcome.status == 0 {
            Notification::normal(
                "Task completed!",
                format!("{} ({}) successfully completed.", plugin.label, action_label),
            )
        } else {
            Notification::critical(
                "Task failed!",
                format!(
                    "{} ({}) failed with exit code {}",
                    plugin.label, action_label, outcome.status
                ),
            )
        };

        notification.with_stable_id(stable_notification_id(&plugin.category, &plugin.label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fixkit_common::{ConfirmRequest, Severity};
    use fixkit_plugins::{ActionScript, ActionSet};
    use fixkit_security::{CommandScanner, RuleSet};
    use crate::traits::{CommandRunner, ConfirmationPrompt};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Semaphore;
    use tokio::sync::mpsc;

    struct MappedRunner {
        statuses: HashMap<String, i32>,
        calls: Mutex<Vec<String>>,
    }

    impl MappedRunner {
        fn new(statuses: &[(&str, i32)]) -> Arc<Self> {
            Arc::new(Self {
                statuses: statuses
                    .iter()
                    .map(|(command, status)| (command.to_string(), *status))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for MappedRunner {
        async fn run(&self, _workdir: Option<&Path>, command: &str) -> ExecOutcome {
            self.calls.lock().unwrap().push(command.to_string());
            ExecOutcome::exited(Some(7), *self.statuses.get(command).unwrap_or(&0))
        }
    }

    struct AcceptAllPrompt;

    #[async_trait]
    impl ConfirmationPrompt for AcceptAllPrompt {
        async fn confirm(&self, _request: &ConfirmRequest) -> bool {
            true
        }

        async fn alert(&self, _request: &ConfirmRequest) {}
    }

    #[derive(Default)]
    struct RecordingView {
        events: Mutex<Vec<String>>,
    }

    impl RecordingView {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl TaskView for RecordingView {
        fn set_busy(&self, busy: bool) {
            self.push(format!("busy:{busy}"));
        }

        fn set_label(&self, label: &str) {
            self.push(format!("label:{label}"));
        }

        fn set_accent(&self, accent: Accent) {
            self.push(format!("accent:{accent:?}"));
        }

        fn set_enabled(&self, enabled: bool) {
            self.push(format!("enabled:{enabled}"));
        }
    }

    #[derive(Default)]
    struct CollectingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    impl CollectingNotifier {
        fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Notifier for CollectingNotifier {
        fn notify(&self, notification: Notification) {
            self.sent.lock().unwrap().push(notification);
        }
    }

    struct StubHost {
        visible: bool,
        quit_requested: AtomicBool,
    }

    impl StubHost {
        fn visible() -> Arc<Self> {
            Arc::new(Self {
                visible: true,
                quit_requested: AtomicBool::new(false),
            })
        }

        fn hidden() -> Arc<Self> {
            Arc::new(Self {
                visible: false,
                quit_requested: AtomicBool::new(false),
            })
        }

        fn quit_requested(&self) -> bool {
            self.quit_requested.load(Ordering::SeqCst)
        }
    }

    impl HostWindow for StubHost {
        fn is_visible(&self) -> bool {
            self.visible
        }

        fn request_quit(&self) {
            self.quit_requested.store(true, Ordering::SeqCst);
        }
    }

    fn plugin_with(scripts: ActionSet) -> Arc<PluginDescriptor> {
        Arc::new(PluginDescriptor {
            category: "Tweaks".into(),
            label: "Better Fonts".into(),
            description: None,
            icon: None,
            license: None,
            scripts,
            flatpak: None,
            name: "betterfonts".into(),
            path: Default::default(),
        })
    }

    fn script(label: &str, command: Option<&str>) -> ActionScript {
        ActionScript {
            label: label.into(),
            command: command.map(str::to_string),
        }
    }

    fn build(
        scripts: ActionSet,
        runner: Arc<dyn CommandRunner>,
        host: Arc<StubHost>,
    ) -> (Arc<TaskController>, Arc<RecordingView>, Arc<CollectingNotifier>) {
        let gate = Arc::new(TaskGate::new(
            CommandScanner::new(&RuleSet::default()),
            Arc::new(AcceptAllPrompt),
        ));
        let queue = Arc::new(CommandQueue::new(runner.clone()));
        let resolver = Arc::new(StatusResolver::new(gate.clone(), runner));
        let view = Arc::new(RecordingView::default());
        let notifier = Arc::new(CollectingNotifier::default());
        let controller = Arc::new(TaskController::new(
            plugin_with(scripts),
            resolver,
            gate,
            queue,
            view.clone(),
            notifier.clone(),
            host,
        ));
        (controller, view, notifier)
    }

    fn installable() -> ActionSet {
        ActionSet {
            exec: Some(script("Install", Some("./install.sh"))),
            undo: Some(script("Remove", Some("./remove.sh"))),
            status: Some(script("", Some("check-state"))),
            show: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_cycle_notifies_and_restores_the_button() {
        let runner = MappedRunner::new(&[("check-state", 1), ("./install.sh", 0)]);
        let (controller, view, notifier) =
            build(installable(), runner.clone(), StubHost::visible());

        let outcome = controller.activate().await.expect("cycle ran");

        assert!(outcome.ok());
        assert_eq!(controller.state(), TaskState::Idle);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].summary, "Task completed!");
        assert_eq!(sent[0].body, "Better Fonts (Install) successfully completed.");
        assert_eq!(sent[0].severity, Severity::Normal);
        assert_eq!(
            sent[0].stable_id,
            Some(stable_notification_id("Tweaks", "Better Fonts"))
        );

        assert_eq!(
            view.events(),
            vec![
                "busy:true",
                "label:Working...",
                "accent:None",
                "enabled:false",
                "busy:false",
                "label:Finished!",
                "label:Install",
                "accent:Suggested",
                "enabled:true",
            ]
        );

        let runs = runner.calls();
        assert_eq!(
            runs.iter().filter(|command| *command == "./install.sh").count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failing_command_reports_its_exit_code() {
        let runner = MappedRunner::new(&[("check-state", 1), ("./install.sh", 3)]);
        let (controller, view, notifier) = build(installable(), runner, StubHost::visible());

        let outcome = controller.activate().await.expect("cycle ran");

        assert_eq!(outcome.status, 3);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].summary, "Task failed!");
        assert_eq!(sent[0].body, "Better Fonts (Install) failed with exit code 3");
        assert_eq!(sent[0].severity, Severity::Critical);
        assert!(view.events().contains(&"label:Error!".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn action_without_command_settles_as_failure() {
        let runner = MappedRunner::new(&[]);
        let scripts = ActionSet {
            exec: Some(script("Install", None)),
            undo: None,
            status: None,
            show: None,
        };
        let (controller, view, notifier) =
            build(scripts, runner.clone(), StubHost::visible());

        let outcome = controller.activate().await.expect("cycle ran");

        assert!(outcome.error.is_some());
        assert!(runner.calls().is_empty());

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].summary, "Task failed!");
        assert_eq!(
            sent[0].body,
            "Better Fonts (Install) failed with error: spawn failure: no runnable command for this action"
        );
        assert!(view.events().contains(&"label:Error!".to_string()));
        assert_eq!(controller.state(), TaskState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn activation_while_a_cycle_is_in_flight_is_ignored() {
        struct ParkedRunner {
            release: Arc<Semaphore>,
            started: mpsc::UnboundedSender<String>,
        }

        #[async_trait]
        impl CommandRunner for ParkedRunner {
            async fn run(&self, _workdir: Option<&Path>, command: &str) -> ExecOutcome {
                let _ = self.started.send(command.to_string());
                let permit = self.release.acquire().await.expect("semaphore closed");
                permit.forget();
                ExecOutcome::exited(Some(7), 0)
            }
        }

        let release = Arc::new(Semaphore::new(0));
        let (started_tx, mut started_rx) = mpsc::unbounded_channel();
        let runner = Arc::new(ParkedRunner {
            release: release.clone(),
            started: started_tx,
        });
        let scripts = ActionSet {
            exec: Some(script("Install", Some("./install.sh"))),
            undo: None,
            status: None,
            show: None,
        };
        let (controller, view, notifier) = build(scripts, runner, StubHost::visible());

        let worker = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.activate().await })
        };
        assert_eq!(started_rx.recv().await.as_deref(), Some("./install.sh"));
        assert_eq!(controller.state(), TaskState::Running);

        // Second click lands while the first command is still executing.
        assert!(controller.activate().await.is_none());
        let workings = view
            .events()
            .iter()
            .filter(|event| *event == "label:Working...")
            .count();
        assert_eq!(workings, 1);

        release.add_permits(1);
        let outcome = worker.await.expect("activation task panicked");
        assert!(outcome.is_some_and(|outcome| outcome.ok()));
        assert_eq!(controller.state(), TaskState::Idle);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_runs_the_cycle_in_the_background() {
        let runner = MappedRunner::new(&[]);
        let scripts = ActionSet {
            exec: Some(script("Apply", Some("true"))),
            undo: None,
            status: None,
            show: None,
        };
        let (controller, _view, notifier) = build(scripts, runner, StubHost::visible());

        controller.trigger();
        while notifier.sent().is_empty() {
            tokio::task::yield_now().await;
        }

        assert_eq!(notifier.sent()[0].summary, "Task completed!");
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_window_with_drained_queue_requests_quit() {
        let runner = MappedRunner::new(&[("check-state", 1)]);
        let host = StubHost::hidden();
        let (controller, view, notifier) = build(installable(), runner, host.clone());

        controller.activate().await;

        assert!(host.quit_requested());
        assert_eq!(controller.state(), TaskState::Idle);
        assert_eq!(notifier.sent().len(), 1);
        // The settled label updates are skipped on the way out.
        assert!(!view.events().contains(&"label:Finished!".to_string()));
    }

    #[tokio::test]
    async fn refresh_applies_the_resolved_action() {
        let runner = MappedRunner::new(&[("check-state", 0)]);
        let (controller, view, _notifier) =
            build(installable(), runner, StubHost::visible());

        controller.refresh().await;

        assert_eq!(
            view.events(),
            vec!["label:Remove", "accent:Destructive", "enabled:true"]
        );
        assert_eq!(controller.state(), TaskState::Idle);
    }

    #[tokio::test]
    async fn refresh_suggests_exec_when_not_applied() {
        let runner = MappedRunner::new(&[("check-state", 4)]);
        let (controller, view, _notifier) =
            build(installable(), runner, StubHost::visible());

        controller.refresh().await;

        assert_eq!(
            view.events(),
            vec!["label:Install", "accent:Suggested", "enabled:true"]
        );
    }
}
