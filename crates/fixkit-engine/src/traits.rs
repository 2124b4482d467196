use async_trait::async_trait;
use fixkit_common::{ConfirmRequest, ExecOutcome, Notification};
use std::path::Path;

/// Anything that can take one command line to completion: the direct
/// process spawner, or the queue wrapping it. Components that launch
/// commands take one of these instead of hardcoding how the command runs.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, workdir: Option<&Path>, command: &str) -> ExecOutcome;
}

/// UI seam for modal prompts.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// Ask the user a question; `true` means proceed.
    async fn confirm(&self, request: &ConfirmRequest) -> bool;

    /// Show a message that expects no answer.
    async fn alert(&self, request: &ConfirmRequest);
}

/// UI seam for desktop notifications. Fire-and-forget: implementations
/// log display failures, they never propagate them.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Styling applied to a task's action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    /// No accent (task in progress).
    None,
    /// The action applies something new.
    Suggested,
    /// The action undoes something already applied.
    Destructive,
}

/// UI seam for the widget a task controller drives.
pub trait TaskView: Send + Sync {
    fn set_busy(&self, busy: bool);
    fn set_label(&self, label: &str);
    fn set_accent(&self, accent: Accent);
    fn set_enabled(&self, enabled: bool);
}

/// UI seam for the toplevel window the tasks live in.
pub trait HostWindow: Send + Sync {
    fn is_visible(&self) -> bool;
    fn request_quit(&self);
}
