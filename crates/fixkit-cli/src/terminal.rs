use async_trait::async_trait;
use dialoguer::Confirm;
use fixkit_common::{ConfirmRequest, Notification, Severity};
use fixkit_engine::{Accent, ConfirmationPrompt, HostWindow, Notifier, TaskView};
use regex::Regex;
use tracing::warn;

/// Renders engine prompts on the terminal via dialoguer. Prompt text
/// arrives with display markup meant for a richer surface, so tags are
/// stripped and entities decoded before asking.
pub struct TerminalPrompt {
    tags: Regex,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            tags: Regex::new(r"</?[a-z]+>").expect("tag pattern is valid"),
        }
    }

    fn plain_text(&self, text: &str) -> String {
        let stripped = self.tags.replace_all(text, "");
        html_escape::decode_html_entities(stripped.as_ref()).into_owned()
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfirmationPrompt for TerminalPrompt {
    async fn confirm(&self, request: &ConfirmRequest) -> bool {
        Confirm::new()
            .with_prompt(self.plain_text(&request.text))
            .default(false)
            .interact()
            .unwrap_or(false)
    }

    async fn alert(&self, request: &ConfirmRequest) {
        eprintln!("{}", self.plain_text(&request.text));
    }
}

/// Approves every confirmation; used by `run --yes`.
pub struct AutoConfirm;

#[async_trait]
impl ConfirmationPrompt for AutoConfirm {
    async fn confirm(&self, _request: &ConfirmRequest) -> bool {
        warn!("auto-confirming a flagged command");
        true
    }

    async fn alert(&self, request: &ConfirmRequest) {
        eprintln!("{}", request.text);
    }
}

/// Prints engine notifications as terminal lines.
pub struct PrintingNotifier;

impl Notifier for PrintingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Critical => eprintln!("{} {}", notification.summary, notification.body),
            Severity::Normal => println!("{} {}", notification.summary, notification.body),
        }
    }
}

/// Shows the task label transitions as progress lines.
pub struct PrintingView;

impl TaskView for PrintingView {
    fn set_busy(&self, _busy: bool) {}

    fn set_label(&self, label: &str) {
        println!("[{label}]");
    }

    fn set_accent(&self, _accent: Accent) {}

    fn set_enabled(&self, _enabled: bool) {}
}

/// Terminal sessions have no window to hide; the run just ends when the
/// cycle does.
pub struct HeadlessHost;

impl HostWindow for HeadlessHost {
    fn is_visible(&self) -> bool {
        true
    }

    fn request_quit(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_stripped_for_the_terminal() {
        let prompt = TerminalPrompt::new();
        let text = prompt.plain_text(
            "The plugin <b>Fancy &amp; Co</b> is trying to run the command \n<tt>rm -rf /</tt>, \nwhich might <b>delete files</b>. \nContinue anyways?",
        );

        assert_eq!(
            text,
            "The plugin Fancy & Co is trying to run the command \nrm -rf /, \nwhich might delete files. \nContinue anyways?"
        );
    }

    #[test]
    fn plain_text_passes_through_unmarked_text() {
        let prompt = TerminalPrompt::new();
        assert_eq!(
            prompt.plain_text("Failed to install org.example.Player"),
            "Failed to install org.example.Player"
        );
    }
}
