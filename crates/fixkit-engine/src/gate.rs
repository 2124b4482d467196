use fixkit_common::{ConfirmRequest, ExecOutcome};
use fixkit_plugins::PluginDescriptor;
use fixkit_security::{CommandScanner, ScanVerdict};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::traits::{CommandRunner, ConfirmationPrompt};

/// Scans a plugin command and, when it trips a rule, asks the user before
/// letting it through. Every plugin-supplied command goes through this
/// gate; the caller chooses the runner (queued for tasks, direct for
/// status probes).
pub struct TaskGate {
    scanner: CommandScanner,
    prompt: Arc<dyn ConfirmationPrompt>,
}

impl TaskGate {
    pub fn new(scanner: CommandScanner, prompt: Arc<dyn ConfirmationPrompt>) -> Self {
        Self { scanner, prompt }
    }

    pub async fn run_gated(
        &self,
        plugin: &PluginDescriptor,
        command: &str,
        runner: &dyn CommandRunner,
    ) -> ExecOutcome {
        match self.scanner.scan(plugin, command) {
            ScanVerdict::Clean => run_in_plugin_dir(plugin, command, runner).await,
            ScanVerdict::Flagged {
                statement,
                description,
            } => {
                let text = format!(
                    "The plugin <b>{}</b> is trying to run the command \n<tt>{}</tt>, \nwhich might <b>{}</b>. \nContinue anyways?",
                    html_escape::encode_text(&plugin.label),
                    html_escape::encode_text(&statement),
                    html_escape::encode_text(&description),
                );

                if self.prompt.confirm(&ConfirmRequest::question(text)).await {
                    run_in_plugin_dir(plugin, command, runner).await
                } else {
                    info!(
                        "user declined flagged command for {}::{}",
                        plugin.category, plugin.label
                    );
                    // Settles like a failed run, with no distinct marker
                    ExecOutcome::exited(None, 1)
                }
            }
        }
    }
}

async fn run_in_plugin_dir(
    plugin: &PluginDescriptor,
    command: &str,
    runner: &dyn CommandRunner,
) -> ExecOutcome {
    let workdir: Option<&Path> =
        (!plugin.path.as_os_str().is_empty()).then_some(plugin.path.as_path());
    runner.run(workdir, command).await
}
