use async_trait::async_trait;
use fixkit_common::{ExecError, ExecOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::traits::CommandRunner;

struct Job {
    workdir: Option<PathBuf>,
    command: String,
    reply: oneshot::Sender<ExecOutcome>,
}

/// Serializes command execution: jobs run strictly one at a time, in
/// submission order, on a single worker task. Every side-effecting
/// command in the application is meant to go through one shared queue so
/// that at most one plugin command is in flight at any moment.
///
/// The queue itself is a `CommandRunner`, wrapping the runner it was
/// constructed with; callers await the same `ExecOutcome` they would get
/// from the inner runner, just later.
pub struct CommandQueue {
    tx: mpsc::UnboundedSender<Job>,
    depth: Arc<AtomicUsize>,
}

impl CommandQueue {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let depth = Arc::new(AtomicUsize::new(0));

        let worker_depth = Arc::clone(&depth);
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                debug!("queue running: {}", job.command);
                let outcome = runner.run(job.workdir.as_deref(), &job.command).await;
                // Drop this job from the depth before the caller can
                // observe its outcome, so a completion handler checking
                // is_idle() does not count the job it is finishing.
                worker_depth.fetch_sub(1, Ordering::SeqCst);
                let _ = job.reply.send(outcome);
            }
        });

        Self { tx, depth }
    }

    /// Number of submitted jobs that have not completed yet, including
    /// the one in flight.
    pub fn pending(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

#[async_trait]
impl CommandRunner for CommandQueue {
    async fn run(&self, workdir: Option<&Path>, command: &str) -> ExecOutcome {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = Job {
            workdir: workdir.map(Path::to_path_buf),
            command: command.to_string(),
            reply: reply_tx,
        };

        self.depth.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return ExecOutcome::failed(ExecError::Spawn("command queue worker stopped".into()));
        }

        match reply_rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                ExecOutcome::failed(ExecError::Spawn("command queue worker stopped".into()))
            }
        }
    }
}
