use async_trait::async_trait;
use fixkit_common::{ExecError, ExecOutcome};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::traits::CommandRunner;

/// Tokenizes a command line into argv and runs it directly, without a
/// shell. Quoting and escaping follow POSIX word-splitting rules; there
/// is no variable expansion, globbing, or piping. The child inherits the
/// parent's stdio and environment, with `PATH` extended by `bin/` under
/// the process working directory so plugins can ship helper executables.
#[derive(Default)]
pub struct ProcessSpawner;

impl ProcessSpawner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessSpawner {
    async fn run(&self, workdir: Option<&Path>, command: &str) -> ExecOutcome {
        let argv = match shell_words::split(command) {
            Ok(argv) if !argv.is_empty() => argv,
            Ok(_) => {
                return ExecOutcome::failed(ExecError::Parse(format!(
                    "failed to parse command: {command}"
                )));
            }
            Err(e) => {
                return ExecOutcome::failed(ExecError::Parse(format!("{e}: {command}")));
            }
        };

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        cmd.env("PATH", augmented_path());
        if let Some(dir) = workdir {
            cmd.current_dir(dir);
        }

        debug!("spawning {:?} in {:?}", argv, workdir);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("failed to spawn '{}': {e}", argv[0]);
                return ExecOutcome::failed(ExecError::Spawn(e.to_string()));
            }
        };

        let pid = child.id();
        match child.wait().await {
            // Signal deaths have no exit code and count as failures
            Ok(status) => ExecOutcome::exited(pid, status.code().unwrap_or(1)),
            Err(e) => ExecOutcome {
                pid,
                status: 1,
                error: Some(ExecError::Spawn(e.to_string())),
            },
        }
    }
}

/// The parent `PATH` with `<current dir>/bin` appended. Falls back to the
/// unmodified `PATH` if the joined value would be malformed.
fn augmented_path() -> OsString {
    let parent_path = std::env::var_os("PATH");
    let mut paths: Vec<PathBuf> = parent_path
        .as_ref()
        .map(|path| std::env::split_paths(path).collect())
        .unwrap_or_default();
    if let Ok(current) = std::env::current_dir() {
        paths.push(current.join("bin"));
    }
    std::env::join_paths(paths).unwrap_or_else(|_| parent_path.unwrap_or_default())
}
