use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal result of one command request.
///
/// `status` is an exit-code shaped value even when no process ran: a
/// declined confirmation settles as `status = 1` with no `error`, and a
/// parse or spawn failure settles as `status = 1` with the cause attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutcome {
    pub pid: Option<u32>,
    pub status: i32,
    pub error: Option<ExecError>,
}

impl ExecOutcome {
    pub fn exited(pid: Option<u32>, status: i32) -> Self {
        Self {
            pid,
            status,
            error: None,
        }
    }

    pub fn failed(error: ExecError) -> Self {
        Self {
            pid: None,
            status: 1,
            error: Some(error),
        }
    }

    pub fn ok(&self) -> bool {
        self.status == 0 && self.error.is_none()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecError {
    #[error("command parse error: {0}")]
    Parse(String),

    #[error("spawn failure: {0}")]
    Spawn(String),
}
