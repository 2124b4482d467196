pub mod error;
pub mod exec;
pub mod feedback;

pub use error::{Error, Result};
pub use exec::{ExecError, ExecOutcome};
pub use feedback::{ConfirmKind, ConfirmRequest, Notification, Severity, stable_notification_id};
