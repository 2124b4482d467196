use serde::{Deserialize, Serialize};

/// Dialog flavor for a user-facing prompt. `Other` renders as a generic
/// message with no answer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmKind {
    Info,
    Warning,
    Question,
    Other,
}

/// A prompt for the UI to display. `text` may contain markup tags; any
/// interpolated values must already be escaped by the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmRequest {
    pub kind: ConfirmKind,
    pub text: String,
}

impl ConfirmRequest {
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            kind: ConfirmKind::Question,
            text: text.into(),
        }
    }

    pub fn other(text: impl Into<String>) -> Self {
        Self {
            kind: ConfirmKind::Other,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Normal,
    Critical,
}

/// Desktop-style notification. `stable_id` makes successive notifications
/// from the same plugin replace each other instead of stacking; `None`
/// requests a fresh notification every time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub summary: String,
    pub body: String,
    pub severity: Severity,
    pub stable_id: Option<u32>,
}

impl Notification {
    pub fn normal(summary: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            body: body.into(),
            severity: Severity::Normal,
            stable_id: None,
        }
    }

    pub fn critical(summary: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            body: body.into(),
            severity: Severity::Critical,
            stable_id: None,
        }
    }

    pub fn with_stable_id(mut self, id: u32) -> Self {
        self.stable_id = Some(id);
        self
    }
}

/// Additive hash over the UTF-16 code units of `category + label`.
/// Deliberately simple so the id is stable across runs and releases.
pub fn stable_notification_id(category: &str, label: &str) -> u32 {
    category
        .encode_utf16()
        .chain(label.encode_utf16())
        .fold(0u32, |acc, unit| acc.wrapping_add(u32::from(unit)))
}
