//! User-facing toast notifications.

use serde::Serialize;
use std::fmt;

/// Fire-and-forget notification channel.
pub trait Notifier: Send {
    fn success(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
}

impl fmt::Display for ToastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToastLevel::Success => f.write_str("success"),
            ToastLevel::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// Collects toasts raised while handling a request so the page can render them.
#[derive(Debug, Default)]
pub struct ToastBuffer {
    toasts: Vec<Toast>,
}

impl ToastBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }
}

impl Notifier for ToastBuffer {
    fn success(&mut self, message: &str) {
        tracing::debug!(message, "toast: success");
        self.toasts.push(Toast {
            level: ToastLevel::Success,
            message: message.to_string(),
        });
    }

    fn error(&mut self, message: &str) {
        tracing::debug!(message, "toast: error");
        self.toasts.push(Toast {
            level: ToastLevel::Error,
            message: message.to_string(),
        });
    }
}
