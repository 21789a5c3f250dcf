//! User-visible notices (toasts, snackbars).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoticeSeverity {
    Info,
    Warning,
    Error,
}

/// Fire-and-forget notice surface. Must not block the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: NoticeSeverity);
}
