//! Notices routed into the log.

use bridge_traits::{NoticeSeverity, Notifier};
use tracing::{error, info, warn};

/// Notifier for hosts without a toast surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: NoticeSeverity) {
        match severity {
            NoticeSeverity::Info => info!(target: "notice", "{}", message),
            NoticeSeverity::Warning => warn!(target: "notice", "{}", message),
            NoticeSeverity::Error => error!(target: "notice", "{}", message),
        }
    }
}
