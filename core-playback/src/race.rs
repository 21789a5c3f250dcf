//! First-of-N race with a timeout.

use futures::future::{select_all, BoxFuture};
use std::time::Duration;

/// Outcome of [`first_of`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirstOf<T> {
    /// Signal at `index` settled first.
    Signal { index: usize, value: T },
    TimedOut,
}

/// Resolve with whichever signal settles first, or `TimedOut` after `timeout`.
///
/// The losing signals are dropped, which detaches them. An empty set waits
/// out the full timeout.
pub async fn first_of<'a, T>(signals: Vec<BoxFuture<'a, T>>, timeout: Duration) -> FirstOf<T> {
    if signals.is_empty() {
        tokio::time::sleep(timeout).await;
        return FirstOf::TimedOut;
    }

    match tokio::time::timeout(timeout, select_all(signals)).await {
        Ok((value, index, _rest)) => FirstOf::Signal { index, value },
        Err(_) => FirstOf::TimedOut,
    }
}
