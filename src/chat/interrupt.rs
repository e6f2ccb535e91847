//! Cancelling an in-flight action when the user interrupts.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `operation` until it finishes or `interrupted` is set.  Returns false if interrupted.
///
/// An interrupted operation is dropped, so any loading indicator it holds is hidden.
pub async fn interruptible(operation: impl Future<Output = ()>, interrupted: &AtomicBool) -> bool {
    tokio::select! {
        _ = operation => true,
        _ = wait_for_interrupt(interrupted) => false,
    }
}

async fn wait_for_interrupt(interrupted: &AtomicBool) {
    while !interrupted.load(Ordering::Relaxed) {
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
