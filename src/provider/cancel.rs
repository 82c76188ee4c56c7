//! Cooperative cancellation for in-flight provider calls.

// crates.io
use tokio::sync::Notify;
// self
use crate::_prelude::*;

/// Externally supplied cancellation signal honored by the provider retry loop.
///
/// Cloning yields another handle to the same signal. Cancelling wakes every waiter, aborts an
/// in-flight attempt at its next suspension point, and cuts any pending backoff sleep short, so
/// a client disconnect never leaks the retry loop.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
	inner: Arc<CancelInner>,
}
impl CancelToken {
	/// Creates an uncancelled token.
	pub fn new() -> Self {
		Self::default()
	}

	/// Flags the token as cancelled and wakes every waiter.
	pub fn cancel(&self) {
		self.inner.flagged.store(true, Ordering::SeqCst);
		self.inner.notify.notify_waiters();
	}

	/// Whether the token has been cancelled.
	pub fn is_cancelled(&self) -> bool {
		self.inner.flagged.load(Ordering::SeqCst)
	}

	/// Resolves once the token is cancelled.
	pub async fn cancelled(&self) {
		loop {
			let notified = self.inner.notify.notified();

			tokio::pin!(notified);
			// Register before re-checking the flag so a concurrent cancel cannot slip between
			// the check and the wait.
			notified.as_mut().enable();

			if self.is_cancelled() {
				return;
			}

			notified.await;
		}
	}
}

#[derive(Debug, Default)]
struct CancelInner {
	flagged: AtomicBool,
	notify: Notify,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn cancelled_resolves_after_cancel() {
		let token = CancelToken::new();
		let waiter = token.clone();
		let join = tokio::spawn(async move { waiter.cancelled().await });

		assert!(!token.is_cancelled());

		token.cancel();
		join.await.expect("Waiter task should resolve after cancellation.");

		assert!(token.is_cancelled());
	}

	#[tokio::test]
	async fn cancel_before_wait_resolves_immediately() {
		let token = CancelToken::new();

		token.cancel();
		token.cancelled().await;
	}
}
