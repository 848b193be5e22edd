//! Per-credential refresh counters.

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for one credential's refresh attempts.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	invalidations: AtomicU64,
}
impl RefreshMetrics {
	/// Refresh calls that reached the token endpoint.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Refreshes that produced a new access token.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Refreshes that failed for any reason, including transient ones.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Refreshes whose 4xx answer cleared the access token.
	pub fn invalidations(&self) -> u64 {
		self.invalidations.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_invalidation(&self) {
		self.invalidations.fetch_add(1, Ordering::Relaxed);
	}
}
