//! Injected time and randomness sources.
//!
//! Credentials compute expiry against a [`Clock`], and PKCE verifiers, OAuth 1.0a nonces, and
//! assertion identifiers draw from a [`RandomSource`]. Neither is read from process-wide state in
//! the core paths, so tests can pin both.

// crates.io
use rand::RngCore;
// self
use crate::_prelude::*;

/// Source of the current instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(Mutex<OffsetDateTime>);
impl ManualClock {
	/// Creates a clock frozen at `instant`.
	pub fn new(instant: OffsetDateTime) -> Self {
		Self(Mutex::new(instant))
	}

	/// Moves the clock forward (or backward for negative durations).
	pub fn advance(&self, by: Duration) {
		let mut now = self.0.lock();

		*now += by;
	}

	/// Jumps to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}

/// Source of random bytes and integers.
pub trait RandomSource
where
	Self: Send + Sync,
{
	/// Returns a uniformly random `u64`.
	fn next_u64(&self) -> u64;

	/// Fills `buf` with random bytes.
	fn fill_bytes(&self, buf: &mut [u8]);
}

/// Thread-local CSPRNG from `rand`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;
impl RandomSource for OsRandom {
	fn next_u64(&self) -> u64 {
		rand::rng().next_u64()
	}

	fn fill_bytes(&self, buf: &mut [u8]) {
		rand::rng().fill_bytes(buf);
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn manual_clock_moves_only_on_request() {
		let clock = ManualClock::new(datetime!(2024-01-01 00:00 UTC));

		assert_eq!(clock.now(), datetime!(2024-01-01 00:00 UTC));

		clock.advance(Duration::seconds(90));

		assert_eq!(clock.now(), datetime!(2024-01-01 00:01:30 UTC));

		clock.set(datetime!(2030-06-01 12:00 UTC));

		assert_eq!(clock.now(), datetime!(2030-06-01 12:00 UTC));
	}

	#[test]
	fn os_random_fills_buffers() {
		let mut a = [0_u8; 32];
		let mut b = [0_u8; 32];

		OsRandom.fill_bytes(&mut a);
		OsRandom.fill_bytes(&mut b);

		assert_ne!(a, b);
	}
}
