//! Continuous-refill token bucket primitives.

// self
use crate::_prelude::*;

/// Fallback wait hint, in seconds, for buckets whose refill rate is zero.
const ZERO_REFILL_RETRY_SECS: u64 = 60;

/// Capacity and refill rate applied to one bucket scope.
///
/// Immutable once constructed; defined per logical route at startup.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
	/// Maximum token count the bucket can hold; must be positive.
	pub capacity: f64,
	/// Continuous refill rate in tokens per second; must be non-negative.
	pub refill_per_sec: f64,
}
impl BucketConfig {
	/// Creates a config from an explicit capacity and refill rate.
	pub const fn new(capacity: f64, refill_per_sec: f64) -> Self {
		Self { capacity, refill_per_sec }
	}

	/// Creates a config that refills `capacity` tokens over one minute.
	pub const fn per_minute(capacity: f64) -> Self {
		Self { capacity, refill_per_sec: capacity / 60. }
	}
}

/// Outcome of a single admission attempt against one bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TakeDecision {
	/// Whether the request may proceed.
	pub allowed: bool,
	/// Whole tokens left after the attempt.
	pub remaining: u64,
	/// Whole seconds until one token becomes available; zero when allowed.
	pub retry_after_secs: u64,
}

/// One keyed counter with refill/consume logic.
///
/// The bucket holds no capacity or rate of its own; callers pass the immutable [`BucketConfig`]
/// on every attempt together with the observation instant, which keeps the math pure and lets
/// tests drive a simulated clock.
#[derive(Clone, Copy, Debug)]
pub struct TokenBucket {
	tokens: f64,
	last_refill: OffsetDateTime,
	last_update: OffsetDateTime,
}
impl TokenBucket {
	/// Creates a bucket for a key seen for the first time, charging one token immediately.
	///
	/// The first request of a new key must consume a token; otherwise it would be admitted once
	/// on creation and again on the first refill cycle.
	pub fn charged(config: &BucketConfig, now: OffsetDateTime) -> (Self, TakeDecision) {
		let tokens = (config.capacity - 1.).max(0.);
		let bucket = Self { tokens, last_refill: now, last_update: now };
		let decision =
			TakeDecision { allowed: true, remaining: tokens.floor() as u64, retry_after_secs: 0 };

		(bucket, decision)
	}

	/// Refills from elapsed time, then attempts to consume one token.
	pub fn take(&mut self, config: &BucketConfig, now: OffsetDateTime) -> TakeDecision {
		let elapsed = (now - self.last_refill).as_seconds_f64().max(0.);

		self.tokens = (self.tokens + elapsed * config.refill_per_sec).min(config.capacity);
		self.last_refill = now;
		self.last_update = now;

		if self.tokens >= 1. {
			self.tokens -= 1.;

			TakeDecision { allowed: true, remaining: self.tokens.floor() as u64, retry_after_secs: 0 }
		} else {
			let retry_after_secs = if config.refill_per_sec > 0. {
				(((1. - self.tokens) / config.refill_per_sec).ceil() as u64).max(1)
			} else {
				ZERO_REFILL_RETRY_SECS
			};

			TakeDecision { allowed: false, remaining: 0, retry_after_secs }
		}
	}

	/// Instant of the most recent attempt against this bucket; drives idle eviction.
	pub fn last_update(&self) -> OffsetDateTime {
		self.last_update
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn epoch() -> OffsetDateTime {
		OffsetDateTime::UNIX_EPOCH
	}

	#[test]
	fn exactly_capacity_requests_pass_without_elapsed_time() {
		let config = BucketConfig::per_minute(5.);
		let now = epoch();
		let (mut bucket, first) = TokenBucket::charged(&config, now);

		assert!(first.allowed);
		assert_eq!(first.remaining, 4);

		for _ in 1..5 {
			assert!(bucket.take(&config, now).allowed);
		}

		let rejected = bucket.take(&config, now);

		assert!(!rejected.allowed);
		assert!(rejected.retry_after_secs >= 1);
	}

	#[test]
	fn waiting_retry_after_admits_exactly_one_request() {
		let config = BucketConfig::per_minute(3.);
		let start = epoch();
		let (mut bucket, _) = TokenBucket::charged(&config, start);

		bucket.take(&config, start);
		bucket.take(&config, start);

		let rejected = bucket.take(&config, start);

		assert!(!rejected.allowed);

		let later = start + Duration::seconds(rejected.retry_after_secs as i64);
		let replay = bucket.take(&config, later);

		assert!(replay.allowed);
		assert!(!bucket.take(&config, later).allowed, "Capacity should be exhausted again.");
	}

	#[test]
	fn refill_saturates_at_capacity() {
		let config = BucketConfig::per_minute(4.);
		let start = epoch();
		let (mut bucket, _) = TokenBucket::charged(&config, start);
		let much_later = start + Duration::days(365);
		let decision = bucket.take(&config, much_later);

		assert!(decision.allowed);
		// One token was just consumed from a full bucket.
		assert_eq!(decision.remaining, 3);
	}

	#[test]
	fn clock_regression_never_drains_tokens() {
		let config = BucketConfig::per_minute(4.);
		let start = epoch();
		let (mut bucket, _) = TokenBucket::charged(&config, start);
		let earlier = start - Duration::hours(1);
		let decision = bucket.take(&config, earlier);

		assert!(decision.allowed);
		assert_eq!(decision.remaining, 2);
	}

	#[test]
	fn zero_refill_rate_reports_fallback_window() {
		let config = BucketConfig::new(1., 0.);
		let now = epoch();
		let (mut bucket, _) = TokenBucket::charged(&config, now);
		let rejected = bucket.take(&config, now + Duration::hours(2));

		assert!(!rejected.allowed);
		assert_eq!(rejected.retry_after_secs, 60);
	}
}
