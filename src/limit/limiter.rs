//! Keyed rate limiter composing address- and identity-scoped buckets.

// self
use crate::{
	_prelude::*,
	identity::IdentityHint,
	limit::{BucketConfig, TokenBucket},
};

/// Scope a bucket key is tracked under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitScope {
	/// Keyed by resolved client address; applies to every caller.
	Address,
	/// Keyed by extracted identity hint; applies only when a hint is present.
	Identity,
}
impl LimitScope {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Address => "address",
			Self::Identity => "identity",
		}
	}
}
impl Display for LimitScope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Composite identifier a token bucket is tracked under.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BucketKey {
	/// Logical route name the limit applies to.
	pub route: String,
	/// Scope dimension of the key.
	pub scope: LimitScope,
	/// Address or identity value within the scope.
	pub subject: String,
}
impl BucketKey {
	/// Builds a key for the route/scope/subject triple.
	pub fn new(route: impl Into<String>, scope: LimitScope, subject: impl Into<String>) -> Self {
		Self { route: route.into(), scope, subject: subject.into() }
	}
}

/// Paired per-scope configs applied by a route.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LimitPreset {
	/// Config for the address-scoped bucket.
	pub address: BucketConfig,
	/// Config for the identity-scoped bucket.
	pub identity: BucketConfig,
}
impl LimitPreset {
	/// Preset for general AI text routes: 20 requests/minute by address, 40 by identity.
	pub const fn ai_text() -> Self {
		Self { address: BucketConfig::per_minute(20.), identity: BucketConfig::per_minute(40.) }
	}

	/// Stricter preset for transcription routes: 6 requests/minute by address, 12 by identity.
	pub const fn ai_transcribe() -> Self {
		Self { address: BucketConfig::per_minute(6.), identity: BucketConfig::per_minute(12.) }
	}

	/// Builds a preset from explicit per-scope configs.
	pub const fn custom(address: BucketConfig, identity: BucketConfig) -> Self {
		Self { address, identity }
	}
}

/// Result of composing both scope checks for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitDecision {
	/// Both checks passed; the request may proceed.
	Allow {
		/// Whole tokens left in the last bucket that was consulted.
		remaining: u64,
	},
	/// A bucket ran out of tokens; the first failing scope wins.
	Deny {
		/// Scope whose bucket rejected the request.
		scope: LimitScope,
		/// Whole seconds until a token becomes available in that bucket.
		retry_after_secs: u64,
	},
}
impl LimitDecision {
	/// Whether the request was admitted.
	pub const fn is_allowed(&self) -> bool {
		matches!(self, Self::Allow { .. })
	}
}

/// Process-wide bucket store applying per-route, per-scope token-bucket limits.
///
/// Explicitly constructed and injected rather than kept as a global so tests can build isolated
/// stores. All shared state lives behind one mutex; the refill-then-consume sequence for a key
/// is atomic because the lock is held across both steps.
#[derive(Debug)]
pub struct RateLimiter {
	buckets: Mutex<HashMap<BucketKey, TokenBucket>>,
	high_water: usize,
	idle_ttl: Duration,
}
impl RateLimiter {
	const DEFAULT_HIGH_WATER: usize = 2_000;
	const DEFAULT_IDLE_TTL: Duration = Duration::hours(1);

	/// Creates a limiter with the default eviction thresholds.
	pub fn new() -> Self {
		Self::with_eviction(Self::DEFAULT_HIGH_WATER, Self::DEFAULT_IDLE_TTL)
	}

	/// Creates a limiter with explicit eviction thresholds.
	pub fn with_eviction(high_water: usize, idle_ttl: Duration) -> Self {
		Self { buckets: Mutex::new(HashMap::new()), high_water, idle_ttl }
	}

	/// Runs the address-scoped check, then the identity-scoped check when a hint is present.
	///
	/// Both must pass; the first failure wins and surfaces its retry hint. Anonymous callers are
	/// limited only by address.
	pub fn check(
		&self,
		route: &str,
		address: &str,
		identity: Option<&IdentityHint>,
		preset: &LimitPreset,
		now: OffsetDateTime,
	) -> LimitDecision {
		let address_key = BucketKey::new(route, LimitScope::Address, address);
		let decision = self.take_one(address_key, &preset.address, now);

		if !decision.allowed {
			return LimitDecision::Deny {
				scope: LimitScope::Address,
				retry_after_secs: decision.retry_after_secs,
			};
		}

		let Some(hint) = identity else {
			return LimitDecision::Allow { remaining: decision.remaining };
		};
		let identity_key = BucketKey::new(route, LimitScope::Identity, hint.bucket_label());
		let decision = self.take_one(identity_key, &preset.identity, now);

		if decision.allowed {
			LimitDecision::Allow { remaining: decision.remaining }
		} else {
			LimitDecision::Deny {
				scope: LimitScope::Identity,
				retry_after_secs: decision.retry_after_secs,
			}
		}
	}

	/// Number of live buckets; exposed for capacity monitoring and tests.
	pub fn bucket_count(&self) -> usize {
		self.buckets.lock().len()
	}

	fn take_one(
		&self,
		key: BucketKey,
		config: &BucketConfig,
		now: OffsetDateTime,
	) -> crate::limit::TakeDecision {
		let mut buckets = self.buckets.lock();

		if let Some(bucket) = buckets.get_mut(&key) {
			return bucket.take(config, now);
		}

		if buckets.len() >= self.high_water {
			let idle_ttl = self.idle_ttl;

			buckets.retain(|_, bucket| now - bucket.last_update() < idle_ttl);
		}

		let (bucket, decision) = TokenBucket::charged(config, now);

		buckets.insert(key, bucket);

		decision
	}
}
impl Default for RateLimiter {
	fn default() -> Self {
		Self::new()
	}
}
