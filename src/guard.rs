//! Request guard façade every AI-backed endpoint calls before doing real work.

pub mod limits;
pub mod request;

pub use limits::*;
pub use request::*;

// self
use crate::{
	_prelude::*,
	error::{LimitUnit, Rejection},
	identity,
	limit::{LimitDecision, LimitPreset, RateLimiter},
	obs::{self, GuardOutcome},
};

/// Field name used for whole-body rejections raised by the declared-size check.
const BODY_FIELD: &str = "body";

/// Per-route admission settings handed to [`Guard::check`].
#[derive(Clone, Debug)]
pub struct GuardPolicy {
	/// Logical route name used for rate-limit keying and observability labels.
	pub route: String,
	/// Rate-limit preset applied to both scopes.
	pub preset: LimitPreset,
	/// Ceiling for the declared request body size, in bytes.
	pub max_body_bytes: u64,
}
impl GuardPolicy {
	/// Creates a policy for the route with the provided preset and body ceiling.
	pub fn new(route: impl Into<String>, preset: LimitPreset, max_body_bytes: u64) -> Self {
		Self { route: route.into(), preset, max_body_bytes }
	}
}

/// Admission façade: declared payload size first, then the two-scope rate check.
///
/// An `Ok(())` return means proceed; a [`Rejection`] short-circuits the route with an
/// HTTP-equivalent 413 or 429 (the latter carrying a `Retry-After` hint the caller must emit).
#[derive(Clone, Debug)]
pub struct Guard {
	limiter: Arc<RateLimiter>,
}
impl Guard {
	/// Creates a guard over the provided limiter store.
	pub fn new(limiter: Arc<RateLimiter>) -> Self {
		Self { limiter }
	}

	/// Runs the admission checks against the current wall clock.
	pub fn check(&self, request: &GuardRequest, policy: &GuardPolicy) -> Result<(), Rejection> {
		self.check_at(request, policy, OffsetDateTime::now_utc())
	}

	/// Runs the admission checks against an explicit observation instant.
	///
	/// Checks short-circuit on the first rejection: the declared content length is compared to
	/// the policy ceiling before any bucket is touched, so an oversized request never consumes a
	/// rate-limit token. A missing or non-numeric `Content-Length` is not rejected here; unsized
	/// payloads are enforced field by field via [`limits`].
	pub fn check_at(
		&self,
		request: &GuardRequest,
		policy: &GuardPolicy,
		now: OffsetDateTime,
	) -> Result<(), Rejection> {
		if let Some(declared) = request.declared_content_length() {
			if declared > policy.max_body_bytes {
				obs::record_guard_outcome(&policy.route, GuardOutcome::PayloadTooLarge);

				return Err(Rejection::PayloadTooLarge {
					field: BODY_FIELD.into(),
					limit: policy.max_body_bytes,
					unit: LimitUnit::Bytes,
				});
			}
		}

		let address = request.client_address();
		let hint = identity::extract_identity(request);
		let decision =
			self.limiter.check(&policy.route, address, hint.as_ref(), &policy.preset, now);

		match decision {
			LimitDecision::Allow { .. } => {
				obs::record_guard_outcome(&policy.route, GuardOutcome::Allowed);

				Ok(())
			},
			LimitDecision::Deny { retry_after_secs, .. } => {
				obs::record_guard_outcome(&policy.route, GuardOutcome::RateLimited);

				Err(Rejection::RateLimited { retry_after_secs })
			},
		}
	}
}
