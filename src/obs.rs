//! Optional observability helpers for the guard and provider paths.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured debug events for every guard decision and provider
//!   attempt.
//! - Enable `metrics` to increment the `prompt_gate_guard_total` and
//!   `prompt_gate_provider_attempt_total` counters, labeled by route/outcome.

// self
use crate::_prelude::*;

/// Guard decisions observed per route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuardOutcome {
	/// Both admission checks passed.
	Allowed,
	/// Declared payload size exceeded the route ceiling.
	PayloadTooLarge,
	/// A rate-limit bucket rejected the request.
	RateLimited,
}
impl GuardOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Allowed => "allowed",
			Self::PayloadTooLarge => "payload_too_large",
			Self::RateLimited => "rate_limited",
		}
	}
}
impl Display for GuardOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each provider attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttemptOutcome {
	/// The provider call succeeded.
	Success,
	/// The attempt failed with a retryable classification.
	Retryable,
	/// The attempt failed with a fatal classification.
	Fatal,
}
impl AttemptOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::Retryable => "retryable",
			Self::Fatal => "fatal",
		}
	}
}
impl Display for AttemptOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records a guard decision via the enabled observability backends.
pub fn record_guard_outcome(route: &str, outcome: GuardOutcome) {
	#[cfg(feature = "tracing")]
	tracing::debug!(route, outcome = outcome.as_str(), "Guard decision recorded.");

	#[cfg(feature = "metrics")]
	metrics::counter!(
		"prompt_gate_guard_total",
		"route" => route.to_owned(),
		"outcome" => outcome.as_str()
	)
	.increment(1);

	#[cfg(not(any(feature = "tracing", feature = "metrics")))]
	let _ = (route, outcome);
}

/// Records one provider attempt via the enabled observability backends.
pub fn record_provider_attempt(attempt: u32, outcome: AttemptOutcome) {
	#[cfg(feature = "tracing")]
	tracing::debug!(attempt, outcome = outcome.as_str(), "Provider attempt recorded.");

	#[cfg(feature = "metrics")]
	metrics::counter!(
		"prompt_gate_provider_attempt_total",
		"outcome" => outcome.as_str()
	)
	.increment(1);

	#[cfg(not(any(feature = "tracing", feature = "metrics")))]
	let _ = (attempt, outcome);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_are_noops_without_backends() {
		record_guard_outcome("chat", GuardOutcome::RateLimited);
		record_provider_attempt(1, AttemptOutcome::Retryable);
	}

	#[test]
	fn labels_are_stable() {
		assert_eq!(GuardOutcome::PayloadTooLarge.as_str(), "payload_too_large");
		assert_eq!(AttemptOutcome::Fatal.to_string(), "fatal");
	}
}
