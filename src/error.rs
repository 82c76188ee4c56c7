//! Crate-level error types shared across the guard, limiter, and provider client.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem (e.g., no upstream credentials).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Upstream provider failure after classification.
	#[error(transparent)]
	Provider(#[from] ProviderError),

	/// The caller cancelled the operation before it completed.
	#[error("Operation was cancelled before completion.")]
	Cancelled,
}

/// Configuration failures raised before any upstream work happens.
///
/// These map to a 500-equivalent at the HTTP layer: the server is misconfigured and the caller
/// cannot correct the request.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// No provider credentials are present in the environment or the supplied pool.
	#[error("No provider credentials are configured.")]
	MissingCredentials,
}

/// Upstream provider failures surfaced to callers once retry handling has finished.
///
/// Messages carry upstream detail for server-side logs; HTTP layers must map these to a generic
/// user-visible message plus an opaque request identifier instead of forwarding them verbatim.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderError {
	/// The provider rejected the request outright; retrying cannot help.
	#[error("Provider rejected the request: {message}.")]
	Fatal {
		/// HTTP status code reported by the provider, when available.
		status: Option<u16>,
		/// Upstream error summary.
		message: String,
	},
	/// Every retry attempt failed; carries the last observed upstream error.
	#[error("Provider call failed after {attempts} attempts: {message}.")]
	Exhausted {
		/// Number of attempts that were made.
		attempts: u32,
		/// HTTP status code from the last attempt, when available.
		status: Option<u16>,
		/// Upstream error summary from the last attempt.
		message: String,
	},
}

/// Structured rejection returned by the request guard.
///
/// This is an expected admission outcome rather than an [`Error`]: routes translate it into a
/// 413 or 429 response and continue serving. The payload deliberately names only the offending
/// field and its ceiling so no internal detail can leak into response bodies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum Rejection {
	/// A declared or measured size exceeds the configured ceiling.
	#[error("{field} exceeds the limit of {limit} {unit}.")]
	#[serde(rename_all = "camelCase")]
	PayloadTooLarge {
		/// Name of the offending field (or `body` for the whole request).
		field: String,
		/// Ceiling the measurement exceeded.
		limit: u64,
		/// Unit the ceiling is expressed in.
		unit: LimitUnit,
	},
	/// A rate-limit bucket ran out of tokens.
	#[error("Too many requests; retry in {retry_after_secs} seconds.")]
	#[serde(rename_all = "camelCase")]
	RateLimited {
		/// Whole seconds the caller should wait before resubmitting.
		retry_after_secs: u64,
	},
}
impl Rejection {
	/// HTTP-equivalent status code for the rejection.
	pub const fn http_status(&self) -> u16 {
		match self {
			Self::PayloadTooLarge { .. } => 413,
			Self::RateLimited { .. } => 429,
		}
	}

	/// `Retry-After` value in whole seconds, present only for rate-limit rejections.
	pub const fn retry_after_secs(&self) -> Option<u64> {
		match self {
			Self::PayloadTooLarge { .. } => None,
			Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
		}
	}
}

/// Unit a payload ceiling is measured in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitUnit {
	/// Raw byte count.
	Bytes,
	/// Unicode character count.
	Characters,
	/// Number of array elements.
	Items,
}
impl Display for LimitUnit {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(match self {
			Self::Bytes => "bytes",
			Self::Characters => "characters",
			Self::Items => "items",
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rejection_exposes_http_status_and_retry_after() {
		let too_large =
			Rejection::PayloadTooLarge { field: "audio".into(), limit: 5, unit: LimitUnit::Bytes };
		let limited = Rejection::RateLimited { retry_after_secs: 7 };

		assert_eq!(too_large.http_status(), 413);
		assert_eq!(too_large.retry_after_secs(), None);
		assert_eq!(limited.http_status(), 429);
		assert_eq!(limited.retry_after_secs(), Some(7));
	}

	#[test]
	fn rejection_message_names_field_and_ceiling() {
		let rejection = Rejection::PayloadTooLarge {
			field: "message".into(),
			limit: 4000,
			unit: LimitUnit::Characters,
		};

		assert_eq!(rejection.to_string(), "message exceeds the limit of 4000 characters.");
	}

	#[test]
	fn rejection_serializes_with_reason_tag() {
		let payload = serde_json::to_string(&Rejection::RateLimited { retry_after_secs: 3 })
			.expect("Rejection should serialize to JSON.");

		assert_eq!(payload, "{\"reason\":\"rateLimited\",\"retryAfterSecs\":3}");
	}

	#[test]
	fn provider_error_carries_attempt_context() {
		let err = ProviderError::Exhausted { attempts: 4, status: Some(503), message: "overloaded".into() };

		assert!(err.to_string().contains("after 4 attempts"));
	}
}
