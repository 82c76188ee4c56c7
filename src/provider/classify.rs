//! Failure classification for provider calls.
//!
//! Classification prioritizes fatal signals (bad request shapes that no retry can fix), then
//! the well-known transient statuses and message markers. Anything unrecognized is treated as
//! retryable: unknown transient failures are common with third-party providers, so the client
//! fails open toward retrying.

// self
use crate::_prelude::*;

/// Message markers that identify a request the provider will never accept.
const FATAL_MARKERS: &[&str] = &["invalid argument", "bad request"];
/// Message markers that identify transient upstream conditions.
const RETRYABLE_MARKERS: &[&str] =
	&["rate", "overload", "timeout", "temporar", "unavailable", "network", "gateway", "429", "503"];

/// Raw failure reported by a [`ProviderTransport`](crate::provider::ProviderTransport).
///
/// Transports reduce whatever their SDK or wire protocol produced to a status code and a
/// message; classification needs nothing more.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct CallError {
	/// HTTP status code reported by the provider, when available.
	pub status: Option<u16>,
	/// Upstream error summary.
	pub message: String,
}
impl CallError {
	/// Creates an error without status information.
	pub fn new(message: impl Into<String>) -> Self {
		Self { status: None, message: message.into() }
	}

	/// Creates an error carrying the provider's HTTP status.
	pub fn with_status(status: u16, message: impl Into<String>) -> Self {
		Self { status: Some(status), message: message.into() }
	}

	/// Classifies this error as fatal or retryable.
	pub fn class(&self) -> ErrorClass {
		classify(self)
	}
}

/// Canonical failure categories driving the retry loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
	/// Abort immediately; further attempts cannot succeed.
	Fatal,
	/// Eligible for another attempt with credential rotation and backoff.
	Retryable,
}

/// Applies the status/marker heuristics to a raw call error.
pub fn classify(error: &CallError) -> ErrorClass {
	let lowered = error.message.to_ascii_lowercase();

	if matches!(error.status, Some(400 | 404))
		|| FATAL_MARKERS.iter().any(|marker| lowered.contains(marker))
	{
		return ErrorClass::Fatal;
	}
	if matches!(error.status, Some(401 | 403 | 408 | 429))
		|| error.status.is_some_and(|status| status >= 500)
		|| RETRYABLE_MARKERS.iter().any(|marker| lowered.contains(marker))
	{
		return ErrorClass::Retryable;
	}

	ErrorClass::Retryable
}
