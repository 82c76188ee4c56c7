//! Admission control and resilient upstream access for AI-backed endpoints: token-bucket rate
//! limiting, weak identity hints, credential-rotating provider calls, and lexical context
//! selection in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod context;
pub mod error;
pub mod guard;
pub mod identity;
pub mod limit;
pub mod obs;
pub mod provider;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for transport-scripted tests; enabled via `cfg(test)`
	//! or the `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::provider::{
		ApiKeyPool, CallError, GenerationRequest, GenerationResponse, ProviderClient,
		ProviderTransport, TransportFuture,
	};

	/// Provider client type alias used by transport-scripted tests.
	pub type ScriptedTestClient = ProviderClient<ScriptedTransport>;

	/// In-memory transport that replays a scripted sequence of call outcomes.
	///
	/// Each invocation pops the next outcome and records the credential that was used, letting
	/// tests assert rotation order without any real network traffic.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		outcomes: Mutex<Vec<Result<GenerationResponse, CallError>>>,
		credentials_seen: Mutex<Vec<String>>,
		requests_seen: Mutex<Vec<GenerationRequest>>,
	}
	impl ScriptedTransport {
		/// Creates a transport that replays `outcomes` in order.
		pub fn new(
			outcomes: impl IntoIterator<Item = Result<GenerationResponse, CallError>>,
		) -> Self {
			let mut outcomes = outcomes.into_iter().collect::<Vec<_>>();

			// Stored back-to-front so replay can pop from the tail.
			outcomes.reverse();

			Self {
				outcomes: Mutex::new(outcomes),
				credentials_seen: Mutex::new(Vec::new()),
				requests_seen: Mutex::new(Vec::new()),
			}
		}

		/// Returns the credentials used so far, in call order.
		pub fn credentials_seen(&self) -> Vec<String> {
			self.credentials_seen.lock().clone()
		}

		/// Returns the requests observed so far, in call order.
		pub fn requests_seen(&self) -> Vec<GenerationRequest> {
			self.requests_seen.lock().clone()
		}
	}
	impl ProviderTransport for ScriptedTransport {
		type Handle = String;

		fn connect(&self, credential: &str) -> Self::Handle {
			credential.to_owned()
		}

		fn generate<'a>(
			&'a self,
			handle: &'a Self::Handle,
			request: &'a GenerationRequest,
		) -> TransportFuture<'a> {
			Box::pin(async move {
				self.credentials_seen.lock().push(handle.clone());
				self.requests_seen.lock().push(request.clone());

				self.outcomes
					.lock()
					.pop()
					.unwrap_or_else(|| Err(CallError::new("Scripted transport ran out of outcomes.")))
			})
		}
	}

	/// Constructs a [`ProviderClient`] over a scripted transport and the provided credentials.
	pub fn build_scripted_client(
		keys: impl IntoIterator<Item = &'static str>,
		outcomes: impl IntoIterator<Item = Result<GenerationResponse, CallError>>,
	) -> ScriptedTestClient {
		ProviderClient::new(ScriptedTransport::new(outcomes), ApiKeyPool::new(keys))
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::{
			Arc,
			atomic::{AtomicBool, AtomicUsize, Ordering},
		},
	};

	pub use parking_lot::Mutex;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}
