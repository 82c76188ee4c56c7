//! Multi-key provider client: handle caching, round-robin rotation, classified retries.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, ProviderError},
	obs::{self, AttemptOutcome},
	provider::{ApiKeyPool, CallError, CancelToken, ErrorClass},
};

/// Boxed future returned by [`ProviderTransport::generate`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = std::result::Result<GenerationResponse, CallError>> + 'a + Send>>;

/// Transport seam the caller implements against their provider SDK or wire protocol.
///
/// The client never touches HTTP itself; it asks the transport for one [`Handle`](Self::Handle)
/// per credential (created once, cached for the process lifetime) and invokes calls through it.
/// Implementations reduce failures to [`CallError`] so classification stays transport-agnostic.
pub trait ProviderTransport
where
	Self: 'static + Send + Sync,
{
	/// Initialized provider handle tied to one credential.
	type Handle: 'static + Send + Sync;

	/// Creates the handle for a credential; invoked once per credential, then cached.
	fn connect(&self, credential: &str) -> Self::Handle;

	/// Executes one generation call through the credential's handle.
	fn generate<'a>(
		&'a self,
		handle: &'a Self::Handle,
		request: &'a GenerationRequest,
	) -> TransportFuture<'a>;
}

/// One piece of a generation prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptPart {
	/// Plain text segment.
	Text(String),
	/// Binary segment (e.g., audio to transcribe) with its MIME type.
	Blob {
		/// MIME type of the payload.
		mime_type: String,
		/// Raw payload bytes.
		data: Vec<u8>,
	},
}

/// Prompt-or-multipart request passed to the provider.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationRequest {
	/// Ordered prompt parts.
	pub parts: Vec<PromptPart>,
	/// Model override; the transport's default model applies when absent.
	pub model: Option<String>,
}
impl GenerationRequest {
	/// Creates a single-part text request.
	pub fn text(prompt: impl Into<String>) -> Self {
		Self { parts: vec![PromptPart::Text(prompt.into())], model: None }
	}

	/// Appends a prompt part.
	pub fn with_part(mut self, part: PromptPart) -> Self {
		self.parts.push(part);

		self
	}

	/// Sets the model override.
	pub fn with_model(mut self, model: impl Into<String>) -> Self {
		self.model = Some(model.into());

		self
	}
}

/// Successful provider output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationResponse {
	text: String,
}
impl GenerationResponse {
	/// Wraps the provider's text output.
	pub fn new(text: impl Into<String>) -> Self {
		Self { text: text.into() }
	}

	/// Returns the generated text.
	pub fn text(&self) -> &str {
		&self.text
	}
}

/// Per-call options for [`ProviderClient::generate`].
#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
	/// Model override applied on top of the request's own setting.
	pub model: Option<String>,
	/// Cancellation signal honored between and during attempts.
	pub cancel: Option<CancelToken>,
}
impl GenerateOptions {
	/// Creates empty options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the model override.
	pub fn with_model(mut self, model: impl Into<String>) -> Self {
		self.model = Some(model.into());

		self
	}

	/// Attaches a cancellation token.
	pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
		self.cancel = Some(cancel);

		self
	}
}

/// Wraps provider calls with credential rotation, failure classification, and linear backoff.
///
/// Multiple credentials spread quota across provider-side per-key rate limits; the round-robin
/// cursor advances on every attempt regardless of outcome so one exhausted key is never retried
/// back-to-back. The cursor is a load-spreading heuristic only; occasional skips or repeats
/// under concurrent access are acceptable.
pub struct ProviderClient<T>
where
	T: ProviderTransport,
{
	transport: T,
	pool: ApiKeyPool,
	handles: Mutex<HashMap<String, Arc<T::Handle>>>,
	cursor: AtomicUsize,
	attempt_ceiling: u32,
	backoff_base: StdDuration,
}
impl<T> ProviderClient<T>
where
	T: ProviderTransport,
{
	const DEFAULT_ATTEMPT_CEILING: u32 = 4;
	const DEFAULT_BACKOFF_BASE: StdDuration = StdDuration::from_millis(250);

	/// Creates a client over the transport and credential pool.
	pub fn new(transport: T, pool: ApiKeyPool) -> Self {
		Self {
			transport,
			pool,
			handles: Mutex::new(HashMap::new()),
			cursor: AtomicUsize::new(0),
			attempt_ceiling: Self::DEFAULT_ATTEMPT_CEILING,
			backoff_base: Self::DEFAULT_BACKOFF_BASE,
		}
	}

	/// Creates a client whose pool is loaded from the process environment.
	pub fn from_env(transport: T) -> Self {
		Self::new(transport, ApiKeyPool::from_env())
	}

	/// Overrides the attempt ceiling and backoff base.
	pub fn with_retry_policy(mut self, attempt_ceiling: u32, backoff_base: StdDuration) -> Self {
		self.attempt_ceiling = attempt_ceiling.max(1);
		self.backoff_base = backoff_base;

		self
	}

	/// Whether any credential is configured; callers pre-check this to return a 500-equivalent
	/// before doing any prompt-building work.
	pub fn is_configured(&self) -> bool {
		!self.pool.is_empty()
	}

	/// Executes a generation request with rotation and retries.
	///
	/// Fails immediately with [`ConfigError::MissingCredentials`] when unconfigured and with
	/// [`ProviderError::Fatal`] on the first fatal classification. Retryable failures rotate to
	/// the next credential after a linear backoff sleep; after exhausting `min(ceiling, pool)`
	/// attempts the last observed error is surfaced as [`ProviderError::Exhausted`].
	pub async fn generate(
		&self,
		request: &GenerationRequest,
		options: &GenerateOptions,
	) -> Result<GenerationResponse> {
		if !self.is_configured() {
			return Err(ConfigError::MissingCredentials.into());
		}

		let effective;
		let request = match &options.model {
			Some(model) =>
				if request.model.as_deref() == Some(model) {
					request
				} else {
					effective = request.clone().with_model(model.clone());

					&effective
				},
			None => request,
		};
		let attempts = self.attempt_ceiling.min(self.pool.len() as u32).max(1);
		let mut last: Option<CallError> = None;

		for attempt in 0..attempts {
			if options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
				return Err(Error::Cancelled);
			}

			let cursor = self.cursor.fetch_add(1, Ordering::Relaxed);
			let credential =
				self.pool.key_at(cursor).ok_or(ConfigError::MissingCredentials)?.to_owned();
			let handle = self.handle_for(&credential);
			let outcome = self.call_one(&handle, request, options.cancel.as_ref()).await?;

			match outcome {
				Ok(response) => {
					obs::record_provider_attempt(attempt + 1, AttemptOutcome::Success);

					return Ok(response);
				},
				Err(error) => match error.class() {
					ErrorClass::Fatal => {
						obs::record_provider_attempt(attempt + 1, AttemptOutcome::Fatal);

						return Err(ProviderError::Fatal {
							status: error.status,
							message: error.message,
						}
						.into());
					},
					ErrorClass::Retryable => {
						obs::record_provider_attempt(attempt + 1, AttemptOutcome::Retryable);

						last = Some(error);

						if attempt + 1 < attempts {
							self.backoff(attempt, options.cancel.as_ref()).await?;
						}
					},
				},
			}
		}

		// `last` is always set here; the fallback guards the theoretical zero-attempt path.
		let last = last.unwrap_or_else(|| {
			CallError::new("Provider retries were exhausted without a recorded error")
		});

		Err(ProviderError::Exhausted { attempts, status: last.status, message: last.message }
			.into())
	}

	/// Returns (and creates on first use) the cached handle for a credential.
	fn handle_for(&self, credential: &str) -> Arc<T::Handle> {
		self.handles
			.lock()
			.entry(credential.to_owned())
			.or_insert_with(|| Arc::new(self.transport.connect(credential)))
			.clone()
	}

	async fn call_one(
		&self,
		handle: &T::Handle,
		request: &GenerationRequest,
		cancel: Option<&CancelToken>,
	) -> Result<std::result::Result<GenerationResponse, CallError>> {
		let call = self.transport.generate(handle, request);

		match cancel {
			Some(token) => tokio::select! {
				outcome = call => Ok(outcome),
				() = token.cancelled() => Err(Error::Cancelled),
			},
			None => Ok(call.await),
		}
	}

	async fn backoff(&self, attempt: u32, cancel: Option<&CancelToken>) -> Result<()> {
		let delay = self.backoff_base * (attempt + 1);

		match cancel {
			Some(token) => tokio::select! {
				() = tokio::time::sleep(delay) => Ok(()),
				() = token.cancelled() => Err(Error::Cancelled),
			},
			None => {
				tokio::time::sleep(delay).await;

				Ok(())
			},
		}
	}
}
impl<T> Debug for ProviderClient<T>
where
	T: ProviderTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderClient")
			.field("configured_keys", &self.pool.len())
			.field("attempt_ceiling", &self.attempt_ceiling)
			.field("backoff_base", &self.backoff_base)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{ScriptedTransport, build_scripted_client};

	fn ok(text: &str) -> std::result::Result<GenerationResponse, CallError> {
		Ok(GenerationResponse::new(text))
	}

	fn rate_limited() -> std::result::Result<GenerationResponse, CallError> {
		Err(CallError::with_status(429, "Resource has been exhausted"))
	}

	#[tokio::test(start_paused = true)]
	async fn retries_rotate_across_all_keys_until_success() {
		let client = build_scripted_client(
			["key-a", "key-b", "key-c"],
			[rate_limited(), rate_limited(), ok("made it")],
		);
		let response = client
			.generate(&GenerationRequest::text("hello"), &GenerateOptions::new())
			.await
			.expect("Third attempt should succeed after two 429s.");

		assert_eq!(response.text(), "made it");
		assert_eq!(
			client.transport.credentials_seen(),
			["key-a", "key-b", "key-c"],
			"Each attempt should use the next credential in round-robin order.",
		);
	}

	#[tokio::test(start_paused = true)]
	async fn fatal_errors_abort_without_rotation() {
		let client = build_scripted_client(
			["key-a", "key-b"],
			[Err(CallError::with_status(400, "Bad request")), ok("never reached")],
		);
		let err = client
			.generate(&GenerationRequest::text("hello"), &GenerateOptions::new())
			.await
			.expect_err("A 400 must abort immediately.");

		assert!(matches!(
			err,
			Error::Provider(ProviderError::Fatal { status: Some(400), .. }),
		));
		assert_eq!(client.transport.credentials_seen(), ["key-a"]);
	}

	#[tokio::test(start_paused = true)]
	async fn exhaustion_surfaces_the_last_observed_error() {
		let client = build_scripted_client(
			["key-a", "key-b"],
			[rate_limited(), Err(CallError::with_status(503, "Service unavailable"))],
		);
		let err = client
			.generate(&GenerationRequest::text("hello"), &GenerateOptions::new())
			.await
			.expect_err("All attempts failing should surface exhaustion.");

		assert!(matches!(
			err,
			Error::Provider(ProviderError::Exhausted { attempts: 2, status: Some(503), .. }),
		));
	}

	#[tokio::test(start_paused = true)]
	async fn attempt_count_is_capped_by_the_ceiling() {
		let outcomes = (0..6).map(|_| rate_limited());
		let client = build_scripted_client(
			["key-a", "key-b", "key-c", "key-d", "key-e"],
			outcomes.collect::<Vec<_>>(),
		);
		let err = client
			.generate(&GenerationRequest::text("hello"), &GenerateOptions::new())
			.await
			.expect_err("Exhaustion expected.");

		assert!(matches!(err, Error::Provider(ProviderError::Exhausted { attempts: 4, .. })));
		assert_eq!(client.transport.credentials_seen().len(), 4);
	}

	#[tokio::test]
	async fn empty_pool_fails_before_any_network_call() {
		let client = ProviderClient::new(ScriptedTransport::default(), ApiKeyPool::default());

		assert!(!client.is_configured());

		let err = client
			.generate(&GenerationRequest::text("hello"), &GenerateOptions::new())
			.await
			.expect_err("Unconfigured client must fail immediately.");

		assert!(matches!(err, Error::Config(ConfigError::MissingCredentials)));
		assert!(client.transport.credentials_seen().is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn cancellation_cuts_the_backoff_short() {
		let client = build_scripted_client(["key-a", "key-b"], [rate_limited(), ok("late")]);
		let token = CancelToken::new();
		let options = GenerateOptions::new().with_cancel(token.clone());
		let request = GenerationRequest::text("hello");
		let call = client.generate(&request, &options);

		tokio::pin!(call);

		// Let the first attempt fail and the backoff sleep begin.
		assert!(
			tokio::time::timeout(StdDuration::from_millis(100), call.as_mut()).await.is_err(),
			"Call should still be backing off after 100ms.",
		);

		token.cancel();

		let err = call.await.expect_err("Cancellation should abort the retry loop.");

		assert!(matches!(err, Error::Cancelled));
		assert_eq!(client.transport.credentials_seen(), ["key-a"]);
	}

	#[tokio::test(start_paused = true)]
	async fn scripted_outcomes_replay_in_submission_order() {
		// A single-ended source; the transport must buffer before reversing for replay.
		let mut source = vec![rate_limited(), ok("second attempt")].into_iter();
		let client = ProviderClient::new(
			ScriptedTransport::new(std::iter::from_fn(move || source.next())),
			ApiKeyPool::new(["key-a", "key-b"]),
		);
		let response = client
			.generate(&GenerationRequest::text("hello"), &GenerateOptions::new())
			.await
			.expect("The second scripted outcome should succeed.");

		assert_eq!(response.text(), "second attempt");
		assert_eq!(client.transport.credentials_seen(), ["key-a", "key-b"]);
	}

	#[tokio::test(start_paused = true)]
	async fn model_override_applies_to_the_request() {
		let client = build_scripted_client(["key-a"], [ok("done")]);
		let options = GenerateOptions::new().with_model("fast-model");

		client
			.generate(&GenerationRequest::text("hello"), &options)
			.await
			.expect("Single attempt should succeed.");

		let seen = client.transport.requests_seen();

		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0].model.as_deref(), Some("fast-model"));
	}

	#[tokio::test(start_paused = true)]
	async fn handles_are_created_once_per_credential_across_calls() {
		let client = build_scripted_client(["key-a", "key-b"], [ok("1"), ok("2"), ok("3")]);
		let request = GenerationRequest::text("hello");

		for _ in 0..3 {
			client
				.generate(&request, &GenerateOptions::new())
				.await
				.expect("Each single-attempt call should succeed.");
		}

		// Three calls rotated across two credentials; the revisited one reused its handle.
		assert_eq!(client.transport.credentials_seen(), ["key-a", "key-b", "key-a"]);
		assert_eq!(client.handles.lock().len(), 2);
	}
}
