//! Best-effort identity hints derived from unverified request credentials.
//!
//! Extraction never verifies signatures and never errors; every decode step fails soft. The
//! resulting [`IdentityHint`] exists solely to pick a rate-limit bucket; nothing in this crate
//! treats it as an authenticated principal.

// crates.io
use base64::{
	Engine,
	engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use percent_encoding::percent_decode_str;
use serde_json::Value;
// self
use crate::{_prelude::*, guard::GuardRequest};

/// Substring that marks a cookie as an auth-token carrier.
const AUTH_COOKIE_MARKER: &str = "auth-token";
/// Prefix used by newer cookie encodings that wrap the payload in base64.
const BASE64_COOKIE_PREFIX: &str = "base64-";

/// Unverified caller identifier used only to widen rate-limit bucketing.
///
/// The inner value is reachable solely through [`bucket_label`](Self::bucket_label), and `Debug`
/// redacts it so request logs never echo identity subjects.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IdentityHint(String);
impl IdentityHint {
	/// Wraps an already-extracted subject string.
	pub fn new(subject: impl Into<String>) -> Self {
		Self(subject.into())
	}

	/// Returns the label used to key identity-scoped rate-limit buckets.
	pub fn bucket_label(&self) -> &str {
		&self.0
	}
}
impl Debug for IdentityHint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("IdentityHint(..)")
	}
}

/// Derives an identity hint from the request's bearer header or auth-token cookies.
///
/// Attempts, in order: the `Authorization: Bearer` token payload, then every cookie whose name
/// contains [`AUTH_COOKIE_MARKER`] across the historical encodings (raw JWT, percent-encoded
/// JSON array, `base64-`-prefixed JSON, nested `session`/`currentSession` objects). Returns
/// `None` when nothing yields a parsable payload with a string `sub`.
pub fn extract_identity(request: &GuardRequest) -> Option<IdentityHint> {
	if let Some(subject) = request
		.authorization
		.as_deref()
		.and_then(|header| header.strip_prefix("Bearer "))
		.and_then(|token| subject_of(token.trim()))
	{
		return Some(IdentityHint::new(subject));
	}

	request
		.cookies
		.iter()
		.filter(|cookie| cookie.name.contains(AUTH_COOKIE_MARKER))
		.find_map(|cookie| subject_from_cookie_value(&cookie.value))
		.map(IdentityHint::new)
}

fn subject_from_cookie_value(raw: &str) -> Option<String> {
	let decoded = percent_decode_str(raw).decode_utf8().ok()?;
	let candidate = match decoded.strip_prefix(BASE64_COOKIE_PREFIX) {
		Some(rest) => String::from_utf8(decode_base64_loose(rest)?).ok()?,
		None => decoded.into_owned(),
	};
	let token =
		if looks_like_jwt(&candidate) { candidate } else { token_from_json(&candidate)? };

	subject_of(&token)
}

/// Pulls a JWT out of the JSON shapes the older cookie encodings used.
fn token_from_json(text: &str) -> Option<String> {
	let value: Value = serde_json::from_str(text).ok()?;

	match &value {
		Value::Array(items) => items
			.iter()
			.filter_map(Value::as_str)
			.find(|item| looks_like_jwt(item))
			.map(ToOwned::to_owned),
		Value::Object(_) => ["access_token", "session.access_token", "currentSession.access_token"]
			.iter()
			.find_map(|path| string_at_path(&value, path)),
		_ => None,
	}
}

fn string_at_path(value: &Value, path: &str) -> Option<String> {
	path.split('.')
		.try_fold(value, |node, segment| node.get(segment))?
		.as_str()
		.map(ToOwned::to_owned)
}

fn looks_like_jwt(candidate: &str) -> bool {
	let mut parts = candidate.split('.');

	matches!(
		(parts.next(), parts.next(), parts.next(), parts.next()),
		(Some(header), Some(payload), Some(signature), None)
			if !header.is_empty() && !payload.is_empty() && !signature.is_empty()
	)
}

/// Decodes the middle JWT segment and returns its `sub` claim.
fn subject_of(token: &str) -> Option<String> {
	if !looks_like_jwt(token) {
		return None;
	}

	let payload = token.split('.').nth(1)?;
	let bytes = decode_base64_loose(payload)?;
	let claims: Value = serde_json::from_slice(&bytes).ok()?;

	claims.get("sub")?.as_str().map(ToOwned::to_owned)
}

/// Accepts both base64url-without-padding and standard-with-padding inputs.
fn decode_base64_loose(segment: &str) -> Option<Vec<u8>> {
	URL_SAFE_NO_PAD
		.decode(segment.trim_end_matches('='))
		.or_else(|_| STANDARD.decode(segment))
		.ok()
}
