//! Transport-agnostic view of an inbound request.
//!
//! The guard works on crate-owned primitive data so callers stay decoupled from any particular
//! HTTP framework; route handlers copy the handful of headers the guard cares about into a
//! [`GuardRequest`] and keep the rest of their request object to themselves.

// self
use crate::_prelude::*;

/// Address used when no header or transport information identifies the caller.
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// One request cookie as received, name and raw (still percent-encoded) value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
	/// Cookie name.
	pub name: String,
	/// Raw cookie value, exactly as it appeared on the wire.
	pub value: String,
}
impl Cookie {
	/// Creates a cookie from a name/value pair.
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { name: name.into(), value: value.into() }
	}
}

/// The header and transport fields the guard inspects, lifted off the inbound request.
#[derive(Clone, Debug, Default)]
pub struct GuardRequest {
	/// `Authorization` header value, when present.
	pub authorization: Option<String>,
	/// Request cookies in arrival order.
	pub cookies: Vec<Cookie>,
	/// `X-Forwarded-For` header value, when present.
	pub forwarded_for: Option<String>,
	/// `X-Real-IP` header value, when present.
	pub real_ip: Option<String>,
	/// CDN connecting-IP header value, when present.
	pub cdn_connecting_ip: Option<String>,
	/// Peer address reported by the transport, when present.
	pub remote_addr: Option<String>,
	/// Raw `Content-Length` header value, when present.
	pub content_length: Option<String>,
}
impl GuardRequest {
	/// Creates an empty request view.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the `Authorization` header value.
	pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
		self.authorization = Some(value.into());

		self
	}

	/// Appends a request cookie.
	pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.cookies.push(Cookie::new(name, value));

		self
	}

	/// Sets the `X-Forwarded-For` header value.
	pub fn with_forwarded_for(mut self, value: impl Into<String>) -> Self {
		self.forwarded_for = Some(value.into());

		self
	}

	/// Sets the `X-Real-IP` header value.
	pub fn with_real_ip(mut self, value: impl Into<String>) -> Self {
		self.real_ip = Some(value.into());

		self
	}

	/// Sets the CDN connecting-IP header value.
	pub fn with_cdn_connecting_ip(mut self, value: impl Into<String>) -> Self {
		self.cdn_connecting_ip = Some(value.into());

		self
	}

	/// Sets the transport-reported peer address.
	pub fn with_remote_addr(mut self, value: impl Into<String>) -> Self {
		self.remote_addr = Some(value.into());

		self
	}

	/// Sets the raw `Content-Length` header value.
	pub fn with_content_length(mut self, value: impl Into<String>) -> Self {
		self.content_length = Some(value.into());

		self
	}

	/// Resolves the client address for rate-limit keying.
	///
	/// Priority order: first `X-Forwarded-For` entry, `X-Real-IP`, CDN connecting IP, transport
	/// peer address, then the literal [`UNKNOWN_ADDRESS`].
	pub fn client_address(&self) -> &str {
		if let Some(forwarded) = self.forwarded_for.as_deref() {
			let first = forwarded.split(',').next().unwrap_or(forwarded).trim();

			if !first.is_empty() {
				return first;
			}
		}

		self.real_ip
			.as_deref()
			.or(self.cdn_connecting_ip.as_deref())
			.or(self.remote_addr.as_deref())
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.unwrap_or(UNKNOWN_ADDRESS)
	}

	/// Declared body size, when the `Content-Length` header parses as an integer.
	pub fn declared_content_length(&self) -> Option<u64> {
		self.content_length.as_deref().and_then(|raw| raw.trim().parse().ok())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn forwarded_for_takes_priority_and_uses_first_entry() {
		let request = GuardRequest::new()
			.with_forwarded_for("203.0.113.9, 10.0.0.1")
			.with_real_ip("198.51.100.2")
			.with_remote_addr("127.0.0.1");

		assert_eq!(request.client_address(), "203.0.113.9");
	}

	#[test]
	fn resolution_falls_through_header_chain() {
		let request = GuardRequest::new().with_cdn_connecting_ip("198.51.100.7");

		assert_eq!(request.client_address(), "198.51.100.7");
		assert_eq!(GuardRequest::new().with_remote_addr("10.1.1.1").client_address(), "10.1.1.1");
		assert_eq!(GuardRequest::new().client_address(), UNKNOWN_ADDRESS);
	}

	#[test]
	fn empty_forwarded_for_is_skipped() {
		let request = GuardRequest::new().with_forwarded_for("  ").with_real_ip("198.51.100.2");

		assert_eq!(request.client_address(), "198.51.100.2");
	}

	#[test]
	fn content_length_parses_only_numeric_values() {
		assert_eq!(
			GuardRequest::new().with_content_length(" 1024 ").declared_content_length(),
			Some(1024),
		);
		assert_eq!(
			GuardRequest::new().with_content_length("chunked").declared_content_length(),
			None,
		);
		assert_eq!(GuardRequest::new().declared_content_length(), None);
	}
}
