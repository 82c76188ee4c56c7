//! Field-level size enforcement and the fixed ceilings routes apply.
//!
//! The guard's content-length check only covers requests that declare a size up front; streamed
//! or unsized payloads are enforced by the route handler measuring each field and calling the
//! helpers below, which return the same 413-shaped [`Rejection`] as the guard itself.

// self
use crate::error::{LimitUnit, Rejection};

/// Ceiling for general free-form text inputs, in characters.
pub const TEXT_INPUT_MAX_CHARS: usize = 5_000;
/// Ceiling for a single chat message, in characters.
pub const CHAT_MESSAGE_MAX_CHARS: usize = 4_000;
/// Ceiling for the combined chat transcript, in characters.
pub const CHAT_TOTAL_MAX_CHARS: usize = 12_000;
/// Ceiling for the number of messages in one chat request.
pub const CHAT_MAX_MESSAGES: usize = 30;
/// Ceiling for a decoded audio blob, in bytes.
pub const AUDIO_BLOB_MAX_BYTES: u64 = 5 * 1024 * 1024;
/// Ceiling for the raw transcription request body, in bytes.
pub const AUDIO_REQUEST_MAX_BYTES: u64 = 8 * 1024 * 1024;
/// Ceiling for a language tag field, in characters.
pub const LANGUAGE_TAG_MAX_CHARS: usize = 32;

/// Rejects `text` when its character count exceeds `max_chars`.
pub fn enforce_text_limit(field: &str, text: &str, max_chars: usize) -> Result<(), Rejection> {
	enforce_char_limit(field, text.chars().count(), max_chars)
}

/// Rejects a pre-measured character count that exceeds `max_chars`.
pub fn enforce_char_limit(
	field: &str,
	measured_chars: usize,
	max_chars: usize,
) -> Result<(), Rejection> {
	if measured_chars > max_chars {
		return Err(Rejection::PayloadTooLarge {
			field: field.to_owned(),
			limit: max_chars as u64,
			unit: LimitUnit::Characters,
		});
	}

	Ok(())
}

/// Rejects a binary payload whose byte count exceeds `max_bytes`.
pub fn enforce_blob_limit(
	field: &str,
	measured_bytes: u64,
	max_bytes: u64,
) -> Result<(), Rejection> {
	if measured_bytes > max_bytes {
		return Err(Rejection::PayloadTooLarge {
			field: field.to_owned(),
			limit: max_bytes,
			unit: LimitUnit::Bytes,
		});
	}

	Ok(())
}

/// Rejects an array whose element count exceeds `max_items`.
pub fn enforce_array_limit(
	field: &str,
	measured_items: usize,
	max_items: usize,
) -> Result<(), Rejection> {
	if measured_items > max_items {
		return Err(Rejection::PayloadTooLarge {
			field: field.to_owned(),
			limit: max_items as u64,
			unit: LimitUnit::Items,
		});
	}

	Ok(())
}
