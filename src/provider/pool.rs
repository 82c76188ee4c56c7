//! Credential pool loading and rotation order.

/// Environment variable holding a comma-separated credential list.
pub const COMBINED_KEYS_ENV: &str = "GENAI_API_KEYS";
/// Prefix of the discrete credential slot variables (`GENAI_API_KEY_1` through `_5`).
pub const SLOT_KEY_ENV_PREFIX: &str = "GENAI_API_KEY_";
/// Number of discrete credential slots consulted.
pub const SLOT_KEY_COUNT: usize = 5;

/// Ordered set of distinct, non-empty provider credentials.
///
/// Loaded once at startup and owned by the client for the process lifetime. The rotation cursor
/// lives on the client; the pool only answers positional lookups.
#[derive(Clone, Debug, Default)]
pub struct ApiKeyPool {
	keys: Vec<String>,
}
impl ApiKeyPool {
	/// Builds a pool from raw candidates: values are trimmed, empties dropped, and duplicates
	/// removed while preserving first-seen order.
	pub fn new(candidates: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
		let mut keys = Vec::new();

		for candidate in candidates {
			let trimmed = candidate.as_ref().trim();

			if !trimmed.is_empty() && !keys.iter().any(|key| key == trimmed) {
				keys.push(trimmed.to_owned());
			}
		}

		Self { keys }
	}

	/// Loads the pool from the process environment.
	///
	/// The combined [`COMBINED_KEYS_ENV`] list takes precedence when it yields any credentials;
	/// otherwise the discrete slot variables are consulted in order.
	pub fn from_env() -> Self {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads the pool through an arbitrary variable lookup; [`from_env`](Self::from_env) with
	/// the lookup made injectable so configuration sources stay testable.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		if let Some(combined) = lookup(COMBINED_KEYS_ENV) {
			let pool = Self::new(combined.split(','));

			if !pool.is_empty() {
				return pool;
			}
		}

		Self::new(
			(1..=SLOT_KEY_COUNT).filter_map(|slot| lookup(&format!("{SLOT_KEY_ENV_PREFIX}{slot}"))),
		)
	}

	/// Whether the pool holds no credentials.
	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Number of distinct credentials.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	/// Credential at the cursor position, wrapping modulo the pool size.
	pub fn key_at(&self, cursor: usize) -> Option<&str> {
		if self.keys.is_empty() {
			return None;
		}

		Some(self.keys[cursor % self.keys.len()].as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn candidates_are_trimmed_deduplicated_and_filtered() {
		let pool = ApiKeyPool::new([" key-a ", "", "key-b", "key-a", "   "]);

		assert_eq!(pool.len(), 2);
		assert_eq!(pool.key_at(0), Some("key-a"));
		assert_eq!(pool.key_at(1), Some("key-b"));
		assert_eq!(pool.key_at(2), Some("key-a"), "Lookup should wrap modulo the pool size.");
	}

	#[test]
	fn empty_pool_answers_no_keys() {
		let pool = ApiKeyPool::new(Vec::<String>::new());

		assert!(pool.is_empty());
		assert_eq!(pool.key_at(0), None);
	}

	#[test]
	fn combined_list_takes_precedence_over_slots() {
		let pool = ApiKeyPool::from_lookup(|name| match name {
			COMBINED_KEYS_ENV => Some("key-a,key-b".into()),
			"GENAI_API_KEY_1" => Some("slot-key".into()),
			_ => None,
		});

		assert_eq!(pool.len(), 2);
		assert_eq!(pool.key_at(0), Some("key-a"));
	}

	#[test]
	fn blank_combined_list_falls_back_to_slots() {
		let pool = ApiKeyPool::from_lookup(|name| match name {
			COMBINED_KEYS_ENV => Some(" , ,".into()),
			"GENAI_API_KEY_2" => Some("slot-two".into()),
			"GENAI_API_KEY_4" => Some("slot-four".into()),
			_ => None,
		});

		assert_eq!(pool.len(), 2);
		assert_eq!(pool.key_at(0), Some("slot-two"));
		assert_eq!(pool.key_at(1), Some("slot-four"));
	}

	#[test]
	fn absent_environment_yields_an_empty_pool() {
		let pool = ApiKeyPool::from_lookup(|_| None);

		assert!(pool.is_empty());
	}
}
