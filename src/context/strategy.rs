//! Relevance scoring strategies for context selection.
//!
//! The default [`LexicalOverlap`] scorer is a bag-of-words intersection, not semantic search;
//! the trait exists so an embedding-based scorer can replace it later without changing the
//! selector's contract.

// std
use std::collections::HashSet;

/// Scores how relevant a candidate turn is to the current turn's text.
pub trait RelevanceScorer
where
	Self: Send + Sync,
{
	/// Returns a non-negative relevance score; zero means "unrelated".
	fn score(&self, current: &str, candidate: &str) -> usize;
}

/// Counts shared significant terms between two texts.
///
/// Significant terms are lowercase word-like tokens of at least `min_token_chars` characters, a
/// crude filter that drops short stop-words without maintaining a stop-word list.
#[derive(Clone, Copy, Debug)]
pub struct LexicalOverlap {
	min_token_chars: usize,
}
impl LexicalOverlap {
	const DEFAULT_MIN_TOKEN_CHARS: usize = 4;

	/// Creates a scorer with an explicit significant-token length threshold.
	pub fn new(min_token_chars: usize) -> Self {
		Self { min_token_chars }
	}

	fn significant_terms(&self, text: &str) -> HashSet<String> {
		text.to_lowercase()
			.split(|c: char| !c.is_alphanumeric())
			.filter(|token| token.chars().count() >= self.min_token_chars)
			.map(ToOwned::to_owned)
			.collect()
	}
}
impl Default for LexicalOverlap {
	fn default() -> Self {
		Self::new(Self::DEFAULT_MIN_TOKEN_CHARS)
	}
}
impl RelevanceScorer for LexicalOverlap {
	fn score(&self, current: &str, candidate: &str) -> usize {
		let current_terms = self.significant_terms(current);

		if current_terms.is_empty() {
			return 0;
		}

		self.significant_terms(candidate)
			.iter()
			.filter(|term| current_terms.contains(*term))
			.count()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn short_tokens_are_not_significant() {
		let scorer = LexicalOverlap::default();

		// "to" and "the" fall under the four-character threshold.
		assert_eq!(scorer.score("go to the shop", "to the moon"), 0);
		assert_eq!(scorer.score("translate to Spanish", "Spanish translate drills"), 2);
	}

	#[test]
	fn duplicate_terms_count_once() {
		let scorer = LexicalOverlap::default();

		assert_eq!(scorer.score("spanish spanish spanish", "learn Spanish fast"), 1);
	}

	#[test]
	fn scoring_is_case_insensitive() {
		let scorer = LexicalOverlap::default();

		assert_eq!(scorer.score("TRANSLATE THIS", "please translate"), 1);
	}

	#[test]
	fn threshold_is_configurable() {
		let scorer = LexicalOverlap::new(2);

		assert_eq!(scorer.score("go to town", "to go"), 2);
	}
}
