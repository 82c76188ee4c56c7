//! Conversation turns and the bounded context-window selector.

pub mod strategy;

pub use strategy::*;

// self
use crate::_prelude::*;

/// Author of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Turn written by the end user.
	User,
	/// Turn produced by the assistant.
	Assistant,
}

/// Opaque identifier of a conversation turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(String);
impl TurnId {
	/// Wraps an identifier string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}
}
impl Display for TurnId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// One turn of a conversation, immutable once loaded for a selection call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationTurn {
	/// Turn identifier.
	pub id: TurnId,
	/// Author role.
	pub role: Role,
	/// Turn text.
	pub content: String,
	/// Creation instant; histories are ordered ascending by this field.
	pub created_at: OffsetDateTime,
}
impl ConversationTurn {
	/// Creates a turn from its parts.
	pub fn new(
		id: impl Into<String>,
		role: Role,
		content: impl Into<String>,
		created_at: OffsetDateTime,
	) -> Self {
		Self { id: TurnId::new(id), role, content: content.into(), created_at }
	}
}

/// Tunable knobs for the selector; the defaults match production behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
	/// Maximum number of context turns returned alongside the current turn.
	pub window: usize,
}
impl Default for SelectorConfig {
	fn default() -> Self {
		Self { window: 2 }
	}
}

/// Result of one selection call: the current turn plus its context window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextSelection<'a> {
	/// Turn the next provider call is about, when one could be determined.
	pub current: Option<&'a ConversationTurn>,
	/// Selected prior turns in ascending chronological order.
	pub context: Vec<&'a ConversationTurn>,
}

/// Picks which prior user turns accompany the current turn in the provider prompt.
///
/// A heuristic relevance filter: candidates that share significant terms with the current turn
/// win (most relevant first, ties broken by recency), falling back to pure recency when nothing
/// overlaps. It exists to avoid flooding the prompt with irrelevant history while still
/// surfacing topically linked earlier questions.
pub struct ContextSelector {
	scorer: Box<dyn RelevanceScorer>,
	config: SelectorConfig,
}
impl ContextSelector {
	/// Creates a selector over an explicit scorer and config.
	pub fn new(scorer: impl RelevanceScorer + 'static, config: SelectorConfig) -> Self {
		Self { scorer: Box::new(scorer), config }
	}

	/// Selects the current turn and its context from an ascending history.
	///
	/// The current turn is the one matching `target`, or the most recent user turn when no
	/// target is given; candidates are the user turns strictly before it. Returns an empty
	/// selection when no current turn can be determined.
	pub fn pick<'a>(
		&self,
		history: &'a [ConversationTurn],
		target: Option<&TurnId>,
	) -> ContextSelection<'a> {
		let current_index = match target {
			Some(id) => history.iter().position(|turn| &turn.id == id),
			None => history.iter().rposition(|turn| turn.role == Role::User),
		};
		let Some(current_index) = current_index else {
			return ContextSelection { current: None, context: Vec::new() };
		};
		let current = &history[current_index];
		let candidates = history[..current_index]
			.iter()
			.enumerate()
			.filter(|(_, turn)| turn.role == Role::User)
			.collect::<Vec<_>>();
		let mut scored = candidates
			.iter()
			.map(|&(position, turn)| (self.scorer.score(&current.content, &turn.content), position, turn))
			.filter(|&(score, ..)| score > 0)
			.collect::<Vec<_>>();

		if scored.is_empty() {
			// Nothing overlaps; fall back to the most recent prior user turns, oldest first.
			let context = candidates
				.iter()
				.rev()
				.take(self.config.window)
				.rev()
				.map(|&(_, turn)| turn)
				.collect();

			return ContextSelection { current: Some(current), context };
		}

		scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
		scored.truncate(self.config.window);
		scored.sort_by_key(|&(_, position, _)| position);

		ContextSelection {
			current: Some(current),
			context: scored.into_iter().map(|(.., turn)| turn).collect(),
		}
	}
}
impl Default for ContextSelector {
	fn default() -> Self {
		Self::new(LexicalOverlap::default(), SelectorConfig::default())
	}
}
impl Debug for ContextSelector {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ContextSelector").field("config", &self.config).finish()
	}
}
