//! Set-logging dialogue module: the per-chat conversation state and the
//! validators for the values a user types while logging a set.

use std::sync::Arc;

use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::types::ChatId;
use tracing::debug;

/// Where a sender is in the "pick exercise → reps → weight" flow
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingReps {
        exercise_id: i64,
        exercise_name: String,
    },
    AwaitingWeight {
        exercise_id: i64,
        exercise_name: String,
        reps: i32,
    },
}

impl ConversationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ConversationState::Idle)
    }

    /// Short tag for log fields
    pub fn label(&self) -> &'static str {
        match self {
            ConversationState::Idle => "idle",
            ConversationState::AwaitingReps { .. } => "awaiting_reps",
            ConversationState::AwaitingWeight { .. } => "awaiting_weight",
        }
    }
}

/// Per-sender conversation states, kept in memory only
pub type ConversationStorage = InMemStorage<ConversationState>;

/// Type alias for our set-logging dialogue
pub type ConversationDialogue = Dialogue<ConversationState, ConversationStorage>;

/// Dialogue keyed by the sender's registry key rather than the chat
pub fn sender_dialogue(storage: Arc<ConversationStorage>, sender_key: i64) -> ConversationDialogue {
    Dialogue::new(storage, ChatId(sender_key))
}

/// Put the sender back to `Idle`
pub async fn reset_dialogue(dialogue: &ConversationDialogue) {
    if let Err(e) = dialogue.reset().await {
        debug!(user_id = %dialogue.chat_id(), error = %e, "Conversation reset failed");
    }
}

/// Validates a rep count: a positive integer
pub fn parse_reps(input: &str) -> Result<i32, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    match trimmed.parse::<i32>() {
        Ok(reps) if reps > 0 => Ok(reps),
        Ok(_) => Err("out_of_range"),
        Err(_) => Err("not_a_number"),
    }
}

/// Validates a weight in kilograms: a finite, non-negative decimal
///
/// Accepts either `.` or `,` as the decimal separator; `0` means bodyweight.
pub fn parse_weight(input: &str) -> Result<f64, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    match trimmed.replace(',', ".").parse::<f64>() {
        Ok(weight) if !weight.is_finite() => Err("not_a_number"),
        // normalizes -0
        Ok(weight) if weight == 0.0 => Ok(0.0),
        Ok(weight) if weight > 0.0 => Ok(weight),
        Ok(_) => Err("out_of_range"),
        Err(_) => Err("not_a_number"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reps_validation() {
        assert_eq!(parse_reps("10"), Ok(10));
        assert_eq!(parse_reps("  8 "), Ok(8));

        assert_eq!(parse_reps(""), Err("empty"));
        assert_eq!(parse_reps("0"), Err("out_of_range"));
        assert_eq!(parse_reps("-3"), Err("out_of_range"));
        assert_eq!(parse_reps("abc"), Err("not_a_number"));
        assert_eq!(parse_reps("8.5"), Err("not_a_number"));
    }

    #[test]
    fn test_weight_validation() {
        assert_eq!(parse_weight("60"), Ok(60.0));
        assert_eq!(parse_weight("67.5"), Ok(67.5));
        assert_eq!(parse_weight("67,5"), Ok(67.5));
        assert_eq!(parse_weight("0"), Ok(0.0));
        assert_eq!(parse_weight("-0"), Ok(0.0));

        assert_eq!(parse_weight("   "), Err("empty"));
        assert_eq!(parse_weight("-5"), Err("out_of_range"));
        assert_eq!(parse_weight("heavy"), Err("not_a_number"));
        assert_eq!(parse_weight("NaN"), Err("not_a_number"));
        assert_eq!(parse_weight("inf"), Err("not_a_number"));
    }

    #[test]
    fn test_default_state_is_idle() {
        let state = ConversationState::default();
        assert!(state.is_idle());
        assert_eq!(state.label(), "idle");
    }

    #[tokio::test]
    async fn test_reset_dialogue_returns_to_idle() {
        let storage = ConversationStorage::new();
        let dialogue = sender_dialogue(storage.clone(), 42);
        assert_eq!(dialogue.get().await.unwrap(), None);

        dialogue
            .update(ConversationState::AwaitingReps {
                exercise_id: 1,
                exercise_name: "Планка".to_string(),
            })
            .await
            .unwrap();
        reset_dialogue(&dialogue).await;

        assert_eq!(dialogue.get_or_default().await.unwrap(), ConversationState::Idle);
        // Other senders are untouched
        assert_eq!(sender_dialogue(storage, 43).get().await.unwrap(), None);
    }
}
