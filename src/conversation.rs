//! # Conversation State Machine
//!
//! Interprets free text in the context of the sender's [`ConversationState`]:
//!
//! - `Idle` + known exercise name → `AwaitingReps`
//! - `AwaitingReps` + positive integer → `AwaitingWeight`
//! - `AwaitingWeight` + non-negative decimal → set appended, back to `Idle`
//!
//! Invalid input never changes the state. A failed append resets to `Idle`
//! so the user is not left retrying against a failing store.
//!
//! ## Ordering
//!
//! States live in teloxide's [`InMemStorage`](teloxide::dispatching::dialogue::InMemStorage),
//! one dialogue per sender. The dispatcher hands updates of one chat to its
//! handlers one at a time, so a transition (registry upsert, store calls and
//! the final state write) finishes before the next message of that chat is
//! read. Different chats run concurrently.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::dialogue::{parse_reps, parse_weight, ConversationDialogue, ConversationState};
use crate::exercise_catalog::match_exact;
use crate::models::UserProfile;
use crate::store::FitnessStore;

/// What the bot should tell the user after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Exercise selected, ask for the rep count
    AskReps { exercise_name: String },
    /// Text did not match any catalog exercise
    UnknownExercise,
    /// Reps accepted, ask for the weight
    AskWeight { reps: i32 },
    InvalidReps,
    /// Set stored
    Saved {
        exercise_name: String,
        reps: i32,
        weight: f64,
    },
    InvalidWeight,
    /// The final append failed; the flow was reset
    SaveFailed,
    /// The registry or catalog could not be reached; nothing changed
    StorageUnavailable,
}

/// Drives the set-logging flow on top of a [`FitnessStore`]
pub struct ConversationMachine<S: FitnessStore + ?Sized> {
    store: Arc<S>,
}

impl<S: FitnessStore + ?Sized> ConversationMachine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Apply one free-text message from the sender behind `dialogue`
    pub async fn handle_text(
        &self,
        dialogue: &ConversationDialogue,
        profile: &UserProfile,
        text: &str,
    ) -> Reply {
        let chat_id = profile.chat_id;

        let user = match self.store.upsert_user(profile).await {
            Ok(user) => user,
            Err(e) => {
                error!(user_id = chat_id, error = %e, "Failed to upsert user");
                return Reply::StorageUnavailable;
            }
        };

        let state = match dialogue.get_or_default().await {
            Ok(state) => state,
            Err(e) => {
                error!(user_id = chat_id, error = %e, "Failed to read conversation state");
                return Reply::StorageUnavailable;
            }
        };

        let text = text.trim();
        let from = state.label();

        let (next, reply) = match &state {
            ConversationState::Idle => match self.store.list_exercises().await {
                Ok(exercises) => match match_exact(&exercises, text) {
                    Some(exercise) => (
                        ConversationState::AwaitingReps {
                            exercise_id: exercise.id,
                            exercise_name: exercise.name.clone(),
                        },
                        Reply::AskReps {
                            exercise_name: exercise.name.clone(),
                        },
                    ),
                    None => (ConversationState::Idle, Reply::UnknownExercise),
                },
                Err(e) => {
                    error!(user_id = chat_id, error = %e, "Failed to list exercises");
                    (ConversationState::Idle, Reply::StorageUnavailable)
                }
            },
            ConversationState::AwaitingReps {
                exercise_id,
                exercise_name,
            } => match parse_reps(text) {
                Ok(reps) => (
                    ConversationState::AwaitingWeight {
                        exercise_id: *exercise_id,
                        exercise_name: exercise_name.clone(),
                        reps,
                    },
                    Reply::AskWeight { reps },
                ),
                Err(reason) => {
                    debug!(user_id = chat_id, reason, "Rejected reps input");
                    (state.clone(), Reply::InvalidReps)
                }
            },
            ConversationState::AwaitingWeight {
                exercise_id,
                exercise_name,
                reps,
            } => match parse_weight(text) {
                Ok(weight) => {
                    match self
                        .store
                        .append_set(user.id, *exercise_id, weight, *reps)
                        .await
                    {
                        Ok(set) => {
                            info!(user_id = chat_id, set_id = set.id, "Set saved from conversation");
                            (
                                ConversationState::Idle,
                                Reply::Saved {
                                    exercise_name: exercise_name.clone(),
                                    reps: *reps,
                                    weight,
                                },
                            )
                        }
                        Err(e) => {
                            error!(user_id = chat_id, error = %e, "Failed to save workout set");
                            (ConversationState::Idle, Reply::SaveFailed)
                        }
                    }
                }
                Err(reason) => {
                    debug!(user_id = chat_id, reason, "Rejected weight input");
                    (state.clone(), Reply::InvalidWeight)
                }
            },
        };

        debug!(user_id = chat_id, from, to = next.label(), "Conversation transition");
        if let Err(e) = dialogue.update(next).await {
            error!(user_id = chat_id, error = %e, "Failed to store conversation state");
            return Reply::StorageUnavailable;
        }
        reply
    }
}
