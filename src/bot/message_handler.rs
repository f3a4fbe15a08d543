//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{debug, error, warn};

use crate::conversation::Reply;
use crate::dialogue::ConversationDialogue;
use crate::localization::t_lang;

use super::ui_builder::{create_exercise_keyboard, render_reply};
use super::{language_code, profile_from_message, send_response, AppState, Response, SharedState};

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: ConversationDialogue,
    state: SharedState,
) -> Result<()> {
    let language_code = language_code(&msg);

    let response = match msg.text() {
        Some(text) => {
            debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message");
            let profile = profile_from_message(&msg);
            let reply = state.machine.handle_text(&dialogue, &profile, text).await;
            response_for_reply(&state, &reply, language_code).await
        }
        None => {
            warn!(user_id = %msg.chat.id, "Received unsupported message type");
            Response::Text(t_lang("unsupported-message", language_code))
        }
    };

    send_response(&bot, msg.chat.id, response).await
}

/// Attach the right keyboard to a conversation reply
///
/// The picker is hidden while reps and weight are typed, and offered again
/// once a set is saved so the next one is a tap away.
pub async fn response_for_reply(
    state: &AppState,
    reply: &Reply,
    language_code: Option<&str>,
) -> Response {
    let text = render_reply(reply, language_code);

    match reply {
        Reply::AskReps { .. } => Response::RemoveKeyboard(text),
        Reply::Saved { .. } => match state.store.list_exercises().await {
            Ok(exercises) if !exercises.is_empty() => Response::Keyboard {
                text: format!("{}\n\n{}", text, t_lang("set-next", language_code)),
                keyboard: create_exercise_keyboard(&exercises),
            },
            Ok(_) => Response::Text(text),
            Err(e) => {
                error!(error = %e, "Failed to list exercises after save");
                Response::Text(text)
            }
        },
        _ => Response::Text(text),
    }
}
