//! Command Handler module for slash commands

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error};

use crate::chart::render_progress_chart;
use crate::dialogue::{reset_dialogue, ConversationDialogue};
use crate::localization::{t_args_lang, t_lang};
use crate::models::{User, UserProfile};
use crate::stats::summarize;

use super::ui_builder::{create_exercise_keyboard, format_exercise_list, format_history, format_summary};
use super::{language_code, profile_from_message, send_response, AppState, Response, SharedState};

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "start and show help")]
    Start,
    #[command(description = "show help")]
    Help,
    #[command(description = "log a set")]
    Add,
    #[command(description = "list exercises")]
    Exercises,
    #[command(description = "recent sets")]
    History,
    #[command(description = "workout statistics")]
    Stats,
    #[command(description = "progress chart for one exercise")]
    Progress(String),
    #[command(description = "abort the current entry")]
    Cancel,
}

/// Handle a parsed command and send the reply
pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: ConversationDialogue,
    state: SharedState,
) -> Result<()> {
    debug!(user_id = %msg.chat.id, command = ?cmd, "Received command");

    let profile = profile_from_message(&msg);
    let response = respond_to_command(&state, &dialogue, &profile, language_code(&msg), cmd).await;
    send_response(&bot, msg.chat.id, response).await
}

/// Compute the reply to a command
///
/// Every command refreshes the sender's registry entry first.
pub async fn respond_to_command(
    state: &AppState,
    dialogue: &ConversationDialogue,
    profile: &UserProfile,
    language_code: Option<&str>,
    cmd: Command,
) -> Response {
    let user = match state.store.upsert_user(profile).await {
        Ok(user) => user,
        Err(e) => {
            error!(user_id = profile.chat_id, error = %e, "Failed to upsert user");
            return Response::Text(t_lang("storage-unavailable", language_code));
        }
    };

    match cmd {
        Command::Start => Response::Text(format!(
            "{}\n\n{}",
            t_args_lang("welcome", &[("name", &user.display_name())], language_code),
            t_lang("help-text", language_code)
        )),
        Command::Help => Response::Text(t_lang("help-text", language_code)),
        Command::Add => add_response(state, dialogue, language_code).await,
        Command::Exercises => exercises_response(state, language_code).await,
        Command::History => history_response(state, &user, language_code).await,
        Command::Stats => stats_response(state, &user, language_code).await,
        Command::Progress(name) => progress_response(state, &user, &name, language_code).await,
        Command::Cancel => {
            reset_dialogue(dialogue).await;
            Response::RemoveKeyboard(t_lang("cancelled", language_code))
        }
    }
}

/// Restart the set flow and offer the exercise picker
async fn add_response(
    state: &AppState,
    dialogue: &ConversationDialogue,
    language_code: Option<&str>,
) -> Response {
    reset_dialogue(dialogue).await;

    match state.store.list_exercises().await {
        Ok(exercises) if exercises.is_empty() => {
            Response::Text(t_lang("catalog-empty", language_code))
        }
        Ok(exercises) => Response::Keyboard {
            text: t_lang("choose-exercise", language_code),
            keyboard: create_exercise_keyboard(&exercises),
        },
        Err(e) => {
            error!(user_id = %dialogue.chat_id(), error = %e, "Failed to list exercises");
            Response::Text(t_lang("storage-unavailable", language_code))
        }
    }
}

async fn exercises_response(state: &AppState, language_code: Option<&str>) -> Response {
    match state.store.list_exercises().await {
        Ok(exercises) => Response::Text(format_exercise_list(&exercises, language_code)),
        Err(e) => {
            error!(error = %e, "Failed to list exercises");
            Response::Text(t_lang("storage-unavailable", language_code))
        }
    }
}

async fn history_response(state: &AppState, user: &User, language_code: Option<&str>) -> Response {
    match state
        .store
        .recent_sets(user.id, state.limits.history_limit)
        .await
    {
        Ok(sets) => Response::Text(format_history(&sets, language_code)),
        Err(e) => {
            error!(user_id = user.chat_id, error = %e, "Failed to load workout history");
            Response::Text(t_lang("storage-unavailable", language_code))
        }
    }
}

async fn stats_response(state: &AppState, user: &User, language_code: Option<&str>) -> Response {
    match state
        .store
        .recent_sets(user.id, state.limits.stats_sample_size)
        .await
    {
        Ok(sets) => Response::Text(format_summary(&summarize(&sets), language_code)),
        Err(e) => {
            error!(user_id = user.chat_id, error = %e, "Failed to load statistics");
            Response::Text(t_lang("storage-unavailable", language_code))
        }
    }
}

async fn progress_response(
    state: &AppState,
    user: &User,
    name: &str,
    language_code: Option<&str>,
) -> Response {
    let name = name.trim();
    if name.is_empty() {
        return Response::Text(t_lang("progress-usage", language_code));
    }

    let exercise = match state.store.find_exercise_by_name(name).await {
        Ok(Some(exercise)) => exercise,
        Ok(None) => return Response::Text(t_lang("unknown-exercise", language_code)),
        Err(e) => {
            error!(user_id = user.chat_id, error = %e, "Failed to look up exercise");
            return Response::Text(t_lang("storage-unavailable", language_code));
        }
    };

    let window_days = state.limits.progress_window_days;
    let points = match state
        .store
        .aggregate_by_day(user.id, exercise.id, window_days)
        .await
    {
        Ok(points) => points,
        Err(e) => {
            error!(user_id = user.chat_id, error = %e, "Failed to aggregate progress");
            return Response::Text(t_lang("storage-unavailable", language_code));
        }
    };

    if points.len() < 2 {
        return Response::Text(t_args_lang(
            "progress-not-enough-data",
            &[("exercise", &exercise.name)],
            language_code,
        ));
    }

    match render_progress_chart(&points) {
        Ok(png) => Response::Photo {
            png,
            caption: t_args_lang(
                "progress-caption",
                &[("exercise", &exercise.name), ("days", &window_days.to_string())],
                language_code,
            ),
        },
        Err(e) => {
            error!(user_id = user.chat_id, error = %e, "Failed to render progress chart");
            Response::Text(t_lang("storage-unavailable", language_code))
        }
    }
}
