//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `command_handler`: Handles slash commands (`/start`, `/add`, `/history`, ...)
//! - `message_handler`: Routes free text through the conversation state machine
//! - `ui_builder`: Creates keyboards and formats messages
//!
//! Handlers first compute a [`Response`] from the shared [`AppState`] and only
//! then talk to Telegram, so the reply logic is testable without a bot.

pub mod command_handler;
pub mod message_handler;
pub mod ui_builder;

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InputFile, KeyboardMarkup, KeyboardRemove, UserId};

use crate::config::QueryLimits;
use crate::conversation::ConversationMachine;
use crate::dialogue::{sender_dialogue, ConversationDialogue, ConversationStorage};
use crate::models::UserProfile;
use crate::store::FitnessStore;

// Re-export main handler functions for use in main.rs
pub use command_handler::{command_handler, Command};
pub use message_handler::message_handler;

/// Shared state injected into every handler
pub struct AppState {
    pub store: Arc<dyn FitnessStore>,
    pub machine: ConversationMachine<dyn FitnessStore>,
    pub limits: QueryLimits,
}

impl AppState {
    pub fn new(store: Arc<dyn FitnessStore>, limits: QueryLimits) -> Self {
        Self {
            machine: ConversationMachine::new(Arc::clone(&store)),
            store,
            limits,
        }
    }
}

/// What a handler wants sent back to the chat
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Text(String),
    /// Text with a reply keyboard attached
    Keyboard { text: String, keyboard: KeyboardMarkup },
    /// Text that also hides any reply keyboard
    RemoveKeyboard(String),
    /// PNG image with a caption
    Photo { png: Vec<u8>, caption: String },
}

impl Response {
    /// The text part of the response
    pub fn text(&self) -> &str {
        match self {
            Response::Text(text) | Response::RemoveKeyboard(text) => text,
            Response::Keyboard { text, .. } => text,
            Response::Photo { caption, .. } => caption,
        }
    }
}

/// Registry and dialogue key of a sender
///
/// The Telegram user id when known, so members of a group chat keep separate
/// rows and separate in-progress sets. Falls back to the chat id for
/// messages without a sender (channel posts).
pub fn registry_key(sender: Option<UserId>, chat_id: ChatId) -> i64 {
    sender
        .and_then(|UserId(id)| i64::try_from(id).ok())
        .unwrap_or(chat_id.0)
}

/// Registry fields of the message sender
pub fn profile_from_message(msg: &Message) -> UserProfile {
    let sender = msg.from.as_ref().map(|user| user.id);
    let mut profile = UserProfile::new(registry_key(sender, msg.chat.id));
    if let Some(user) = msg.from.as_ref() {
        profile.username = user.username.clone();
        profile.first_name = Some(user.first_name.clone()).filter(|name| !name.is_empty());
        profile.last_name = user.last_name.clone();
    }
    profile
}

/// Dialogue of the message sender, injected into handlers by the dispatcher
pub fn dialogue_for_sender(msg: Message, storage: Arc<ConversationStorage>) -> ConversationDialogue {
    sender_dialogue(storage, profile_from_message(&msg).chat_id)
}

/// Extract user's language code from Telegram
pub fn language_code(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_ref())
        .map(|s| s.as_str())
}

pub async fn send_response(bot: &Bot, chat_id: ChatId, response: Response) -> Result<()> {
    match response {
        Response::Text(text) => {
            bot.send_message(chat_id, text).await?;
        }
        Response::Keyboard { text, keyboard } => {
            bot.send_message(chat_id, text).reply_markup(keyboard).await?;
        }
        Response::RemoveKeyboard(text) => {
            bot.send_message(chat_id, text)
                .reply_markup(KeyboardRemove::new())
                .await?;
        }
        Response::Photo { png, caption } => {
            bot.send_photo(chat_id, InputFile::memory(png).file_name("progress.png"))
                .caption(caption)
                .await?;
        }
    }
    Ok(())
}

/// Shared state handle as stored in the dispatcher dependencies
pub type SharedState = Arc<AppState>;
