//! # Workout Data Model
//!
//! Rows of the three persisted tables plus the read models the commands
//! format: a set joined with its exercise name and a per-day aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered chat user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// Telegram identity of the sender (unique); the chat id in private chats
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name used when addressing the user in replies
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name, &self.username) {
            (Some(first), Some(last), _) => format!("{} {}", first, last),
            (Some(first), None, _) => first.clone(),
            (None, _, Some(username)) => username.clone(),
            _ => self.chat_id.to_string(),
        }
    }
}

/// Display-name fields sent with every inbound message
///
/// Upserted into the registry on each interaction, last write wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Registry key, see [`crate::bot::registry_key`]
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserProfile {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            ..Default::default()
        }
    }
}

/// An exercise definition from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_standard: bool,
    /// Owning user, `None` for global exercises
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct NewExercise<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub is_standard: bool,
}

/// One recorded set; rows are append-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkoutSet {
    pub id: i64,
    pub user_id: i64,
    pub exercise_id: i64,
    /// Load in kilograms, 0 for bodyweight
    pub weight: f64,
    pub reps: i32,
    pub created_at: DateTime<Utc>,
}

/// A set joined with the name of its exercise, as shown by `/history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SetRecord {
    pub id: i64,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub weight: f64,
    pub reps: i32,
    pub created_at: DateTime<Utc>,
}

impl SetRecord {
    pub fn is_bodyweight(&self) -> bool {
        self.weight <= 0.0
    }

    /// Weight times reps
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

/// Per-day aggregate for one user and exercise, drives the progress chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyAggregate {
    /// Start of the day (UTC)
    pub day: DateTime<Utc>,
    /// Sum of weight × reps
    pub total_volume: f64,
    pub avg_weight: f64,
    pub avg_reps: f64,
    pub set_count: i64,
}
