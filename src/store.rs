//! Persistence seam shared by the Postgres store and the in-memory store.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::models::{DailyAggregate, Exercise, NewExercise, SetRecord, User, UserProfile, WorkoutSet};

pub type StoreResult<T> = Result<T, StoreError>;

/// Operations of the user registry, exercise catalog and workout log
#[async_trait]
pub trait FitnessStore: Send + Sync {
    /// Insert or refresh a user keyed by chat id, returning the current row
    async fn upsert_user(&self, profile: &UserProfile) -> StoreResult<User>;

    async fn find_user(&self, chat_id: i64) -> StoreResult<Option<User>>;

    /// All exercises ordered by name
    async fn list_exercises(&self) -> StoreResult<Vec<Exercise>>;

    /// Case-insensitive lookup
    async fn find_exercise_by_name(&self, name: &str) -> StoreResult<Option<Exercise>>;

    async fn find_exercise_by_id(&self, id: i64) -> StoreResult<Option<Exercise>>;

    /// Insert a global catalog entry
    async fn insert_exercise(&self, exercise: NewExercise<'_>) -> StoreResult<Exercise>;

    /// Append one immutable set
    ///
    /// Fails when `user_id` or `exercise_id` does not reference an existing row.
    async fn append_set(
        &self,
        user_id: i64,
        exercise_id: i64,
        weight: f64,
        reps: i32,
    ) -> StoreResult<WorkoutSet>;

    /// Most recent sets first, at most `limit`
    async fn recent_sets(&self, user_id: i64, limit: i64) -> StoreResult<Vec<SetRecord>>;

    /// Daily aggregates over the last `window_days`, oldest day first
    async fn aggregate_by_day(
        &self,
        user_id: i64,
        exercise_id: i64,
        window_days: i32,
    ) -> StoreResult<Vec<DailyAggregate>>;
}
