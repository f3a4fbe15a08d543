//! In-memory [`FitnessStore`] used by tests and local experiments.
//!
//! Mirrors the Postgres contract: chat ids are unique, exercise names are
//! unique case-insensitively, sets must reference existing rows. Failures
//! can be injected per operation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

use crate::errors::StoreError;
use crate::models::{DailyAggregate, Exercise, NewExercise, SetRecord, User, UserProfile, WorkoutSet};
use crate::store::{FitnessStore, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    exercises: Vec<Exercise>,
    sets: Vec<WorkoutSet>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_upserts: AtomicBool,
    fail_appends: AtomicBool,
}

fn injected(operation: &str) -> StoreError {
    StoreError::Database(sqlx::Error::Protocol(format!("injected failure: {operation}")))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `upsert_user` call fail
    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Make every `append_set` call fail
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a set with an explicit timestamp, bypassing failure injection
    pub fn insert_set_at(
        &self,
        user_id: i64,
        exercise_id: i64,
        weight: f64,
        reps: i32,
        created_at: DateTime<Utc>,
    ) -> WorkoutSet {
        let mut tables = self.tables();
        let set = WorkoutSet {
            id: tables.next_id(),
            user_id,
            exercise_id,
            weight,
            reps,
            created_at,
        };
        tables.sets.push(set.clone());
        set
    }

    pub fn set_count(&self) -> usize {
        self.tables().sets.len()
    }

    pub fn exercise_count(&self) -> usize {
        self.tables().exercises.len()
    }
}

fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&at.date_naive().and_time(NaiveTime::default()))
}

#[async_trait]
impl FitnessStore for MemoryStore {
    async fn upsert_user(&self, profile: &UserProfile) -> StoreResult<User> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(injected("upsert_user"));
        }

        let mut tables = self.tables();
        let now = Utc::now();
        if let Some(user) = tables.users.iter_mut().find(|u| u.chat_id == profile.chat_id) {
            user.username = profile.username.clone();
            user.first_name = profile.first_name.clone();
            user.last_name = profile.last_name.clone();
            user.updated_at = now;
            return Ok(user.clone());
        }

        let user = User {
            id: tables.next_id(),
            chat_id: profile.chat_id,
            username: profile.username.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, chat_id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.chat_id == chat_id).cloned())
    }

    async fn list_exercises(&self) -> StoreResult<Vec<Exercise>> {
        let mut exercises = self.tables().exercises.clone();
        exercises.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(exercises)
    }

    async fn find_exercise_by_name(&self, name: &str) -> StoreResult<Option<Exercise>> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .tables()
            .exercises
            .iter()
            .find(|e| e.name.to_lowercase() == wanted)
            .cloned())
    }

    async fn find_exercise_by_id(&self, id: i64) -> StoreResult<Option<Exercise>> {
        Ok(self.tables().exercises.iter().find(|e| e.id == id).cloned())
    }

    async fn insert_exercise(&self, exercise: NewExercise<'_>) -> StoreResult<Exercise> {
        let mut tables = self.tables();
        let lowered = exercise.name.to_lowercase();
        if tables.exercises.iter().any(|e| e.name.to_lowercase() == lowered) {
            return Err(StoreError::Database(sqlx::Error::Protocol(format!(
                "duplicate exercise name: {}",
                exercise.name
            ))));
        }

        let row = Exercise {
            id: tables.next_id(),
            name: exercise.name.to_string(),
            description: exercise.description.to_string(),
            is_standard: exercise.is_standard,
            user_id: None,
            created_at: Utc::now(),
        };
        tables.exercises.push(row.clone());
        Ok(row)
    }

    async fn append_set(
        &self,
        user_id: i64,
        exercise_id: i64,
        weight: f64,
        reps: i32,
    ) -> StoreResult<WorkoutSet> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(injected("append_set"));
        }

        {
            let tables = self.tables();
            if !tables.users.iter().any(|u| u.id == user_id) {
                return Err(StoreError::ForeignKey {
                    entity: "user",
                    id: user_id,
                });
            }
            if !tables.exercises.iter().any(|e| e.id == exercise_id) {
                return Err(StoreError::ForeignKey {
                    entity: "exercise",
                    id: exercise_id,
                });
            }
        }

        Ok(self.insert_set_at(user_id, exercise_id, weight, reps, Utc::now()))
    }

    async fn recent_sets(&self, user_id: i64, limit: i64) -> StoreResult<Vec<SetRecord>> {
        let tables = self.tables();
        let mut records: Vec<SetRecord> = tables
            .sets
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| {
                let exercise = tables.exercises.iter().find(|e| e.id == s.exercise_id)?;
                Some(SetRecord {
                    id: s.id,
                    exercise_id: s.exercise_id,
                    exercise_name: exercise.name.clone(),
                    weight: s.weight,
                    reps: s.reps,
                    created_at: s.created_at,
                })
            })
            .collect();

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        records.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(records)
    }

    async fn aggregate_by_day(
        &self,
        user_id: i64,
        exercise_id: i64,
        window_days: i32,
    ) -> StoreResult<Vec<DailyAggregate>> {
        let since = Utc::now() - Duration::days(i64::from(window_days.max(0)));
        let tables = self.tables();

        // day -> (volume, weight sum, reps sum, count)
        let mut days: BTreeMap<DateTime<Utc>, (f64, f64, f64, i64)> = BTreeMap::new();
        for set in tables
            .sets
            .iter()
            .filter(|s| s.user_id == user_id && s.exercise_id == exercise_id && s.created_at >= since)
        {
            let entry = days.entry(start_of_day(set.created_at)).or_default();
            entry.0 += set.weight * f64::from(set.reps);
            entry.1 += set.weight;
            entry.2 += f64::from(set.reps);
            entry.3 += 1;
        }

        Ok(days
            .into_iter()
            .map(|(day, (volume, weight_sum, reps_sum, count))| DailyAggregate {
                day,
                total_volume: volume,
                avg_weight: weight_sum / count as f64,
                avg_reps: reps_sum / count as f64,
                set_count: count,
            })
            .collect())
    }
}
