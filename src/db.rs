use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use crate::config::BotConfig;
use crate::errors::StoreError;
use crate::models::{DailyAggregate, Exercise, NewExercise, SetRecord, User, UserProfile, WorkoutSet};
use crate::store::{FitnessStore, StoreResult};

const USER_COLUMNS: &str = "id, chat_id, username, first_name, last_name, created_at, updated_at";
const EXERCISE_COLUMNS: &str = "id, name, description, is_standard, user_id, created_at";

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> StoreResult<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            chat_id BIGINT NOT NULL UNIQUE,
            username TEXT,
            first_name TEXT,
            last_name TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS exercises (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            is_standard BOOLEAN NOT NULL DEFAULT FALSE,
            user_id BIGINT REFERENCES users(id),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS exercises_name_lower_idx ON exercises (LOWER(name))")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS workout_sets (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id),
            exercise_id BIGINT NOT NULL REFERENCES exercises(id),
            weight DOUBLE PRECISION NOT NULL CHECK (weight >= 0),
            reps INTEGER NOT NULL CHECK (reps > 0),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS workout_sets_user_created_idx
         ON workout_sets (user_id, created_at DESC)",
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Postgres-backed store; every round-trip is bounded by `timeout`
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Open a connection pool using the bot configuration
    pub async fn connect(config: &BotConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_timeout)
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool, config.db_timeout))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => {
                debug!(operation, timeout_secs = self.timeout.as_secs(), "Database call timed out");
                Err(StoreError::Timeout {
                    secs: self.timeout.as_secs(),
                })
            }
        }
    }
}

/// Map a foreign-key violation on `workout_sets` to the entity it names
fn classify_append_error(err: StoreError, user_id: i64, exercise_id: i64) -> StoreError {
    if let StoreError::Database(sqlx::Error::Database(db_err)) = &err {
        if db_err.is_foreign_key_violation() {
            return match db_err.constraint() {
                Some(name) if name.contains("exercise") => StoreError::ForeignKey {
                    entity: "exercise",
                    id: exercise_id,
                },
                _ => StoreError::ForeignKey {
                    entity: "user",
                    id: user_id,
                },
            };
        }
    }
    err
}

#[async_trait]
impl FitnessStore for PgStore {
    async fn upsert_user(&self, profile: &UserProfile) -> StoreResult<User> {
        let query = format!(
            "INSERT INTO users (chat_id, username, first_name, last_name)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (chat_id) DO UPDATE SET
                 username = EXCLUDED.username,
                 first_name = EXCLUDED.first_name,
                 last_name = EXCLUDED.last_name,
                 updated_at = NOW()
             RETURNING {USER_COLUMNS}"
        );
        let user = self
            .timed(
                "upsert_user",
                sqlx::query_as::<_, User>(&query)
                    .bind(profile.chat_id)
                    .bind(&profile.username)
                    .bind(&profile.first_name)
                    .bind(&profile.last_name)
                    .fetch_one(&self.pool),
            )
            .await?;
        debug!(user_id = user.id, chat_id = user.chat_id, "User upserted");
        Ok(user)
    }

    async fn find_user(&self, chat_id: i64) -> StoreResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE chat_id = $1");
        self.timed(
            "find_user",
            sqlx::query_as::<_, User>(&query)
                .bind(chat_id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn list_exercises(&self) -> StoreResult<Vec<Exercise>> {
        let query = format!("SELECT {EXERCISE_COLUMNS} FROM exercises ORDER BY name");
        self.timed(
            "list_exercises",
            sqlx::query_as::<_, Exercise>(&query).fetch_all(&self.pool),
        )
        .await
    }

    async fn find_exercise_by_name(&self, name: &str) -> StoreResult<Option<Exercise>> {
        let query =
            format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE LOWER(name) = LOWER($1)");
        self.timed(
            "find_exercise_by_name",
            sqlx::query_as::<_, Exercise>(&query)
                .bind(name.trim())
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn find_exercise_by_id(&self, id: i64) -> StoreResult<Option<Exercise>> {
        let query = format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = $1");
        self.timed(
            "find_exercise_by_id",
            sqlx::query_as::<_, Exercise>(&query)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn insert_exercise(&self, exercise: NewExercise<'_>) -> StoreResult<Exercise> {
        let query = format!(
            "INSERT INTO exercises (name, description, is_standard, user_id)
             VALUES ($1, $2, $3, NULL)
             RETURNING {EXERCISE_COLUMNS}"
        );
        self.timed(
            "insert_exercise",
            sqlx::query_as::<_, Exercise>(&query)
                .bind(exercise.name)
                .bind(exercise.description)
                .bind(exercise.is_standard)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn append_set(
        &self,
        user_id: i64,
        exercise_id: i64,
        weight: f64,
        reps: i32,
    ) -> StoreResult<WorkoutSet> {
        let result = self
            .timed(
                "append_set",
                sqlx::query_as::<_, WorkoutSet>(
                    "INSERT INTO workout_sets (user_id, exercise_id, weight, reps)
                     VALUES ($1, $2, $3, $4)
                     RETURNING id, user_id, exercise_id, weight, reps, created_at",
                )
                .bind(user_id)
                .bind(exercise_id)
                .bind(weight)
                .bind(reps)
                .fetch_one(&self.pool),
            )
            .await;

        match result {
            Ok(set) => {
                info!(set_id = set.id, user_id, exercise_id, reps, weight, "Workout set recorded");
                Ok(set)
            }
            Err(e) => Err(classify_append_error(e, user_id, exercise_id)),
        }
    }

    async fn recent_sets(&self, user_id: i64, limit: i64) -> StoreResult<Vec<SetRecord>> {
        self.timed(
            "recent_sets",
            sqlx::query_as::<_, SetRecord>(
                "SELECT ws.id, ws.exercise_id, e.name AS exercise_name,
                        ws.weight, ws.reps, ws.created_at
                 FROM workout_sets ws
                 JOIN exercises e ON ws.exercise_id = e.id
                 WHERE ws.user_id = $1
                 ORDER BY ws.created_at DESC, ws.id DESC
                 LIMIT $2",
            )
            .bind(user_id)
            .bind(limit.max(0))
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn aggregate_by_day(
        &self,
        user_id: i64,
        exercise_id: i64,
        window_days: i32,
    ) -> StoreResult<Vec<DailyAggregate>> {
        self.timed(
            "aggregate_by_day",
            sqlx::query_as::<_, DailyAggregate>(
                "SELECT DATE_TRUNC('day', ws.created_at)             AS day,
                        COALESCE(SUM(ws.weight * ws.reps), 0)::FLOAT8 AS total_volume,
                        COALESCE(AVG(ws.weight), 0)::FLOAT8           AS avg_weight,
                        COALESCE(AVG(ws.reps), 0)::FLOAT8             AS avg_reps,
                        COUNT(*)                                      AS set_count
                 FROM workout_sets ws
                 WHERE ws.user_id = $1
                   AND ws.exercise_id = $2
                   AND ws.created_at >= NOW() - make_interval(days => $3)
                 GROUP BY day
                 ORDER BY day ASC",
            )
            .bind(user_id)
            .bind(exercise_id)
            .bind(window_days.max(0))
            .fetch_all(&self.pool),
        )
        .await
    }
}
