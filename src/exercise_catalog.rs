//! # Exercise Catalog Module
//!
//! The fixed list of global exercises seeded at startup, and the lookup
//! helpers the conversation and commands use on top of a [`FitnessStore`].

use tracing::{debug, info};

use crate::models::{Exercise, NewExercise};
use crate::store::{FitnessStore, StoreResult};

/// Default exercises as `(name, description)` pairs
pub const DEFAULT_EXERCISES: &[(&str, &str)] = &[
    ("Приседания", "Приседания со штангой"),
    ("Жим лежа", "Жим штанги лежа"),
    ("Становая тяга", "Классическая становая тяга"),
    ("Подтягивания", "Подтягивания широким хватом"),
    ("Отжимания", "Отжимания от пола"),
    ("Жим стоя", "Армейский жим"),
    ("Тяга штанги", "Тяга штанги в наклоне"),
    ("Бицепс", "Подъем штанги на бицепс"),
    ("Трицепс", "Жим лежа узким хватом"),
    ("Планка", "Упражнение на пресс"),
];

/// Outcome of a seeding pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Ensure every default exercise exists
///
/// Check-then-insert per name; names already present (compared
/// case-insensitively) are skipped, so repeated runs insert nothing.
pub async fn seed_defaults<S: FitnessStore + ?Sized>(store: &S) -> StoreResult<SeedReport> {
    let mut report = SeedReport::default();

    for &(name, description) in DEFAULT_EXERCISES {
        if store.find_exercise_by_name(name).await?.is_some() {
            debug!(exercise = %name, "Default exercise already present, skipping");
            report.skipped += 1;
            continue;
        }

        store
            .insert_exercise(NewExercise {
                name,
                description,
                is_standard: true,
            })
            .await?;
        debug!(exercise = %name, "Default exercise added");
        report.inserted += 1;
    }

    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        total = DEFAULT_EXERCISES.len(),
        "Exercise catalog seeded"
    );
    Ok(report)
}

/// Exact, case-sensitive match against a catalog listing
pub fn match_exact<'a>(exercises: &'a [Exercise], text: &str) -> Option<&'a Exercise> {
    exercises.iter().find(|exercise| exercise.name == text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn exercise(id: i64, name: &str) -> Exercise {
        Exercise {
            id,
            name: name.to_string(),
            description: String::new(),
            is_standard: true,
            user_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_default_names_are_unique() {
        let mut names: Vec<String> = DEFAULT_EXERCISES
            .iter()
            .map(|(name, _)| name.to_lowercase())
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), DEFAULT_EXERCISES.len());
    }

    #[test]
    fn test_match_exact_is_case_sensitive() {
        let catalog = vec![exercise(1, "Жим лежа"), exercise(2, "Планка")];

        assert_eq!(match_exact(&catalog, "Жим лежа").map(|e| e.id), Some(1));
        assert!(match_exact(&catalog, "жим лежа").is_none());
        assert!(match_exact(&catalog, "Жим").is_none());
    }
}
