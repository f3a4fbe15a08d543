//! Summary statistics over a user's recent sets, as shown by `/stats`.

use std::collections::HashMap;

use crate::models::SetRecord;

/// Totals and per-exercise frequency over a sample of sets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutSummary {
    pub total_sets: usize,
    pub total_reps: i64,
    /// Sum of weight × reps, kilograms
    pub total_volume: f64,
    /// `(exercise name, set count)`, most frequent first, ties by name
    pub frequency: Vec<(String, usize)>,
}

impl WorkoutSummary {
    pub fn is_empty(&self) -> bool {
        self.total_sets == 0
    }
}

pub fn summarize(sets: &[SetRecord]) -> WorkoutSummary {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut summary = WorkoutSummary {
        total_sets: sets.len(),
        ..Default::default()
    };

    for set in sets {
        *counts.entry(set.exercise_name.as_str()).or_default() += 1;
        summary.total_reps += i64::from(set.reps);
        summary.total_volume += set.volume();
    }

    let mut frequency: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    frequency.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    summary.frequency = frequency;

    summary
}
