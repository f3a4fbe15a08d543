//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::conversation::Reply;
use crate::localization::{t_args_lang, t_lang};
use crate::models::{Exercise, SetRecord};
use crate::stats::WorkoutSummary;

/// Buttons per keyboard row
const EXERCISES_PER_ROW: usize = 2;

/// Format a weight with one decimal, e.g. `60.0`
pub fn format_weight(weight: f64) -> String {
    format!("{:.1}", weight)
}

/// Reply keyboard with one button per exercise, two per row
pub fn create_exercise_keyboard(exercises: &[Exercise]) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = exercises
        .chunks(EXERCISES_PER_ROW)
        .map(|chunk| {
            chunk
                .iter()
                .map(|exercise| KeyboardButton::new(exercise.name.clone()))
                .collect()
        })
        .collect();

    KeyboardMarkup::new(rows).resize_keyboard()
}

/// Render a conversation reply as text
pub fn render_reply(reply: &Reply, language_code: Option<&str>) -> String {
    match reply {
        Reply::AskReps { exercise_name } => {
            t_args_lang("ask-reps", &[("exercise", exercise_name)], language_code)
        }
        Reply::UnknownExercise => t_lang("unknown-exercise", language_code),
        Reply::AskWeight { reps } => {
            t_args_lang("ask-weight", &[("reps", &reps.to_string())], language_code)
        }
        Reply::InvalidReps => t_lang("invalid-reps", language_code),
        Reply::Saved {
            exercise_name,
            reps,
            weight,
        } if *weight <= 0.0 => t_args_lang(
            "set-saved-bodyweight",
            &[("exercise", exercise_name), ("reps", &reps.to_string())],
            language_code,
        ),
        Reply::Saved {
            exercise_name,
            reps,
            weight,
        } => t_args_lang(
            "set-saved",
            &[
                ("exercise", exercise_name),
                ("reps", &reps.to_string()),
                ("weight", &format_weight(*weight)),
            ],
            language_code,
        ),
        Reply::InvalidWeight => t_lang("invalid-weight", language_code),
        Reply::SaveFailed => t_lang("save-failed", language_code),
        Reply::StorageUnavailable => t_lang("storage-unavailable", language_code),
    }
}

/// "• name - description" per exercise
pub fn format_exercise_list(exercises: &[Exercise], language_code: Option<&str>) -> String {
    if exercises.is_empty() {
        return t_lang("catalog-empty", language_code);
    }

    let mut result = format!("{}\n\n", t_lang("exercises-title", language_code));
    for exercise in exercises {
        result.push_str(&format!("• {}", exercise.name));
        if !exercise.description.is_empty() {
            result.push_str(&format!(" - {}", exercise.description));
        }
        result.push('\n');
    }

    result
}

/// Recent sets, newest first, each followed by its `dd.mm HH:MM` timestamp
pub fn format_history(sets: &[SetRecord], language_code: Option<&str>) -> String {
    if sets.is_empty() {
        return t_lang("history-empty", language_code);
    }

    let mut result = format!("{}\n\n", t_lang("history-title", language_code));
    for set in sets {
        let reps = set.reps.to_string();
        let line = if set.is_bodyweight() {
            t_args_lang(
                "history-entry-bodyweight",
                &[("exercise", &set.exercise_name), ("reps", &reps)],
                language_code,
            )
        } else {
            t_args_lang(
                "history-entry-weighted",
                &[
                    ("exercise", &set.exercise_name),
                    ("weight", &format_weight(set.weight)),
                    ("reps", &reps),
                ],
                language_code,
            )
        };
        result.push_str(&format!(
            "{}\n  {}\n",
            line,
            set.created_at.format("%d.%m %H:%M")
        ));
    }

    result
}

pub fn format_summary(summary: &WorkoutSummary, language_code: Option<&str>) -> String {
    if summary.is_empty() {
        return t_lang("stats-empty", language_code);
    }

    let mut lines = vec![
        t_lang("stats-title", language_code),
        String::new(),
        t_args_lang(
            "stats-total-sets",
            &[("count", &summary.total_sets.to_string())],
            language_code,
        ),
        t_args_lang(
            "stats-total-reps",
            &[("count", &summary.total_reps.to_string())],
            language_code,
        ),
        t_args_lang(
            "stats-total-volume",
            &[("volume", &format_weight(summary.total_volume))],
            language_code,
        ),
        String::new(),
        t_lang("stats-frequency-title", language_code),
    ];

    for (exercise, count) in &summary.frequency {
        lines.push(t_args_lang(
            "stats-frequency-entry",
            &[("exercise", exercise), ("count", &count.to_string())],
            language_code,
        ));
    }

    lines.join("\n")
}
