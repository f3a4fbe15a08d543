//! # Liftlog Telegram Bot
//!
//! A Telegram bot that logs weightlifting sets. Users pick an exercise from
//! a shared catalog, type the reps and the weight, and can review their
//! history, summary statistics and a per-exercise progress chart.

pub mod bot;
pub mod chart;
pub mod config;
pub mod conversation;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod exercise_catalog;
pub mod localization;
pub mod models;
pub mod stats;
pub mod store;
pub mod testing;
