use std::sync::Arc;

use anyhow::Result;

use liftlog_bot::conversation::{ConversationMachine, Reply};
use liftlog_bot::dialogue::{
    reset_dialogue, sender_dialogue, ConversationDialogue, ConversationState, ConversationStorage,
};
use liftlog_bot::exercise_catalog::{seed_defaults, DEFAULT_EXERCISES};
use liftlog_bot::models::UserProfile;
use liftlog_bot::store::FitnessStore;
use liftlog_bot::testing::MemoryStore;

/// Machine plus a helper that feeds one sender's text through its dialogue
struct Harness {
    store: Arc<MemoryStore>,
    machine: ConversationMachine<MemoryStore>,
    storage: Arc<ConversationStorage>,
}

impl Harness {
    fn dialogue(&self, chat_id: i64) -> ConversationDialogue {
        sender_dialogue(self.storage.clone(), chat_id)
    }

    async fn send(&self, user: &UserProfile, text: &str) -> Reply {
        self.machine
            .handle_text(&self.dialogue(user.chat_id), user, text)
            .await
    }

    async fn state(&self, chat_id: i64) -> Option<ConversationState> {
        self.dialogue(chat_id).get().await.ok().flatten()
    }
}

async fn seeded_machine() -> Result<Harness> {
    let store = Arc::new(MemoryStore::new());
    seed_defaults(store.as_ref()).await?;
    let machine = ConversationMachine::new(Arc::clone(&store));
    Ok(Harness {
        store,
        machine,
        storage: ConversationStorage::new(),
    })
}

fn profile(chat_id: i64) -> UserProfile {
    let mut profile = UserProfile::new(chat_id);
    profile.first_name = Some("Anna".to_string());
    profile
}

/// Full flow: exercise, reps, weight, then the set is readable back
#[tokio::test]
async fn test_bench_press_set_is_logged() -> Result<()> {
    let h = seeded_machine().await?;
    let anna = profile(42);

    assert_eq!(
        h.send(&anna, "Жим лежа").await,
        Reply::AskReps {
            exercise_name: "Жим лежа".to_string()
        }
    );
    assert_eq!(h.send(&anna, "8").await, Reply::AskWeight { reps: 8 });
    assert_eq!(
        h.send(&anna, "60").await,
        Reply::Saved {
            exercise_name: "Жим лежа".to_string(),
            reps: 8,
            weight: 60.0
        }
    );
    assert_eq!(h.state(42).await, Some(ConversationState::Idle));

    let user = h.store.find_user(42).await?.expect("user registered");
    let recent = h.store.recent_sets(user.id, 1).await?;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].exercise_name, "Жим лежа");
    assert_eq!(recent[0].reps, 8);
    assert_eq!(recent[0].weight, 60.0);

    Ok(())
}

#[tokio::test]
async fn test_invalid_reps_keep_state() -> Result<()> {
    let h = seeded_machine().await?;
    let user = profile(7);

    h.send(&user, "Приседания").await;
    for input in ["abc", "0", "-3", "", "8.5"] {
        assert_eq!(h.send(&user, input).await, Reply::InvalidReps);
    }

    assert!(matches!(
        h.state(7).await,
        Some(ConversationState::AwaitingReps { ref exercise_name, .. }) if exercise_name == "Приседания"
    ));

    Ok(())
}

#[tokio::test]
async fn test_invalid_weight_keeps_state_and_comma_is_accepted() -> Result<()> {
    let h = seeded_machine().await?;
    let user = profile(8);

    h.send(&user, "Становая тяга").await;
    h.send(&user, "5").await;

    assert_eq!(h.send(&user, "heavy").await, Reply::InvalidWeight);
    assert_eq!(h.send(&user, "-10").await, Reply::InvalidWeight);
    assert!(matches!(
        h.state(8).await,
        Some(ConversationState::AwaitingWeight { reps: 5, .. })
    ));

    assert_eq!(
        h.send(&user, "102,5").await,
        Reply::Saved {
            exercise_name: "Становая тяга".to_string(),
            reps: 5,
            weight: 102.5
        }
    );
    assert_eq!(h.store.set_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_zero_weight_is_a_bodyweight_set() -> Result<()> {
    let h = seeded_machine().await?;
    let user = profile(9);

    h.send(&user, "Подтягивания").await;
    h.send(&user, "12").await;
    let reply = h.send(&user, "0").await;

    assert!(matches!(reply, Reply::Saved { weight, .. } if weight == 0.0));
    let registered = h.store.find_user(9).await?.expect("user registered");
    assert!(h.store.recent_sets(registered.id, 10).await?[0].is_bodyweight());

    Ok(())
}

#[tokio::test]
async fn test_unknown_exercise_stays_idle() -> Result<()> {
    let h = seeded_machine().await?;
    let user = profile(10);

    assert_eq!(h.send(&user, "Йога").await, Reply::UnknownExercise);
    // Idle matching is exact
    assert_eq!(h.send(&user, "жим лежа").await, Reply::UnknownExercise);
    assert_eq!(h.state(10).await, Some(ConversationState::Idle));
    assert_eq!(h.store.set_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_surrounding_whitespace_is_ignored() -> Result<()> {
    let h = seeded_machine().await?;
    let user = profile(11);

    assert!(matches!(
        h.send(&user, "  Планка \n").await,
        Reply::AskReps { .. }
    ));
    assert_eq!(h.send(&user, " 3 ").await, Reply::AskWeight { reps: 3 });

    Ok(())
}

#[tokio::test]
async fn test_failed_save_resets_to_idle() -> Result<()> {
    let h = seeded_machine().await?;
    let user = profile(12);

    h.send(&user, "Жим лежа").await;
    h.send(&user, "8").await;
    h.store.fail_appends(true);

    assert_eq!(h.send(&user, "60").await, Reply::SaveFailed);
    assert_eq!(h.state(12).await, Some(ConversationState::Idle));
    assert_eq!(h.store.set_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_registry_failure_leaves_state_untouched() -> Result<()> {
    let h = seeded_machine().await?;
    let user = profile(13);

    h.send(&user, "Бицепс").await;
    h.store.fail_upserts(true);

    assert_eq!(h.send(&user, "10").await, Reply::StorageUnavailable);
    assert!(matches!(
        h.state(13).await,
        Some(ConversationState::AwaitingReps { .. })
    ));

    h.store.fail_upserts(false);
    assert_eq!(h.send(&user, "10").await, Reply::AskWeight { reps: 10 });

    Ok(())
}

#[tokio::test]
async fn test_state_is_created_lazily() -> Result<()> {
    let h = seeded_machine().await?;

    assert_eq!(h.state(99).await, None);

    h.send(&profile(99), "Йога").await;
    assert_eq!(h.state(99).await, Some(ConversationState::Idle));
    assert!(h.store.find_user(99).await?.is_some());
    assert_eq!(h.state(100).await, None);

    Ok(())
}

#[tokio::test]
async fn test_reset_returns_to_idle() -> Result<()> {
    let h = seeded_machine().await?;
    let user = profile(14);

    h.send(&user, "Приседания").await;
    h.send(&user, "5").await;
    reset_dialogue(&h.dialogue(14)).await;

    assert_eq!(h.state(14).await, Some(ConversationState::Idle));
    // A number is not an exercise name once idle
    assert_eq!(h.send(&user, "80").await, Reply::UnknownExercise);

    Ok(())
}

#[tokio::test]
async fn test_chats_are_independent() -> Result<()> {
    let h = seeded_machine().await?;
    let (anna, boris) = (profile(1), profile(2));

    h.send(&anna, "Жим лежа").await;
    h.send(&boris, "Приседания").await;
    h.send(&anna, "8").await;

    assert!(matches!(
        h.state(2).await,
        Some(ConversationState::AwaitingReps { .. })
    ));
    assert_eq!(h.send(&boris, "6").await, Reply::AskWeight { reps: 6 });
    h.send(&anna, "60").await;
    h.send(&boris, "100").await;

    let anna_id = h.store.find_user(1).await?.expect("anna").id;
    let boris_id = h.store.find_user(2).await?.expect("boris").id;
    assert_eq!(h.store.recent_sets(anna_id, 10).await?[0].exercise_name, "Жим лежа");
    assert_eq!(h.store.recent_sets(boris_id, 10).await?[0].exercise_name, "Приседания");

    Ok(())
}

#[tokio::test]
async fn test_registry_failure_creates_no_state() -> Result<()> {
    let h = seeded_machine().await?;
    h.store.fail_upserts(true);

    assert_eq!(h.send(&profile(21), "Жим лежа").await, Reply::StorageUnavailable);
    assert_eq!(h.state(21).await, None);
    assert!(h.store.find_user(21).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_seeding_is_idempotent() -> Result<()> {
    let store = MemoryStore::new();

    let first = seed_defaults(&store).await?;
    assert_eq!(first.inserted, DEFAULT_EXERCISES.len());

    let second = seed_defaults(&store).await?;
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, DEFAULT_EXERCISES.len());
    assert_eq!(store.exercise_count(), DEFAULT_EXERCISES.len());

    Ok(())
}
