//! Property-based tests for unlocking, advancing and profile persistence.
//!
//! Invariants covered:
//! - a line without prerequisites is always unlocked
//! - unlocked iff prerequisites are a subset of the completed set, and growing
//!   the completed set never locks a line
//! - repeated `advance` terminates and then leaves the cursor alone
//! - save -> load preserves the profile

use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use maia_learn::catalog::Catalog;
use maia_learn::content::{ContentItem, ContentKind, LearnLine, NextAction, Step};
use maia_learn::events::EventBus;
use maia_learn::focus::NoFocus;
use maia_learn::graph::is_unlocked;
use maia_learn::profile::{LineStatus, ProfileLearnLineStatus, UserProfile};
use maia_learn::store::{MemoryStore, ProfileStore};
use maia_learn::tracker::{AdvanceOutcome, ProgressTracker};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn line_id(index: usize) -> String {
    format!("line-{index}")
}

fn arb_id_set() -> impl Strategy<Value = HashSet<usize>> {
    proptest::collection::hash_set(0usize..8, 0..8)
}

fn arb_next_action() -> impl Strategy<Value = Option<NextAction>> {
    prop_oneof![
        Just(None),
        Just(Some(NextAction::AutoProceed)),
        Just(Some(NextAction::ContinueButton)),
    ]
}

fn arb_line_shape() -> impl Strategy<Value = Vec<Vec<Option<NextAction>>>> {
    proptest::collection::vec(proptest::collection::vec(arb_next_action(), 0..4), 0..5)
}

fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn arb_status() -> impl Strategy<Value = LineStatus> {
    prop_oneof![
        Just(LineStatus::NotStarted),
        Just(LineStatus::InProgress),
        Just(LineStatus::Mastered),
        Just(LineStatus::NeedsReview),
    ]
}

fn arb_line_status() -> impl Strategy<Value = ProfileLearnLineStatus> {
    (
        0u32..=100,     // velocity
        0u32..=1000,    // efficacy
        0usize..20,     // step
        0usize..20,     // content
        arb_status(),
        arb_timestamp(),
    )
        .prop_map(|(velocity, efficacy, step, content, status, last_accessed)| {
            ProfileLearnLineStatus {
                learn_line_id: String::new(),
                velocity: velocity as f64,
                efficacy: efficacy as f64,
                current_step_index: step,
                current_content_index: content,
                status,
                last_accessed,
            }
        })
}

fn arb_profile() -> impl Strategy<Value = UserProfile> {
    (
        proptest::collection::btree_map(0usize..8, arb_line_status(), 0..6),
        arb_id_set(),
        proptest::option::of("[a-zA-Z ]{1,12}"),
        arb_timestamp(),
        arb_timestamp(),
    )
        .prop_map(|(statuses, completed, name, created, last_active)| {
            let learn_line_status: BTreeMap<String, ProfileLearnLineStatus> = statuses
                .into_iter()
                .map(|(index, mut status)| {
                    status.learn_line_id = line_id(index);
                    (line_id(index), status)
                })
                .collect();
            let mut completed: Vec<String> = completed.into_iter().map(line_id).collect();
            completed.sort();

            let mut profile = UserProfile::new();
            profile.name = name;
            profile.created = created;
            profile.last_active = last_active;
            profile.learn_line_status = learn_line_status;
            profile.completed_learn_lines = completed;
            profile
        })
}

fn line_from_shape(shape: &[Vec<Option<NextAction>>]) -> LearnLine {
    let steps = shape
        .iter()
        .enumerate()
        .map(|(s, actions)| Step {
            id: format!("step-{s}"),
            title: None,
            content: actions
                .iter()
                .enumerate()
                .map(|(c, action)| ContentItem {
                    id: format!("item-{s}-{c}"),
                    next_action: *action,
                    kind: ContentKind::Text { text: format!("{s}.{c}") },
                })
                .collect(),
            completion_trigger: None,
            assessment: None,
        })
        .collect();
    LearnLine::new("generated", "Generated").with_steps(steps)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn no_prerequisites_always_unlocked(completed in arb_id_set()) {
        let ids: Vec<String> = completed.into_iter().map(line_id).collect();
        let set: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let line = LearnLine::new("free", "Free");
        prop_assert!(is_unlocked(&line, &set));
    }

    #[test]
    fn unlocked_iff_prerequisites_completed(
        prerequisites in arb_id_set(),
        completed in arb_id_set(),
        extra in arb_id_set(),
    ) {
        let line = LearnLine::new("target", "Target")
            .with_prerequisites(prerequisites.iter().map(|i| line_id(*i)));

        let small: Vec<String> = completed.iter().map(|i| line_id(*i)).collect();
        let large: Vec<String> = completed.union(&extra).map(|i| line_id(*i)).collect();
        let small_set: HashSet<&str> = small.iter().map(String::as_str).collect();
        let large_set: HashSet<&str> = large.iter().map(String::as_str).collect();

        prop_assert_eq!(is_unlocked(&line, &small_set), prerequisites.is_subset(&completed));
        if is_unlocked(&line, &small_set) {
            prop_assert!(is_unlocked(&line, &large_set));
        }
    }

    #[test]
    fn advance_terminates_then_holds_cursor(shape in arb_line_shape()) {
        let line = line_from_shape(&shape);
        let total: usize = shape.iter().map(Vec::len).sum::<usize>() + shape.len();
        let mut tracker = ProgressTracker::load(
            Arc::new(Catalog::new(vec![line])),
            ProfileStore::new(Arc::new(MemoryStore::new())),
            Arc::new(NoFocus),
            EventBus::new(),
        );

        let mut last = AdvanceOutcome::UnknownLine;
        for _ in 0..=total {
            last = tracker.advance("generated");
            if matches!(last, AdvanceOutcome::AtEnd | AdvanceOutcome::NoStep) {
                break;
            }
        }
        prop_assert!(matches!(last, AdvanceOutcome::AtEnd | AdvanceOutcome::NoStep));

        let cursor = tracker.status("generated").map(|s| s.cursor());
        prop_assert_eq!(tracker.advance("generated"), last);
        prop_assert_eq!(tracker.status("generated").map(|s| s.cursor()), cursor);
    }

    #[test]
    fn profile_save_load_roundtrip(profile in arb_profile()) {
        let store = ProfileStore::new(Arc::new(MemoryStore::new()));
        store.save(&profile).unwrap();
        let loaded = store.load();
        prop_assert_eq!(loaded.as_ref(), Some(&profile));
    }
}
