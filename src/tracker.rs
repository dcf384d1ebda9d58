//! Learner progression through learn lines.
//!
//! The tracker exclusively owns the [`UserProfile`]. Every status mutation is
//! routed through [`ProgressTracker::update_status`], which refreshes the access
//! time, persists the profile and notifies observers.
//!
//! Ids that are not in the current learn graph are ignored: mutators log at
//! debug level and report `None` / [`AdvanceOutcome::UnknownLine`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::catalog::Catalog;
use crate::content::{LearnLine, NextAction};
use crate::events::{EventBus, LearnEvent};
use crate::focus::FocusSink;
use crate::profile::{
    LineStatus, PreferencesUpdate, ProfileLearnLineStatus, StatusUpdate, UserProfile,
};
use crate::store::ProfileStore;

/// Result of one [`ProgressTracker::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The line is not in the learn graph; nothing changed.
    UnknownLine,
    /// The cursor points at a step the line does not have; nothing changed.
    NoStep,
    /// Already on the last content item of the last step; nothing changed.
    AtEnd,
    /// The cursor moved `hops` times and now rests on `cursor`.
    Moved { cursor: (usize, usize), hops: usize },
}

/// Next cursor position after `(step, content)`, or `None` at the end of the line.
fn next_cursor(line: &LearnLine, step: usize, content: usize) -> Option<(usize, usize)> {
    let current = line.step(step)?;
    if content + 1 < current.content.len() {
        Some((step, content + 1))
    } else if step + 1 < line.steps.len() {
        Some((step + 1, 0))
    } else {
        None
    }
}

pub struct ProgressTracker {
    catalog: Arc<Catalog>,
    store: ProfileStore,
    focus: Arc<dyn FocusSink>,
    events: EventBus,
    profile: UserProfile,
}

impl ProgressTracker {
    /// Build a tracker around the stored profile, or a fresh default one.
    pub fn load(
        catalog: Arc<Catalog>,
        store: ProfileStore,
        focus: Arc<dyn FocusSink>,
        events: EventBus,
    ) -> Self {
        let profile = store.load().unwrap_or_else(|| {
            info!("no usable stored profile, starting with defaults");
            UserProfile::new()
        });
        Self {
            catalog,
            store,
            focus,
            events,
            profile,
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn status(&self, line_id: &str) -> Option<&ProfileLearnLineStatus> {
        self.profile.status(line_id)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Merge `update` into the line's status record, creating it if needed.
    pub fn update_status(
        &mut self,
        line_id: &str,
        update: StatusUpdate,
    ) -> Option<ProfileLearnLineStatus> {
        if !self.catalog.contains(line_id) {
            debug!(line_id, "status update for unknown learn line ignored");
            return None;
        }

        let record = self
            .profile
            .learn_line_status
            .entry(line_id.to_string())
            .or_insert_with(|| ProfileLearnLineStatus::new(line_id));
        record.apply(&update);
        record.last_accessed = Utc::now();
        let snapshot = record.clone();

        self.persist();
        self.events.publish(LearnEvent::StatusChanged {
            line_id: line_id.to_string(),
            status: snapshot.status,
            step_index: snapshot.current_step_index,
            content_index: snapshot.current_content_index,
        });
        Some(snapshot)
    }

    /// Begin or resume a line.
    pub fn start(&mut self, line_id: &str) -> Option<ProfileLearnLineStatus> {
        let current = self
            .profile
            .status(line_id)
            .map(|status| status.status)
            .unwrap_or_default();

        let update = if current.is_startable() {
            StatusUpdate::status(LineStatus::InProgress)
        } else {
            StatusUpdate::default()
        };
        self.update_status(line_id, update)
    }

    /// Move the cursor to the next content item of `line_id`.
    ///
    /// Items without a next action, or with `autoProceed`, are passed over in
    /// the same call; the cursor stops on the first item that waits for the
    /// learner or at the last item of the line. Every visualization landed
    /// on is published to the focus sink.
    ///
    /// Reaching the end does not complete the line; that is [`Self::complete`].
    pub fn advance(&mut self, line_id: &str) -> AdvanceOutcome {
        let Some(line) = self.catalog.get(line_id) else {
            debug!(line_id, "advance on unknown learn line ignored");
            return AdvanceOutcome::UnknownLine;
        };

        let (mut step, mut content) = match self.profile.status(line_id) {
            Some(status) => status.cursor(),
            None => match self.start(line_id) {
                Some(status) => status.cursor(),
                None => return AdvanceOutcome::UnknownLine,
            },
        };

        if line.step(step).is_none() {
            debug!(line_id, step, "cursor points past the last step");
            return AdvanceOutcome::NoStep;
        }

        // every hop moves strictly forward through steps and content
        let max_hops = line.steps.len() + line.content_len();
        let mut hops = 0;

        while hops < max_hops {
            let Some((next_step, next_content)) = next_cursor(&line, step, content) else {
                break;
            };
            step = next_step;
            content = next_content;
            hops += 1;

            self.update_status(line_id, StatusUpdate::cursor(step, content));

            let Some(item) = line.content_at(step, content) else {
                break;
            };
            if let Some(config) = item.visualization() {
                self.focus.publish(config);
            }
            if !NextAction::proceeds_automatically(item.next_action) {
                break;
            }
            debug!(line_id, step, content, item_id = %item.id, "auto-proceeding");
        }

        if hops == 0 {
            AdvanceOutcome::AtEnd
        } else {
            AdvanceOutcome::Moved {
                cursor: (step, content),
                hops,
            }
        }
    }

    /// Mark a line mastered and add it to the completed set.
    pub fn complete(&mut self, line_id: &str) -> Option<ProfileLearnLineStatus> {
        let status = self.update_status(line_id, StatusUpdate::mastered())?;

        if self.profile.mark_completed(line_id) {
            info!(line_id, "learn line completed");
            self.persist();
        }
        self.events.publish(LearnEvent::LineCompleted {
            line_id: line_id.to_string(),
        });
        Some(status)
    }

    pub fn update_preferences(&mut self, update: PreferencesUpdate) {
        self.profile.preferences.apply(update);
        self.persist();
        self.events.publish(LearnEvent::PreferencesChanged);
    }

    pub fn set_identity(&mut self, name: Option<String>, email: Option<String>) {
        self.profile.name = name;
        self.profile.email = email;
        self.persist();
    }

    /// Drop all progress: clear the durable entry and the focused content,
    /// then start over with a fresh profile. Observers receive `ProfileReset`
    /// and must reload fully.
    pub fn reset(&mut self) {
        if let Err(err) = self.store.clear() {
            error!(error = %err, "failed to clear stored user profile");
        }
        self.focus.reset();
        self.profile = UserProfile::new();
        self.persist();
        info!(profile_id = %self.profile.id, "user profile reset");
        self.events.publish(LearnEvent::ProfileReset {
            profile_id: self.profile.id.clone(),
        });
    }

    /// Save the profile, best effort. A failed write keeps the in-memory state.
    pub fn persist(&mut self) {
        self.profile.last_active = Utc::now();
        if let Err(err) = self.store.save(&self.profile) {
            error!(error = %err, profile_id = %self.profile.id, "failed to save user profile");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentItem, ContentKind, Step, VisualizationConfig};
    use crate::focus::SharedFocus;
    use crate::store::MemoryStore;

    fn text(id: &str, next: Option<NextAction>) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            next_action: next,
            kind: ContentKind::Text {
                text: format!("text {id}"),
            },
        }
    }

    fn step(id: &str, content: Vec<ContentItem>) -> Step {
        Step {
            id: id.to_string(),
            title: None,
            content,
            completion_trigger: None,
            assessment: None,
        }
    }

    fn tracker_with(lines: Vec<LearnLine>) -> (ProgressTracker, SharedFocus) {
        let focus = SharedFocus::new();
        let tracker = ProgressTracker::load(
            Arc::new(Catalog::new(lines)),
            ProfileStore::new(Arc::new(MemoryStore::new())),
            Arc::new(focus.clone()),
            EventBus::new(),
        );
        (tracker, focus)
    }

    #[test]
    fn test_next_cursor() {
        let line = LearnLine::new("a", "A").with_steps(vec![
            step("s1", vec![text("a", None), text("b", None)]),
            step("s2", vec![text("c", None)]),
        ]);
        assert_eq!(next_cursor(&line, 0, 0), Some((0, 1)));
        assert_eq!(next_cursor(&line, 0, 1), Some((1, 0)));
        assert_eq!(next_cursor(&line, 1, 0), None);
        assert_eq!(next_cursor(&line, 5, 0), None);
    }

    #[test]
    fn test_start_transitions() {
        let (mut tracker, _) = tracker_with(vec![LearnLine::new("a", "A")]);

        let status = tracker.start("a").unwrap();
        assert_eq!(status.status, LineStatus::InProgress);
        assert_eq!(status.cursor(), (0, 0));

        tracker.complete("a");
        let status = tracker.start("a").unwrap();
        assert_eq!(status.status, LineStatus::Mastered);

        tracker.update_status("a", StatusUpdate::status(LineStatus::NeedsReview));
        assert_eq!(tracker.start("a").unwrap().status, LineStatus::InProgress);
    }

    #[test]
    fn test_unknown_line_is_ignored() {
        let (mut tracker, _) = tracker_with(vec![LearnLine::new("a", "A")]);
        assert_eq!(tracker.advance("ghost"), AdvanceOutcome::UnknownLine);
        assert!(tracker.start("ghost").is_none());
        assert!(tracker.complete("ghost").is_none());
        assert!(tracker.profile().learn_line_status.is_empty());
        assert!(tracker.profile().completed_learn_lines.is_empty());
    }

    #[test]
    fn test_advance_on_line_without_steps() {
        let (mut tracker, _) = tracker_with(vec![LearnLine::new("a", "A")]);
        assert_eq!(tracker.advance("a"), AdvanceOutcome::NoStep);
        // advance starts the line even when it cannot move
        assert_eq!(tracker.status("a").unwrap().status, LineStatus::InProgress);
    }

    #[test]
    fn test_advance_publishes_visualization() {
        let vis = ContentItem {
            id: "vis".to_string(),
            next_action: Some(NextAction::ContinueButton),
            kind: ContentKind::Visualization {
                caption: None,
                config: VisualizationConfig {
                    active: Some(true),
                    left_side: Some("x + 3".into()),
                    right_side: Some("7".into()),
                    x_value: Some(4.0),
                    ..VisualizationConfig::default()
                },
            },
        };
        let line = LearnLine::new("a", "A").with_steps(vec![step(
            "s1",
            vec![text("intro", Some(NextAction::ContinueButton)), vis],
        )]);
        let (mut tracker, focus) = tracker_with(vec![line]);

        assert_eq!(
            tracker.advance("a"),
            AdvanceOutcome::Moved { cursor: (0, 1), hops: 1 }
        );
        let current = focus.current();
        assert!(current.active);
        assert_eq!(current.left_side, "x + 3");
        assert_eq!(current.x_value, 4.0);
    }

    #[test]
    fn test_advance_stops_on_empty_step() {
        let line = LearnLine::new("a", "A").with_steps(vec![
            step("s1", vec![text("intro", None)]),
            step("empty", Vec::new()),
            step("s3", vec![text("outro", Some(NextAction::ContinueButton))]),
        ]);
        let (mut tracker, _) = tracker_with(vec![line]);
        tracker.start("a");

        assert_eq!(tracker.advance("a"), AdvanceOutcome::Moved { cursor: (1, 0), hops: 1 });
        assert_eq!(tracker.advance("a"), AdvanceOutcome::Moved { cursor: (2, 0), hops: 1 });
        assert_eq!(tracker.advance("a"), AdvanceOutcome::AtEnd);
    }

    #[test]
    fn test_complete_is_idempotent() {
        let (mut tracker, _) = tracker_with(vec![LearnLine::new("a", "A")]);
        let first = tracker.complete("a").unwrap();
        let second = tracker.complete("a").unwrap();

        assert_eq!(tracker.profile().completed_learn_lines, vec!["a".to_string()]);
        assert_eq!(first.status, second.status);
        assert_eq!(second.velocity, 100.0);
        assert_eq!(second.efficacy, 1000.0);
    }

    #[test]
    fn test_update_status_refreshes_last_accessed() {
        let (mut tracker, _) = tracker_with(vec![LearnLine::new("a", "A")]);
        let first = tracker.start("a").unwrap();
        let second = tracker
            .update_status("a", StatusUpdate { velocity: Some(40.0), ..StatusUpdate::default() })
            .unwrap();
        assert!(second.last_accessed >= first.last_accessed);
        assert_eq!(second.velocity, 40.0);
        assert_eq!(second.status, LineStatus::InProgress);
    }
}
