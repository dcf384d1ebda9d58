//! Explicitly owned application context.
//!
//! Composes the catalog, the progress tracker, localization and the small
//! amount of navigation state a front end needs.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::content::{LearnLine, LearnLineId};
use crate::events::{EventBus, LearnEvent};
use crate::focus::FocusSink;
use crate::i18n::{I18n, Language};
use crate::profile::PreferencesUpdate;
use crate::recommend::{self, Availability};
use crate::store::{KeyValueStore, ProfileStore};
use crate::tracker::ProgressTracker;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub learn_graph_map_open: bool,
    pub current_learn_line: Option<LearnLineId>,
}

pub struct AppContext {
    catalog: Arc<Catalog>,
    tracker: ProgressTracker,
    i18n: I18n,
    events: EventBus,
    state: AppState,
}

impl AppContext {
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn KeyValueStore>,
        focus: Arc<dyn FocusSink>,
        events: EventBus,
        fallback_language: Language,
    ) -> Self {
        let tracker = ProgressTracker::load(
            Arc::clone(&catalog),
            ProfileStore::new(Arc::clone(&store)),
            focus,
            events.clone(),
        );
        let mut i18n = I18n::initialize(fallback_language, store);
        i18n.register_learn_lines(&catalog.lines());
        info!(language = %i18n.language(), "app context ready");

        Self {
            catalog,
            tracker,
            i18n,
            events,
            state: AppState::default(),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ProgressTracker {
        &mut self.tracker
    }

    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Returns whether the map is open afterwards.
    pub fn toggle_map(&mut self) -> bool {
        self.state.learn_graph_map_open = !self.state.learn_graph_map_open;
        self.state.learn_graph_map_open
    }

    pub fn close_map(&mut self) {
        self.state.learn_graph_map_open = false;
    }

    /// Select the line being studied, or clear the selection with `None`.
    ///
    /// Selecting a line starts it and closes the map. Returns false for ids
    /// not in the catalog, leaving the state as it was.
    pub fn set_current_line(&mut self, line_id: Option<&str>) -> bool {
        let Some(line_id) = line_id else {
            self.state.current_learn_line = None;
            return true;
        };

        if self.tracker.start(line_id).is_none() {
            debug!(line_id, "cannot select unknown learn line");
            return false;
        }
        self.state.current_learn_line = Some(line_id.to_string());
        self.state.learn_graph_map_open = false;
        true
    }

    pub fn set_language(&mut self, language: Language) {
        self.i18n.set_language(language);
        self.tracker.update_preferences(PreferencesUpdate {
            language: Some(language.code().to_string()),
            ..PreferencesUpdate::default()
        });
        self.events.publish(LearnEvent::LanguageChanged {
            language: language.code().to_string(),
        });
    }

    /// Swap in a new line set and refresh the line translations.
    pub fn reload_catalog(&mut self, lines: Vec<LearnLine>) {
        self.catalog.replace_all(lines);
        self.i18n.register_learn_lines(&self.catalog.lines());

        let keep_current = self
            .state
            .current_learn_line
            .as_deref()
            .is_some_and(|id| self.catalog.contains(id));
        if !keep_current {
            self.state.current_learn_line = None;
        }
    }

    /// Wipe all progress and return to the start screen.
    pub fn debug_reset(&mut self) {
        self.tracker.reset();
        self.state = AppState::default();
    }

    pub fn recommended(&self, limit: usize) -> Vec<LearnLineId> {
        recommend::recommended_lines(&self.catalog.snapshot(), self.tracker.profile(), limit)
    }

    pub fn progress(&self) -> u32 {
        recommend::overall_progress(&self.catalog.snapshot(), self.tracker.profile())
    }

    pub fn availability(&self, line_id: &str) -> Option<Availability> {
        let graph = self.catalog.snapshot();
        let line = graph.get(line_id)?;
        Some(recommend::availability(line, self.tracker.profile()))
    }

    /// Title in the current language, or the authored title when untranslated.
    pub fn line_title(&self, line_id: &str) -> Option<String> {
        let line = self.catalog.get(line_id)?;
        let key = format!("learnLines.{line_id}.title");
        let title = self.i18n.t(&key);
        if title == key || title.is_empty() {
            Some(line.title)
        } else {
            Some(title)
        }
    }
}
