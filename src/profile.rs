use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::LearnLineId;

pub const MASTERED_VELOCITY: f64 = 100.0;
pub const MASTERED_EFFICACY: f64 = 1000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineStatus {
    #[default]
    NotStarted,
    InProgress,
    Mastered,
    NeedsReview,
}

impl LineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineStatus::NotStarted => "notStarted",
            LineStatus::InProgress => "inProgress",
            LineStatus::Mastered => "mastered",
            LineStatus::NeedsReview => "needsReview",
        }
    }

    /// Whether `start` moves a line in this state to `InProgress`.
    pub fn is_startable(&self) -> bool {
        matches!(self, LineStatus::NotStarted | LineStatus::NeedsReview)
    }
}

/// Learner progress on a single learn line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileLearnLineStatus {
    pub learn_line_id: LearnLineId,
    /// Short-term momentum, conventionally 0-100.
    pub velocity: f64,
    /// Long-term mastery, conventionally 0-1000+.
    pub efficacy: f64,
    pub current_step_index: usize,
    pub current_content_index: usize,
    pub status: LineStatus,
    pub last_accessed: DateTime<Utc>,
}

impl ProfileLearnLineStatus {
    pub fn new(learn_line_id: impl Into<LearnLineId>) -> Self {
        Self {
            learn_line_id: learn_line_id.into(),
            ..Self::default()
        }
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.current_step_index, self.current_content_index)
    }

    pub fn apply(&mut self, update: &StatusUpdate) {
        if let Some(velocity) = update.velocity {
            self.velocity = velocity;
        }
        if let Some(efficacy) = update.efficacy {
            self.efficacy = efficacy;
        }
        if let Some(step) = update.current_step_index {
            self.current_step_index = step;
        }
        if let Some(content) = update.current_content_index {
            self.current_content_index = content;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
    }
}

impl Default for ProfileLearnLineStatus {
    fn default() -> Self {
        Self {
            learn_line_id: LearnLineId::new(),
            velocity: 0.0,
            efficacy: 0.0,
            current_step_index: 0,
            current_content_index: 0,
            status: LineStatus::NotStarted,
            last_accessed: Utc::now(),
        }
    }
}

/// Partial status fields; `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusUpdate {
    pub velocity: Option<f64>,
    pub efficacy: Option<f64>,
    pub current_step_index: Option<usize>,
    pub current_content_index: Option<usize>,
    pub status: Option<LineStatus>,
}

impl StatusUpdate {
    pub fn cursor(step: usize, content: usize) -> Self {
        Self {
            current_step_index: Some(step),
            current_content_index: Some(content),
            ..Self::default()
        }
    }

    pub fn status(status: LineStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn mastered() -> Self {
        Self {
            status: Some(LineStatus::Mastered),
            velocity: Some(MASTERED_VELOCITY),
            efficacy: Some(MASTERED_EFFICACY),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Print,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Accessibility {
    pub high_contrast: bool,
    pub large_text: bool,
    pub reduce_motion: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub language: String,
    pub theme: Theme,
    pub accessibility: Accessibility,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            theme: Theme::Light,
            accessibility: Accessibility::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferencesUpdate {
    pub language: Option<String>,
    pub theme: Option<Theme>,
    pub accessibility: Option<Accessibility>,
}

impl Preferences {
    pub fn apply(&mut self, update: PreferencesUpdate) {
        if let Some(language) = update.language {
            self.language = language;
        }
        if let Some(theme) = update.theme {
            self.theme = theme;
        }
        if let Some(accessibility) = update.accessibility {
            self.accessibility = accessibility;
        }
    }
}

/// Everything persisted about one learner on one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub preferences: Preferences,
    pub learn_line_status: BTreeMap<LearnLineId, ProfileLearnLineStatus>,
    /// Completed lines in completion order, without duplicates.
    pub completed_learn_lines: Vec<LearnLineId>,
}

impl UserProfile {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: None,
            email: None,
            created: now,
            last_active: now,
            preferences: Preferences::default(),
            learn_line_status: BTreeMap::new(),
            completed_learn_lines: Vec::new(),
        }
    }

    pub fn status(&self, line_id: &str) -> Option<&ProfileLearnLineStatus> {
        self.learn_line_status.get(line_id)
    }

    pub fn is_completed(&self, line_id: &str) -> bool {
        self.completed_learn_lines.iter().any(|id| id == line_id)
    }

    pub fn completed_set(&self) -> HashSet<&str> {
        self.completed_learn_lines.iter().map(String::as_str).collect()
    }

    /// Append to the completed set. Returns false when already present.
    pub fn mark_completed(&mut self, line_id: &str) -> bool {
        if self.is_completed(line_id) {
            return false;
        }
        self.completed_learn_lines.push(line_id.to_string());
        true
    }

    /// Repair invariants a hand-edited or older serialized profile may break.
    pub fn normalize(&mut self) {
        let mut seen = HashSet::new();
        self.completed_learn_lines.retain(|id| seen.insert(id.clone()));

        for (key, status) in self.learn_line_status.iter_mut() {
            if status.learn_line_id != *key {
                status.learn_line_id = key.clone();
            }
        }
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new()
    }
}
