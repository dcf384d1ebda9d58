use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::content::LearnLineId;
use crate::profile::LineStatus;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum LearnEvent {
    #[serde(rename = "STATUS_CHANGED")]
    StatusChanged {
        line_id: LearnLineId,
        status: LineStatus,
        step_index: usize,
        content_index: usize,
    },

    #[serde(rename = "LINE_COMPLETED")]
    LineCompleted { line_id: LearnLineId },

    #[serde(rename = "PREFERENCES_CHANGED")]
    PreferencesChanged,

    /// Profile was wiped; every dependent view must reload in full.
    #[serde(rename = "PROFILE_RESET")]
    ProfileReset { profile_id: String },

    #[serde(rename = "CATALOG_CHANGED")]
    CatalogChanged { line_count: usize },

    #[serde(rename = "LANGUAGE_CHANGED")]
    LanguageChanged { language: String },
}

impl LearnEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            LearnEvent::StatusChanged { .. } => "STATUS_CHANGED",
            LearnEvent::LineCompleted { .. } => "LINE_COMPLETED",
            LearnEvent::PreferencesChanged => "PREFERENCES_CHANGED",
            LearnEvent::ProfileReset { .. } => "PROFILE_RESET",
            LearnEvent::CatalogChanged { .. } => "CATALOG_CHANGED",
            LearnEvent::LanguageChanged { .. } => "LANGUAGE_CHANGED",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub id: String,
    pub event: LearnEvent,
    pub created_at: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(event: LearnEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
            created_at: Utc::now(),
        }
    }
}

/// Fan-out of learner events to any number of observers.
///
/// Cloning the bus shares the channel. Publishing never blocks and needs no
/// async runtime; observers drain their receivers with `try_recv`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: LearnEvent) {
        let envelope = EventEnvelope::new(event);
        let event_type = envelope.event.event_type();
        match self.sender.send(envelope) {
            Ok(receivers) => debug!(event_type, sent_to = receivers, "event published"),
            Err(_) => debug!(event_type, "no subscribers for event"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
