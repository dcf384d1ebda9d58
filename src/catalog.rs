use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::content::LearnLine;
use crate::events::{EventBus, LearnEvent};
use crate::graph::LearnGraph;

struct CatalogState {
    lines: Vec<LearnLine>,
    graph: Arc<LearnGraph>,
}

/// The mutable learn line set and its current graph snapshot.
///
/// Every mutation rebuilds the graph and swaps the snapshot under the write
/// lock, so readers see either the old graph or the new one, never a mix.
pub struct Catalog {
    state: RwLock<CatalogState>,
    events: Option<EventBus>,
}

impl Catalog {
    pub fn new(lines: Vec<LearnLine>) -> Self {
        let graph = Arc::new(LearnGraph::build(lines.iter().cloned()));
        info!(line_count = graph.len(), tag_count = graph.all_tags().len(), "learn graph built");
        Self {
            state: RwLock::new(CatalogState { lines, graph }),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn snapshot(&self) -> Arc<LearnGraph> {
        Arc::clone(&self.state.read().graph)
    }

    pub fn get(&self, id: &str) -> Option<LearnLine> {
        self.state.read().graph.get(id).cloned()
    }

    /// Source lines in their authored order, duplicates included.
    pub fn lines(&self) -> Vec<LearnLine> {
        self.state.read().lines.clone()
    }

    pub fn add(&self, line: LearnLine) {
        self.mutate(|lines| {
            lines.push(line);
            true
        });
    }

    /// Replace every line carrying the same id. Returns false when none matched.
    pub fn update(&self, line: LearnLine) -> bool {
        self.mutate(|lines| {
            let mut replaced = false;
            for existing in lines.iter_mut().filter(|existing| existing.id == line.id) {
                *existing = line.clone();
                replaced = true;
            }
            replaced
        })
    }

    pub fn remove(&self, id: &str) -> bool {
        self.mutate(|lines| {
            let before = lines.len();
            lines.retain(|line| line.id != id);
            lines.len() != before
        })
    }

    pub fn replace_all(&self, lines: Vec<LearnLine>) {
        self.mutate(|current| {
            *current = lines;
            true
        });
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state.read().graph.contains(id)
    }

    fn mutate<F>(&self, apply: F) -> bool
    where
        F: FnOnce(&mut Vec<LearnLine>) -> bool,
    {
        let line_count = {
            let mut state = self.state.write();
            if !apply(&mut state.lines) {
                return false;
            }
            state.graph = Arc::new(LearnGraph::build(state.lines.iter().cloned()));
            state.graph.len()
        };

        info!(line_count, "learn graph rebuilt");
        if let Some(ref events) = self.events {
            events.publish(LearnEvent::CatalogChanged { line_count });
        }
        true
    }
}
