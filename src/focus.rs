use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::content::VisualizationConfig;

/// Write-only surface for the equation visualization currently on screen.
pub trait FocusSink: Send + Sync {
    fn publish(&self, config: &VisualizationConfig);

    /// Return the surface to its initial, inactive state.
    fn reset(&self);
}

/// The equation balance the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusedContent {
    pub active: bool,
    pub left_side: String,
    pub right_side: String,
    pub x_value: f64,
    pub x_symbol: String,
    pub show_evaluation: bool,
}

impl Default for FocusedContent {
    fn default() -> Self {
        Self {
            active: false,
            left_side: String::new(),
            right_side: String::new(),
            x_value: 0.0,
            x_symbol: "x".to_string(),
            show_evaluation: false,
        }
    }
}

impl FocusedContent {
    /// Overwrite the fields present in `config`, keep the rest.
    pub fn apply(&mut self, config: &VisualizationConfig) {
        if let Some(ref left) = config.left_side {
            self.left_side = left.clone();
        }
        if let Some(ref right) = config.right_side {
            self.right_side = right.clone();
        }
        if let Some(x_value) = config.x_value {
            self.x_value = x_value;
        }
        if let Some(active) = config.active {
            self.active = active;
        }
        if let Some(ref symbol) = config.x_symbol {
            self.x_symbol = symbol.clone();
        }
        if let Some(show) = config.show_evaluation {
            self.show_evaluation = show;
        }
    }
}

/// Thread-safe focused content shared with whoever renders it.
#[derive(Debug, Clone, Default)]
pub struct SharedFocus {
    inner: Arc<RwLock<FocusedContent>>,
}

impl SharedFocus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> FocusedContent {
        self.inner.read().clone()
    }
}

impl FocusSink for SharedFocus {
    fn publish(&self, config: &VisualizationConfig) {
        debug!(?config, "applying visualization config");
        self.inner.write().apply(config);
    }

    fn reset(&self) {
        debug!("focused content cleared");
        *self.inner.write() = FocusedContent::default();
    }
}

/// Sink for headless use; drops every config.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFocus;

impl FocusSink for NoFocus {
    fn publish(&self, _config: &VisualizationConfig) {}

    fn reset(&self) {}
}
