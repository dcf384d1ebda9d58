pub mod app;
pub mod catalog;
pub mod config;
pub mod content;
pub mod error;
pub mod events;
pub mod focus;
pub mod graph;
pub mod i18n;
pub mod logging;
pub mod profile;
pub mod recommend;
pub mod store;
pub mod tracker;

pub use app::{AppContext, AppState};
pub use error::{ContentError, MaiaError, StoreError};
