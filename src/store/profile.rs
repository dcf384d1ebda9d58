use std::sync::Arc;

use tracing::{error, info};

use super::KeyValueStore;
use crate::error::StoreResult;
use crate::profile::UserProfile;

/// Well-known key of the serialized learner profile.
pub const PROFILE_KEY: &str = "userProfile";

/// Loads and saves the [`UserProfile`] under [`PROFILE_KEY`].
#[derive(Clone)]
pub struct ProfileStore {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the stored profile.
    ///
    /// Fields missing from the stored JSON take their default values. Corrupt
    /// or unreadable data is logged and yields `None`; the stored entry is left
    /// as is.
    pub fn load(&self) -> Option<UserProfile> {
        let raw = match self.store.get(PROFILE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                error!(error = %err, "failed to read user profile");
                return None;
            }
        };

        match decode(&raw) {
            Ok(profile) => {
                info!(profile_id = %profile.id, lines = profile.learn_line_status.len(), "user profile loaded");
                Some(profile)
            }
            Err(err) => {
                error!(error = %err, "failed to parse stored user profile");
                None
            }
        }
    }

    pub fn save(&self, profile: &UserProfile) -> StoreResult<()> {
        let raw = serde_json::to_string(profile)?;
        self.store.set(PROFILE_KEY, &raw)
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.store.remove(PROFILE_KEY)
    }
}

pub fn decode(raw: &str) -> StoreResult<UserProfile> {
    let mut profile: UserProfile = serde_json::from_str(raw)?;
    profile.normalize();
    Ok(profile)
}
