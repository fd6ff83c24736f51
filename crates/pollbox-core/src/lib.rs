pub mod directory;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod questions;
pub mod sqlite;
pub mod store;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::PollStore;

/// Policy knobs for the poll components.
///
/// `require_existing_channel` verifies channel references before reading or
/// writing questions; when off, listing an unknown channel yields an empty
/// list and writes rely on the store's own referential check.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub require_existing_channel: bool,
    pub unique_channel_names: bool,
    pub max_channel_name_len: usize,
    pub max_question_len: usize,
    pub max_choice_len: usize,
    pub max_choices: usize,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            require_existing_channel: true,
            unique_channel_names: false,
            max_channel_name_len: 100,
            max_question_len: 300,
            max_choice_len: 100,
            max_choices: 20,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PollStore>,
    pub settings: Arc<PollSettings>,
}

impl AppState {
    pub fn new(store: Arc<dyn PollStore>, settings: PollSettings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
        }
    }
}
