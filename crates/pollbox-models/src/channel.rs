use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ChannelId;

/// A named grouping under which questions are posted.
///
/// Channels are never renamed or deleted once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
