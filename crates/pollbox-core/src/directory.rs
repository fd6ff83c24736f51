use pollbox_models::{Channel, ChannelId};

use crate::error::CoreError;
use crate::store::PollStore;
use crate::validation;
use crate::PollSettings;

/// All channels in creation order.
pub async fn list_channels(store: &dyn PollStore) -> Result<Vec<Channel>, CoreError> {
    store.list_channels().await
}

pub async fn get_channel(store: &dyn PollStore, id: ChannelId) -> Result<Channel, CoreError> {
    store.get_channel(id).await?.ok_or(CoreError::NotFound)
}

/// Create a channel under a trimmed `name`.
///
/// Duplicate names are accepted unless `unique_channel_names` is set.
pub async fn create_channel(
    store: &dyn PollStore,
    settings: &PollSettings,
    name: &str,
) -> Result<Channel, CoreError> {
    let name = validation::required_text("channel name", name, settings.max_channel_name_len)?;
    let id = ChannelId::new();

    let channel = if settings.unique_channel_names {
        store
            .insert_channel_if_name_free(id, &name)
            .await?
            .ok_or_else(|| {
                CoreError::InvalidInput(format!("a channel named \"{name}\" already exists"))
            })?
    } else {
        store.insert_channel(id, &name).await?
    };

    tracing::debug!(channel_id = %channel.id, "channel created");
    Ok(channel)
}

/// Fail with `NotFound` when strict scoping is on and the channel is unknown.
/// Returns whether the channel is known to exist.
pub(crate) async fn check_channel_scope(
    store: &dyn PollStore,
    settings: &PollSettings,
    channel_id: ChannelId,
) -> Result<bool, CoreError> {
    let exists = store.get_channel(channel_id).await?.is_some();
    if !exists && settings.require_existing_channel {
        return Err(CoreError::NotFound);
    }
    Ok(exists)
}
