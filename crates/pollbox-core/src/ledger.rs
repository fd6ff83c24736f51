use pollbox_models::{Choice, ChoiceId};

use crate::error::CoreError;
use crate::store::PollStore;

/// Record one anonymous vote for `choice_id`.
///
/// The count comes from the store's atomic increment, never from a read
/// followed by a write. Text and ownership of a choice are immutable, so the
/// returned choice is the stored row with the post-increment count.
pub async fn cast_vote(store: &dyn PollStore, choice_id: ChoiceId) -> Result<Choice, CoreError> {
    let votes = store.increment_and_get(choice_id).await?;
    let mut choice = store.get_choice(choice_id).await?.ok_or(CoreError::NotFound)?;
    choice.votes = votes;
    tracing::debug!(choice_id = %choice_id, votes, "vote recorded");
    Ok(choice)
}
