use axum::{
    extract::{Path, State},
    Json,
};
use pollbox_core::{ledger, AppState};
use pollbox_models::ChoiceId;
use serde_json::Value;

use super::{choice_to_json, parse_id};
use crate::error::ApiError;

/// Votes are anonymous; the request carries no body.
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(choice_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let choice_id: ChoiceId = parse_id("choice", &choice_id)?;
    let choice = ledger::cast_vote(state.store.as_ref(), choice_id).await?;
    Ok(Json(choice_to_json(&choice)))
}
