use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use pollbox_core::{directory, AppState};
use pollbox_models::ChannelId;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{channel_to_json, parse_id};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateChannelRequest {
    pub name: String,
}

pub async fn list_channels(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let channels = directory::list_channels(state.store.as_ref()).await?;
    let result: Vec<Value> = channels.iter().map(channel_to_json).collect();
    Ok(Json(json!(result)))
}

pub async fn create_channel(
    State(state): State<AppState>,
    payload: Result<Json<CreateChannelRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = payload?;
    let channel =
        directory::create_channel(state.store.as_ref(), &state.settings, &body.name).await?;
    Ok((StatusCode::CREATED, Json(channel_to_json(&channel))))
}

pub async fn get_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let channel_id: ChannelId = parse_id("channel", &channel_id)?;
    let channel = directory::get_channel(state.store.as_ref(), channel_id).await?;
    Ok(Json(channel_to_json(&channel)))
}
