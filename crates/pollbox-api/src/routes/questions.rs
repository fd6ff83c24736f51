use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use pollbox_core::{questions, AppState};
use pollbox_models::{ChannelId, QuestionId};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_id, question_to_json};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateQuestionRequest {
    pub text: String,
    #[serde(default)]
    pub choices: Vec<String>,
}

pub async fn list_questions(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let channel_id: ChannelId = parse_id("channel", &channel_id)?;
    let list =
        questions::list_questions(state.store.as_ref(), &state.settings, channel_id).await?;
    let result: Vec<Value> = list.iter().map(question_to_json).collect();
    Ok(Json(json!(result)))
}

pub async fn create_question(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    payload: Result<Json<CreateQuestionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = payload?;
    let channel_id: ChannelId = parse_id("channel", &channel_id)?;
    let question = questions::create_question(
        state.store.as_ref(),
        &state.settings,
        channel_id,
        &body.text,
        body.choices.as_slice(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(question_to_json(&question))))
}

pub async fn get_question(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let question_id: QuestionId = parse_id("question", &question_id)?;
    let question = questions::get_question(state.store.as_ref(), question_id).await?;
    Ok(Json(question_to_json(&question)))
}
