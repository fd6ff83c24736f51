pub mod channels;
pub mod health;
pub mod questions;
pub mod votes;

use pollbox_models::{Channel, Choice, Question};
use serde_json::{json, Value};
use std::str::FromStr;

use crate::error::ApiError;

/// Parse an opaque id from a path segment.
pub(crate) fn parse_id<T: FromStr>(kind: &str, raw: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::InvalidInput(format!("malformed {kind} id: {raw}")))
}

pub(crate) fn channel_to_json(c: &Channel) -> Value {
    json!({
        "id": c.id.to_string(),
        "name": c.name,
        "created_at": c.created_at.to_rfc3339(),
    })
}

pub(crate) fn choice_to_json(c: &Choice) -> Value {
    json!({
        "id": c.id.to_string(),
        "question_id": c.question_id.to_string(),
        "text": c.text,
        "position": c.position,
        "votes": c.votes,
    })
}

pub(crate) fn question_to_json(q: &Question) -> Value {
    let choices: Vec<Value> = q.choices.iter().map(choice_to_json).collect();
    json!({
        "id": q.id.to_string(),
        "channel_id": q.channel_id.to_string(),
        "text": q.text,
        "choices": choices,
        "total_votes": q.total_votes(),
        "created_at": q.created_at.to_rfc3339(),
    })
}
