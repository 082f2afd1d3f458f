use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use ac_core::{Article, CancellationToken, EntityCount, DEFAULT_ENTITY_LIMIT};
use ac_query::ChatAnswer;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// Older clients send the question as `message`.
    #[serde(default)]
    pub message: Option<String>,
}

impl ChatRequest {
    pub fn text(&self) -> &str {
        [&self.query, &self.message]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct ArticleRequest {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntitiesRequest {
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EntitiesResponse {
    pub entities: Vec<EntityCount>,
    pub count: usize,
}

// Each handler owns a token that is cancelled when its future is dropped,
// which is what happens on client disconnect or when the timeout layer fires.

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatAnswer>> {
    let Json(request) = payload?;
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let answer = state.chat.answer(request.text(), &cancel).await?;
    Ok(Json(answer))
}

pub async fn add_article(
    State(state): State<AppState>,
    payload: Result<Json<ArticleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    let Json(request) = payload?;
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let article = state.ingestion.add_new_article(&request.url, &cancel).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn entities(
    State(state): State<AppState>,
    payload: Result<Json<EntitiesRequest>, JsonRejection>,
) -> ApiResult<Json<EntitiesResponse>> {
    let Json(request) = payload?;
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let urls: Vec<String> = request
        .urls
        .iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();
    let entities = state
        .articles()
        .top_entities(&urls, DEFAULT_ENTITY_LIMIT, &cancel)
        .await?;
    Ok(Json(EntitiesResponse {
        count: entities.len(),
        entities,
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.articles().model_name(),
        "cached_responses": state.chat.cache().len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_prefers_query_over_message() {
        let both: ChatRequest =
            serde_json::from_str(r#"{"query":"new","message":"old"}"#).unwrap();
        assert_eq!(both.text(), "new");
        let legacy: ChatRequest = serde_json::from_str(r#"{"message":" old "}"#).unwrap();
        assert_eq!(legacy.text(), "old");
        let blank: ChatRequest = serde_json::from_str(r#"{"query":"  ","message":"x"}"#).unwrap();
        assert_eq!(blank.text(), "x");
        assert_eq!(ChatRequest::default().text(), "");
    }
}
