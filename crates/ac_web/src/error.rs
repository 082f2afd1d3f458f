use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use ac_core::{Error, ErrorKind};

/// Maps a domain error onto an HTTP status with a `{"error": ..}` body.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::Validation(rejection.body_text()))
    }
}

/// Gives the bare 408 from the timeout layer the same `{"error": ..}` body
/// as every other failure.
pub async fn timeout_envelope(response: Response) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }
    tracing::warn!("request timed out");
    (
        StatusCode::REQUEST_TIMEOUT,
        Json(json!({ "error": "request timed out" })),
    )
        .into_response()
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Duplicate => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::info!(error = %self.0, status = status.as_u16(), "request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ac_core::Intent;

    #[test]
    fn statuses_follow_the_error_kind() {
        let status = |e: Error| ApiError(e).status();
        assert_eq!(status(Error::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(Error::Duplicate("u".into())), StatusCode::CONFLICT);
        assert_eq!(
            status(Error::strategy(Intent::Summarize, Error::NotFound("u".into()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status(Error::Upstream("down".into())), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(Error::Persistence("disk".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn timeouts_get_an_error_body() {
        let bare = StatusCode::REQUEST_TIMEOUT.into_response();
        let response = timeout_envelope(bare).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "request timed out");

        let ok = timeout_envelope(StatusCode::OK.into_response()).await;
        assert_eq!(ok.status(), StatusCode::OK);
    }
}
