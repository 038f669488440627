use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouteError>;

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("unknown voice id: {0}")]
    UnknownVoice(String),

    #[error(transparent)]
    Store(#[from] tutor_turns::Error),

    #[error(transparent)]
    Generation(#[from] tutor_chat_anthropic::Error),

    #[error("generation produced no text")]
    EmptyGeneration,

    #[error(transparent)]
    Synthesis(#[from] tutor_speak_elevenlabs::Error),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::UnknownVoice(id) => (
                StatusCode::BAD_REQUEST,
                "unknown_voice",
                format!("unknown voice id: {id}"),
            ),
            Self::Store(err) => match err {
                tutor_turns::Error::ConversationNotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "conversation_not_found",
                    err.to_string(),
                ),
                tutor_turns::Error::Forbidden(_) => {
                    (StatusCode::FORBIDDEN, "forbidden", err.to_string())
                }
                tutor_turns::Error::Backend(message) => {
                    tracing::error!(error = %message, "store_error");
                    sentry::capture_message(&message, sentry::Level::Error);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_server_error",
                        "Internal server error".to_string(),
                    )
                }
            },
            Self::Generation(err) => {
                tracing::error!(error = %err, "generation_failed_before_output");
                (
                    StatusCode::BAD_GATEWAY,
                    "generation_failed",
                    err.to_string(),
                )
            }
            Self::EmptyGeneration => (
                StatusCode::BAD_GATEWAY,
                "empty_generation",
                "generation produced no text".to_string(),
            ),
            Self::Synthesis(err) => {
                tracing::error!(error = %err, "synthesis_failed");
                (StatusCode::BAD_GATEWAY, "synthesis_failed", err.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetails {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}
