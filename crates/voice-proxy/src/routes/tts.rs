use axum::{
    Json,
    body::Body,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::ToSchema;

use tutor_speak_elevenlabs::{SynthesisRequest, voices};

use super::{AppState, CLIENT_PLATFORM_HEADER};
use crate::error::{Result, RouteError};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TtsRequest {
    pub text: String,
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// One-shot synthesis of caller-supplied text.
///
/// Streams the provider response when it starts cleanly, otherwise
/// escalates to the non-streaming call once before giving up.
#[utoipa::path(
    post,
    path = "/tts",
    request_body = TtsRequest,
    responses(
        (status = 200, description = "Audio byte stream in the negotiated format"),
        (status = 400, description = "Unknown voice id"),
        (status = 502, description = "Synthesis failed"),
    ),
    tag = "voice",
)]
pub async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<TtsRequest>,
) -> Result<Response> {
    let voice_id = payload
        .voice_id
        .clone()
        .unwrap_or_else(|| state.config.default_voice_id.clone());
    if !voices::is_known_voice(&voice_id) {
        return Err(RouteError::UnknownVoice(voice_id));
    }

    let format = tutor_audio_format::negotiate(
        headers.get("accept").and_then(|v| v.to_str().ok()),
        headers
            .get(CLIENT_PLATFORM_HEADER)
            .and_then(|v| v.to_str().ok()),
        state.config.pcm_enabled,
    );

    let req = SynthesisRequest {
        text: &payload.text,
        voice_id: &voice_id,
        format,
        latency_hint: state.config.latency_hint,
    };

    let content_type = [("content-type", format.content_type().to_string())];

    match state.speech.synthesize_stream(&req).await {
        Ok(stream) => Ok((content_type, Body::from_stream(stream)).into_response()),
        Err(e) => {
            tracing::warn!(error = %e, "tts_stream_failed_falling_back");
            let bytes = state.speech.synthesize_once(&req).await?;
            Ok((content_type, Body::from(bytes)).into_response())
        }
    }
}
