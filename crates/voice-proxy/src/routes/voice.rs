use std::convert::Infallible;
use std::time::Instant;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::{StreamExt, stream};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use utoipa::ToSchema;
use uuid::Uuid;

use tutor_chat_anthropic::{ChatMessage, Role};
use tutor_prompts::Mode;
use tutor_speak_elevenlabs::voices;

use super::{AppState, CLIENT_PLATFORM_HEADER, CONVERSATION_ID_HEADER, UserContext};
use crate::error::{Result, RouteError};
use crate::pipeline::{self, AUDIO_CHANNEL_CAPACITY, SpeechParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct HistoryMessage {
    pub role: HistoryRole,
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VoiceChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default)]
    pub start_new: bool,
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
    #[serde(default)]
    pub attachments: Option<serde_json::Value>,
}

/// Streams one spoken assistant response.
///
/// The conversation id is resolved (lazily reserved when nothing exists
/// yet) and surfaced as a response header before any audio is emitted.
/// The first text delta is awaited before the response is committed, so
/// an upstream failure before any output turns into an explicit error
/// response; everything after that streams and ends silently on error.
#[utoipa::path(
    post,
    path = "/voice/stream",
    request_body = VoiceChatRequest,
    responses(
        (status = 200, description = "Audio byte stream in the negotiated format; x-conversation-id header carries the conversation identity"),
        (status = 400, description = "Unknown voice id"),
        (status = 403, description = "Conversation belongs to another user"),
        (status = 404, description = "Conversation not found"),
        (status = 502, description = "Generation failed before any output"),
    ),
    tag = "voice",
)]
pub async fn handler(
    State(state): State<AppState>,
    user: UserContext,
    headers: HeaderMap,
    Json(payload): Json<VoiceChatRequest>,
) -> Result<Response> {
    let started = Instant::now();

    let voice_id = payload
        .voice_id
        .clone()
        .unwrap_or_else(|| state.config.default_voice_id.clone());
    if !voices::is_known_voice(&voice_id) {
        return Err(RouteError::UnknownVoice(voice_id));
    }

    let format = tutor_audio_format::negotiate(
        header_str(&headers, "accept"),
        header_str(&headers, CLIENT_PLATFORM_HEADER),
        state.config.pcm_enabled,
    );

    let handle = state
        .store
        .resolve_or_reserve(&user.user_id, payload.conversation_id, payload.start_new)
        .await?;

    let system = state
        .prompts
        .resolve(&state.config.prompt_variant, Mode::Voice);
    let history = chat_history(&payload.history);

    let mut deltas = state
        .chat
        .stream_message(&system, &history, &payload.message)
        .await?;

    // wait for the first real delta: failures up to here become an
    // explicit error response and leave no turn behind
    let first = loop {
        match deltas.next().await {
            Some(Ok(delta)) if delta.is_empty() => continue,
            Some(Ok(delta)) => break delta,
            Some(Err(e)) => return Err(e.into()),
            None => return Err(RouteError::EmptyGeneration),
        }
    };

    tracing::info!(
        conversation_id = %handle.id(),
        voice_id = %voice_id,
        format = ?format,
        first_delta_ms = started.elapsed().as_millis() as u64,
        "voice_stream_started"
    );

    let (audio_tx, audio_rx) = mpsc::channel::<Bytes>(AUDIO_CHANNEL_CAPACITY);
    let params = SpeechParams {
        voice_id: voice_id.clone(),
        format,
        latency_hint: state.config.latency_hint,
    };

    let speech = state.speech.clone();
    let store = state.store.clone();
    let task_handle = handle.clone();
    let user_input = payload.message.clone();
    let attachments = payload.attachments.clone();
    tokio::spawn(async move {
        let deltas = stream::iter([Ok::<_, tutor_chat_anthropic::Error>(first)]).chain(deltas);
        let report = pipeline::run(deltas, speech.as_ref(), &params, audio_tx).await;
        pipeline::finalize(
            store.as_ref(),
            &task_handle,
            &user_input,
            &report,
            started.elapsed().as_millis() as u64,
            &params.voice_id,
            attachments,
        )
        .await;
    });

    let body = Body::from_stream(ReceiverStream::new(audio_rx).map(Ok::<_, Infallible>));
    Ok((
        [
            ("content-type", format.content_type().to_string()),
            (CONVERSATION_ID_HEADER, handle.id().to_string()),
        ],
        body,
    )
        .into_response())
}

fn chat_history(history: &[HistoryMessage]) -> Vec<ChatMessage> {
    history
        .iter()
        .map(|m| ChatMessage {
            role: match m.role {
                HistoryRole::User => Role::User,
                HistoryRole::Assistant => Role::Assistant,
            },
            content: m.content.clone(),
        })
        .collect()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
