pub(crate) mod tts;
pub(crate) mod voice;
pub(crate) mod voices;

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
};

use tutor_chat_anthropic::ChatClient;
use tutor_prompts::PromptCatalog;
use tutor_speak_elevenlabs::SpeechClient;
use tutor_turns::{MemoryTurnStore, TurnStore};

use crate::config::VoiceProxyConfig;

/// Caller identity, resolved by the out-of-scope auth collaborator and
/// forwarded as a header.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Surfaces the resolved conversation id before any audio is emitted.
pub const CONVERSATION_ID_HEADER: &str = "x-conversation-id";
/// Client platform hint feeding format negotiation.
pub const CLIENT_PLATFORM_HEADER: &str = "x-client-platform";

const ANONYMOUS_USER: &str = "anonymous";

#[derive(Clone)]
pub(crate) struct AppState {
    pub config: VoiceProxyConfig,
    pub chat: Arc<ChatClient>,
    pub speech: Arc<SpeechClient>,
    pub store: Arc<dyn TurnStore>,
    pub prompts: Arc<PromptCatalog>,
}

pub struct UserContext {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(ANONYMOUS_USER)
            .to_string();
        Ok(UserContext { user_id })
    }
}

fn make_state(config: VoiceProxyConfig, store: Arc<dyn TurnStore>) -> AppState {
    let mut chat = ChatClient::builder().api_key(&config.anthropic_api_key);
    if let Some(api_base) = &config.anthropic_api_base {
        chat = chat.api_base(api_base);
    }
    if let Some(model) = &config.anthropic_model {
        chat = chat.model(model);
    }

    let mut speech = SpeechClient::builder().api_key(&config.elevenlabs_api_key);
    if let Some(api_base) = &config.elevenlabs_api_base {
        speech = speech.api_base(api_base);
    }
    if let Some(model_id) = &config.elevenlabs_model_id {
        speech = speech.model_id(model_id);
    }

    AppState {
        config,
        chat: Arc::new(chat.build()),
        speech: Arc::new(speech.build()),
        store,
        prompts: Arc::new(PromptCatalog::builtin()),
    }
}

pub fn router(config: VoiceProxyConfig) -> Router {
    router_with_store(config, Arc::new(MemoryTurnStore::new()))
}

/// Same router with an injected store, for sharing it with other parts
/// of the app and for contract tests.
pub fn router_with_store(config: VoiceProxyConfig, store: Arc<dyn TurnStore>) -> Router {
    let state = make_state(config, store);

    Router::new()
        .route("/voice/stream", post(voice::handler))
        .route("/tts", post(tts::handler))
        .route("/voices", get(voices::handler))
        .with_state(state)
}
