use tutor_speak_elevenlabs::DEFAULT_VOICE_ID;

/// Per-process configuration for the voice pipeline.
///
/// The prompt variant lives here and is passed into each request
/// explicitly; nothing in the pipeline consults process-global state.
#[derive(Debug, Clone)]
pub struct VoiceProxyConfig {
    pub anthropic_api_key: String,
    pub anthropic_api_base: Option<String>,
    pub anthropic_model: Option<String>,
    pub elevenlabs_api_key: String,
    pub elevenlabs_api_base: Option<String>,
    pub elevenlabs_model_id: Option<String>,
    /// Gates whether raw-sample output is ever offered.
    pub pcm_enabled: bool,
    pub prompt_variant: String,
    pub default_voice_id: String,
    /// Provider latency/quality trade-off for streaming synthesis.
    pub latency_hint: u8,
}

impl VoiceProxyConfig {
    pub fn new(anthropic_api_key: impl Into<String>, elevenlabs_api_key: impl Into<String>) -> Self {
        Self {
            anthropic_api_key: anthropic_api_key.into(),
            anthropic_api_base: None,
            anthropic_model: None,
            elevenlabs_api_key: elevenlabs_api_key.into(),
            elevenlabs_api_base: None,
            elevenlabs_model_id: None,
            pcm_enabled: false,
            prompt_variant: tutor_prompts::DEFAULT_VARIANT.to_string(),
            default_voice_id: DEFAULT_VOICE_ID.to_string(),
            latency_hint: 1,
        }
    }

    pub fn with_anthropic_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.anthropic_api_base = Some(api_base.into());
        self
    }

    pub fn with_anthropic_model(mut self, model: impl Into<String>) -> Self {
        self.anthropic_model = Some(model.into());
        self
    }

    pub fn with_elevenlabs_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.elevenlabs_api_base = Some(api_base.into());
        self
    }

    pub fn with_elevenlabs_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.elevenlabs_model_id = Some(model_id.into());
        self
    }

    pub fn with_pcm_enabled(mut self, pcm_enabled: bool) -> Self {
        self.pcm_enabled = pcm_enabled;
        self
    }

    pub fn with_prompt_variant(mut self, variant: impl Into<String>) -> Self {
        self.prompt_variant = variant.into();
        self
    }
}
