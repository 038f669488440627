use std::sync::OnceLock;

use serde::Deserialize;

fn default_port() -> u16 {
    8000
}

fn default_prompt_variant() -> String {
    "socratic".to_string()
}

#[derive(Deserialize)]
pub struct Env {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub sentry_dsn: Option<String>,

    pub anthropic_api_key: String,
    #[serde(default)]
    pub anthropic_model: Option<String>,

    pub elevenlabs_api_key: String,
    #[serde(default)]
    pub elevenlabs_model_id: Option<String>,

    /// Gates whether raw PCM output is ever offered to clients.
    #[serde(default)]
    pub pcm_output_enabled: bool,

    #[serde(default = "default_prompt_variant")]
    pub prompt_variant: String,
}

static ENV: OnceLock<Env> = OnceLock::new();

pub fn env() -> &'static Env {
    ENV.get_or_init(|| {
        let _ = dotenvy::dotenv();
        envy::from_env().expect("Failed to load environment")
    })
}
