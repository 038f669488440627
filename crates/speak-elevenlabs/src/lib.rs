//! Streaming client for the ElevenLabs text-to-speech API.
//!
//! One persistent `reqwest::Client` is shared across requests and safe
//! for concurrent use; each synthesis call is a self-contained exchange.
//! `synthesize_stream` yields audio bytes as the provider produces them;
//! `synthesize_once` is the non-streaming escalation path that returns
//! the whole clip in one piece.

mod error;
pub mod voices;

pub use error::{Error, Result};
pub use voices::{DEFAULT_VOICE_ID, VoiceInfo};

use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use tutor_audio_format::AudioFormat;

pub const DEFAULT_API_BASE: &str = "https://api.elevenlabs.io";
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";

/// Lazily-produced audio for one synthesis call.
pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[derive(Debug, Clone)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    pub voice_id: &'a str,
    pub format: AudioFormat,
    /// Provider-side latency/quality trade-off, 0 (quality) to 4
    /// (lowest latency).
    pub latency_hint: u8,
}

#[derive(Default)]
pub struct SpeechClientBuilder {
    api_base: Option<String>,
    api_key: Option<String>,
    model_id: Option<String>,
}

impl SpeechClientBuilder {
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn build(self) -> SpeechClient {
        SpeechClient {
            http: reqwest::Client::new(),
            api_base: self
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: self.api_key.expect("api_key is required"),
            model_id: self
                .model_id
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
        }
    }
}

pub struct SpeechClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model_id: String,
}

impl SpeechClient {
    pub fn builder() -> SpeechClientBuilder {
        SpeechClientBuilder::default()
    }

    /// Streaming synthesis. Fails before the first chunk on request or
    /// status errors; mid-stream failures arrive as stream items.
    pub async fn synthesize_stream(&self, req: &SynthesisRequest<'_>) -> Result<AudioStream> {
        let url = stream_url(&self.api_base, req);
        let response = self.send(&url, req).await?;
        Ok(Box::pin(response.bytes_stream().map_err(Error::from)))
    }

    /// Non-streaming synthesis: the whole clip or an error.
    pub async fn synthesize_once(&self, req: &SynthesisRequest<'_>) -> Result<Bytes> {
        let url = once_url(&self.api_base, req);
        let response = self.send(&url, req).await?;
        Ok(response.bytes().await?)
    }

    async fn send(&self, url: &str, req: &SynthesisRequest<'_>) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(url)
            .header("xi-api-key", &self.api_key)
            .json(&serde_json::json!({
                "text": req.text,
                "model_id": self.model_id,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(
                http_status = %status.as_u16(),
                voice_id = %req.voice_id,
                "synthesis_request_rejected"
            );
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

/// Provider identifier for the negotiated output encoding.
pub fn output_format(format: AudioFormat) -> &'static str {
    match format {
        AudioFormat::Mp3 => "mp3_44100_128",
        AudioFormat::Pcm => "pcm_16000",
    }
}

fn stream_url(api_base: &str, req: &SynthesisRequest<'_>) -> String {
    format!(
        "{}/v1/text-to-speech/{}/stream?output_format={}&optimize_streaming_latency={}",
        api_base.trim_end_matches('/'),
        req.voice_id,
        output_format(req.format),
        req.latency_hint,
    )
}

fn once_url(api_base: &str, req: &SynthesisRequest<'_>) -> String {
    format!(
        "{}/v1/text-to-speech/{}?output_format={}",
        api_base.trim_end_matches('/'),
        req.voice_id,
        output_format(req.format),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(format: AudioFormat) -> SynthesisRequest<'static> {
        SynthesisRequest {
            text: "Hello there.",
            voice_id: "21m00Tcm4TlvDq8ikWAM",
            format,
            latency_hint: 2,
        }
    }

    #[test]
    fn stream_url_carries_format_and_latency() {
        let url = stream_url("https://api.elevenlabs.io", &request(AudioFormat::Mp3));
        assert_eq!(
            url,
            "https://api.elevenlabs.io/v1/text-to-speech/21m00Tcm4TlvDq8ikWAM/stream?output_format=mp3_44100_128&optimize_streaming_latency=2"
        );
    }

    #[test]
    fn once_url_has_no_latency_param() {
        let url = once_url("https://api.elevenlabs.io/", &request(AudioFormat::Pcm));
        assert_eq!(
            url,
            "https://api.elevenlabs.io/v1/text-to-speech/21m00Tcm4TlvDq8ikWAM?output_format=pcm_16000"
        );
    }

    #[test]
    fn format_ids_match_negotiated_encodings() {
        assert_eq!(output_format(AudioFormat::Mp3), "mp3_44100_128");
        assert_eq!(output_format(AudioFormat::Pcm), "pcm_16000");
    }
}
