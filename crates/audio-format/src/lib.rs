//! Output-format negotiation for synthesized audio.
//!
//! Decided once per request, before synthesis starts; the chosen format
//! is threaded through every synthesis call and echoed in the response
//! content type. Raw PCM is only offered behind a process-wide flag.

pub const PCM_SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// Compressed MP3, the default for every client.
    Mp3,
    /// Raw 16 kHz PCM samples, for clients that cannot play streamed MP3.
    Pcm,
}

impl AudioFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Pcm => "audio/pcm;rate=16000",
        }
    }
}

/// Picks the target encoding from request hints.
///
/// Pure and idempotent: same inputs, same output, no I/O. PCM is chosen
/// only when `pcm_enabled` is set and the caller asked for it, either
/// with an `Accept` value naming `audio/pcm` or an `ios` platform hint.
pub fn negotiate(
    accept: Option<&str>,
    platform: Option<&str>,
    pcm_enabled: bool,
) -> AudioFormat {
    if !pcm_enabled {
        return AudioFormat::Mp3;
    }

    if accepts_pcm(accept) || platform_wants_pcm(platform) {
        return AudioFormat::Pcm;
    }

    AudioFormat::Mp3
}

fn accepts_pcm(accept: Option<&str>) -> bool {
    let Some(accept) = accept else {
        return false;
    };

    accept
        .split(',')
        .filter_map(|entry| entry.split(';').next())
        .any(|mime| mime.trim() == "audio/pcm")
}

fn platform_wants_pcm(platform: Option<&str>) -> bool {
    platform
        .map(|p| p.trim().eq_ignore_ascii_case("ios"))
        .unwrap_or(false)
}
