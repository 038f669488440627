use std::future::Future;

use bytes::Bytes;
use tutor_speak_elevenlabs::{AudioStream, Error, SpeechClient, SynthesisRequest};

/// Seam between the pipeline and the synthesis provider.
///
/// The pipeline only needs the two calls of the escalation pair; the
/// contract tests substitute scripted implementations here.
pub trait Synthesizer: Send + Sync {
    fn synthesize_stream(
        &self,
        req: &SynthesisRequest<'_>,
    ) -> impl Future<Output = Result<AudioStream, Error>> + Send;

    fn synthesize_once(
        &self,
        req: &SynthesisRequest<'_>,
    ) -> impl Future<Output = Result<Bytes, Error>> + Send;
}

impl Synthesizer for SpeechClient {
    fn synthesize_stream(
        &self,
        req: &SynthesisRequest<'_>,
    ) -> impl Future<Output = Result<AudioStream, Error>> + Send {
        SpeechClient::synthesize_stream(self, req)
    }

    fn synthesize_once(
        &self,
        req: &SynthesisRequest<'_>,
    ) -> impl Future<Output = Result<Bytes, Error>> + Send {
        SpeechClient::synthesize_once(self, req)
    }
}
