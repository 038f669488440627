//! # Sentence-at-a-time synthesis pipeline
//!
//! Drives one generation stream through the segmenter and the synthesis
//! escalation pair, forwarding audio to a bounded channel. The lifecycle
//! is `Streaming` (consume deltas, voice each sentence as it completes)
//! → `Draining` (voice the flushed remainder) → `Finalizing` (persist
//! the turn, exactly once, best effort).
//!
//! The pipeline is deliberately single-lane: a sentence is fully
//! synthesized and forwarded before the next delta is consumed. That is
//! what guarantees playback order matches text order and bounds memory
//! to one in-flight sentence — do not parallelize it.
//!
//! Channel sends double as disconnect detection: when the receiver is
//! gone the send fails, synthesis stops, and whatever text was processed
//! so far still gets finalized as a truncated turn.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;

use tutor_audio_format::AudioFormat;
use tutor_sentence::SentenceSegmenter;
use tutor_speak_elevenlabs::SynthesisRequest;
use tutor_turns::{ConversationHandle, NewTurn, TurnStore};

use crate::synth::Synthesizer;

/// Backpressure window between synthesis and the client socket.
pub const AUDIO_CHANNEL_CAPACITY: usize = 4;

/// How one sentence's audio was (or was not) delivered. The sentence
/// text counts toward the transcript in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// Chunks were forwarded as the provider streamed them.
    Streamed { chunks: usize },
    /// Streaming failed; the one-shot escalation delivered a single blob.
    FallbackDelivered,
    /// Both calls failed; no audio for this sentence.
    Failed,
}

#[derive(Debug, Clone)]
pub struct SentenceOutcome {
    pub text: String,
    pub outcome: SynthesisOutcome,
}

#[derive(Debug)]
pub struct PipelineReport {
    /// Every sentence that entered synthesis, in emission order.
    pub sentences: Vec<SentenceOutcome>,
    /// The client went away before the response was fully voiced.
    pub truncated: bool,
    /// The generation stream died after producing some text.
    pub generation_interrupted: bool,
}

impl PipelineReport {
    /// The transcript: concatenation of processed sentence texts in
    /// emission order, exactly as they were segmented.
    pub fn assistant_text(&self) -> String {
        self.sentences.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Synthesis parameters fixed for the whole request.
#[derive(Debug, Clone)]
pub struct SpeechParams {
    pub voice_id: String,
    pub format: AudioFormat,
    pub latency_hint: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Streaming,
    Draining,
}

/// Runs the pipeline until the generation stream ends, errors, or the
/// client disconnects. Does not finalize; call [`finalize`] with the
/// returned report exactly once.
pub async fn run<D, S>(
    mut deltas: D,
    synth: &S,
    params: &SpeechParams,
    audio_tx: mpsc::Sender<Bytes>,
) -> PipelineReport
where
    D: Stream<Item = tutor_chat_anthropic::Result<String>> + Unpin,
    S: Synthesizer,
{
    let mut stage = Stage::Streaming;
    let mut segmenter = SentenceSegmenter::new();
    let mut sentences: Vec<SentenceOutcome> = Vec::new();
    let mut truncated = false;
    let mut generation_interrupted = false;

    while stage == Stage::Streaming {
        match deltas.next().await {
            Some(Ok(delta)) => {
                for unit in segmenter.feed(&delta) {
                    let (outcome, disconnected) =
                        speak_unit(synth, params, &unit, &audio_tx).await;
                    sentences.push(SentenceOutcome {
                        text: unit,
                        outcome,
                    });
                    if disconnected {
                        tracing::info!(
                            sentences_processed = sentences.len(),
                            "client_disconnected_truncating"
                        );
                        truncated = true;
                        stage = Stage::Draining;
                        break;
                    }
                }
            }
            Some(Err(e)) => {
                // the audio already sent cannot be unsent; keep the text
                // accumulated so far and end the stream quietly
                tracing::warn!(error = %e, "generation_stream_interrupted");
                generation_interrupted = true;
                stage = Stage::Draining;
            }
            None => {
                stage = Stage::Draining;
            }
        }
    }

    tracing::debug!(stage = ?stage, "pipeline_draining");
    if !truncated {
        if let Some(rest) = segmenter.flush() {
            let (outcome, _) = speak_unit(synth, params, &rest, &audio_tx).await;
            sentences.push(SentenceOutcome {
                text: rest,
                outcome,
            });
        }
    }

    PipelineReport {
        sentences,
        truncated,
        generation_interrupted,
    }
}

/// Synthesizes one sentence with the streaming→one-shot escalation and
/// forwards its audio in order. Returns the outcome and whether the
/// outbound channel is gone.
async fn speak_unit<S: Synthesizer>(
    synth: &S,
    params: &SpeechParams,
    unit: &str,
    audio_tx: &mpsc::Sender<Bytes>,
) -> (SynthesisOutcome, bool) {
    let spoken = unit.trim();
    if spoken.is_empty() {
        return (SynthesisOutcome::Streamed { chunks: 0 }, false);
    }

    let req = SynthesisRequest {
        text: spoken,
        voice_id: &params.voice_id,
        format: params.format,
        latency_hint: params.latency_hint,
    };

    match synth.synthesize_stream(&req).await {
        Ok(mut stream) => {
            let mut chunks = 0usize;
            loop {
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        if bytes.is_empty() {
                            continue;
                        }
                        if audio_tx.send(bytes).await.is_err() {
                            return (SynthesisOutcome::Streamed { chunks }, true);
                        }
                        chunks += 1;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(
                            error = %e,
                            chunks_forwarded = chunks,
                            "synthesis_stream_failed_midway"
                        );
                        break;
                    }
                    None => return (SynthesisOutcome::Streamed { chunks }, false),
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "synthesis_stream_failed_to_start");
        }
    }

    match synth.synthesize_once(&req).await {
        Ok(bytes) => {
            if !bytes.is_empty() && audio_tx.send(bytes).await.is_err() {
                return (SynthesisOutcome::FallbackDelivered, true);
            }
            (SynthesisOutcome::FallbackDelivered, false)
        }
        Err(e) => {
            // not fatal: the sentence contributes no audio but its text
            // still counts toward the transcript
            tracing::error!(error = %e, "synthesis_fallback_failed");
            (SynthesisOutcome::Failed, false)
        }
    }
}

/// Persists the finished turn. Runs exactly once per request; failures
/// are logged and swallowed because the audio has already been
/// delivered. Produces nothing when no text ever arrived, so failed
/// requests leave no empty turns.
pub async fn finalize(
    store: &dyn TurnStore,
    handle: &ConversationHandle,
    user_input: &str,
    report: &PipelineReport,
    elapsed_ms: u64,
    voice_id: &str,
    attachments: Option<serde_json::Value>,
) {
    let assistant_text = report.assistant_text();
    if assistant_text.trim().is_empty() {
        tracing::info!("empty_response_not_persisted");
        return;
    }

    let turn = NewTurn {
        user_input: user_input.to_string(),
        assistant_text,
        elapsed_ms,
        voice_id: Some(voice_id.to_string()),
        attachments,
    };

    match store.persist_turn(handle, turn).await {
        Ok(persisted) => {
            tracing::info!(
                conversation_id = %persisted.conversation_id,
                turn_number = persisted.turn_number,
                elapsed_ms = elapsed_ms,
                truncated = report.truncated,
                "turn_persisted"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "turn_persist_failed");
            sentry::capture_message(&e.to_string(), sentry::Level::Error);
        }
    }
}
