use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_util::stream;
use tokio::sync::{Notify, mpsc};

use tutor_audio_format::AudioFormat;
use tutor_chat_anthropic::Error as ChatError;
use tutor_speak_elevenlabs::{AudioStream, Error as SpeakError, SynthesisRequest};
use tutor_turns::{MemoryTurnStore, TurnStore};
use voice_proxy::pipeline::{self, PipelineReport, SentenceOutcome, SpeechParams, SynthesisOutcome};
use voice_proxy::synth::Synthesizer;

/// Synthesizer whose behavior is scripted per call index (1-based, in
/// order of `synthesize_stream` calls). Audio payloads encode the call
/// and chunk index so forwarding order is visible in the output bytes.
#[derive(Default)]
struct ScriptedSynth {
    calls: Mutex<Vec<String>>,
    fail_stream_for: HashSet<usize>,
    fail_midway_for: HashSet<usize>,
    fail_once_for: HashSet<usize>,
    gate: Option<(usize, Arc<Notify>)>,
    chunks_per_sentence: usize,
}

impl ScriptedSynth {
    fn new(chunks_per_sentence: usize) -> Self {
        Self {
            chunks_per_sentence,
            ..Self::default()
        }
    }

    fn spoken_texts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn chunk(call: usize, n: usize) -> Bytes {
    Bytes::from(format!("s{call}c{n}|"))
}

fn scripted_error() -> SpeakError {
    SpeakError::Api {
        status: 500,
        message: "scripted failure".into(),
    }
}

impl Synthesizer for ScriptedSynth {
    fn synthesize_stream(
        &self,
        req: &SynthesisRequest<'_>,
    ) -> impl Future<Output = Result<AudioStream, SpeakError>> + Send {
        let text = req.text.to_string();
        async move {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(text);
                calls.len()
            };

            if let Some((gated_call, notify)) = &self.gate {
                if *gated_call == call {
                    notify.notified().await;
                }
            }

            if self.fail_stream_for.contains(&call) {
                return Err(scripted_error());
            }

            let chunks: Vec<Result<Bytes, SpeakError>> = if self.fail_midway_for.contains(&call) {
                vec![Ok(chunk(call, 1)), Err(scripted_error())]
            } else {
                (1..=self.chunks_per_sentence)
                    .map(|n| Ok(chunk(call, n)))
                    .collect()
            };
            let stream: AudioStream = Box::pin(stream::iter(chunks));
            Ok(stream)
        }
    }

    fn synthesize_once(
        &self,
        _req: &SynthesisRequest<'_>,
    ) -> impl Future<Output = Result<Bytes, SpeakError>> + Send {
        async move {
            let call = self.calls.lock().unwrap().len();
            if self.fail_once_for.contains(&call) {
                return Err(scripted_error());
            }
            Ok(Bytes::from(format!("s{call}fallback|")))
        }
    }
}

fn params() -> SpeechParams {
    SpeechParams {
        voice_id: "21m00Tcm4TlvDq8ikWAM".into(),
        format: AudioFormat::Mp3,
        latency_hint: 1,
    }
}

fn deltas(parts: &[&str]) -> Vec<Result<String, ChatError>> {
    parts.iter().map(|p| Ok(p.to_string())).collect()
}

/// Runs the pipeline over scripted deltas and drains the audio channel
/// to completion, returning the report and the forwarded bytes.
async fn run_to_completion(
    synth: Arc<ScriptedSynth>,
    input: Vec<Result<String, ChatError>>,
) -> (PipelineReport, String) {
    let (tx, mut rx) = mpsc::channel::<Bytes>(pipeline::AUDIO_CHANNEL_CAPACITY);

    let run = tokio::spawn({
        let synth = synth.clone();
        async move { pipeline::run(stream::iter(input), synth.as_ref(), &params(), tx).await }
    });

    let mut audio = Vec::new();
    while let Some(bytes) = rx.recv().await {
        audio.extend_from_slice(&bytes);
    }

    let report = run.await.unwrap();
    (report, String::from_utf8(audio).unwrap())
}

#[tokio::test]
async fn sentences_synthesized_in_order() {
    let synth = Arc::new(ScriptedSynth::new(2));
    let input = deltas(&["Hello", " there.", " How are", " you", " today?"]);

    let (report, audio) = run_to_completion(synth.clone(), input).await;

    assert_eq!(
        synth.spoken_texts(),
        vec!["Hello there.".to_string(), "How are you today?".to_string()]
    );
    assert_eq!(audio, "s1c1|s1c2|s2c1|s2c2|");
    assert_eq!(report.assistant_text(), "Hello there. How are you today?");
    assert!(!report.truncated);
    assert!(report.sentences.iter().all(|s| matches!(
        s.outcome,
        SynthesisOutcome::Streamed { chunks: 2 }
    )));
}

#[tokio::test]
async fn fallback_keeps_chunk_groups_ordered() {
    let mut synth = ScriptedSynth::new(2);
    synth.fail_stream_for.insert(2);
    let synth = Arc::new(synth);
    let input = deltas(&["Hello there. ", "How are you today?"]);

    let (report, audio) = run_to_completion(synth.clone(), input).await;

    assert_eq!(audio, "s1c1|s1c2|s2fallback|");
    assert_eq!(report.assistant_text(), "Hello there. How are you today?");
    assert_eq!(report.sentences[0].outcome, SynthesisOutcome::Streamed { chunks: 2 });
    assert_eq!(report.sentences[1].outcome, SynthesisOutcome::FallbackDelivered);
}

#[tokio::test]
async fn midstream_failure_escalates_to_fallback() {
    let mut synth = ScriptedSynth::new(3);
    synth.fail_midway_for.insert(1);
    let synth = Arc::new(synth);

    let (report, audio) = run_to_completion(synth.clone(), deltas(&["Only one. "])).await;

    // the provider died after one chunk; the fallback re-delivers the
    // sentence as a single blob
    assert_eq!(audio, "s1c1|s1fallback|");
    assert_eq!(report.sentences[0].outcome, SynthesisOutcome::FallbackDelivered);
}

#[tokio::test]
async fn failed_sentence_keeps_pipeline_and_transcript_alive() {
    let mut synth = ScriptedSynth::new(1);
    synth.fail_stream_for.insert(2);
    synth.fail_once_for.insert(2);
    let synth = Arc::new(synth);
    let input = deltas(&["First. ", "Second. ", "Third."]);

    let (report, audio) = run_to_completion(synth.clone(), input).await;

    assert_eq!(audio, "s1c1|s3c1|");
    assert_eq!(report.assistant_text(), "First. Second. Third.");
    assert_eq!(report.sentences[1].outcome, SynthesisOutcome::Failed);
    assert_eq!(report.sentences[2].outcome, SynthesisOutcome::Streamed { chunks: 1 });
    assert!(!report.truncated);
}

#[tokio::test]
async fn disconnect_truncates_to_processed_sentences() {
    let notify = Arc::new(Notify::new());
    let mut synth = ScriptedSynth::new(1);
    synth.gate = Some((3, notify.clone()));
    let synth = Arc::new(synth);
    let input = deltas(&["S1. S2. S3. S4. S5."]);

    let (tx, mut rx) = mpsc::channel::<Bytes>(1);
    let run = tokio::spawn({
        let synth = synth.clone();
        async move { pipeline::run(stream::iter(input), synth.as_ref(), &params(), tx).await }
    });

    // consume the first two sentences' audio, then hang up while the
    // third is mid-synthesis
    let mut received = Vec::new();
    for _ in 0..2 {
        received.push(rx.recv().await.expect("audio chunk"));
    }
    drop(rx);
    notify.notify_one();

    let report = run.await.unwrap();

    assert!(report.truncated);
    assert_eq!(report.sentences.len(), 3);
    assert_eq!(report.assistant_text(), "S1. S2. S3. ");
    assert_eq!(synth.spoken_texts().len(), 3);
}

#[tokio::test]
async fn unterminated_response_flushes_one_unit() {
    let synth = Arc::new(ScriptedSynth::new(1));

    let (report, audio) = run_to_completion(synth.clone(), deltas(&["just one fragment"])).await;

    assert_eq!(synth.spoken_texts(), vec!["just one fragment".to_string()]);
    assert_eq!(audio, "s1c1|");
    assert_eq!(report.assistant_text(), "just one fragment");
}

#[tokio::test]
async fn generation_error_after_text_keeps_accumulated_transcript() {
    let synth = Arc::new(ScriptedSynth::new(1));
    let input = vec![
        Ok("One. ".to_string()),
        Err(ChatError::Stream("overloaded".into())),
    ];

    let (report, audio) = run_to_completion(synth.clone(), input).await;

    assert!(report.generation_interrupted);
    assert!(!report.truncated);
    assert_eq!(audio, "s1c1|");
    assert_eq!(report.assistant_text(), "One. ");
}

#[tokio::test]
async fn empty_generation_produces_nothing() {
    let synth = Arc::new(ScriptedSynth::new(1));

    let (report, audio) = run_to_completion(synth.clone(), vec![]).await;

    assert!(synth.spoken_texts().is_empty());
    assert!(audio.is_empty());
    assert_eq!(report.assistant_text(), "");
}

fn report_with(texts: &[&str]) -> PipelineReport {
    PipelineReport {
        sentences: texts
            .iter()
            .map(|t| SentenceOutcome {
                text: t.to_string(),
                outcome: SynthesisOutcome::Streamed { chunks: 1 },
            })
            .collect(),
        truncated: false,
        generation_interrupted: false,
    }
}

#[tokio::test]
async fn finalize_persists_the_concatenated_transcript() {
    let store = MemoryTurnStore::new();
    let handle = store.resolve_or_reserve("u1", None, false).await.unwrap();
    let report = report_with(&["Hello there. ", "How are you today?"]);

    pipeline::finalize(&store, &handle, "hi", &report, 321, "rachel", None).await;

    let turns = store.turns(handle.id()).await.unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].assistant_text, "Hello there. How are you today?");
    assert_eq!(turns[0].user_input, "hi");
    assert_eq!(turns[0].elapsed_ms, 321);
    assert_eq!(turns[0].voice_id.as_deref(), Some("rachel"));
    assert_eq!(turns[0].turn_number, 1);
}

#[tokio::test]
async fn finalize_skips_empty_transcripts() {
    let store = MemoryTurnStore::new();
    let handle = store.resolve_or_reserve("u1", None, false).await.unwrap();
    let report = report_with(&[]);

    pipeline::finalize(&store, &handle, "hi", &report, 10, "rachel", None).await;

    assert!(store.get_conversation(handle.id()).await.unwrap().is_none());
    assert!(store.turns(handle.id()).await.unwrap().is_empty());
}
