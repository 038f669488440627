//! SSE framing for the messages stream.
//!
//! Network chunks split lines at arbitrary byte offsets, so complete
//! lines are reassembled before any JSON parsing happens.

/// Reassembles newline-terminated lines out of raw network chunks.
#[derive(Default)]
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line that became complete.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let rest = self.buf.split_off(pos + 1);
            let mut line = std::mem::replace(&mut self.buf, rest);
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }
}

/// A stream event the pipeline cares about.
#[derive(Debug, PartialEq)]
pub(crate) enum SseEvent {
    Delta(String),
    Stop,
    Error(String),
}

/// Extracts the interesting event from one SSE line, if any. `event:`
/// prefixes, comments, and unrelated message events are skipped.
pub(crate) fn parse_line(line: &str) -> Option<SseEvent> {
    let data = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:"))?;

    let parsed: serde_json::Value = match serde_json::from_str(data.trim()) {
        Ok(v) => v,
        Err(_) => return None,
    };

    match parsed.get("type").and_then(|t| t.as_str()) {
        Some("content_block_delta") => {
            let delta = parsed.get("delta")?;
            if delta.get("type").and_then(|t| t.as_str()) != Some("text_delta") {
                return None;
            }
            delta
                .get("text")
                .and_then(|t| t.as_str())
                .map(|t| SseEvent::Delta(t.to_string()))
        }
        Some("message_stop") => Some(SseEvent::Stop),
        Some("error") => {
            let message = parsed
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("unknown upstream error");
            Some(SseEvent::Error(message.to_string()))
        }
        _ => None,
    }
}
