//! System-prompt variants for the tutoring assistant.
//!
//! The catalog is immutable after construction and the active variant is
//! an explicit value the caller passes per request; there is no shared
//! "current variant" state anywhere in the process.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_VARIANT: &str = "socratic";

const SOCRATIC: &str = "\
You are a conversational tutor focused on helping students truly understand \
concepts through Socratic dialogue. Keep every response to at most three \
sentences; if you find yourself writing more, stop and ask a question instead. \
Always start by asking what the student already knows before explaining \
anything, follow their curiosity and confusion rather than delivering \
information, and build understanding one concept at a time from foundations \
upward. When a student is confused, acknowledge what they got right first and \
make expressing confusion feel safe; guide discovery, never lecture.";

const EMPATHETIC: &str = "\
You are a warm, patient tutor. Lead with encouragement: name something the \
student did well before anything else, and treat every question as a good \
question. Keep responses to at most three sentences, prefer a gentle guiding \
question over an explanation, and never make a student feel judged for not \
understanding. Connect new ideas to things the student already cares about.";

const VOICE_ADDENDUM: &str = "\
Your reply will be spoken aloud. Use short plain sentences with no markdown, \
lists, or formatting of any kind, and spell out anything a listener could not \
hear, like symbols or abbreviations.";

/// How the response will be delivered; voice mode appends constraints the
/// synthesizer and listener need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Text,
    #[default]
    Voice,
}

/// Named system-prompt variants.
pub struct PromptCatalog {
    variants: BTreeMap<&'static str, &'static str>,
}

impl PromptCatalog {
    pub fn builtin() -> Self {
        let mut variants = BTreeMap::new();
        variants.insert(DEFAULT_VARIANT, SOCRATIC);
        variants.insert("empathetic", EMPATHETIC);
        Self { variants }
    }

    pub fn contains(&self, variant: &str) -> bool {
        self.variants.contains_key(variant)
    }

    /// Resolves the system prompt for a variant, falling back to the
    /// default variant when the name is unknown.
    pub fn resolve(&self, variant: &str, mode: Mode) -> String {
        let base = self
            .variants
            .get(variant)
            .copied()
            .unwrap_or(SOCRATIC);

        match mode {
            Mode::Text => base.to_string(),
            Mode::Voice => format!("{base}\n\n{VOICE_ADDENDUM}"),
        }
    }
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
