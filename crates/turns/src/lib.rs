//! Conversation and turn persistence.
//!
//! Conversations are created lazily: resolving one before a response is
//! generated never writes anything. The caller gets a handle whose id can
//! be surfaced immediately (e.g. in a response header); the conversation
//! row itself only comes into existence together with its first persisted
//! turn, so failed requests leave no empty conversations behind.

mod error;
mod memory;

pub use error::{Error, Result};
pub use memory::MemoryTurnStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// A conversation identity that is valid before anything is written.
#[derive(Debug, Clone)]
pub enum ConversationHandle {
    /// An existing conversation the turn will be appended to.
    Existing(Conversation),
    /// An id reserved for a conversation that will be created together
    /// with the first persisted turn.
    Reserved { id: Uuid, user_id: String },
}

impl ConversationHandle {
    pub fn id(&self) -> Uuid {
        match self {
            ConversationHandle::Existing(c) => c.id,
            ConversationHandle::Reserved { id, .. } => *id,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            ConversationHandle::Existing(c) => &c.user_id,
            ConversationHandle::Reserved { user_id, .. } => user_id,
        }
    }
}

/// One user-input/assistant-response pair, ready to persist.
#[derive(Debug, Clone)]
pub struct NewTurn {
    pub user_input: String,
    pub assistant_text: String,
    pub elapsed_ms: u64,
    pub voice_id: Option<String>,
    pub attachments: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersistedTurn {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub turn_number: u32,
    pub user_input: String,
    pub assistant_text: String,
    pub elapsed_ms: u64,
    pub voice_id: Option<String>,
    pub attachments: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Storage collaborator for conversations and turns.
///
/// The response fields of a turn are written exactly once, by
/// `persist_turn`; there is no update path.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Resolves the conversation a new turn belongs to.
    ///
    /// An explicit id must exist and belong to `user_id`. Without one,
    /// the user's latest active conversation is reused unless
    /// `start_new` is set, in which case (or when nothing exists yet) a
    /// fresh id is reserved without writing anything.
    async fn resolve_or_reserve(
        &self,
        user_id: &str,
        explicit_id: Option<Uuid>,
        start_new: bool,
    ) -> Result<ConversationHandle>;

    /// Appends a turn, creating the conversation first when the handle
    /// is only a reservation. Turn numbers are derived per conversation
    /// at write time.
    async fn persist_turn(&self, handle: &ConversationHandle, turn: NewTurn)
    -> Result<PersistedTurn>;

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>>;

    /// Turns of a conversation in turn-number order.
    async fn turns(&self, conversation_id: Uuid) -> Result<Vec<PersistedTurn>>;
}
