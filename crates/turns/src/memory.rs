use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::{Conversation, ConversationHandle, NewTurn, PersistedTurn, TurnStore};

const DEFAULT_TITLE: &str = "New Conversation";

#[derive(Default)]
struct Inner {
    conversations: BTreeMap<Uuid, Conversation>,
    turns: BTreeMap<Uuid, Vec<PersistedTurn>>,
}

/// In-process store implementing the lazy-creation contract.
///
/// Backs the server by default and the contract tests; a database-backed
/// implementation is a drop-in behind `TurnStore`.
#[derive(Default)]
pub struct MemoryTurnStore {
    inner: RwLock<Inner>,
}

impl MemoryTurnStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TurnStore for MemoryTurnStore {
    async fn resolve_or_reserve(
        &self,
        user_id: &str,
        explicit_id: Option<Uuid>,
        start_new: bool,
    ) -> Result<ConversationHandle> {
        let inner = self.inner.read().await;

        if let Some(id) = explicit_id {
            let conversation = inner
                .conversations
                .get(&id)
                .ok_or(Error::ConversationNotFound(id))?;
            if conversation.user_id != user_id {
                return Err(Error::Forbidden(id));
            }
            return Ok(ConversationHandle::Existing(conversation.clone()));
        }

        if !start_new {
            let latest = inner
                .conversations
                .values()
                .filter(|c| c.user_id == user_id && c.is_active)
                .max_by_key(|c| c.created_at);
            if let Some(conversation) = latest {
                return Ok(ConversationHandle::Existing(conversation.clone()));
            }
        }

        Ok(ConversationHandle::Reserved {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
        })
    }

    async fn persist_turn(
        &self,
        handle: &ConversationHandle,
        turn: NewTurn,
    ) -> Result<PersistedTurn> {
        let mut inner = self.inner.write().await;

        let conversation_id = handle.id();
        if !inner.conversations.contains_key(&conversation_id) {
            inner.conversations.insert(
                conversation_id,
                Conversation {
                    id: conversation_id,
                    user_id: handle.user_id().to_string(),
                    title: DEFAULT_TITLE.to_string(),
                    created_at: Utc::now(),
                    is_active: true,
                },
            );
        }

        let turns = inner.turns.entry(conversation_id).or_default();
        let turn_number = turns.last().map(|t| t.turn_number + 1).unwrap_or(1);

        let persisted = PersistedTurn {
            id: Uuid::new_v4(),
            conversation_id,
            turn_number,
            user_input: turn.user_input,
            assistant_text: turn.assistant_text,
            elapsed_ms: turn.elapsed_ms,
            voice_id: turn.voice_id,
            attachments: turn.attachments,
            created_at: Utc::now(),
        };
        turns.push(persisted.clone());

        Ok(persisted)
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.inner.read().await.conversations.get(&id).cloned())
    }

    async fn turns(&self, conversation_id: Uuid) -> Result<Vec<PersistedTurn>> {
        Ok(self
            .inner
            .read()
            .await
            .turns
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}
