use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("conversation not found: {0}")]
    ConversationNotFound(Uuid),

    #[error("conversation {0} does not belong to the requesting user")]
    Forbidden(Uuid),

    #[error("storage backend error: {0}")]
    Backend(String),
}
