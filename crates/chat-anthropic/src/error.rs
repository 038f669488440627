use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation api returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("generation stream error: {0}")]
    Stream(String),
}
