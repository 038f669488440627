//! Voice pipeline: generation stream → sentence segmentation →
//! per-sentence synthesis with fallback → ordered audio stream, with a
//! persisted conversation turn once the response drains.

mod config;
mod error;
mod openapi;
pub mod pipeline;
mod routes;
pub mod synth;

pub use config::VoiceProxyConfig;
pub use error::{ErrorResponse, RouteError};
pub use openapi::openapi;
pub use routes::{
    CLIENT_PLATFORM_HEADER, CONVERSATION_ID_HEADER, USER_ID_HEADER, router, router_with_store,
};
