use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use tutor_speak_elevenlabs::{VoiceInfo, voices};

#[derive(Debug, Serialize, ToSchema)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceInfo>,
}

#[utoipa::path(
    get,
    path = "/voices",
    responses(
        (status = 200, description = "Curated voice catalog", body = VoicesResponse),
    ),
    tag = "voice",
)]
pub async fn handler() -> Json<VoicesResponse> {
    Json(VoicesResponse {
        voices: voices::curated().to_vec(),
    })
}
