use serde::Serialize;
use utoipa::ToSchema;

/// A voice offered to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VoiceInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
}

pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

const CURATED: &[VoiceInfo] = &[
    VoiceInfo {
        id: "21m00Tcm4TlvDq8ikWAM",
        name: "Rachel",
        description: "Clear, friendly, educational voice",
        category: "Educational",
    },
    VoiceInfo {
        id: "AZnzlk1XvdvUeBnXmlld",
        name: "Domi",
        description: "Warm, encouraging, patient voice",
        category: "Friendly",
    },
    VoiceInfo {
        id: "EXAVITQu4vr4xnSDxMaL",
        name: "Bella",
        description: "Energetic, engaging, youthful voice",
        category: "Enthusiastic",
    },
    VoiceInfo {
        id: "ErXwobaYiN019PkySvjV",
        name: "Antoni",
        description: "Professional, authoritative, trustworthy voice",
        category: "Professional",
    },
];

pub fn curated() -> &'static [VoiceInfo] {
    CURATED
}

pub fn is_known_voice(voice_id: &str) -> bool {
    CURATED.iter().any(|v| v.id == voice_id)
}
