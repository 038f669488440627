use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::voice::handler,
        crate::routes::tts::handler,
        crate::routes::voices::handler,
    ),
    components(
        schemas(
            crate::routes::voice::VoiceChatRequest,
            crate::routes::voice::HistoryMessage,
            crate::routes::voice::HistoryRole,
            crate::routes::tts::TtsRequest,
            crate::routes::voices::VoicesResponse,
        )
    ),
    tags(
        (name = "voice", description = "Streaming speech synthesis for tutor responses")
    )
)]
struct ApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
