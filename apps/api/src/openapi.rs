use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tutor API",
        version = "1.0.0",
        description = "Conversational tutoring backend: streaming speech synthesis for assistant responses"
    ),
    tags(
        (name = "voice", description = "Streaming speech synthesis endpoints")
    )
)]
struct ApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.merge(tutor_voice_proxy::openapi());
    doc
}
