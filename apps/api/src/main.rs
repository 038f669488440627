mod env;
mod openapi;

use std::net::SocketAddr;
use std::time::Duration;

use axum::{Router, body::Body, extract::MatchedPath, http::Request};
use tower_http::{
    cors::{self, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::prelude::*;

use tutor_voice_proxy::VoiceProxyConfig;

use env::env;

fn app() -> Router {
    let env = env();

    let mut config = VoiceProxyConfig::new(&env.anthropic_api_key, &env.elevenlabs_api_key)
        .with_pcm_enabled(env.pcm_output_enabled)
        .with_prompt_variant(&env.prompt_variant);
    if let Some(model) = &env.anthropic_model {
        config = config.with_anthropic_model(model);
    }
    if let Some(model_id) = &env.elevenlabs_model_id {
        config = config.with_elevenlabs_model_id(model_id);
    }

    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/openapi.json", axum::routing::get(openapi_json))
        .merge(tutor_voice_proxy::router(config))
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any)
                .expose_headers(cors::Any),
        )
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let path = request.uri().path();

                if path == "/health" {
                    return tracing::Span::none();
                }

                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str)
                    .unwrap_or(path);

                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    http.route = %matched_path,
                )
            }),
        )
}

fn main() -> std::io::Result<()> {
    let env = env();

    let _guard = sentry::init(sentry::ClientOptions {
        dsn: env.sentry_dsn.as_ref().and_then(|s| s.parse().ok()),
        environment: Some(
            if cfg!(debug_assertions) {
                "development"
            } else {
                "production"
            }
            .into(),
        ),
        ..Default::default()
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(sentry::integrations::tracing::layer())
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            let addr = SocketAddr::from(([0, 0, 0, 0], env.port));
            tracing::info!(addr = %addr, "server_listening");

            let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
            axum::serve(listener, app())
                .with_graceful_shutdown(shutdown_signal())
                .await
                .unwrap();
        });

    if let Some(client) = sentry::Hub::current().client() {
        client.close(Some(Duration::from_secs(2)));
    }

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("shutdown_signal_received");
}

async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(openapi::openapi())
}

async fn health() -> &'static str {
    "ok"
}
