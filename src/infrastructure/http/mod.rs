pub mod request_id;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::controllers::{health, synthesis::SynthesisController};
use crate::domain::synthesis::SynthesisService;
use crate::infrastructure::config::Config;

pub use request_id::{make_request_span, request_id_middleware, RequestId};

/// Worst case UTF-8 size of the largest accepted text, plus room for the JSON envelope
fn body_limit_bytes(max_request_chars: usize) -> usize {
    max_request_chars.saturating_mul(4).saturating_add(64 * 1024)
}

/// Build the application router with all routes and middleware
pub fn build_router(
    synthesis_service: Arc<SynthesisService>,
    synthesis_controller: Arc<SynthesisController>,
    max_request_chars: usize,
) -> Router {
    let synthesis_routes = Router::new()
        .route(
            "/generate-audio",
            post(SynthesisController::generate_audio)
                .layer(DefaultBodyLimit::max(body_limit_bytes(max_request_chars))),
        )
        .route("/status/:job_id", get(SynthesisController::get_status))
        .route("/audio/:job_id", get(SynthesisController::get_audio))
        .route("/voices", get(SynthesisController::list_voices))
        .with_state(synthesis_controller);

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(synthesis_service)
        .merge(synthesis_routes);

    with_middleware(app)
}

/// Request id assignment runs outside tracing so the request span can carry it
fn with_middleware(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
    )
}

/// Start the HTTP server and serve until the process stops
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
