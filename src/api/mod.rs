pub mod image;
pub mod middleware;
pub mod pages;
pub mod video;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, MatchedPath},
    http::{HeaderValue, Method},
    routing::{get, post},
    Extension, Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::config::{AuthConfig, UploadConfig};
use crate::media::MediaGateway;
use crate::pages::Pages;
use crate::pipeline::UploadPipeline;
use crate::session::SessionVerifier;
use crate::store::VideoStore;

/// Multipart framing overhead allowed on top of the upload ceiling.
const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Handles shared by every request. Constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: UploadPipeline,
    pub store: Arc<dyn VideoStore>,
    pub gateway: Arc<dyn MediaGateway>,
    pub pages: Arc<Pages>,
    pub sessions: SessionVerifier,
    pub auth: AuthConfig,
    /// Cancelled by the server once the shutdown grace period runs out.
    pub uploads: CancellationToken,
}

impl AppState {
    pub fn new(
        store: Arc<dyn VideoStore>,
        gateway: Arc<dyn MediaGateway>,
        upload: UploadConfig,
        auth: AuthConfig,
    ) -> Result<Self, handlebars::TemplateError> {
        Ok(Self {
            pipeline: UploadPipeline::new(store.clone(), gateway.clone(), upload),
            store,
            gateway,
            pages: Arc::new(Pages::new()?),
            sessions: SessionVerifier::new(&auth.session_secret),
            auth,
            uploads: CancellationToken::new(),
        })
    }
}

async fn health_check() -> &'static str {
    "OK"
}

pub fn router(state: AppState) -> Router {
    let body_limit = (state.pipeline.max_upload_bytes() + FORM_OVERHEAD_BYTES) as usize;

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(pages::home))
        .route("/home", get(pages::home))
        .route("/sign-in", get(pages::sign_in))
        .route("/sign-up", get(pages::sign_up))
        .route("/video-upload", get(pages::video_upload))
        .route("/social-share", get(pages::social_share))
        .route("/api/videos", get(video::list_videos))
        .route("/api/videos/cards", get(video::list_cards))
        .route("/api/vid-upload", post(video::upload_video))
        .route("/api/img-upload", post(image::upload_image))
        .layer(axum::middleware::from_fn(middleware::auth_middleware))
        .layer(Extension(state))
        .layer(tower_cookies::CookieManagerLayer::new())
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(|matched| matched.as_str());

                    let span_name = if let Some(path) = matched_path {
                        format!("{} {}", request.method(), path)
                    } else {
                        format!("{} {}", request.method(), request.uri().path())
                    };

                    let user_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .and_then(|v| v.to_str().ok())
                        .or_else(|| {
                            request
                                .headers()
                                .get("x-real-ip")
                                .and_then(|v| v.to_str().ok())
                        })
                        .unwrap_or("unknown");

                    // Handlers fill in the empty fields.
                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        user_ip = user_ip,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        user_id = tracing::field::Empty,
                        action = tracing::field::Empty,
                        asset_id = tracing::field::Empty,
                        business_event = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(|_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(DefaultBodyLimit::max(body_limit))
}

pub fn cors_layer(origin: &str) -> Result<CorsLayer, axum::http::header::InvalidHeaderValue> {
    Ok(CorsLayer::new()
        .allow_origin(origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_credentials(true))
}
