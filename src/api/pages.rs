use axum::{
    extract::{Extension, Query},
    response::{Html, Redirect},
};
use serde::Deserialize;

use crate::api::AppState;
use crate::error::ApiError;
use crate::gallery::GalleryCard;
use crate::social;

const RENDER_FAILED: &str = "Failed to render page";

fn render_error(err: handlebars::RenderError) -> ApiError {
    tracing::error!(error = %err, "{}", RENDER_FAILED);
    ApiError::Internal(RENDER_FAILED)
}

pub async fn home(Extension(state): Extension<AppState>) -> Result<Html<String>, ApiError> {
    let videos = state
        .store
        .list_newest_first()
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch videos"))?;

    let now = chrono::Utc::now();
    let cards: Vec<GalleryCard> = videos
        .iter()
        .map(|v| GalleryCard::from_video(v, state.gateway.as_ref(), now))
        .collect();

    state.pages.gallery(&cards).map(Html).map_err(render_error)
}

pub async fn video_upload(Extension(state): Extension<AppState>) -> Result<Html<String>, ApiError> {
    state
        .pages
        .upload(state.pipeline.max_upload_bytes())
        .map(Html)
        .map_err(render_error)
}

#[derive(Debug, Deserialize)]
pub struct SocialShareParams {
    pub image: Option<String>,
}

pub async fn social_share(
    Extension(state): Extension<AppState>,
    Query(params): Query<SocialShareParams>,
) -> Result<Html<String>, ApiError> {
    let image = params.image.as_deref().filter(|id| !id.is_empty());
    let renditions = social::renditions(state.gateway.as_ref(), image);
    state
        .pages
        .social_share(&renditions)
        .map(Html)
        .map_err(render_error)
}

/// Sign-in and sign-up are hosted by the identity provider.
pub async fn sign_in(Extension(state): Extension<AppState>) -> Redirect {
    Redirect::to(&state.auth.sign_in_url)
}

pub async fn sign_up(Extension(state): Extension<AppState>) -> Redirect {
    Redirect::to(&state.auth.sign_up_url)
}
