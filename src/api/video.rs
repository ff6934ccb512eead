use axum::{
    extract::{Extension, Multipart},
    http::StatusCode,
    Json,
};
use bytes::Bytes;

use crate::api::AppState;
use crate::entities::video;
use crate::error::ApiError;
use crate::gallery::GalleryCard;
use crate::metrics;
use crate::pipeline::{PipelineError, VideoSubmission};
use crate::session::AuthUser;

const UPLOAD_FAILED: &str = "Failed to upload video";
const FETCH_FAILED: &str = "Failed to fetch videos";

/// One uploaded file part.
pub(crate) struct FilePart {
    pub name: Option<String>,
    pub data: Bytes,
}

pub(crate) fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    tracing::warn!(error = %err, "failed to read multipart body");
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest("Invalid multipart body".to_string())
    }
}

pub(crate) async fn read_file(field: axum::extract::multipart::Field<'_>) -> Result<FilePart, ApiError> {
    let name = field.file_name().map(str::to_string);
    let data = field.bytes().await.map_err(multipart_error)?;
    Ok(FilePart { name, data })
}

pub async fn upload_video(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<video::Model>, ApiError> {
    let span = tracing::Span::current();
    span.record("action", "upload_video");

    let mut submission = VideoSubmission::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file = read_file(field).await?;
                // An empty file input still sends a part.
                if !file.data.is_empty() {
                    submission.file_name = file.name;
                    submission.file = Some(file.data);
                }
            }
            "title" => submission.title = Some(field.text().await.map_err(multipart_error)?),
            "desc" => submission.description = Some(field.text().await.map_err(multipart_error)?),
            "origSize" => {
                submission.declared_size = Some(field.text().await.map_err(multipart_error)?)
            }
            _ => {}
        }
    }

    let uploaded_bytes = submission.file.as_ref().map(|f| f.len()).unwrap_or(0);

    match state.pipeline.upload_video(submission, &state.uploads).await {
        Ok(created) => {
            span.record("asset_id", created.external_asset_id.as_str())
                .record("business_event", "Video uploaded successfully");
            tracing::info!(user_id = %user.0, video_id = %created.id, "video uploaded");
            metrics::record_upload("video", uploaded_bytes);
            metrics::increment_videos_total();
            Ok(Json(created))
        }
        Err(err) => {
            metrics::record_upload_failure("video", failure_reason(&err));
            Err(ApiError::from_pipeline(err, UPLOAD_FAILED))
        }
    }
}

pub(crate) fn failure_reason(err: &PipelineError) -> &'static str {
    match err {
        PipelineError::MissingFile | PipelineError::InvalidInput(_) => "invalid_input",
        PipelineError::TooLarge { .. } => "too_large",
        PipelineError::Upstream(_) => "upstream",
        PipelineError::Persistence { .. } => "persistence",
        PipelineError::Cancelled => "cancelled",
    }
}

pub async fn list_videos(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<video::Model>>, ApiError> {
    tracing::Span::current().record("action", "list_videos");

    let videos = state
        .store
        .list_newest_first()
        .await
        .map_err(|e| ApiError::from_store(e, FETCH_FAILED))?;
    Ok(Json(videos))
}

pub async fn list_cards(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<GalleryCard>>, ApiError> {
    tracing::Span::current().record("action", "list_cards");

    let videos = state
        .store
        .list_newest_first()
        .await
        .map_err(|e| ApiError::from_store(e, FETCH_FAILED))?;

    let now = chrono::Utc::now();
    let cards = videos
        .iter()
        .map(|v| GalleryCard::from_video(v, state.gateway.as_ref(), now))
        .collect();
    Ok(Json(cards))
}
