use axum::{
    extract::{Extension, Multipart},
    Json,
};
use serde_json::{json, Value};

use crate::api::video::{failure_reason, multipart_error, read_file, FilePart};
use crate::api::AppState;
use crate::error::ApiError;
use crate::metrics;

pub async fn upload_image(
    Extension(state): Extension<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let span = tracing::Span::current();
    span.record("action", "upload_image");

    let mut file: Option<FilePart> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            let part = read_file(field).await?;
            if !part.data.is_empty() {
                file = Some(part);
            }
        }
    }

    let (data, name) = match file {
        Some(part) => (Some(part.data), part.name),
        None => (None, None),
    };
    let uploaded_bytes = data.as_ref().map(|d| d.len()).unwrap_or(0);

    match state.pipeline.upload_image(data, name, &state.uploads).await {
        Ok(public_id) => {
            span.record("asset_id", public_id.as_str())
                .record("business_event", "Image uploaded successfully");
            metrics::record_upload("image", uploaded_bytes);
            Ok(Json(json!({ "publicID": public_id })))
        }
        Err(err) => {
            metrics::record_upload_failure("image", failure_reason(&err));
            Err(ApiError::from_pipeline(err, "Failed to upload image"))
        }
    }
}
