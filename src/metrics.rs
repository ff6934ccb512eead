use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

use crate::entities::Video;

pub async fn init_metrics(db: &DatabaseConnection) {
    let video_count = Video::find().count(db).await.unwrap_or(0);
    metrics::gauge!("mediashare_videos_total").set(video_count as f64);

    tracing::info!("Initialized metrics: Videos={}", video_count);
}

pub fn increment_videos_total() {
    metrics::gauge!("mediashare_videos_total").increment(1.0);
}

pub fn record_upload(kind: &'static str, bytes: usize) {
    metrics::counter!("mediashare_uploads_total", "kind" => kind).increment(1);
    metrics::histogram!("mediashare_upload_bytes", "kind" => kind).record(bytes as f64);
}

pub fn record_upload_failure(kind: &'static str, reason: &'static str) {
    metrics::counter!("mediashare_upload_failures_total", "kind" => kind, "reason" => reason)
        .increment(1);
}
