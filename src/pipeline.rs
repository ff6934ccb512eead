use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::config::UploadConfig;
use crate::entities::video;
use crate::media::{AssetKind, GatewayError, MediaGateway, UploadOptions, UploadedAsset};
use crate::store::{NewVideo, StoreError, VideoStore};

/// A submitted video form.
#[derive(Debug, Clone, Default)]
pub struct VideoSubmission {
    pub file: Option<Bytes>,
    pub file_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Size reported by the client before upload, as a decimal string.
    pub declared_size: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("file not found")]
    MissingFile,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error(transparent)]
    Upstream(#[from] GatewayError),

    #[error("failed to persist metadata for {external_id}: {source}")]
    Persistence {
        external_id: String,
        #[source]
        source: StoreError,
    },

    #[error("upload cancelled")]
    Cancelled,
}

/// Orchestrates one upload: validation, the gateway round trip, then the
/// metadata write. There is no transaction spanning the gateway and the
/// store, so a failed write leaves the remote asset in place.
#[derive(Clone)]
pub struct UploadPipeline {
    store: Arc<dyn VideoStore>,
    gateway: Arc<dyn MediaGateway>,
    settings: UploadConfig,
}

impl UploadPipeline {
    pub fn new(
        store: Arc<dyn VideoStore>,
        gateway: Arc<dyn MediaGateway>,
        settings: UploadConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            settings,
        }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.settings.max_upload_bytes
    }

    pub async fn upload_video(
        &self,
        submission: VideoSubmission,
        cancel: &CancellationToken,
    ) -> Result<video::Model, PipelineError> {
        let file = submission.file.ok_or(PipelineError::MissingFile)?;

        let title = submission
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PipelineError::InvalidInput("title is required".to_string()))?;

        let declared_size = match submission.declared_size.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(raw.parse::<u64>().map_err(|_| {
                PipelineError::InvalidInput(format!("origSize is not a byte count: {raw}"))
            })?),
            _ => None,
        };

        if let Some(size) = declared_size {
            self.check_size(size)?;
        }
        self.check_size(file.len() as u64)?;
        let original_size = declared_size.unwrap_or(file.len() as u64);

        let options =
            UploadOptions::video(&self.settings.video_folder).with_file_name(submission.file_name);
        let uploaded = self
            .upload_cancellable(file, AssetKind::Video, &options, cancel)
            .await?;

        let new_video = NewVideo {
            title,
            description: submission.description.unwrap_or_default(),
            external_asset_id: uploaded.external_id.clone(),
            original_size_bytes: original_size.to_string(),
            compressed_size_bytes: uploaded.processed_size_bytes.to_string(),
            duration_seconds: uploaded.duration_seconds.unwrap_or(0.0),
        };

        match self.store.create(new_video).await {
            Ok(created) => {
                tracing::info!(
                    video_id = %created.id,
                    asset_id = %created.external_asset_id,
                    "video metadata stored"
                );
                Ok(created)
            }
            Err(source) => {
                // The remote asset is left in place; no compensating delete.
                tracing::error!(
                    asset_id = %uploaded.external_id,
                    error = %source,
                    "metadata write failed after upload, remote asset is orphaned"
                );
                Err(PipelineError::Persistence {
                    external_id: uploaded.external_id,
                    source,
                })
            }
        }
    }

    /// Uploads an image and returns its external id. Nothing is persisted.
    pub async fn upload_image(
        &self,
        file: Option<Bytes>,
        file_name: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let file = file.ok_or(PipelineError::MissingFile)?;
        self.check_size(file.len() as u64)?;

        let options = UploadOptions::image(&self.settings.image_folder).with_file_name(file_name);
        let uploaded = self
            .upload_cancellable(file, AssetKind::Image, &options, cancel)
            .await?;
        Ok(uploaded.external_id)
    }

    fn check_size(&self, size: u64) -> Result<(), PipelineError> {
        let limit = self.settings.max_upload_bytes;
        if size > limit {
            return Err(PipelineError::TooLarge { size, limit });
        }
        Ok(())
    }

    async fn upload_cancellable(
        &self,
        file: Bytes,
        kind: AssetKind,
        options: &UploadOptions,
        cancel: &CancellationToken,
    ) -> Result<UploadedAsset, PipelineError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            result = self.gateway.upload(file, kind, options) => Ok(result?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{DeliveryUrls, Rendition};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGateway {
        calls: AtomicUsize,
        fail: bool,
        hang: bool,
        last_options: Mutex<Option<UploadOptions>>,
    }

    #[async_trait]
    impl MediaGateway for RecordingGateway {
        async fn upload(
            &self,
            bytes: Bytes,
            _kind: AssetKind,
            options: &UploadOptions,
        ) -> Result<UploadedAsset, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_options.lock().unwrap() = Some(options.clone());
            if self.hang {
                std::future::pending::<()>().await;
            }
            if self.fail {
                return Err(GatewayError::Rejected {
                    status: 420,
                    message: "quota".to_string(),
                });
            }
            Ok(UploadedAsset {
                external_id: "vids/abc".to_string(),
                processed_size_bytes: (bytes.len() / 2) as u64,
                duration_seconds: None,
            })
        }

        fn build_url(&self, external_id: &str, kind: AssetKind, rendition: &Rendition) -> String {
            DeliveryUrls::new("https://cdn.test", "demo").build(external_id, kind, rendition)
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<video::Model>>,
        fail: bool,
    }

    #[async_trait]
    impl VideoStore for MemoryStore {
        async fn create(&self, new_video: NewVideo) -> Result<video::Model, StoreError> {
            if self.fail {
                return Err(StoreError(sea_orm::DbErr::Custom("disk full".to_string())));
            }
            let now = Utc::now().fixed_offset();
            let row = video::Model {
                id: uuid::Uuid::new_v4(),
                title: new_video.title,
                description: new_video.description,
                external_asset_id: new_video.external_asset_id,
                original_size_bytes: new_video.original_size_bytes,
                compressed_size_bytes: new_video.compressed_size_bytes,
                duration_seconds: new_video.duration_seconds,
                created_at: now,
                updated_at: now,
            };
            self.rows.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn list_newest_first(&self) -> Result<Vec<video::Model>, StoreError> {
            Ok(self.rows.lock().unwrap().clone())
        }
    }

    fn pipeline(store: Arc<MemoryStore>, gateway: Arc<RecordingGateway>) -> UploadPipeline {
        UploadPipeline::new(store, gateway, UploadConfig::default())
    }

    fn submission(size: Option<&str>) -> VideoSubmission {
        VideoSubmission {
            file: Some(Bytes::from_static(b"0123456789")),
            file_name: Some("cat.mov".to_string()),
            title: Some("  Cat  ".to_string()),
            description: None,
            declared_size: size.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn valid_upload_stores_gateway_fields() {
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(RecordingGateway::default());
        let created = pipeline(store.clone(), gateway.clone())
            .upload_video(submission(Some("10")), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(created.external_asset_id, "vids/abc");
        assert_eq!(created.title, "Cat");
        assert_eq!(created.description, "");
        assert_eq!(created.original_size_bytes, "10");
        assert_eq!(created.compressed_size_bytes, "5");
        assert_eq!(created.duration_seconds, 0.0);
        assert_eq!(store.rows.lock().unwrap().len(), 1);

        let options = gateway.last_options.lock().unwrap().clone().unwrap();
        assert_eq!(options.transformation.as_deref(), Some("q_auto,f_mp4"));
        assert_eq!(options.folder.as_deref(), Some("mediashare-vid"));
        assert_eq!(options.file_name.as_deref(), Some("cat.mov"));
    }

    #[tokio::test]
    async fn undeclared_size_falls_back_to_payload_length() {
        let store = Arc::new(MemoryStore::default());
        let created = pipeline(store, Arc::new(RecordingGateway::default()))
            .upload_video(submission(None), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(created.original_size_bytes, "10");
    }

    #[tokio::test]
    async fn oversized_declaration_never_reaches_gateway() {
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(RecordingGateway::default());
        let err = pipeline(store.clone(), gateway.clone())
            .upload_video(submission(Some("62914561")), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::TooLarge { size: 62_914_561, .. }));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn exactly_sixty_mebibytes_is_accepted() {
        let gateway = Arc::new(RecordingGateway::default());
        pipeline(Arc::new(MemoryStore::default()), gateway.clone())
            .upload_video(submission(Some("62914560")), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_file_and_blank_title_are_client_errors() {
        let p = pipeline(
            Arc::new(MemoryStore::default()),
            Arc::new(RecordingGateway::default()),
        );
        let token = CancellationToken::new();

        let no_file = VideoSubmission {
            file: None,
            ..submission(Some("10"))
        };
        assert!(matches!(
            p.upload_video(no_file, &token).await,
            Err(PipelineError::MissingFile)
        ));

        let blank_title = VideoSubmission {
            title: Some("   ".to_string()),
            ..submission(Some("10"))
        };
        assert!(matches!(
            p.upload_video(blank_title, &token).await,
            Err(PipelineError::InvalidInput(_))
        ));

        assert!(matches!(
            p.upload_video(submission(Some("ten")), &token).await,
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn gateway_failure_creates_no_row() {
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(RecordingGateway {
            fail: true,
            ..Default::default()
        });
        let err = pipeline(store.clone(), gateway)
            .upload_video(submission(Some("10")), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Upstream(_)));
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_still_uploaded_once() {
        let store = Arc::new(MemoryStore {
            fail: true,
            ..Default::default()
        });
        let gateway = Arc::new(RecordingGateway::default());
        let err = pipeline(store, gateway.clone())
            .upload_video(submission(Some("10")), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            PipelineError::Persistence { external_id, .. } => assert_eq!(external_id, "vids/abc"),
            other => panic!("expected Persistence, got {other:?}"),
        }
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_aborts_pending_upload() {
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(RecordingGateway {
            hang: true,
            ..Default::default()
        });
        let token = CancellationToken::new();
        let p = pipeline(store.clone(), gateway);

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let err = p
            .upload_video(submission(Some("10")), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn image_upload_uses_image_folder() {
        let gateway = Arc::new(RecordingGateway::default());
        let id = pipeline(Arc::new(MemoryStore::default()), gateway.clone())
            .upload_image(
                Some(Bytes::from_static(b"png")),
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(id, "vids/abc");
        let options = gateway.last_options.lock().unwrap().clone().unwrap();
        assert_eq!(options.folder.as_deref(), Some("mediashare-img"));
        assert!(options.transformation.is_none());
    }
}
