#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use bytes::Bytes;
use chrono::Utc;
use http_body_util::BodyExt;
use mediashare_server::api::{self, AppState};
use mediashare_server::config::{AuthConfig, UploadConfig};
use mediashare_server::entities::video;
use mediashare_server::media::{
    AssetKind, DeliveryUrls, GatewayError, MediaGateway, Rendition, UploadOptions, UploadedAsset,
};
use mediashare_server::migrator::Migrator;
use mediashare_server::session::{SessionVerifier, SESSION_COOKIE};
use mediashare_server::store::{NewVideo, SeaOrmVideoStore, StoreError, VideoStore};
use sea_orm::{ConnectOptions, Database, DbErr};
use sea_orm_migration::MigratorTrait;
use tower::ServiceExt;

pub const SESSION_SECRET: &str = "test-session-secret";
pub const BOUNDARY: &str = "mediashare-test-boundary";

/// Gateway double that counts calls and can be told to fail.
#[derive(Default)]
pub struct FakeGateway {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl FakeGateway {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaGateway for FakeGateway {
    async fn upload(
        &self,
        bytes: Bytes,
        kind: AssetKind,
        _options: &UploadOptions,
    ) -> Result<UploadedAsset, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(GatewayError::Rejected {
                status: 503,
                message: "simulated network failure".to_string(),
            });
        }
        Ok(UploadedAsset {
            external_id: format!("{}s/asset-{}", kind.as_str(), n),
            processed_size_bytes: (bytes.len() as u64) / 2,
            duration_seconds: match kind {
                AssetKind::Video => Some(125.0),
                AssetKind::Image => None,
            },
        })
    }

    fn build_url(&self, external_id: &str, kind: AssetKind, rendition: &Rendition) -> String {
        DeliveryUrls::new("https://res.cloudinary.com", "demo").build(external_id, kind, rendition)
    }
}

/// In-memory store; optionally fails every call.
#[derive(Default)]
pub struct MemoryStore {
    pub rows: Mutex<Vec<video::Model>>,
    pub fail: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn create(&self, new_video: NewVideo) -> Result<video::Model, StoreError> {
        if self.fail {
            return Err(StoreError(DbErr::Custom("simulated write failure".to_string())));
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
        if self.fail {
            return Err(StoreError(DbErr::Custom("simulated read failure".to_string())));
        }
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        session_secret: SESSION_SECRET.to_string(),
        sign_in_url: "https://accounts.test/sign-in".to_string(),
        sign_up_url: "https://accounts.test/sign-up".to_string(),
    }
}

pub fn build_app(store: Arc<dyn VideoStore>, gateway: Arc<dyn MediaGateway>) -> Router {
    build_app_with(store, gateway, UploadConfig::default())
}

pub fn build_app_with(
    store: Arc<dyn VideoStore>,
    gateway: Arc<dyn MediaGateway>,
    upload: UploadConfig,
) -> Router {
    let state = AppState::new(store, gateway, upload, auth_config()).unwrap();
    api::router(state)
}

pub async fn sqlite_store() -> Arc<SeaOrmVideoStore> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Arc::new(SeaOrmVideoStore::new(db))
}

pub fn session_cookie(user_id: &str) -> String {
    let token = SessionVerifier::new(SESSION_SECRET).sign(user_id);
    format!("{}={}", SESSION_COOKIE, token)
}

/// A multipart part: field name, optional file name, contents.
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub data: &'a [u8],
}

pub fn text<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    Part {
        name,
        file_name: None,
        data: value.as_bytes(),
    }
}

pub fn file<'a>(name: &'a str, file_name: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        name,
        file_name: Some(file_name),
        data,
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        part.name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn post_multipart(
    app: Router,
    uri: &str,
    cookie: Option<&str>,
    parts: &[Part<'_>],
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = builder.body(Body::from(multipart_body(parts))).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
