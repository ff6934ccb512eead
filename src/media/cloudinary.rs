use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{AssetKind, DeliveryUrls, GatewayError, MediaGateway, Rendition, UploadOptions, UploadedAsset};
use crate::config::{CloudinaryConfig, CloudinaryCredentials};

/// Signed-upload client for the Cloudinary upload API.
pub struct CloudinaryClient {
    client: Client,
    credentials: CloudinaryCredentials,
    api_base: String,
    urls: DeliveryUrls,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    bytes: u64,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryClient {
    pub fn new(config: &CloudinaryConfig) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            credentials: config.credentials.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            urls: DeliveryUrls::new(&config.delivery_base, &config.credentials.cloud_name),
        })
    }

    fn upload_url(&self, kind: AssetKind) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.api_base,
            self.credentials.cloud_name,
            kind.as_str()
        )
    }
}

/// Hex SHA-256 over the `k=v&...` parameter string (sorted by key) with the
/// API secret appended.
pub fn sign_params(params: &BTreeMap<&'static str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaGateway for CloudinaryClient {
    async fn upload(
        &self,
        bytes: Bytes,
        kind: AssetKind,
        options: &UploadOptions,
    ) -> Result<UploadedAsset, GatewayError> {
        let mut params: BTreeMap<&'static str, String> = BTreeMap::new();
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        if let Some(folder) = &options.folder {
            params.insert("folder", folder.clone());
        }
        if let Some(transformation) = &options.transformation {
            params.insert("transformation", transformation.clone());
        }
        let signature = sign_params(&params, &self.credentials.api_secret);

        let file_name = options
            .file_name
            .clone()
            .unwrap_or_else(|| format!("upload.{}", default_extension(kind)));
        let mime_type = mime_guess::from_path(&file_name).first_or_octet_stream();
        let content_length = bytes.len() as u64;
        let file_part = Part::stream_with_length(reqwest::Body::from(bytes), content_length)
            .file_name(file_name)
            .mime_str(mime_type.essence_str())?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("api_key", self.credentials.api_key.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        tracing::debug!(
            kind = kind.as_str(),
            bytes = content_length,
            folder = ?options.folder,
            "uploading to media service"
        );

        let res = self
            .client
            .post(self.upload_url(kind))
            .multipart(form)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: UploadResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))?;

        Ok(UploadedAsset {
            external_id: parsed.public_id,
            processed_size_bytes: parsed.bytes,
            duration_seconds: parsed.duration,
        })
    }

    fn build_url(&self, external_id: &str, kind: AssetKind, rendition: &Rendition) -> String {
        self.urls.build(external_id, kind, rendition)
    }
}

fn default_extension(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Video => "mp4",
        AssetKind::Image => "png",
    }
}
