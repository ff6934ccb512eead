//! Media transform gateway: uploads raw bytes to the external media service
//! and builds delivery URLs for derived renditions.

pub mod cloudinary;

use async_trait::async_trait;
use bytes::Bytes;

pub use cloudinary::CloudinaryClient;

/// Resource type on the media service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Video,
    Image,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Video => "video",
            AssetKind::Image => "image",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub folder: Option<String>,
    /// Incoming transformation applied by the service before storing.
    pub transformation: Option<String>,
    pub file_name: Option<String>,
}

impl UploadOptions {
    /// Automatic quality, normalised to mp4.
    pub fn video(folder: impl Into<String>) -> Self {
        Self {
            folder: Some(folder.into()),
            transformation: Some("q_auto,f_mp4".to_string()),
            file_name: None,
        }
    }

    pub fn image(folder: impl Into<String>) -> Self {
        Self {
            folder: Some(folder.into()),
            transformation: None,
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: Option<String>) -> Self {
        self.file_name = file_name;
        self
    }
}

/// What the service reports back after a successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedAsset {
    pub external_id: String,
    pub processed_size_bytes: u64,
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("media service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("media service rejected the upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected media service response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait MediaGateway: Send + Sync {
    /// Uploads `bytes` in a single attempt. No retries are made.
    async fn upload(
        &self,
        bytes: Bytes,
        kind: AssetKind,
        options: &UploadOptions,
    ) -> Result<UploadedAsset, GatewayError>;

    /// Builds a delivery URL without touching the network.
    fn build_url(&self, external_id: &str, kind: AssetKind, rendition: &Rendition) -> String;
}

/// A derived rendition of a stored asset, expressed in the service's URL
/// transformation grammar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendition {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crop: Option<&'static str>,
    pub gravity: Option<&'static str>,
    pub format: Option<&'static str>,
    pub quality: Option<&'static str>,
    /// Passed through verbatim, one URL segment each.
    pub raw: Vec<String>,
    /// Appended to the public id, e.g. `jpg` or `mp4`.
    pub extension: Option<&'static str>,
}

pub const PREVIEW_TOTAL_SECS: u32 = 15;
pub const PREVIEW_MAX_SEGMENT_SECS: u32 = 9;
pub const PREVIEW_MIN_SEGMENT_SECS: u32 = 1;

impl Rendition {
    pub fn thumbnail() -> Self {
        Self {
            width: Some(360),
            height: Some(250),
            crop: Some("fill"),
            gravity: Some("auto"),
            quality: Some("auto"),
            extension: Some("jpg"),
            ..Default::default()
        }
    }

    /// Short segment-sampled clip shown while hovering a gallery card.
    pub fn preview() -> Self {
        Self {
            width: Some(320),
            height: Some(180),
            raw: vec![format!(
                "e_preview:duration_{}:max_seg_{}:min_seg_dur_{}",
                PREVIEW_TOTAL_SECS, PREVIEW_MAX_SEGMENT_SECS, PREVIEW_MIN_SEGMENT_SECS
            )],
            ..Default::default()
        }
    }

    pub fn full() -> Self {
        Self {
            width: Some(640),
            height: Some(360),
            crop: Some("limit"),
            extension: Some("mp4"),
            ..Default::default()
        }
    }

    /// Fill-cropped image at an exact size, used for social formats.
    pub fn fill(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            crop: Some("fill"),
            gravity: Some("auto"),
            ..Default::default()
        }
    }

    fn segments(&self) -> Vec<String> {
        let mut segments = Vec::new();

        let mut sizing = Vec::new();
        if let Some(crop) = self.crop {
            sizing.push(format!("c_{}", crop));
        }
        if let Some(w) = self.width {
            sizing.push(format!("w_{}", w));
        }
        if let Some(h) = self.height {
            sizing.push(format!("h_{}", h));
        }
        if !sizing.is_empty() {
            segments.push(sizing.join(","));
        }
        if let Some(gravity) = self.gravity {
            segments.push(format!("g_{}", gravity));
        }
        segments.extend(self.raw.iter().cloned());
        if let Some(format) = self.format {
            segments.push(format!("f_{}", format));
        }
        if let Some(quality) = self.quality {
            segments.push(format!("q_{}", quality));
        }
        segments
    }
}

/// Deterministic delivery URL construction for one cloud account.
#[derive(Debug, Clone)]
pub struct DeliveryUrls {
    base: String,
    cloud_name: String,
}

impl DeliveryUrls {
    pub fn new(base: impl Into<String>, cloud_name: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            cloud_name: cloud_name.into(),
        }
    }

    pub fn build(&self, external_id: &str, kind: AssetKind, rendition: &Rendition) -> String {
        let mut url = format!("{}/{}/{}/upload", self.base, self.cloud_name, kind.as_str());
        for segment in rendition.segments() {
            url.push('/');
            url.push_str(&segment);
        }
        url.push('/');
        url.push_str(external_id);
        if let Some(ext) = rendition.extension {
            url.push('.');
            url.push_str(ext);
        }
        url
    }
}
