use serde::Serialize;

use crate::media::{AssetKind, MediaGateway, Rendition};

/// Target sizes for social media posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialFormat {
    InstagramSquare,
    InstagramPortrait,
    TwitterPost,
    TwitterHeader,
    FacebookCover,
}

impl SocialFormat {
    pub const ALL: [SocialFormat; 5] = [
        SocialFormat::InstagramSquare,
        SocialFormat::InstagramPortrait,
        SocialFormat::TwitterPost,
        SocialFormat::TwitterHeader,
        SocialFormat::FacebookCover,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SocialFormat::InstagramSquare => "Instagram Square (1:1)",
            SocialFormat::InstagramPortrait => "Instagram Portrait (4:5)",
            SocialFormat::TwitterPost => "Twitter Post (16:9)",
            SocialFormat::TwitterHeader => "Twitter Header (3:1)",
            SocialFormat::FacebookCover => "FB Cover (205:78)",
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            SocialFormat::InstagramSquare => (1080, 1080),
            SocialFormat::InstagramPortrait => (1080, 1350),
            SocialFormat::TwitterPost => (1200, 675),
            SocialFormat::TwitterHeader => (1500, 500),
            SocialFormat::FacebookCover => (820, 312),
        }
    }

    /// e.g. `twitter_post_(16:9).png`
    pub fn download_file_name(&self) -> String {
        let slug = self
            .label()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_lowercase();
        format!("{}.png", slug)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialRendition {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub url: Option<String>,
    pub download_file_name: String,
}

/// One entry per format. URLs are only filled in when an image id is given.
pub fn renditions(gateway: &dyn MediaGateway, image_id: Option<&str>) -> Vec<SocialRendition> {
    SocialFormat::ALL
        .iter()
        .map(|format| {
            let (width, height) = format.dimensions();
            SocialRendition {
                label: format.label(),
                width,
                height,
                url: image_id
                    .map(|id| gateway.build_url(id, AssetKind::Image, &Rendition::fill(width, height))),
                download_file_name: format.download_file_name(),
            }
        })
        .collect()
}
