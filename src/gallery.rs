//! Gallery card view model and the display formatting behind it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::video;
use crate::media::{AssetKind, MediaGateway, Rendition};

/// One rendered unit in the gallery.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryCard {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub preview_url: String,
    pub full_url: String,
    pub download_file_name: String,
    pub original_size: String,
    pub compressed_size: String,
    pub compression_percentage: Option<i64>,
    pub compression_label: String,
    pub duration: String,
    pub uploaded: String,
}

impl GalleryCard {
    pub fn from_video(video: &video::Model, gateway: &dyn MediaGateway, now: DateTime<Utc>) -> Self {
        let original = parse_size(&video.original_size_bytes);
        let compressed = parse_size(&video.compressed_size_bytes);
        let percentage = compression_percentage(original, compressed);
        let id = video.external_asset_id.as_str();

        Self {
            id: video.id,
            title: video.title.clone(),
            description: video.description.clone(),
            thumbnail_url: gateway.build_url(id, AssetKind::Video, &Rendition::thumbnail()),
            preview_url: gateway.build_url(id, AssetKind::Video, &Rendition::preview()),
            full_url: gateway.build_url(id, AssetKind::Video, &Rendition::full()),
            download_file_name: download_file_name(&video.title),
            original_size: format_size(original),
            compressed_size: format_size(compressed),
            compression_percentage: percentage,
            compression_label: percentage
                .map(|p| format!("{}%", p))
                .unwrap_or_else(|| "n/a".to_string()),
            duration: format_duration(video.duration_seconds),
            uploaded: relative_time(video.created_at.with_timezone(&Utc), now),
        }
    }
}

fn parse_size(raw: &str) -> u64 {
    raw.trim().parse().unwrap_or(0)
}

pub fn download_file_name(title: &str) -> String {
    format!("{}.mp4", title)
}

/// `m:ss`, after rounding to the nearest whole second.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

const SIZE_UNITS: [&str; 6] = ["B", "kB", "MB", "GB", "TB", "PB"];

/// Decimal (SI) units with at most two fractional digits.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while unit < SIZE_UNITS.len() - 1 && round2(value) >= 1000.0 {
        value /= 1000.0;
        unit += 1;
    }

    let formatted = format!("{:.2}", round2(value));
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `round((1 - compressed/original) * 100)`, halves rounded up. `None` when
/// the original size is unknown.
pub fn compression_percentage(original: u64, compressed: u64) -> Option<i64> {
    if original == 0 {
        return None;
    }
    let saved = (1.0 - compressed as f64 / original as f64) * 100.0;
    Some((saved + 0.5).floor() as i64)
}

/// Human phrasing of how long ago `then` was.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0) as f64;
    let minutes = (secs / 60.0).round() as i64;
    let hours = (secs / 3_600.0).round() as i64;
    let days = (secs / 86_400.0).round() as i64;

    if secs < 45.0 {
        "a few seconds ago".to_string()
    } else if secs < 90.0 {
        "a minute ago".to_string()
    } else if minutes < 45 {
        format!("{} minutes ago", minutes)
    } else if minutes < 90 {
        "an hour ago".to_string()
    } else if hours < 22 {
        format!("{} hours ago", hours)
    } else if hours < 36 {
        "a day ago".to_string()
    } else if days < 26 {
        format!("{} days ago", days)
    } else if days < 46 {
        "a month ago".to_string()
    } else {
        let months = ((days as f64 / 30.4375).round() as i64).max(2);
        if months < 11 {
            format!("{} months ago", months)
        } else if months < 18 {
            "a year ago".to_string()
        } else {
            let years = ((days as f64 / 365.25).round() as i64).max(2);
            format!("{} years ago", years)
        }
    }
}
