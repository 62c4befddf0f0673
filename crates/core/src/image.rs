//! Image records, the image collection, and storage-quota arithmetic.
//!
//! Images live in their own flat collection with a locally-scoped id
//! counter disjoint from asset ids. They are never duplicate-resolved; a
//! short rolling window only suppresses double submission.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{AssetId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Per-image size ceiling (20 MB).
pub const MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

/// Default storage ceiling for the collection (100 MB).
pub const DEFAULT_MAX_STORAGE_SIZE: u64 = 100 * 1024 * 1024;

/// Default step by which the ceiling grows (100 MB).
pub const DEFAULT_STORAGE_SCALE_FACTOR: u64 = 100 * 1024 * 1024;

pub const DEFAULT_MAX_IMAGE_WIDTH: u32 = 9999;

/// Window in which a same name+size image is treated as a re-fired event.
pub const RECENT_IMAGE_WINDOW: Duration = Duration::from_secs(3);

/// MIME type of re-encoded images.
pub const COMPRESSED_MIME: &str = "image/jpeg";

// ---------------------------------------------------------------------------
// ImageAsset
// ---------------------------------------------------------------------------

/// A stored image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    pub id: AssetId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    pub upload_time: Timestamp,
    /// Displayable `data:` URL. Not persisted when `compressed_data` can
    /// rebuild it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data_url: String,
    /// base91 encoding of the re-encoded JPEG bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_data: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ImageAsset {
    /// Estimated stored bytes of the image payload.
    pub fn estimated_bytes(&self) -> u64 {
        estimated_size(&self.data_url)
    }

    /// Rebuild `data_url` from `compressed_data` when it is missing.
    ///
    /// Returns `false` when the record has neither and cannot be shown.
    pub fn repair(&mut self) -> bool {
        if !self.data_url.is_empty() {
            return true;
        }
        match &self.compressed_data {
            Some(compressed) => {
                self.data_url = restore_data_url(compressed);
                true
            }
            None => false,
        }
    }
}

/// Bytes represented by a base64 payload, estimated as 3/4 of its length.
pub fn estimated_size(data_url: &str) -> u64 {
    (data_url.len() as f64 * 0.75) as u64
}

// ---------------------------------------------------------------------------
// SVG
// ---------------------------------------------------------------------------

static SVG_ROOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<svg\b([^>]*)>").expect("valid regex"));

/// Unitless or `px` lengths only; percentages have no intrinsic size.
static SVG_LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)(width|height)\s*=\s*["']\s*([0-9]+(?:\.[0-9]+)?)\s*(?:px)?\s*["']"#)
        .expect("valid regex")
});

static SVG_VIEWBOX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)viewBox\s*=\s*["']\s*-?[0-9.]+[\s,]+-?[0-9.]+[\s,]+([0-9.]+)[\s,]+([0-9.]+)\s*["']"#)
        .expect("valid regex")
});

/// Intrinsic size of an SVG document from the root element's `width` and
/// `height`, completed from `viewBox` when one of them is missing.
pub fn svg_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let text = std::str::from_utf8(bytes).ok()?;
    let attrs = SVG_ROOT_RE.captures(text)?.get(1)?.as_str();

    let (mut width, mut height) = (None, None);
    for cap in SVG_LENGTH_RE.captures_iter(attrs) {
        let value = cap[2].parse::<f64>().ok();
        if cap[1].eq_ignore_ascii_case("width") {
            width = width.or(value);
        } else {
            height = height.or(value);
        }
    }
    let view_box = SVG_VIEWBOX_RE
        .captures(attrs)
        .and_then(|c| Some((c[1].parse::<f64>().ok()?, c[2].parse::<f64>().ok()?)));

    let (w, h) = match (width, height, view_box) {
        (Some(w), Some(h), _) => (w, h),
        (Some(w), None, Some((vw, vh))) if vw > 0.0 => (w, w * vh / vw),
        (None, Some(h), Some((vw, vh))) if vh > 0.0 => (h * vw / vh, h),
        (None, None, Some(view)) => view,
        _ => return None,
    };
    let (w, h) = (w.round(), h.round());
    if w < 1.0 || h < 1.0 || w > u32::MAX as f64 || h > u32::MAX as f64 {
        return None;
    }
    Some((w as u32, h as u32))
}

// ---------------------------------------------------------------------------
// Data URL helpers
// ---------------------------------------------------------------------------

pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Split a base64 `data:` URL into MIME type and decoded bytes.
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>), CoreError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| CoreError::Validation("Not a data URL".into()))?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| CoreError::Validation("Data URL is not base64-encoded".into()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| CoreError::Validation(format!("Invalid base64 payload: {e}")))?;
    Ok((mime.to_string(), bytes))
}

/// Alternate encoding stored alongside compressed images.
pub fn encode_compressed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(&base91::slice_encode(bytes)).to_string()
}

pub fn restore_data_url(compressed: &str) -> String {
    let bytes = base91::slice_decode(compressed.as_bytes());
    encode_data_url(COMPRESSED_MIME, &bytes)
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Image-manager settings persisted under `image-manager-config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageManagerConfig {
    pub max_storage_size: u64,
    pub storage_scale_factor: u64,
    pub use_compression: bool,
    pub compression_quality: f32,
    pub max_image_width: u32,
    pub auto_compress_images: bool,
    pub lazy_load_images: bool,
    pub last_updated: Option<Timestamp>,
}

impl Default for ImageManagerConfig {
    fn default() -> Self {
        Self {
            max_storage_size: DEFAULT_MAX_STORAGE_SIZE,
            storage_scale_factor: DEFAULT_STORAGE_SCALE_FACTOR,
            use_compression: false,
            compression_quality: 1.0,
            max_image_width: DEFAULT_MAX_IMAGE_WIDTH,
            auto_compress_images: false,
            lazy_load_images: true,
            last_updated: None,
        }
    }
}

impl ImageManagerConfig {
    pub fn should_compress(&self) -> bool {
        self.use_compression || self.auto_compress_images
    }

    /// JPEG quality in `0.0..=1.0`. Auto-compress alone keeps full quality.
    pub fn effective_quality(&self) -> f32 {
        if self.use_compression {
            self.compression_quality.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

// ---------------------------------------------------------------------------
// Storage quota
// ---------------------------------------------------------------------------

/// Outcome of [`check_storage_space`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageCheck {
    Fits,
    /// The ceiling must grow to `new_limit` (a whole number of scale
    /// steps) before `required` bytes fit.
    NeedsIncrease { required: u64, new_limit: u64 },
}

pub fn check_storage_space(current_usage: u64, incoming: u64, config: &ImageManagerConfig) -> StorageCheck {
    let required = current_usage + incoming;
    if required <= config.max_storage_size {
        return StorageCheck::Fits;
    }
    let scale = config.storage_scale_factor.max(1);
    let increase = (required - config.max_storage_size).div_ceil(scale) * scale;
    StorageCheck::NeedsIncrease {
        required,
        new_limit: config.max_storage_size + increase,
    }
}

// ---------------------------------------------------------------------------
// Recent-submission filter
// ---------------------------------------------------------------------------

/// Suppresses an image whose name and size were seen within `window`.
#[derive(Debug)]
pub struct RecentFilter {
    window: Duration,
    seen: Vec<(String, u64, Instant)>,
}

impl RecentFilter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: Vec::new(),
        }
    }

    /// Record the file and return `true` if it was not seen recently.
    pub fn admit(&mut self, name: &str, size: u64, now: Instant) -> bool {
        let window = self.window;
        self.seen
            .retain(|(_, _, at)| now.saturating_duration_since(*at) < window);
        if self.seen.iter().any(|(n, s, _)| n == name && *s == size) {
            return false;
        }
        self.seen.push((name.to_string(), size, now));
        true
    }
}

impl Default for RecentFilter {
    fn default() -> Self {
        Self::new(RECENT_IMAGE_WINDOW)
    }
}

// ---------------------------------------------------------------------------
// ImageCollection
// ---------------------------------------------------------------------------

/// Collection counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStats {
    pub total_images: usize,
    pub total_size: u64,
    pub favorites: usize,
}

/// The flat image array plus its id counter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageCollection {
    pub images: Vec<ImageAsset>,
    counter: AssetId,
}

impl ImageCollection {
    /// Build from loaded records, repairing or dropping unusable ones.
    ///
    /// Returns the collection and how many records were dropped. The id
    /// counter resumes after the largest surviving id.
    pub fn from_loaded(mut images: Vec<ImageAsset>) -> (Self, usize) {
        let before = images.len();
        images.retain_mut(ImageAsset::repair);
        let dropped = before - images.len();
        let counter = images.iter().map(|i| i.id).max().unwrap_or(0);
        (Self { images, counter }, dropped)
    }

    pub fn next_id(&mut self) -> AssetId {
        self.counter += 1;
        self.counter
    }

    pub fn push(&mut self, image: ImageAsset) {
        self.counter = self.counter.max(image.id);
        self.images.push(image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn find_by_id(&self, id: AssetId) -> Option<&ImageAsset> {
        self.images.iter().find(|i| i.id == id)
    }

    fn locate_mut(&mut self, id: AssetId) -> Result<&mut ImageAsset, CoreError> {
        self.images
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(CoreError::NotFound { entity: "image", id })
    }

    /// Estimated bytes used by all image payloads.
    pub fn storage_usage(&self) -> u64 {
        self.images.iter().map(ImageAsset::estimated_bytes).sum()
    }

    pub fn toggle_favorite(&mut self, id: AssetId) -> Result<bool, CoreError> {
        let image = self.locate_mut(id)?;
        image.favorite = !image.favorite;
        Ok(image.favorite)
    }

    /// Rename an image. Returns `false` when the trimmed name is unchanged.
    pub fn rename(&mut self, id: AssetId, new_name: &str) -> Result<bool, CoreError> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() || !trimmed.contains('.') {
            return Err(CoreError::Validation(
                "Image name must include a file extension".into(),
            ));
        }
        let image = self.locate_mut(id)?;
        if image.name == trimmed {
            return Ok(false);
        }
        image.name = trimmed.to_string();
        Ok(true)
    }

    pub fn remove(&mut self, id: AssetId) -> Result<ImageAsset, CoreError> {
        let index = self
            .images
            .iter()
            .position(|i| i.id == id)
            .ok_or(CoreError::NotFound { entity: "image", id })?;
        Ok(self.images.remove(index))
    }

    pub fn search(&self, query: &str) -> Vec<&ImageAsset> {
        let needle = query.to_lowercase();
        self.images
            .iter()
            .filter(|i| i.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn stats(&self) -> ImageStats {
        ImageStats {
            total_images: self.images.len(),
            total_size: self.images.iter().map(|i| i.size).sum(),
            favorites: self.images.iter().filter(|i| i.favorite).count(),
        }
    }

    pub fn clear(&mut self) {
        self.images.clear();
        self.counter = 0;
    }
}
