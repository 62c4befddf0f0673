//! Per-image import: validate, decode, optionally compress, check the
//! storage ceiling, commit.
//!
//! Images are processed one at a time and saved after each, so a failure
//! part-way through keeps everything imported before it.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use hoard_core::classify::{accepts_undecoded, infer_image_mime, is_vector_image, IMAGE_MIME_PREFIX};
use hoard_core::image::{
    check_storage_space, encode_compressed, encode_data_url, estimated_size, ImageAsset,
    svg_dimensions, RecentFilter, StorageCheck, COMPRESSED_MIME,
};
use hoard_core::types::AssetId;
use hoard_db::repositories::ImageRepo;
use hoard_events::{Notice, NotificationSink};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ImageReader;
use serde::Serialize;

use crate::config::ImportConfig;
use crate::reader::{FileHandle, FileReader};

// ---------------------------------------------------------------------------
// Codec seam
// ---------------------------------------------------------------------------

/// Re-encoded image bytes and their dimensions.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Image decode capability.
pub trait ImageCodec: Send + Sync {
    /// Pixel dimensions of an encoded image.
    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), String>;

    /// Downscale to at most `max_width` and re-encode as JPEG at
    /// `quality` (`0.0..=1.0`).
    fn compress(&self, bytes: &[u8], max_width: u32, quality: f32) -> Result<CompressedImage, String>;
}

/// [`ImageCodec`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl ImageCodec for RasterCodec {
    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), String> {
        let raster = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| e.to_string())?
            .into_dimensions()
            .map_err(|e| e.to_string());
        raster.or_else(|e| svg_dimensions(bytes).ok_or(e))
    }

    fn compress(&self, bytes: &[u8], max_width: u32, quality: f32) -> Result<CompressedImage, String> {
        let decoded = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
        let resized = if decoded.width() > max_width {
            decoded.resize(max_width, decoded.height(), FilterType::Triangle)
        } else {
            decoded
        };
        let rgb = resized.to_rgb8();

        let quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality)
            .encode_image(&rgb)
            .map_err(|e| e.to_string())?;

        Ok(CompressedImage {
            bytes: out,
            width: rgb.width(),
            height: rgb.height(),
        })
    }
}

// ---------------------------------------------------------------------------
// Quota confirmation seam
// ---------------------------------------------------------------------------

/// A request to raise the storage ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaRequest {
    pub file_size: u64,
    pub required: u64,
    pub current_limit: u64,
    pub new_limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Proceed,
    Abort,
}

/// Asks the user whether the storage ceiling may grow.
#[async_trait]
pub trait QuotaPrompt: Send + Sync {
    async fn confirm_increase(&self, request: QuotaRequest) -> QuotaDecision;
}

/// Always answers with the same decision.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub QuotaDecision);

#[async_trait]
impl QuotaPrompt for FixedDecision {
    async fn confirm_increase(&self, _request: QuotaRequest) -> QuotaDecision {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Why an image was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum ImageRejection {
    NotAnImage,
    TooLarge { size: u64, limit: u64 },
    /// Same name and size seen within the recent window.
    RecentlyProcessed,
    ReadFailed(String),
    DecodeFailed(String),
    QuotaDeclined,
    StoreFailed(String),
}

impl std::fmt::Display for ImageRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnImage => f.write_str("not an image"),
            Self::TooLarge { size, limit } => write!(f, "{size} bytes exceeds the {limit} byte limit"),
            Self::RecentlyProcessed => f.write_str("already processed a moment ago"),
            Self::ReadFailed(e) => write!(f, "could not be read: {e}"),
            Self::DecodeFailed(e) => write!(f, "could not be decoded: {e}"),
            Self::QuotaDeclined => f.write_str("storage limit not raised"),
            Self::StoreFailed(e) => write!(f, "could not be saved: {e}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageImportReport {
    pub imported: Vec<(AssetId, String)>,
    pub rejected: Vec<(String, ImageRejection)>,
}

impl ImageImportReport {
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imported.is_empty() && self.rejected.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct ImageImportPipeline {
    codec: Arc<dyn ImageCodec>,
    prompt: Arc<dyn QuotaPrompt>,
    sink: Arc<dyn NotificationSink>,
    recent: RecentFilter,
    max_image_bytes: u64,
}

impl ImageImportPipeline {
    pub fn new(
        config: &ImportConfig,
        codec: Arc<dyn ImageCodec>,
        prompt: Arc<dyn QuotaPrompt>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            codec,
            prompt,
            sink,
            recent: RecentFilter::new(config.recent_image_window),
            max_image_bytes: config.max_image_bytes,
        }
    }

    /// Import every handle in order and report per-file outcomes.
    pub async fn import(
        &mut self,
        repo: &mut ImageRepo,
        reader: &dyn FileReader,
        handles: &[FileHandle],
    ) -> ImageImportReport {
        let mut report = ImageImportReport::default();
        for handle in handles {
            match self.import_one(repo, reader, handle).await {
                Ok(id) => report.imported.push((id, handle.name.clone())),
                Err(rejection) => {
                    tracing::warn!(file = %handle.name, reason = %rejection, "Image not imported");
                    report.rejected.push((handle.name.clone(), rejection));
                }
            }
        }

        if !report.imported.is_empty() {
            self.sink.notify(Notice::success(
                "images.imported",
                format!("Imported {} image(s)", report.imported.len()),
            ));
        }
        if !report.rejected.is_empty() {
            self.sink.notify(
                Notice::warning(
                    "images.rejected",
                    format!("{} image(s) were not imported", report.rejected.len()),
                )
                .with_payload(serde_json::to_value(&report.rejected).unwrap_or_default()),
            );
        }
        report
    }

    async fn import_one(
        &mut self,
        repo: &mut ImageRepo,
        reader: &dyn FileReader,
        handle: &FileHandle,
    ) -> Result<AssetId, ImageRejection> {
        let mime_type = if handle.mime_type.is_empty() {
            infer_image_mime(&handle.name).unwrap_or_default().to_string()
        } else {
            handle.mime_type.clone()
        };
        if !mime_type.to_lowercase().starts_with(IMAGE_MIME_PREFIX) {
            return Err(ImageRejection::NotAnImage);
        }
        if handle.size > self.max_image_bytes {
            return Err(ImageRejection::TooLarge {
                size: handle.size,
                limit: self.max_image_bytes,
            });
        }
        if !self.recent.admit(&handle.name, handle.size, Instant::now()) {
            return Err(ImageRejection::RecentlyProcessed);
        }

        let bytes = reader
            .read_bytes(handle)
            .await
            .map_err(|e| ImageRejection::ReadFailed(e.to_string()))?;
        let (mut width, mut height, decoded) = match self.codec.dimensions(&bytes) {
            Ok((width, height)) => (width, height, true),
            Err(e) if accepts_undecoded(&mime_type) => {
                tracing::debug!(file = %handle.name, error = %e, "Storing image with unknown dimensions");
                (0, 0, false)
            }
            Err(e) => return Err(ImageRejection::DecodeFailed(e)),
        };

        let config = repo.config().clone();
        let mut data_url = String::new();
        let mut compressed_data = None;
        if config.should_compress() && decoded && !is_vector_image(&mime_type) {
            match self
                .codec
                .compress(&bytes, config.max_image_width, config.effective_quality())
            {
                Ok(compressed) => {
                    data_url = encode_data_url(COMPRESSED_MIME, &compressed.bytes);
                    compressed_data = Some(encode_compressed(&compressed.bytes));
                    width = compressed.width;
                    height = compressed.height;
                }
                Err(e) => {
                    tracing::warn!(file = %handle.name, error = %e, "Compression failed, keeping original");
                }
            }
        }
        if data_url.is_empty() {
            data_url = encode_data_url(&mime_type, &bytes);
        }

        let incoming = estimated_size(&data_url);
        if let StorageCheck::NeedsIncrease { required, new_limit } =
            check_storage_space(repo.storage_usage(), incoming, &config)
        {
            let request = QuotaRequest {
                file_size: incoming,
                required,
                current_limit: config.max_storage_size,
                new_limit,
            };
            match self.prompt.confirm_increase(request).await {
                QuotaDecision::Proceed => repo
                    .set_max_storage_size(new_limit)
                    .await
                    .map_err(|e| ImageRejection::StoreFailed(e.to_string()))?,
                QuotaDecision::Abort => return Err(ImageRejection::QuotaDeclined),
            }
        }

        let id = repo.next_id();
        let image = ImageAsset {
            id,
            name: handle.name.clone(),
            mime_type,
            size: handle.size,
            width,
            height,
            upload_time: Utc::now(),
            data_url,
            compressed_data,
            favorite: false,
            tags: Vec::new(),
        };
        repo.add(image)
            .await
            .map_err(|e| ImageRejection::StoreFailed(e.to_string()))?;

        tracing::info!(file = %handle.name, image_id = id, width, height, "Image imported");
        Ok(id)
    }
}
