//! Downscale, compress and persist uploaded portrait images.
//!
//! Uploads are decoded, shrunk so the longer edge is at most [`MAX_DIMENSION`]
//! pixels, re-encoded as JPEG at [`JPEG_QUALITY`] and stored as a data URI
//! under the slot's key.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tokio::sync::watch;
use wojtek_core::storage::KeyValueStore;
use wojtek_core::{DataUri, ImageSlot, Result, WojtekError};

use crate::error::MediaError;

/// Longest edge of a stored image, in pixels.
pub const MAX_DIMENSION: u32 = 600;

/// JPEG quality on the encoder's 1-100 scale (0.5 of the maximum).
pub const JPEG_QUALITY: u8 = 50;

/// How long a "saved" status stays visible.
pub const STATUS_TTL: Duration = Duration::from_secs(2);

/// Computes the target size so that the longer edge does not exceed `max_dim`.
///
/// Aspect ratio is kept and the scaled edge is truncated to whole pixels (at
/// least 1). Images already within the bound keep their size. When both edges
/// are equal the height is the one checked.
pub fn fit_within(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let scale = |edge: u32, long: u32| -> u32 {
        let scaled = u64::from(edge) * u64::from(max_dim) / u64::from(long.max(1));
        (scaled as u32).max(1)
    };

    if width > height {
        if width > max_dim {
            return (max_dim, scale(height, width));
        }
    } else if height > max_dim {
        return (scale(width, height), max_dim);
    }
    (width, height)
}

/// Result of compressing one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub data_uri: DataUri,
    pub width: u32,
    pub height: u32,
}

/// Decodes `bytes`, downsizes and re-encodes them as a JPEG data URI.
///
/// CPU bound; async callers should use [`compress_image_async`].
pub fn compress_image(bytes: &[u8]) -> std::result::Result<CompressedImage, MediaError> {
    let image =
        image::load_from_memory(bytes).map_err(|e| MediaError::ImageDecode(e.to_string()))?;

    let (width, height) = fit_within(image.width(), image.height(), MAX_DIMENSION);
    let resized = if (width, height) == (image.width(), image.height()) {
        image
    } else {
        image.resize_exact(width, height, FilterType::Triangle)
    };

    // JPEG has no alpha channel
    let rgb = resized.to_rgb8();
    let mut jpeg = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| MediaError::ImageEncode(e.to_string()))?;

    let payload = BASE64_STANDARD.encode(jpeg.into_inner());
    Ok(CompressedImage {
        data_uri: DataUri::from_base64("image/jpeg", &payload),
        width,
        height,
    })
}

/// Runs [`compress_image`] on the blocking thread pool.
pub async fn compress_image_async(
    bytes: Vec<u8>,
) -> std::result::Result<CompressedImage, MediaError> {
    tokio::task::spawn_blocking(move || compress_image(&bytes))
        .await
        .map_err(|e| MediaError::ImageDecode(format!("compression task failed: {e}")))?
}

/// Current stored value of each slot; absent slots have nothing uploaded.
pub type SlotPreviews = HashMap<ImageSlot, String>;

/// Upload pipeline with observable previews and a transient status line.
#[derive(Clone)]
pub struct ImagePipeline {
    store: Arc<dyn KeyValueStore>,
    previews: Arc<watch::Sender<SlotPreviews>>,
    status: Arc<watch::Sender<Option<String>>>,
    status_ttl: Duration,
}

impl ImagePipeline {
    /// Creates the pipeline and reads the current slot values from `store`.
    pub async fn new(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let (previews, _) = watch::channel(SlotPreviews::new());
        let (status, _) = watch::channel(None);
        let pipeline = Self {
            store,
            previews: Arc::new(previews),
            status: Arc::new(status),
            status_ttl: STATUS_TTL,
        };
        pipeline.refresh_previews().await?;
        Ok(pipeline)
    }

    /// Overrides how long the status line stays set.
    pub fn with_status_ttl(mut self, ttl: Duration) -> Self {
        self.status_ttl = ttl;
        self
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn subscribe_previews(&self) -> watch::Receiver<SlotPreviews> {
        self.previews.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<Option<String>> {
        self.status.subscribe()
    }

    pub fn preview(&self, slot: ImageSlot) -> Option<String> {
        self.previews.borrow().get(&slot).cloned()
    }

    pub fn status(&self) -> Option<String> {
        self.status.borrow().clone()
    }

    /// Re-reads every slot from the store into the previews.
    pub async fn refresh_previews(&self) -> Result<()> {
        let mut fresh = SlotPreviews::new();
        for slot in ImageSlot::ALL {
            if let Some(value) = self.store.get(slot.storage_key()).await? {
                fresh.insert(slot, value);
            }
        }
        self.previews.send_replace(fresh);
        Ok(())
    }

    /// Compresses `bytes` and stores the result under `slot`.
    ///
    /// When the store rejects the write the preview is left untouched and the
    /// previously stored value stays authoritative.
    pub async fn upload(&self, slot: ImageSlot, bytes: Vec<u8>) -> Result<CompressedImage> {
        let compressed = compress_image_async(bytes).await?;
        tracing::debug!(
            "[ImagePipeline] Compressed {} to {}x{} ({} bytes)",
            slot,
            compressed.width,
            compressed.height,
            compressed.data_uri.as_str().len()
        );

        if let Err(e) = self
            .store
            .set(slot.storage_key(), compressed.data_uri.as_str())
            .await
        {
            tracing::error!("[ImagePipeline] Failed to store {}: {}", slot, e);
            return Err(WojtekError::Storage(e));
        }

        self.previews.send_modify(|previews| {
            previews.insert(slot, compressed.data_uri.as_str().to_string());
        });
        self.announce(format!("Zapisano {slot}!"));
        tracing::info!("[ImagePipeline] Stored new image for {}", slot);

        Ok(compressed)
    }

    /// Reads an image file and uploads it into `slot`.
    pub async fn upload_file(&self, slot: ImageSlot, path: &Path) -> Result<CompressedImage> {
        let bytes = tokio::fs::read(path).await?;
        self.upload(slot, bytes).await
    }

    /// Sets the status line and clears it after the TTL, unless replaced meanwhile.
    fn announce(&self, message: String) {
        self.status.send_replace(Some(message.clone()));

        let status = Arc::clone(&self.status);
        let ttl = self.status_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            status.send_if_modified(|current| {
                if current.as_deref() == Some(message.as_str()) {
                    *current = None;
                    true
                } else {
                    false
                }
            });
        });
    }
}
