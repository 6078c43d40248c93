//! Gallery of Wojtek portraits.
//!
//! Each slot shows, in order of preference: the uploaded image from the store,
//! an image generated earlier in this session, the bundled default file, or a
//! freshly generated image when the default file is missing.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use wojtek_core::{DataUri, ImageSlot, RequestGuard};
use wojtek_media::ImagePipeline;

use crate::gemini_client::GeminiClient;

pub const UPLOADED_LABEL: &str = "Twoja Legenda";
pub const VISION_LABEL: &str = "Wizja Wojtka";

/// Where a gallery image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Uploaded,
    Generated,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryImage {
    pub slot: ImageSlot,
    /// A data URI, or a file path for the bundled default.
    pub source: String,
    pub origin: ImageOrigin,
}

impl GalleryImage {
    /// Caption shown under the image. Any data URI counts as a user legend.
    pub fn label(&self) -> &'static str {
        if DataUri::is_data_uri(&self.source) {
            UPLOADED_LABEL
        } else {
            VISION_LABEL
        }
    }

    pub fn data_uri(&self) -> Option<DataUri> {
        DataUri::parse(self.source.clone())
    }
}

pub struct Gallery {
    client: Arc<GeminiClient>,
    pipeline: ImagePipeline,
    asset_dir: PathBuf,
    generating: RequestGuard<ImageSlot>,
    generated: Mutex<HashMap<ImageSlot, String>>,
}

impl Gallery {
    /// Creates a gallery that looks for default images in the working directory.
    pub fn new(client: Arc<GeminiClient>, pipeline: ImagePipeline) -> Self {
        Self {
            client,
            pipeline,
            asset_dir: PathBuf::from("."),
            generating: RequestGuard::new(),
            generated: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves default image paths against `dir`.
    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = dir.into();
        self
    }

    pub fn pipeline(&self) -> &ImagePipeline {
        &self.pipeline
    }

    pub fn is_generating(&self, slot: ImageSlot) -> bool {
        self.generating.is_in_flight(&slot)
    }

    fn default_path(&self, slot: ImageSlot) -> PathBuf {
        self.asset_dir
            .join(slot.default_image().trim_start_matches("./"))
    }

    fn default_image(&self, slot: ImageSlot) -> GalleryImage {
        GalleryImage {
            slot,
            source: self.default_path(slot).to_string_lossy().into_owned(),
            origin: ImageOrigin::Default,
        }
    }

    fn generated_image(&self, slot: ImageSlot) -> Option<String> {
        self.generated
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&slot)
            .cloned()
    }

    /// The image currently shown for `slot`, without generating anything.
    pub fn current(&self, slot: ImageSlot) -> GalleryImage {
        if let Some(uploaded) = self.pipeline.preview(slot) {
            return GalleryImage {
                slot,
                source: uploaded,
                origin: ImageOrigin::Uploaded,
            };
        }
        if let Some(generated) = self.generated_image(slot) {
            return GalleryImage {
                slot,
                source: generated,
                origin: ImageOrigin::Generated,
            };
        }
        self.default_image(slot)
    }

    /// True when `slot` would show a default image whose file is missing.
    pub fn needs_generation(&self, slot: ImageSlot) -> bool {
        self.current(slot).origin == ImageOrigin::Default && !self.default_path(slot).exists()
    }

    /// Like [`Gallery::current`], but paints the slot when the default file is missing.
    pub async fn resolve(&self, slot: ImageSlot) -> GalleryImage {
        if self.needs_generation(slot) {
            tracing::info!("[Gallery] No image for {}, asking Wojtek to paint one", slot);
            return self.generate(slot).await;
        }
        self.current(slot)
    }

    /// Generates an image for `slot` unless one is stored or being generated.
    ///
    /// Failures are logged and the slot keeps its default image.
    pub async fn generate(&self, slot: ImageSlot) -> GalleryImage {
        if self.pipeline.preview(slot).is_some() {
            return self.current(slot);
        }
        let Some(permit) = self.generating.try_begin(slot) else {
            tracing::debug!("[Gallery] Generation for {} already in flight", slot);
            return self.current(slot);
        };

        match self.client.generate_image(slot.generation_prompt()).await {
            Ok(uri) => {
                permit.complete();
                self.generated
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(slot, uri.into_string());
                self.current(slot)
            }
            Err(e) => {
                permit.fail();
                tracing::error!("[Gallery] Image generation for {} failed: {}", slot, e);
                self.default_image(slot)
            }
        }
    }

    /// Chat avatar: the szaszlyk portrait.
    pub fn avatar(&self) -> GalleryImage {
        self.current(ImageSlot::Szaszlyk)
    }

    /// Refreshes previews whenever a slot key changes in the store.
    pub fn watch_storage(&self) -> JoinHandle<()> {
        let pipeline = self.pipeline.clone();
        let mut changes = pipeline.store().subscribe();

        tokio::spawn(async move {
            loop {
                let refresh = match changes.recv().await {
                    Ok(change) => ImageSlot::ALL
                        .iter()
                        .any(|slot| slot.storage_key() == change.key),
                    // Missed some changes; re-read everything.
                    Err(RecvError::Lagged(_)) => true,
                    Err(RecvError::Closed) => break,
                };
                if refresh {
                    if let Err(e) = pipeline.refresh_previews().await {
                        tracing::warn!("[Gallery] Failed to refresh previews: {}", e);
                    }
                }
            }
            tracing::debug!("[Gallery] Storage watcher stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_depends_on_data_uri() {
        let uploaded = GalleryImage {
            slot: ImageSlot::Szaszlyk,
            source: "data:image/jpeg;base64,AAAA".into(),
            origin: ImageOrigin::Uploaded,
        };
        assert_eq!(uploaded.label(), UPLOADED_LABEL);

        let default = GalleryImage {
            slot: ImageSlot::Egzamin,
            source: "./input_file_1.png".into(),
            origin: ImageOrigin::Default,
        };
        assert_eq!(default.label(), VISION_LABEL);
        assert!(default.data_uri().is_none());
    }
}
