use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use wojtek_core::secret::SecretService;
use wojtek_core::storage::KeyValueStore;
use wojtek_core::DataUri;
use wojtek_infrastructure::{ConfigService, JsonFileStore, SecretServiceImpl};
use wojtek_interaction::{Gallery, GeminiClient, SpeechController};
use wojtek_media::{ImagePipeline, PlaybackAdapter, RodioOutput};

/// Services shared by the subcommands.
pub struct AppContext {
    pub client: Arc<GeminiClient>,
    pub file_store: Arc<JsonFileStore>,
    pub store: Arc<dyn KeyValueStore>,
}

impl AppContext {
    pub async fn load() -> Result<Self> {
        let secrets = SecretServiceImpl::default().context("Failed to resolve secret file")?;
        let model_override = secrets
            .load_secrets()
            .await
            .ok()
            .and_then(|config| config.gemini)
            .and_then(|gemini| gemini.model_name);

        let mut client = GeminiClient::with_http(Arc::new(secrets));
        if let Some(model) = model_override {
            tracing::info!("[Wojtek] Using text model {}", model);
            client = client.with_text_model(model);
        }

        let file_store = Arc::new(
            ConfigService::new()
                .open_store()
                .await
                .context("Failed to open local storage")?,
        );

        Ok(Self {
            client: Arc::new(client),
            store: file_store.clone(),
            file_store,
        })
    }

    pub async fn pipeline(&self) -> Result<ImagePipeline> {
        Ok(ImagePipeline::new(Arc::clone(&self.store)).await?)
    }

    pub async fn gallery(&self) -> Result<Gallery> {
        Ok(Gallery::new(Arc::clone(&self.client), self.pipeline().await?))
    }

    pub fn speech(&self) -> SpeechController {
        SpeechController::new(
            Arc::clone(&self.client),
            PlaybackAdapter::new(Arc::new(RodioOutput::new())),
        )
    }
}

/// Decodes a data URI payload and writes it to `path`.
pub fn write_data_uri(uri: &DataUri, path: &Path) -> Result<()> {
    let bytes = BASE64_STANDARD
        .decode(uri.payload())
        .context("Image payload is not valid base64")?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// One-line rendering of an image source; data URIs are summarized.
pub fn describe_source(source: &str) -> String {
    match DataUri::parse(source.to_string()) {
        Some(uri) => format!("{} ({} znaków base64)", uri.mime_type(), uri.payload().len()),
        None => source.to_string(),
    }
}
