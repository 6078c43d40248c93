//! GeminiClient - direct REST client for the three Wojtek operations.
//!
//! Text completion, image generation and speech synthesis all go through the
//! `generateContent` endpoint. The API key is resolved on every call, and each
//! operation reacts differently when it is missing:
//!
//! | operation | no API key |
//! |---|---|
//! | [`GeminiClient::generate_response`] | fixed instructive message, no request |
//! | [`GeminiClient::generate_image`] | `WojtekError::MissingCredential` |
//! | [`GeminiClient::generate_speech`] | `Ok(None)`, no request |

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use wojtek_core::secret::SecretService;
use wojtek_core::{DataUri, PersonaMode, Result, WojtekError};

pub const TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const SPEECH_VOICE: &str = "Kore";
pub const IMAGE_ASPECT_RATIO: &str = "1:1";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Returned by text completion when no API key is configured.
pub const MISSING_KEY_REPLY: &str =
    "Skonfiguruj API_KEY na Netlify (Environment variables)! Wojtek nie ma paliwa.";

/// Returned by text completion when the response carries no text.
pub const EMPTY_REPLY: &str = "Wojtek ma pauzę. Reset!";

fn image_prompt(prompt: &str) -> String {
    format!("A humorous photo, {prompt}, realistic style, vivid colors.")
}

fn speech_prompt(text: &str) -> String {
    format!("Powiedz to wyluzowanym, lekko leniwym głosem: {text}")
}

/// Sends `generateContent` requests.
#[async_trait]
pub trait GenerativeTransport: Send + Sync {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

/// [`GenerativeTransport`] over HTTPS.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Points the transport at another endpoint root (e.g. a local proxy).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeTransport for HttpTransport {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!("{}/{model}:generateContent", self.base_url);

        let response = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await
            .map_err(|err| {
                // reqwest errors may embed the URL; drop it so the key never leaks
                WojtekError::transport(None, format!("Gemini API request failed: {}", err.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        response.json().await.map_err(|err| {
            WojtekError::transport(None, format!("Failed to parse Gemini response: {}", err.without_url()))
        })
    }
}

/// Facade over the Gemini operations used by Wojtek.
#[derive(Clone)]
pub struct GeminiClient {
    transport: Arc<dyn GenerativeTransport>,
    secrets: Arc<dyn SecretService>,
    text_model: String,
}

impl GeminiClient {
    pub fn new(transport: Arc<dyn GenerativeTransport>, secrets: Arc<dyn SecretService>) -> Self {
        Self {
            transport,
            secrets,
            text_model: TEXT_MODEL.to_string(),
        }
    }

    /// Client talking to the public Gemini endpoint.
    pub fn with_http(secrets: Arc<dyn SecretService>) -> Self {
        Self::new(Arc::new(HttpTransport::new()), secrets)
    }

    /// Overrides the text completion model.
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    async fn api_key(&self) -> Option<String> {
        self.secrets.api_key().await
    }

    /// Asks Wojtek for a reply in the given persona.
    pub async fn generate_response(&self, prompt: &str, mode: PersonaMode) -> Result<String> {
        let Some(api_key) = self.api_key().await else {
            tracing::warn!("[GeminiClient] Brak klucza API_KEY. Wojtek milczy.");
            return Ok(MISSING_KEY_REPLY.to_string());
        };

        let request = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            system_instruction: Some(Content::text(mode.system_instruction())),
            generation_config: None,
        };

        tracing::debug!("[GeminiClient] Text completion ({:?}) via {}", mode, self.text_model);
        let response = self
            .transport
            .generate_content(&api_key, &self.text_model, &request)
            .await?;

        Ok(response
            .text()
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| EMPTY_REPLY.to_string()))
    }

    /// Generates a square image and returns it as a data URI.
    pub async fn generate_image(&self, prompt: &str) -> Result<DataUri> {
        let api_key = self.api_key().await.ok_or(WojtekError::MissingCredential)?;

        let request = GenerateContentRequest {
            contents: vec![Content::user_text(&image_prompt(prompt))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: IMAGE_ASPECT_RATIO.to_string(),
                }),
                ..Default::default()
            }),
        };

        tracing::debug!("[GeminiClient] Image generation via {}", IMAGE_MODEL);
        let response = self
            .transport
            .generate_content(&api_key, IMAGE_MODEL, &request)
            .await?;

        let parts = response.first_parts().ok_or(WojtekError::NoContent)?;
        parts
            .iter()
            .find_map(|part| part.inline_data.as_ref())
            .map(|inline| DataUri::from_base64(&inline.mime_type, &inline.data))
            .ok_or(WojtekError::NoInlineImage)
    }

    /// Synthesizes `text` with the Kore voice.
    ///
    /// Returns base64-encoded 24 kHz mono PCM16, or `None` when there is no
    /// API key or the response carries no audio.
    pub async fn generate_speech(&self, text: &str) -> Result<Option<String>> {
        let Some(api_key) = self.api_key().await else {
            tracing::debug!("[GeminiClient] No API key, skipping speech synthesis");
            return Ok(None);
        };

        let request = GenerateContentRequest {
            contents: vec![Content::user_text(&speech_prompt(text))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig::prebuilt(SPEECH_VOICE)),
                ..Default::default()
            }),
        };

        tracing::debug!("[GeminiClient] Speech synthesis via {}", SPEECH_MODEL);
        let response = self
            .transport
            .generate_content(&api_key, SPEECH_MODEL, &request)
            .await?;

        Ok(response
            .first_parts()
            .and_then(|parts| parts.first())
            .and_then(|part| part.inline_data.as_ref())
            .map(|inline| inline.data.clone()))
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    fn user_text(text: &str) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::Text {
                text: text.to_string(),
            }],
        }
    }

    fn text(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part::Text {
                text: text.to_string(),
            }],
        }
    }

    /// Concatenated text of all text parts.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

impl SpeechConfig {
    fn prebuilt(voice_name: &str) -> Self {
        Self {
            voice_config: VoiceConfig {
                prebuilt_voice_config: PrebuiltVoiceConfig {
                    voice_name: voice_name.to_string(),
                },
            },
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Parts of the first candidate, if it has any content.
    pub fn first_parts(&self) -> Option<&[ResponsePart]> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.as_deref())
    }

    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = self.first_parts()?;
        let texts: Vec<&str> = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub content: Option<ResponseContent>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ResponseContent {
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ResponsePart {
    pub text: Option<String>,
    #[serde(rename = "inlineData")]
    pub inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn map_http_error(status: StatusCode, body: String) -> WojtekError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    WojtekError::transport(Some(status.as_u16()), message)
}
