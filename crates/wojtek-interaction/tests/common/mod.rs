#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{Value, json};
use tokio::sync::Semaphore;
use wojtek_core::secret::{SecretService, StaticSecretService};
use wojtek_core::{Result, WojtekError};
use wojtek_interaction::GeminiClient;
use wojtek_interaction::gemini_client::{
    GenerateContentRequest, GenerateContentResponse, GenerativeTransport,
};
use wojtek_media::{AudioOutput, AudioSampleBuffer, MediaError, OutputState, PlaybackCompletion};

/// Records every request and answers from a script.
///
/// With a gate, each call waits for one permit after being recorded.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<(String, GenerateContentRequest)>>,
    script: Mutex<VecDeque<Result<GenerateContentResponse>>>,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn respond(&self, body: Value) {
        let response = serde_json::from_value(body).expect("valid response fixture");
        self.script.lock().unwrap().push_back(Ok(response));
    }

    pub fn fail(&self, error: WojtekError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<(String, GenerateContentRequest)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.call_count() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("transport was not called in time");
    }
}

#[async_trait]
impl GenerativeTransport for RecordingTransport {
    async fn generate_content(
        &self,
        _api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(GenerateContentResponse::default()))
    }
}

pub fn client_with(transport: Arc<RecordingTransport>, api_key: Option<&str>) -> Arc<GeminiClient> {
    let secrets: Arc<dyn SecretService> = match api_key {
        Some(key) => Arc::new(StaticSecretService::with_api_key(key)),
        None => Arc::new(StaticSecretService::empty()),
    };
    Arc::new(GeminiClient::new(transport, secrets))
}

pub fn text_response(text: &str) -> Value {
    json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
}

pub fn inline_response(mime_type: &str, data: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"inlineData": {"mimeType": mime_type, "data": data}}]}
        }]
    })
}

/// Audio output that is always running and finishes playback at once.
#[derive(Default)]
pub struct InstantOutput {
    started: Mutex<Vec<usize>>,
}

impl InstantOutput {
    pub fn started(&self) -> Vec<usize> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioOutput for InstantOutput {
    fn state(&self) -> OutputState {
        OutputState::Running
    }

    async fn resume(&self) -> std::result::Result<(), MediaError> {
        Ok(())
    }

    fn start(
        &self,
        buffer: AudioSampleBuffer,
    ) -> std::result::Result<PlaybackCompletion, MediaError> {
        self.started.lock().unwrap().push(buffer.frame_count());
        Ok(PlaybackCompletion::finished())
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}
