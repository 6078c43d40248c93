//! Chat session with Wojtek.

use std::sync::Arc;

use wojtek_core::persona::GREETING;
use wojtek_core::{ChatMessage, PersonaMode};

use crate::gemini_client::GeminiClient;

/// Model message shown when text completion fails.
pub const ERROR_REPLY: &str = "Wojtek ma *Kopfschmerzen*. Reset!";

/// A conversation transcript, opened by Wojtek's greeting.
///
/// Each prompt is sent on its own; earlier turns are not replayed to the model.
pub struct ChatSession {
    client: Arc<GeminiClient>,
    messages: Vec<ChatMessage>,
    mode: PersonaMode,
}

impl ChatSession {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self {
            client,
            messages: vec![ChatMessage::model(GREETING)],
            mode: PersonaMode::default(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message(&self, index: usize) -> Option<&ChatMessage> {
        self.messages.get(index)
    }

    pub fn mode(&self) -> PersonaMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PersonaMode) {
        self.mode = mode;
    }

    /// Switches between demotivation and storytelling; returns the new mode.
    pub fn toggle_mode(&mut self) -> PersonaMode {
        self.mode = self.mode.toggled();
        tracing::debug!("[ChatSession] Mode switched to {:?}", self.mode);
        self.mode
    }

    /// Sends `input` and appends both turns to the transcript.
    ///
    /// Blank input is ignored and returns `None`. Completion failures become
    /// [`ERROR_REPLY`] instead of an error.
    pub async fn send(&mut self, input: &str) -> Option<&ChatMessage> {
        if input.trim().is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::user(input));

        let reply = match self.client.generate_response(input, self.mode).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("[ChatSession] Text completion failed: {}", e);
                ERROR_REPLY.to_string()
            }
        };

        self.messages.push(ChatMessage::model(reply));
        self.messages.last()
    }
}
