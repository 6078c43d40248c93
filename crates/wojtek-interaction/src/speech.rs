//! Speech playback for chat messages.
//!
//! At most one synthesis request runs per message index, and playbacks of
//! different messages are queued behind one another.

use std::sync::Arc;

use tokio::sync::Mutex;
use wojtek_core::RequestGuard;
use wojtek_media::PlaybackAdapter;

use crate::gemini_client::GeminiClient;

/// What happened to a speak request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Audio was played to the end.
    Played,
    /// Nothing to play: no credential or no audio in the response.
    Silent,
    /// The message is already being spoken.
    AlreadySpeaking,
    /// Synthesis, decoding or playback failed; the error was logged.
    Failed,
}

/// Strips markdown emphasis markers, which would otherwise be read aloud.
pub fn speakable_text(text: &str) -> String {
    text.replace('*', "")
}

pub struct SpeechController {
    client: Arc<GeminiClient>,
    playback: PlaybackAdapter,
    speaking: RequestGuard<usize>,
    playback_lock: Mutex<()>,
}

impl SpeechController {
    pub fn new(client: Arc<GeminiClient>, playback: PlaybackAdapter) -> Self {
        Self {
            client,
            playback,
            speaking: RequestGuard::new(),
            playback_lock: Mutex::new(()),
        }
    }

    /// Whether message `index` is being synthesized or played.
    pub fn is_speaking(&self, index: usize) -> bool {
        self.speaking.is_in_flight(&index)
    }

    /// Speaks the message at `index` unless it is already being spoken.
    pub async fn speak_message(&self, index: usize, text: &str) -> SpeechOutcome {
        let Some(permit) = self.speaking.try_begin(index) else {
            tracing::debug!("[Speech] Message {} is already speaking", index);
            return SpeechOutcome::AlreadySpeaking;
        };

        let outcome = self.speak(text).await;
        if outcome == SpeechOutcome::Failed {
            permit.fail();
        } else {
            permit.complete();
        }
        outcome
    }

    /// Synthesizes `text` and plays it to the end. Errors are logged, not returned.
    pub async fn speak(&self, text: &str) -> SpeechOutcome {
        let payload = match self.client.generate_speech(&speakable_text(text)).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return SpeechOutcome::Silent,
            Err(e) => {
                tracing::error!("[Speech] Synthesis failed: {}", e);
                return SpeechOutcome::Failed;
            }
        };

        let _playing = self.playback_lock.lock().await;
        match self.playback.play_speech_payload(&payload).await {
            Ok(()) => SpeechOutcome::Played,
            Err(e) => {
                tracing::error!("[Speech] Playback failed: {}", e);
                SpeechOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speakable_text_drops_asterisks() {
        assert_eq!(
            speakable_text("Wojtek ma *Kopfschmerzen*. Reset!"),
            "Wojtek ma Kopfschmerzen. Reset!"
        );
        assert_eq!(speakable_text("**"), "");
    }
}
