//! Wojtek interaction layer.
//!
//! Gemini client facade plus the session objects built on it: the chat
//! transcript, per-message speech and the portrait gallery.

pub mod chat;
pub mod gallery;
pub mod gemini_client;
pub mod speech;

pub use chat::{ChatSession, ERROR_REPLY};
pub use gallery::{Gallery, GalleryImage, ImageOrigin};
pub use gemini_client::{GeminiClient, GenerativeTransport, HttpTransport};
pub use speech::{SpeechController, SpeechOutcome, speakable_text};
