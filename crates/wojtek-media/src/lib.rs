//! Audio and image processing for Wojtek.
//!
//! - [`pcm`]: base64 / PCM16 decoding of synthesized speech
//! - [`playback`]: playing decoded speech with an explicit completion signal
//! - [`image_pipeline`]: downscaling and persisting uploaded portraits

pub mod error;
pub mod image_pipeline;
pub mod pcm;
pub mod playback;

pub use error::MediaError;
pub use image_pipeline::{CompressedImage, ImagePipeline, compress_image, fit_within};
pub use pcm::{AudioSampleBuffer, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};
pub use playback::{
    AudioOutput, OutputState, PlaybackAdapter, PlaybackCompletion, RodioOutput,
    estimated_speaking_duration,
};
