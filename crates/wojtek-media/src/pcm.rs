//! Base64 and 16-bit PCM decoding for synthesized speech.
//!
//! The speech service answers with base64-encoded signed 16-bit little-endian
//! PCM. Samples are normalized by dividing by 32768, so the output range is
//! [-1.0, 1.0) with -32768 mapping exactly to -1.0.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

use crate::error::MediaError;

/// Sample rate of synthesized speech, in Hz.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Channel count of synthesized speech.
pub const SPEECH_CHANNELS: usize = 1;

const PCM16_SCALE: f32 = 32768.0;

/// Decodes a standard-alphabet, padded base64 string.
pub fn decode_base64(input: &str) -> Result<Vec<u8>, MediaError> {
    Ok(BASE64_STANDARD.decode(input)?)
}

/// Splits interleaved PCM16 little-endian bytes into normalized per-channel samples.
///
/// Frame count is `floor(samples / channels)`. A trailing partial frame, and a
/// trailing odd byte, are dropped.
pub fn decode_pcm16(bytes: &[u8], channels: usize) -> Result<Vec<Vec<f32>>, MediaError> {
    if channels == 0 {
        return Err(MediaError::InvalidChannelCount);
    }

    let frame_bytes = 2 * channels;
    let frame_count = bytes.len() / frame_bytes;
    let mut output = vec![Vec::with_capacity(frame_count); channels];

    for frame in bytes.chunks_exact(frame_bytes) {
        for (channel, sample) in frame.chunks_exact(2).enumerate() {
            let value = i16::from_le_bytes([sample[0], sample[1]]);
            output[channel].push(f32::from(value) / PCM16_SCALE);
        }
    }

    Ok(output)
}

/// Decoded audio ready for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSampleBuffer {
    sample_rate: u32,
    /// One sample vector per channel, all of equal length.
    channels: Vec<Vec<f32>>,
}

impl AudioSampleBuffer {
    /// Builds a buffer from per-channel samples.
    ///
    /// Channels longer than the shortest one are truncated to keep frames whole.
    pub fn new(sample_rate: u32, mut channels: Vec<Vec<f32>>) -> Result<Self, MediaError> {
        if channels.is_empty() {
            return Err(MediaError::InvalidChannelCount);
        }
        let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        for channel in &mut channels {
            channel.truncate(frames);
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Decodes raw PCM16 bytes.
    pub fn from_pcm16(bytes: &[u8], sample_rate: u32, channels: usize) -> Result<Self, MediaError> {
        Self::new(sample_rate, decode_pcm16(bytes, channels)?)
    }

    /// Decodes base64-encoded PCM16.
    pub fn from_base64_pcm(data: &str, sample_rate: u32, channels: usize) -> Result<Self, MediaError> {
        Self::from_pcm16(&decode_base64(data)?, sample_rate, channels)
    }

    /// Decodes a speech payload at the fixed 24 kHz mono format.
    pub fn from_speech_payload(data: &str) -> Result<Self, MediaError> {
        Self::from_base64_pcm(data, SPEECH_SAMPLE_RATE, SPEECH_CHANNELS)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frame_count(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / f64::from(self.sample_rate))
    }

    /// Interleaves the channels frame by frame, as audio sinks expect.
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frame_count();
        let mut out = Vec::with_capacity(frames * self.channel_count());
        for i in 0..frames {
            for channel in &self.channels {
                out.push(channel[i]);
            }
        }
        out
    }
}
