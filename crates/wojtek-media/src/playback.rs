//! Audio playback for synthesized speech.
//!
//! [`PlaybackAdapter::play`] resumes a suspended output before starting and
//! returns a [`PlaybackCompletion`] that resolves once the output has drained.
//! Playback runs once, end to end; there is no pause, seek or loop.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::MediaError;
use crate::pcm::AudioSampleBuffer;

/// Per-character estimate used by [`estimated_speaking_duration`].
pub const SPEAKING_MS_PER_CHAR: u64 = 60;

/// Upper bound for [`estimated_speaking_duration`].
pub const MAX_SPEAKING_ESTIMATE: Duration = Duration::from_millis(5000);

/// Rough speaking time for `text`, for front ends without a completion signal.
pub fn estimated_speaking_duration(text: &str) -> Duration {
    let chars = text.chars().count() as u64;
    Duration::from_millis(chars.saturating_mul(SPEAKING_MS_PER_CHAR)).min(MAX_SPEAKING_ESTIMATE)
}

/// Whether an output can start sound right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Running,
    /// Must be resumed before playback is scheduled.
    Suspended,
}

/// Resolves when the output reports end of stream for one playback.
#[must_use = "dropping the completion does not stop playback, but loses the result"]
pub struct PlaybackCompletion {
    rx: oneshot::Receiver<Result<(), MediaError>>,
}

impl PlaybackCompletion {
    /// Creates a completion and the sender the output uses to signal it.
    pub fn channel() -> (oneshot::Sender<Result<(), MediaError>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// A completion that is already resolved.
    pub fn finished() -> Self {
        let (tx, completion) = Self::channel();
        let _ = tx.send(Ok(()));
        completion
    }
}

impl Future for PlaybackCompletion {
    type Output = Result<(), MediaError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|result| {
            result.unwrap_or_else(|_| {
                Err(MediaError::Playback(
                    "audio output stopped before signalling completion".into(),
                ))
            })
        })
    }
}

/// Host audio output.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    fn state(&self) -> OutputState;

    /// Brings a suspended output into the running state.
    async fn resume(&self) -> Result<(), MediaError>;

    /// Schedules `buffer` for immediate playback.
    fn start(&self, buffer: AudioSampleBuffer) -> Result<PlaybackCompletion, MediaError>;
}

/// Plays decoded audio through an [`AudioOutput`].
#[derive(Clone)]
pub struct PlaybackAdapter {
    output: Arc<dyn AudioOutput>,
}

impl PlaybackAdapter {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self { output }
    }

    /// Starts playback, resuming the output first if it is suspended.
    pub async fn play(&self, buffer: AudioSampleBuffer) -> Result<PlaybackCompletion, MediaError> {
        if self.output.state() == OutputState::Suspended {
            tracing::debug!("[Playback] Output suspended, resuming before start");
            self.output.resume().await?;
        }

        tracing::debug!(
            "[Playback] Starting {} frames at {} Hz ({} ch)",
            buffer.frame_count(),
            buffer.sample_rate(),
            buffer.channel_count()
        );
        self.output.start(buffer)
    }

    /// Starts playback and waits until it has finished.
    pub async fn play_to_end(&self, buffer: AudioSampleBuffer) -> Result<(), MediaError> {
        self.play(buffer).await?.await
    }

    /// Decodes a 24 kHz mono speech payload and plays it to the end.
    pub async fn play_speech_payload(&self, base64_pcm: &str) -> Result<(), MediaError> {
        let buffer = AudioSampleBuffer::from_speech_payload(base64_pcm)?;
        self.play_to_end(buffer).await
    }
}

/// Default system output via rodio.
///
/// Starts suspended; [`AudioOutput::resume`] checks that an output device
/// exists. Each playback opens the device on its own OS thread, because the
/// underlying stream handle cannot move between threads.
pub struct RodioOutput {
    suspended: AtomicBool,
}

impl RodioOutput {
    pub fn new() -> Self {
        Self {
            suspended: AtomicBool::new(true),
        }
    }
}

impl Default for RodioOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioOutput for RodioOutput {
    fn state(&self) -> OutputState {
        if self.suspended.load(Ordering::Acquire) {
            OutputState::Suspended
        } else {
            OutputState::Running
        }
    }

    async fn resume(&self) -> Result<(), MediaError> {
        let device_name = tokio::task::spawn_blocking(|| {
            use rodio::cpal::traits::{DeviceTrait, HostTrait};

            let device = rodio::cpal::default_host()
                .default_output_device()
                .ok_or_else(|| MediaError::OutputUnavailable("no default output device".into()))?;
            Ok::<_, MediaError>(device.name().unwrap_or_else(|_| "unknown".to_string()))
        })
        .await
        .map_err(|e| MediaError::OutputUnavailable(format!("device lookup panicked: {e}")))??;

        tracing::info!("[Playback] Audio output resumed on '{}'", device_name);
        self.suspended.store(false, Ordering::Release);
        Ok(())
    }

    fn start(&self, buffer: AudioSampleBuffer) -> Result<PlaybackCompletion, MediaError> {
        if self.state() == OutputState::Suspended {
            return Err(MediaError::Playback("output is suspended".into()));
        }
        if buffer.is_empty() {
            return Ok(PlaybackCompletion::finished());
        }

        let channels = u16::try_from(buffer.channel_count())
            .map_err(|_| MediaError::Playback("too many channels".into()))?;
        let sample_rate = buffer.sample_rate();
        let samples = buffer.interleaved();

        let (tx, completion) = PlaybackCompletion::channel();
        std::thread::Builder::new()
            .name("wojtek-playback".into())
            .spawn(move || {
                let result = (|| -> Result<(), MediaError> {
                    let mut stream_handle = rodio::OutputStreamBuilder::open_default_stream()
                        .map_err(|e| MediaError::OutputUnavailable(e.to_string()))?;
                    // Dropping the stream after playback finished is expected
                    stream_handle.log_on_drop(false);
                    let sink = rodio::Sink::connect_new(stream_handle.mixer());
                    sink.append(rodio::buffer::SamplesBuffer::new(channels, sample_rate, samples));
                    sink.sleep_until_end();
                    Ok(())
                })();
                let _ = tx.send(result);
            })
            .map_err(|e| MediaError::Playback(format!("failed to spawn playback thread: {e}")))?;

        Ok(completion)
    }
}
