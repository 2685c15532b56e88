//! Playback lifecycle.
//!
//! A [`PlaybackDevice`] starts sound and hands back a [`PlaybackHandle`].
//! The device keeps a [`CompletionSignal`] and fires it once the buffer with
//! the last frame has been handed over; the handle resolves on that signal or
//! on cancellation, whichever settles first. Settling happens once.

use crate::audio::buffer::AssembledAudio;
use crate::error::{Result, TannoyError};
use std::any::Any;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

const PLAYING: u8 = 0;
const ENDED: u8 = 1;
const CANCELLED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Ended,
    Cancelled,
}

impl PlaybackState {
    fn from_u8(value: u8) -> Self {
        match value {
            ENDED => PlaybackState::Ended,
            CANCELLED => PlaybackState::Cancelled,
            _ => PlaybackState::Playing,
        }
    }
}

#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    done: Mutex<Option<oneshot::Sender<()>>>,
}

impl Shared {
    fn settle(&self, outcome: u8) -> bool {
        let sender = self
            .done
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(sender) = sender else {
            return false;
        };
        self.state.store(outcome, Ordering::SeqCst);
        if sender.send(()).is_err() {
            tracing::trace!("playback settled after its handle was dropped");
        }
        true
    }

    fn state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

/// Create a linked handle and completion signal for one playback.
pub fn playback() -> (PlaybackHandle, CompletionSignal) {
    let (tx, rx) = oneshot::channel();
    let shared = Arc::new(Shared {
        state: AtomicU8::new(PLAYING),
        done: Mutex::new(Some(tx)),
    });
    let handle = PlaybackHandle {
        shared: Arc::clone(&shared),
        done: rx,
        output: None,
    };
    (handle, CompletionSignal { shared })
}

/// Held by the output; reports that the announcement has ended.
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    shared: Arc<Shared>,
}

impl CompletionSignal {
    /// Mark playback as ended. Returns `false` if it had already settled.
    pub fn finish(&self) -> bool {
        self.shared.settle(ENDED)
    }

    pub fn is_settled(&self) -> bool {
        self.shared.state() != PlaybackState::Playing
    }
}

/// Cancels a playback from anywhere, e.g. a Ctrl-C handler.
#[derive(Debug, Clone)]
pub struct PlaybackCanceller {
    shared: Arc<Shared>,
}

impl PlaybackCanceller {
    /// Returns `false` if the playback had already ended or been cancelled.
    pub fn cancel(&self) -> bool {
        self.shared.settle(CANCELLED)
    }
}

/// One running announcement. Dropping the handle stops the output.
#[derive(Debug)]
pub struct PlaybackHandle {
    shared: Arc<Shared>,
    done: oneshot::Receiver<()>,
    output: Option<Box<dyn Any + Send>>,
}

impl PlaybackHandle {
    /// Keep `output` (typically an audio stream) alive for as long as the handle.
    pub fn with_output<T: Send + 'static>(mut self, output: T) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.state()
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    pub fn canceller(&self) -> PlaybackCanceller {
        PlaybackCanceller {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn cancel(&self) -> bool {
        self.shared.settle(CANCELLED)
    }

    /// Wait until playback ends or is cancelled, then release the output.
    ///
    /// # Errors
    /// `Playback` if the output went away without ever settling.
    pub async fn finished(mut self) -> Result<PlaybackState> {
        match (&mut self.done).await {
            Ok(()) => Ok(self.state()),
            Err(_) => Err(TannoyError::Playback {
                message: "audio output stopped before the announcement ended".to_string(),
            }),
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        if self.shared.settle(CANCELLED) {
            tracing::debug!("playback handle dropped while playing");
        }
    }
}

/// An output that can play assembled announcements.
pub trait PlaybackDevice: Send + Sync {
    /// Start playing `audio` and return immediately.
    ///
    /// # Errors
    /// `Playback` or `AudioDeviceNotFound` if the output cannot be opened.
    fn play(&self, audio: AssembledAudio) -> Result<PlaybackHandle>;

    fn name(&self) -> String;
}

impl<T: PlaybackDevice + ?Sized> PlaybackDevice for Arc<T> {
    fn play(&self, audio: AssembledAudio) -> Result<PlaybackHandle> {
        (**self).play(audio)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// Mock playback device for testing
#[derive(Debug, Clone, Default)]
pub struct MockPlaybackDevice {
    played: Arc<Mutex<Vec<AssembledAudio>>>,
    pending: Arc<Mutex<Vec<CompletionSignal>>>,
    hold: bool,
    should_fail: bool,
}

impl MockPlaybackDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep every playback running until [`finish_all`](Self::finish_all).
    pub fn with_hold(mut self) -> Self {
        self.hold = true;
        self
    }

    /// Configure the mock to fail on play
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Everything played so far, in order.
    pub fn played(&self) -> Vec<AssembledAudio> {
        self.played
            .lock()
            .map(|played| played.clone())
            .unwrap_or_default()
    }

    /// End every held playback. Returns how many were still running.
    pub fn finish_all(&self) -> usize {
        let signals = self
            .pending
            .lock()
            .map(|mut pending| std::mem::take(&mut *pending))
            .unwrap_or_default();
        signals.iter().filter(|signal| signal.finish()).count()
    }
}

impl PlaybackDevice for MockPlaybackDevice {
    fn play(&self, audio: AssembledAudio) -> Result<PlaybackHandle> {
        if self.should_fail {
            return Err(TannoyError::Playback {
                message: "mock playback error".to_string(),
            });
        }

        if let Ok(mut played) = self.played.lock() {
            played.push(audio);
        }

        let (handle, signal) = playback();
        if self.hold {
            if let Ok(mut pending) = self.pending.lock() {
                pending.push(signal);
            }
        } else {
            signal.finish();
        }
        Ok(handle)
    }

    fn name(&self) -> String {
        "mock".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn audio() -> AssembledAudio {
        AssembledAudio::new(vec![0.0; 100], 44100)
    }

    #[tokio::test]
    async fn finish_resolves_handle_as_ended() {
        let (handle, signal) = playback();
        assert!(handle.is_playing());

        assert!(signal.finish());
        assert_eq!(handle.finished().await.unwrap(), PlaybackState::Ended);
    }

    #[tokio::test]
    async fn completion_fires_once() {
        let (handle, signal) = playback();
        let clone = signal.clone();

        assert!(signal.finish());
        assert!(!clone.finish());
        assert!(!handle.cancel());
        assert_eq!(handle.state(), PlaybackState::Ended);
    }

    #[tokio::test]
    async fn cancel_wins_over_later_finish() {
        let (handle, signal) = playback();
        let canceller = handle.canceller();

        assert!(canceller.cancel());
        assert!(!signal.finish());
        assert_eq!(handle.finished().await.unwrap(), PlaybackState::Cancelled);
    }

    #[tokio::test]
    async fn finish_from_another_task() {
        let (handle, signal) = playback();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            signal.finish();
        });
        assert_eq!(handle.finished().await.unwrap(), PlaybackState::Ended);
    }

    #[test]
    fn dropping_handle_cancels() {
        let (handle, signal) = playback();
        drop(handle);
        assert!(signal.is_settled());
        assert!(!signal.finish());
    }

    #[test]
    fn poisoned_lock_still_settles() {
        let (handle, signal) = playback();
        let shared = Arc::clone(&signal.shared);
        let holder = std::thread::spawn(move || {
            let _guard = shared.done.lock().unwrap();
            panic!("panic while holding the completion lock");
        });
        assert!(holder.join().is_err());
        assert!(signal.shared.done.is_poisoned());

        assert!(signal.finish());
        assert_eq!(handle.state(), PlaybackState::Ended);
        assert!(!signal.finish());
    }

    #[test]
    fn output_is_kept_alive_with_handle() {
        let marker = Arc::new(());
        let (handle, _signal) = playback();
        let handle = handle.with_output(Arc::clone(&marker));
        assert_eq!(Arc::strong_count(&marker), 2);
        drop(handle);
        assert_eq!(Arc::strong_count(&marker), 1);
    }

    #[tokio::test]
    async fn mock_records_and_finishes() {
        let device = MockPlaybackDevice::new();
        let handle = device.play(audio()).unwrap();
        assert_eq!(handle.finished().await.unwrap(), PlaybackState::Ended);
        assert_eq!(device.played().len(), 1);
        assert_eq!(device.name(), "mock");
    }

    #[tokio::test]
    async fn mock_hold_keeps_playing_until_finished() {
        let device = MockPlaybackDevice::new().with_hold();
        let handle = device.play(audio()).unwrap();
        assert!(handle.is_playing());

        assert_eq!(device.finish_all(), 1);
        assert_eq!(handle.finished().await.unwrap(), PlaybackState::Ended);
    }

    #[test]
    fn mock_failure() {
        let device = MockPlaybackDevice::new().with_failure();
        assert!(matches!(
            device.play(audio()),
            Err(TannoyError::Playback { .. })
        ));
        assert!(device.played().is_empty());
    }
}
