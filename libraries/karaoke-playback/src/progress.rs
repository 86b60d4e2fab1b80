//! Periodic progress sampling while playing

use crate::engine::PlaybackEngine;
use crate::message::{ControllerMessage, ProgressSample};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Owns the at-most-one progress sampling task
///
/// Each start bumps the generation; samples from an older generation are
/// stale and must be ignored by the receiver. Stopping (or dropping the
/// ticker) aborts the task.
#[derive(Debug, Default)]
pub struct ProgressTicker {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl ProgressTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any running ticker with a fresh one
    pub fn start(
        &mut self,
        engine: Arc<dyn PlaybackEngine>,
        sink: mpsc::UnboundedSender<ControllerMessage>,
        interval: Duration,
    ) {
        self.stop();
        let generation = self.generation;
        self.handle = Some(tokio::spawn(sample_loop(engine, sink, interval, generation)));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether a sample comes from the currently running ticker
    pub fn accepts(&self, sample: &ProgressSample) -> bool {
        self.is_running() && sample.generation == self.generation
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn sample_loop(
    engine: Arc<dyn PlaybackEngine>,
    sink: mpsc::UnboundedSender<ControllerMessage>,
    interval: Duration,
    generation: u64,
) {
    loop {
        match engine.status().await {
            Ok(status) => {
                let sample = ProgressSample {
                    generation,
                    position_ms: status.position_ms,
                    duration_ms: status.duration_ms,
                };
                if sink.send(ControllerMessage::Progress(sample)).is_err() {
                    break;
                }
            }
            Err(e) => trace!(error = %e, "Skipping progress sample"),
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MediaItem;
    use crate::simulated::SimulatedEngine;
    use karaoke_core::Track;

    async fn playing_engine() -> Arc<SimulatedEngine> {
        let (engine, _events) = SimulatedEngine::new(Duration::from_secs(100));
        let track = Track::new("a", "A", "Artist").with_audio_url("https://example.com/a.mp3");
        engine.load(vec![MediaItem::from(&track)], 0, 0).await.unwrap();
        engine.play().await.unwrap();
        Arc::new(engine)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ControllerMessage>) -> Vec<ProgressSample> {
        let mut samples = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let ControllerMessage::Progress(sample) = message {
                samples.push(sample);
            }
        }
        samples
    }

    #[tokio::test(start_paused = true)]
    async fn samples_at_interval() {
        let engine = playing_engine().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = ProgressTicker::new();

        ticker.start(engine, tx, Duration::from_millis(250));
        tokio::time::sleep(Duration::from_millis(1_010)).await;

        let samples = drain(&mut rx);
        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|s| ticker.accepts(s)));
        assert_eq!(samples[4].position_ms, 1_000);
        assert_eq!(samples[4].duration_ms, 100_000);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_invalidates_old_samples() {
        let engine = playing_engine().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = ProgressTicker::new();

        ticker.start(engine.clone(), tx.clone(), Duration::from_millis(250));
        tokio::time::sleep(Duration::from_millis(10)).await;
        let old = drain(&mut rx);

        ticker.start(engine, tx, Duration::from_millis(250));
        assert!(!old.is_empty());
        assert!(old.iter().all(|s| !ticker.accepts(s)));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_sampling() {
        let engine = playing_engine().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = ProgressTicker::new();

        ticker.start(engine, tx, Duration::from_millis(250));
        tokio::time::sleep(Duration::from_millis(10)).await;
        ticker.stop();
        drain(&mut rx);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(drain(&mut rx).is_empty());
        assert!(!ticker.is_running());
    }
}
