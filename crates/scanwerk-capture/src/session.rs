// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live detection session: a cancelable sampling loop that runs one detection
// pass, publishes the result, waits for the cadence, and repeats.
//
// Passes never overlap because the next one is only scheduled after the
// previous result has been published. The latest result lives in a `watch`
// channel: the loop is the single writer and any number of overlay renderers
// read it.
//
// Cancellation bumps a shared generation counter before waking the loop. A
// pass that was already running when `stop()` or `restart()` was called sees
// the new generation and discards its result instead of publishing it. The
// bump and the loop's check-then-write both run under the watch lock.
//
// Passes run on the blocking pool so a slow frame never stalls a runtime
// worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use scanwerk_core::config::{DetectionConfig, ScanConfig};
use scanwerk_core::error::{Result, ScanError};
use scanwerk_core::types::{DetectedQuadrilateral, DisplayGeometry};
use scanwerk_document::Detector;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::traits::VideoSource;

/// Result of one loop iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The source had no frame; nothing ran and nothing is published.
    NotReady,
    /// A pass ran. `None` means nothing acceptable was found or the pass
    /// failed; either way it replaces the previous result.
    Analyzed(Option<DetectedQuadrilateral>),
}

impl TickOutcome {
    /// The value to publish, if any.
    pub fn published(&self) -> Option<Option<DetectedQuadrilateral>> {
        match self {
            Self::NotReady => None,
            Self::Analyzed(detection) => Some(*detection),
        }
    }
}

/// One iteration of the sampling loop, without any timer.
///
/// Detections come back in display coordinates.
pub fn run_tick(source: &dyn VideoSource, detector: &Detector) -> TickOutcome {
    if !source.is_ready() {
        debug!("Video source not ready; skipping pass");
        return TickOutcome::NotReady;
    }

    let native = match source.current_frame() {
        Ok(Some(frame)) if frame.width() > 0 && frame.height() > 0 => frame,
        Ok(_) => return TickOutcome::NotReady,
        Err(err) => {
            warn!(error = %err, "Could not read video frame");
            return TickOutcome::Analyzed(None);
        }
    };

    let geometry = match source.display_size() {
        Some((display_width, display_height)) => DisplayGeometry {
            native_width: native.width(),
            native_height: native.height(),
            display_width,
            display_height,
        },
        None => DisplayGeometry::identity(native.width(), native.height()),
    };

    TickOutcome::Analyzed(detector.analyze_native(&native, &geometry))
}

/// Handle to a running detection loop.
///
/// Dropping the handle cancels the loop without waiting for it.
pub struct DetectionSession {
    source: Arc<dyn VideoSource>,
    config: DetectionConfig,
    /// Single-writer cell holding the latest detection.
    latest: Arc<watch::Sender<Option<DetectedQuadrilateral>>>,
    /// Bumped on every stop/restart; loops compare against their own.
    generation: Arc<AtomicU64>,
    shutdown_signal: Arc<Notify>,
    task_handle: Option<JoinHandle<()>>,
}

impl DetectionSession {
    /// Start sampling `source` at `config.cadence()`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `config` does not validate, `Session` if there is no
    /// runtime to spawn on.
    pub fn start(source: Arc<dyn VideoSource>, config: DetectionConfig) -> Result<Self> {
        let (latest, _) = watch::channel(None);
        let mut session = Self {
            source,
            config: config.clone(),
            latest: Arc::new(latest),
            generation: Arc::new(AtomicU64::new(0)),
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
        };
        session.spawn_loop(config)?;
        Ok(session)
    }

    /// Start only if the scanner settings have detection enabled.
    pub fn start_if_enabled(
        source: Arc<dyn VideoSource>,
        settings: &ScanConfig,
    ) -> Result<Option<Self>> {
        if !settings.detection_enabled {
            info!("Live detection disabled in settings");
            return Ok(None);
        }
        Self::start(source, settings.detection.clone()).map(Some)
    }

    /// A receiver that observes every published detection.
    pub fn subscribe(&self) -> watch::Receiver<Option<DetectedQuadrilateral>> {
        self.latest.subscribe()
    }

    /// The most recently published detection.
    pub fn latest(&self) -> Option<DetectedQuadrilateral> {
        *self.latest.borrow()
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Replace the running loop with one using `config`.
    ///
    /// The new configuration is validated first; on error the current loop
    /// keeps running untouched. The last published detection is kept until
    /// the new loop publishes its first result.
    pub async fn restart(&mut self, config: DetectionConfig) -> Result<()> {
        let detector = Detector::new(config.clone())?;
        self.halt().await?;
        self.config = config;
        self.spawn_with(detector)
    }

    /// Cancel the loop and wait for it to exit.
    ///
    /// Any pass in flight finishes its computation but does not publish.
    /// The last published detection stays readable through `latest()`.
    pub async fn stop(&mut self) -> Result<()> {
        if self.task_handle.is_none() {
            return Ok(());
        }
        self.halt().await?;
        info!("Detection session stopped");
        Ok(())
    }

    // -- Loop management ------------------------------------------------------

    fn spawn_loop(&mut self, config: DetectionConfig) -> Result<()> {
        let detector = Detector::new(config)?;
        self.spawn_with(detector)
    }

    fn spawn_with(&mut self, detector: Detector) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ScanError::Session(format!("no Tokio runtime: {e}")))?;

        // Fresh signal per loop so a stale permit cannot stop the new one.
        self.shutdown_signal = Arc::new(Notify::new());
        let my_generation = self.generation.load(Ordering::SeqCst);
        let cadence = detector.config().cadence();

        let ctx = LoopContext {
            source: Arc::clone(&self.source),
            detector: Arc::new(detector),
            latest: Arc::clone(&self.latest),
            generation: Arc::clone(&self.generation),
            my_generation,
            shutdown: Arc::clone(&self.shutdown_signal),
            cadence,
        };

        info!(
            generation = my_generation,
            cadence_ms = cadence.as_millis() as u64,
            downsample = ctx.detector.config().downsample_factor,
            "Detection session started"
        );
        self.task_handle = Some(runtime.spawn(sampling_loop(ctx)));
        Ok(())
    }

    /// Bump the generation and wake the loop. The bump happens under the
    /// watch lock so a loop cannot publish between its check and its write.
    fn invalidate(&self) {
        self.latest.send_if_modified(|_| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            false
        });
        self.shutdown_signal.notify_one();
    }

    /// Invalidate the current loop and wait for it to exit.
    async fn halt(&mut self) -> Result<()> {
        self.invalidate();
        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| ScanError::Session(format!("detection loop join: {e}")))?;
        }
        Ok(())
    }
}

impl Drop for DetectionSession {
    fn drop(&mut self) {
        self.invalidate();
    }
}

struct LoopContext {
    source: Arc<dyn VideoSource>,
    detector: Arc<Detector>,
    latest: Arc<watch::Sender<Option<DetectedQuadrilateral>>>,
    generation: Arc<AtomicU64>,
    my_generation: u64,
    shutdown: Arc<Notify>,
    cadence: Duration,
}

impl LoopContext {
    fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.my_generation
    }

    /// Store `detection` unless this loop has been invalidated.
    fn publish(&self, detection: Option<DetectedQuadrilateral>) -> bool {
        self.latest.send_if_modified(|slot| {
            if !self.is_current() {
                return false;
            }
            *slot = detection;
            true
        })
    }

    async fn run_pass(&self) -> TickOutcome {
        let source = Arc::clone(&self.source);
        let detector = Arc::clone(&self.detector);
        match tokio::task::spawn_blocking(move || run_tick(source.as_ref(), &detector)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "Detection pass did not complete");
                TickOutcome::Analyzed(None)
            }
        }
    }
}

async fn sampling_loop(ctx: LoopContext) {
    let mut passes: u64 = 0;
    loop {
        if !ctx.is_current() {
            break;
        }

        let outcome = ctx.run_pass().await;

        match outcome.published() {
            Some(detection) if ctx.publish(detection) => passes += 1,
            Some(_) => {
                debug!(generation = ctx.my_generation, "Pass finished after cancellation; discarded");
                break;
            }
            None if !ctx.is_current() => break,
            None => {}
        }

        tokio::select! {
            _ = ctx.shutdown.notified() => {
                debug!(generation = ctx.my_generation, "Sampling loop received shutdown signal");
                break;
            }
            _ = tokio::time::sleep(ctx.cadence) => {}
        }
    }
    debug!(generation = ctx.my_generation, passes, "Sampling loop exited");
}
