//! Per-target scheduling loop driving a probe at a live-adjustable cadence.

use crate::probe::EchoProbe;
use crate::session::TargetDescriptor;
use crate::stats::StatsStore;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Smallest accepted interval in seconds, bounding the per-host request rate.
pub const MIN_INTERVAL_S: f64 = 0.1;

// Echo timeout bounds relative to the cadence: interval * 0.8, clamped.
const MIN_TIMEOUT_MS: f64 = 100.0;
const MAX_TIMEOUT_MS: f64 = 5000.0;

/// Cadence-driven ping loop for one target.
///
/// Between `start` and `stop` a dedicated worker thread owns the probe and
/// feeds the shared store; `stop` signals cooperative cancellation and joins
/// the worker, so after it returns the probe and the store are no longer
/// touched by this session. The session is restartable after stopping.
pub struct PingSession {
    target: TargetDescriptor,
    interval_ms: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    probe: Arc<Mutex<Box<dyn EchoProbe>>>,
    store: Arc<StatsStore>,
    worker: Option<JoinHandle<()>>,
}

impl PingSession {
    pub fn new(
        target: TargetDescriptor,
        probe: Box<dyn EchoProbe>,
        store: Arc<StatsStore>,
    ) -> Self {
        let interval_ms = (target.interval_s.max(MIN_INTERVAL_S) * 1000.0) as u64;
        Self {
            target,
            interval_ms: Arc::new(AtomicU64::new(interval_ms)),
            running: Arc::new(AtomicBool::new(false)),
            probe: Arc::new(Mutex::new(probe)),
            store,
            worker: None,
        }
    }

    /// Read-only access to the configured target.
    pub fn target(&self) -> &TargetDescriptor {
        &self.target
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Launches the worker thread. No-op while already running.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let host = self.target.host.clone();
        let running = Arc::clone(&self.running);
        let interval_ms = Arc::clone(&self.interval_ms);
        let probe = Arc::clone(&self.probe);
        let store = Arc::clone(&self.store);
        debug!(host = %host, "starting ping session");
        self.worker = Some(thread::spawn(move || {
            run_loop(&host, &running, &interval_ms, &probe, &store);
        }));
    }

    /// Signals cancellation and blocks until the worker has fully exited.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
            debug!(host = %self.target.host, "ping session stopped");
        }
    }

    /// Updates the cadence, effective on the next loop iteration. The value
    /// is clamped to [`MIN_INTERVAL_S`].
    pub fn set_interval(&self, seconds: f64) {
        let clamped = seconds.max(MIN_INTERVAL_S);
        self.interval_ms
            .store((clamped * 1000.0) as u64, Ordering::SeqCst);
    }
}

impl Drop for PingSession {
    fn drop(&mut self) {
        self.stop();
        self.probe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shutdown();
    }
}

fn run_loop(
    host: &str,
    running: &AtomicBool,
    interval_ms: &AtomicU64,
    probe: &Mutex<Box<dyn EchoProbe>>,
    store: &StatsStore,
) {
    while running.load(Ordering::SeqCst) {
        let iteration_start = Instant::now();
        let interval = Duration::from_millis(interval_ms.load(Ordering::SeqCst));
        let timeout_ms = (interval.as_secs_f64() * 800.0).clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS);
        let timeout = Duration::from_millis(timeout_ms as u64);

        let outcome = probe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(host, timeout);
        match outcome {
            Ok(result) => store.add_sample(host, result.rtt_ms, result.success),
            // Resolution and transport failures become lost samples; a
            // single probe error never terminates the loop.
            Err(e) => {
                warn!(host = %host, error = %e, "probe failed, recording lost sample");
                store.add_sample(host, 0.0, false);
            }
        }

        // Best-effort cadence: sleep whatever remains of the interval, or
        // proceed immediately when probing overran it.
        if let Some(remaining) = interval.checked_sub(iteration_start.elapsed()) {
            thread::sleep(remaining);
        }
    }
}
