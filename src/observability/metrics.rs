use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for the acquisition loop and the motion engine behind it
pub struct SensingMetrics {
    wakeups: AtomicU64,
    frame_requests: AtomicU64,
    frames_accepted: AtomicU64,
    empty_captures: AtomicU64,
    engine_errors: AtomicU64,
    engine_skips: AtomicU64,
    total_ingest_us: AtomicU64,
    ingest_samples: AtomicU64,
}

impl SensingMetrics {
    pub fn new() -> Self {
        Self {
            wakeups: AtomicU64::new(0),
            frame_requests: AtomicU64::new(0),
            frames_accepted: AtomicU64::new(0),
            empty_captures: AtomicU64::new(0),
            engine_errors: AtomicU64::new(0),
            engine_skips: AtomicU64::new(0),
            total_ingest_us: AtomicU64::new(0),
            ingest_samples: AtomicU64::new(0),
        }
    }

    pub fn wakeups(&self) -> u64 {
        self.wakeups.load(Ordering::Relaxed)
    }

    pub fn frame_requests(&self) -> u64 {
        self.frame_requests.load(Ordering::Relaxed)
    }

    pub fn frames_accepted(&self) -> u64 {
        self.frames_accepted.load(Ordering::Relaxed)
    }

    pub fn empty_captures(&self) -> u64 {
        self.empty_captures.load(Ordering::Relaxed)
    }

    pub fn engine_errors(&self) -> u64 {
        self.engine_errors.load(Ordering::Relaxed)
    }

    /// Engine calls bypassed by an open circuit breaker
    pub fn engine_skips(&self) -> u64 {
        self.engine_skips.load(Ordering::Relaxed)
    }

    pub fn record_wakeup(&self) {
        self.wakeups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_request(&self) {
        self.frame_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_accepted(&self) {
        self.frames_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty_capture(&self) {
        self.empty_captures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_engine_error(&self) {
        self.engine_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_engine_skip(&self) {
        self.engine_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_ingest(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_ingest(&self, start: Instant) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.total_ingest_us.fetch_add(latency_us, Ordering::Relaxed);
        self.ingest_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_ingest_latency_us(&self) -> u64 {
        let samples = self.ingest_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_ingest_us.load(Ordering::Relaxed) / samples
    }
}

impl Default for SensingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
