use crate::core::{DrawableShape, Frame, MotionState};
use crate::motion::MotionEngine;
use crate::observability::SensingMetrics;
use super::ErrorPolicy;
use anyhow::{anyhow, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{Duration, Instant};

/// Engine shared between the acquisition loop and the predicates
pub type SharedEngine = Arc<Mutex<ResilientEngine>>;

/// Lock the shared engine, recovering from a poisoned lock
pub fn lock_engine(engine: &SharedEngine) -> MutexGuard<'_, ResilientEngine> {
    engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Best-effort text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

/// Wraps a `MotionEngine` so that none of its failures reach the caller
pub struct ResilientEngine {
    inner: Box<dyn MotionEngine>,
    metrics: Arc<SensingMetrics>,
    policy: ErrorPolicy,
    consecutive_errors: usize,
    open_until: Option<Instant>,
}

impl ResilientEngine {
    pub fn new(
        inner: Box<dyn MotionEngine>,
        metrics: Arc<SensingMetrics>,
        policy: ErrorPolicy,
    ) -> Self {
        Self {
            inner,
            metrics,
            policy,
            consecutive_errors: 0,
            open_until: None,
        }
    }

    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    /// Returns whether the frame was accepted by the engine
    pub fn ingest(&mut self, frame: &Frame) -> bool {
        let start = self.metrics.start_ingest();
        let accepted = self.guarded("ingest", |engine| engine.ingest(frame)).is_some();
        if accepted {
            self.metrics.finish_ingest(start);
        }
        accepted
    }

    pub fn current_brightness(&mut self) -> Option<f64> {
        self.guarded("brightness", |engine| engine.current_brightness())
            .flatten()
    }

    pub fn refresh_global_analysis(&mut self) {
        self.guarded("global analysis", |engine| engine.refresh_global_analysis());
    }

    pub fn compute_local_motion(&mut self, shape: &DrawableShape, state: &mut MotionState) {
        self.guarded("local motion", |engine| engine.compute_local_motion(shape, state));
    }

    pub fn frame_number(&self) -> u64 {
        self.inner.frame_number()
    }

    /// Whether the circuit breaker is currently bypassing the engine
    pub fn is_tripped(&self) -> bool {
        self.open_until.is_some_and(|until| Instant::now() < until)
    }

    fn guarded<T, F>(&mut self, operation: &str, call: F) -> Option<T>
    where
        F: FnOnce(&mut Box<dyn MotionEngine>) -> Result<T>,
    {
        if self.is_tripped() {
            self.metrics.record_engine_skip();
            return None;
        }

        // A panicking engine is treated like one that returned an error
        let inner = &mut self.inner;
        let result = panic::catch_unwind(AssertUnwindSafe(|| call(inner)))
            .unwrap_or_else(|payload| Err(anyhow!("panicked: {}", panic_message(payload.as_ref()))));

        match result {
            Ok(value) => {
                if self.open_until.take().is_some() {
                    log::info!("Motion engine recovered, circuit closed");
                }
                self.consecutive_errors = 0;
                Some(value)
            }
            Err(e) => {
                self.metrics.record_engine_error();
                self.consecutive_errors += 1;
                log::warn!("Motion engine {} failed: {:#}", operation, e);

                if let ErrorPolicy::CircuitBreaker { error_threshold, cooldown_ms } = self.policy {
                    if self.consecutive_errors >= error_threshold {
                        log::warn!(
                            "Motion engine failed {} times in a row, bypassing it for {}ms",
                            self.consecutive_errors,
                            cooldown_ms
                        );
                        self.open_until = Some(Instant::now() + Duration::from_millis(cooldown_ms));
                        self.consecutive_errors = 0;
                    }
                }
                None
            }
        }
    }
}
