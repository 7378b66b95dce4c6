use crate::core::{Frame, FrameRequest};
use crate::hal::VideoProvider;
use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Scripted camera for tests and demos.
///
/// Queued frames are handed out first, one per request; once the queue is
/// drained the constant frame (if any) is returned on every request.
pub struct SimulatedCamera {
    available: bool,
    enabled: AtomicBool,
    ghost: Mutex<Option<u8>>,
    queued: Mutex<VecDeque<Frame>>,
    constant: Mutex<Option<Frame>>,
    requests: AtomicU64,
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self {
            available: true,
            enabled: AtomicBool::new(false),
            ghost: Mutex::new(None),
            queued: Mutex::new(VecDeque::new()),
            constant: Mutex::new(None),
            requests: AtomicU64::new(0),
        }
    }

    /// A host without any video device
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn push_frame(&self, frame: Frame) {
        self.queued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(frame);
    }

    pub fn set_constant_frame(&self, frame: Option<Frame>) {
        *self.constant
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = frame;
    }

    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn ghost_level(&self) -> Option<u8> {
        *self.ghost.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoProvider for SimulatedCamera {
    fn is_available(&self) -> bool {
        self.available
    }

    fn enable_video(&self) -> Result<()> {
        if !self.available {
            return Err(anyhow!("No video device present"));
        }
        self.enabled.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn set_preview_ghost(&self, ghost: u8) {
        *self.ghost.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(ghost);
    }

    fn get_frame(&self, _request: &FrameRequest) -> Option<Frame> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if !self.available || !self.is_enabled() {
            return None;
        }

        let queued = self.queued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();

        queued.or_else(|| {
            self.constant
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        })
    }
}
