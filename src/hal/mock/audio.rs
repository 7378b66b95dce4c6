use crate::hal::{AudioBackend, Oscillator};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Operations observed by the simulated audio graph
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    Created(usize),
    FrequencySet(usize, f64),
    Connected(usize),
    Started(usize),
    Stopped(usize),
    Disconnected(usize),
    Released(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OscillatorState {
    Created,
    Connected,
    Running,
    Stopped,
    Disconnected,
}

#[derive(Default)]
struct GraphShared {
    events: Mutex<Vec<AudioEvent>>,
    next_id: AtomicUsize,
    live: AtomicUsize,
    fail_start: AtomicBool,
}

impl GraphShared {
    fn record(&self, event: AudioEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// In-memory audio graph that records every operation applied to it
#[derive(Clone, Default)]
pub struct SimulatedAudioGraph {
    shared: Arc<GraphShared>,
}

impl SimulatedAudioGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `start` fail
    pub fn fail_on_start(&self, fail: bool) {
        self.shared.fail_start.store(fail, Ordering::Relaxed);
    }

    /// Number of oscillator handles currently alive
    pub fn live_oscillators(&self) -> usize {
        self.shared.live.load(Ordering::Relaxed)
    }

    /// Total number of oscillators ever created
    pub fn created_oscillators(&self) -> usize {
        self.shared.next_id.load(Ordering::Relaxed)
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        self.shared
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Allocate a concrete oscillator bound to this graph
    pub fn spawn_oscillator(&self) -> SimulatedOscillator {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared.live.fetch_add(1, Ordering::Relaxed);
        self.shared.record(AudioEvent::Created(id));
        SimulatedOscillator {
            id,
            graph: self.shared.clone(),
            state: OscillatorState::Created,
            frequency: 440.0,
            sample_rate: 48000.0,
            phase: 0.0,
        }
    }
}

#[async_trait]
impl AudioBackend for SimulatedAudioGraph {
    async fn create_oscillator(&self) -> Result<Box<dyn Oscillator>> {
        Ok(Box::new(self.spawn_oscillator()))
    }
}

/// Sine oscillator living in a `SimulatedAudioGraph`
pub struct SimulatedOscillator {
    id: usize,
    graph: Arc<GraphShared>,
    state: OscillatorState,
    frequency: f64,
    sample_rate: f64,
    phase: f64,
}

impl SimulatedOscillator {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_running(&self) -> bool {
        self.state == OscillatorState::Running
    }

    /// Render the next `count` samples; silence unless running
    pub fn render(&mut self, count: usize) -> Vec<f64> {
        if self.state != OscillatorState::Running {
            return vec![0.0; count];
        }

        let mut samples = Vec::with_capacity(count);
        let delta_phase = 2.0 * PI * self.frequency / self.sample_rate;

        for _ in 0..count {
            samples.push(self.phase.sin());
            self.phase += delta_phase;
            if self.phase > 2.0 * PI {
                self.phase -= 2.0 * PI;
            }
        }

        samples
    }
}

#[async_trait]
impl Oscillator for SimulatedOscillator {
    fn set_frequency(&mut self, hz: f64) {
        self.frequency = hz;
        self.graph.record(AudioEvent::FrequencySet(self.id, hz));
    }

    fn frequency(&self) -> f64 {
        self.frequency
    }

    async fn connect(&mut self) -> Result<()> {
        if self.state != OscillatorState::Created {
            return Err(anyhow!("Cannot connect oscillator in state {:?}", self.state));
        }
        self.state = OscillatorState::Connected;
        self.graph.record(AudioEvent::Connected(self.id));
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        if self.state != OscillatorState::Connected {
            return Err(anyhow!("Cannot start oscillator in state {:?}", self.state));
        }
        if self.graph.fail_start.load(Ordering::Relaxed) {
            return Err(anyhow!("Audio context refused to start oscillator {}", self.id));
        }
        self.state = OscillatorState::Running;
        self.phase = 0.0;
        self.graph.record(AudioEvent::Started(self.id));
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if self.state != OscillatorState::Running {
            return Err(anyhow!("Cannot stop oscillator in state {:?}", self.state));
        }
        self.state = OscillatorState::Stopped;
        self.graph.record(AudioEvent::Stopped(self.id));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.state == OscillatorState::Created || self.state == OscillatorState::Disconnected {
            return Ok(());
        }
        self.state = OscillatorState::Disconnected;
        self.graph.record(AudioEvent::Disconnected(self.id));
        Ok(())
    }
}

impl Drop for SimulatedOscillator {
    fn drop(&mut self) {
        self.graph.live.fetch_sub(1, Ordering::Relaxed);
        self.graph.record(AudioEvent::Released(self.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_oscillator_renders_only_while_running() {
        let graph = SimulatedAudioGraph::new();
        let mut osc = graph.spawn_oscillator();
        osc.set_frequency(1.0);
        osc.sample_rate = 8.0;

        assert!(osc.render(4).iter().all(|s| *s == 0.0));

        osc.connect().await.unwrap();
        osc.start().await.unwrap();
        let data = osc.render(8);
        assert!(data[0].abs() < 0.01);
        assert!((data[2] - 1.0).abs() < 0.01);
        assert!(data[4].abs() < 0.01);
    }

    #[tokio::test]
    async fn test_start_requires_connection() {
        let graph = SimulatedAudioGraph::new();
        let mut osc = graph.spawn_oscillator();
        assert!(osc.start().await.is_err());
    }

    #[test]
    fn test_live_count_tracks_drop() {
        let graph = SimulatedAudioGraph::new();
        let osc = graph.spawn_oscillator();
        assert_eq!(graph.live_oscillators(), 1);
        drop(osc);
        assert_eq!(graph.live_oscillators(), 0);
        assert_eq!(graph.created_oscillators(), 1);
        assert_eq!(graph.events().last(), Some(&AudioEvent::Released(0)));
    }
}
