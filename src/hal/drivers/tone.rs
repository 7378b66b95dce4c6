use crate::hal::{AudioBackend, Oscillator};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::f64::consts::PI;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Peak amplitude of the generated tone
const AMPLITUDE: f64 = 0.5;

enum StreamCommand {
    Play(Sender<Result<()>>),
    Pause(Sender<Result<()>>),
    Shutdown,
}

/// Audio backend driving the default output device through CPAL
pub struct CpalToneBackend;

impl CpalToneBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalToneBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioBackend for CpalToneBackend {
    async fn create_oscillator(&self) -> Result<Box<dyn Oscillator>> {
        Ok(Box::new(CpalOscillator::new()))
    }
}

struct StreamWorker {
    commands: Sender<StreamCommand>,
    thread: JoinHandle<()>,
}

/// Sine oscillator on a dedicated output thread.
///
/// CPAL streams cannot cross threads, so the stream is built and owned by a
/// worker thread that takes play/pause/shutdown commands over a channel.
pub struct CpalOscillator {
    frequency: Arc<AtomicU64>,
    worker: Option<StreamWorker>,
}

impl CpalOscillator {
    pub fn new() -> Self {
        Self {
            frequency: Arc::new(AtomicU64::new(440.0f64.to_bits())),
            worker: None,
        }
    }

    async fn request<F>(&self, command: F) -> Result<()>
    where
        F: FnOnce(Sender<Result<()>>) -> StreamCommand,
    {
        let worker = self.worker
            .as_ref()
            .ok_or_else(|| anyhow!("Oscillator is not connected"))?;

        let (reply_tx, reply_rx) = bounded(1);
        worker.commands
            .send(command(reply_tx))
            .map_err(|_| anyhow!("Tone stream worker has exited"))?;

        wait_for(reply_rx).await
    }
}

impl Default for CpalOscillator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Oscillator for CpalOscillator {
    fn set_frequency(&mut self, hz: f64) {
        self.frequency.store(hz.to_bits(), Ordering::Relaxed);
    }

    fn frequency(&self) -> f64 {
        f64::from_bits(self.frequency.load(Ordering::Relaxed))
    }

    async fn connect(&mut self) -> Result<()> {
        if self.worker.is_some() {
            bail!("Oscillator is already connected");
        }

        let (command_tx, command_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);
        let frequency = self.frequency.clone();

        let thread = std::thread::Builder::new()
            .name("tone-output".to_string())
            .spawn(move || run_stream(frequency, command_rx, ready_tx))
            .context("Failed to spawn tone output thread")?;

        self.worker = Some(StreamWorker {
            commands: command_tx,
            thread,
        });

        if let Err(e) = wait_for(ready_rx).await {
            self.disconnect().await?;
            return Err(e);
        }
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        self.request(StreamCommand::Play).await
    }

    async fn stop(&mut self) -> Result<()> {
        self.request(StreamCommand::Pause).await
    }

    async fn disconnect(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        let _ = worker.commands.send(StreamCommand::Shutdown);
        tokio::task::spawn_blocking(move || worker.thread.join())
            .await
            .context("Failed to join tone output thread")?
            .map_err(|_| anyhow!("Tone output thread panicked"))
    }
}

impl Drop for CpalOscillator {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.commands.send(StreamCommand::Shutdown);
        }
    }
}

async fn wait_for(reply: Receiver<Result<()>>) -> Result<()> {
    tokio::task::spawn_blocking(move || reply.recv())
        .await
        .context("Tone stream reply task failed")?
        .map_err(|_| anyhow!("Tone stream worker exited before replying"))?
}

fn run_stream(
    frequency: Arc<AtomicU64>,
    commands: Receiver<StreamCommand>,
    ready: Sender<Result<()>>,
) {
    let stream = match build_stream(frequency) {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    while let Ok(command) = commands.recv() {
        match command {
            StreamCommand::Play(reply) => {
                let _ = reply.send(stream.play().context("Failed to play tone stream"));
            }
            StreamCommand::Pause(reply) => {
                let _ = reply.send(stream.pause().context("Failed to pause tone stream"));
            }
            StreamCommand::Shutdown => break,
        }
    }
}

fn build_stream(frequency: Arc<AtomicU64>) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("No default audio output device"))?;

    let supported = device
        .default_output_config()
        .context("Failed to query default output config")?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        bail!(
            "Unsupported output sample format {:?}, expected F32",
            supported.sample_format()
        );
    }

    let config: cpal::StreamConfig = supported.into();
    let sample_rate = config.sample_rate.0 as f64;
    let channels = config.channels.max(1) as usize;
    let mut phase = 0.0f64;

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let hz = f64::from_bits(frequency.load(Ordering::Relaxed));
                let delta_phase = 2.0 * PI * hz / sample_rate;

                for frame in data.chunks_mut(channels) {
                    let value = (AMPLITUDE * phase.sin()) as f32;
                    for sample in frame.iter_mut() {
                        *sample = value;
                    }
                    phase += delta_phase;
                    if phase > 2.0 * PI {
                        phase -= 2.0 * PI;
                    }
                }
            },
            |err| log::warn!("Tone output stream error: {}", err),
            None,
        )
        .context("Failed to build tone output stream")?;

    // Some backends start playing as soon as the stream is built
    let _ = stream.pause();
    Ok(stream)
}
