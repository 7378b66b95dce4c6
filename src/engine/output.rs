use crate::core::Target;
use crate::hal::{AudioBackend, Oscillator};
use anyhow::Result;
use std::sync::Arc;

/// Frequency of the actuation tone
pub const TONE_FREQUENCY_HZ: f64 = 17000.0;

/// Output channel states
#[derive(Default)]
pub enum OutputState {
    #[default]
    Idle,
    Active(Box<dyn Oscillator>),
}

impl OutputState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Active(_) => "Active",
        }
    }
}

impl std::fmt::Debug for OutputState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Active(osc) => f
                .debug_struct("Active")
                .field("frequency", &osc.frequency())
                .finish(),
        }
    }
}

/// On/off control of the single ultrasonic tone.
///
/// Commands never fail: unmet preconditions and repeated transitions are
/// silent no-ops, backend errors are logged and leave the channel Idle.
pub struct OutputController {
    audio: Option<Arc<dyn AudioBackend>>,
    state: OutputState,
}

impl OutputController {
    pub fn new(audio: Option<Arc<dyn AudioBackend>>) -> Self {
        Self {
            audio,
            state: OutputState::Idle,
        }
    }

    pub fn state(&self) -> &OutputState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Frequency of the live tone, if any
    pub fn frequency(&self) -> Option<f64> {
        match &self.state {
            OutputState::Active(osc) => Some(osc.frequency()),
            OutputState::Idle => None,
        }
    }

    pub async fn switch_on(&mut self, target: &Target) {
        if self.state.is_active() {
            return;
        }
        let Some(audio) = self.audio.as_ref() else {
            log::debug!("Switch on ignored: no audio engine");
            return;
        };
        if !target.has_sound_bank {
            log::debug!("Switch on ignored: entity {} has no sound bank", target.id.0);
            return;
        }

        match activate(audio.as_ref()).await {
            Ok(osc) => {
                log::info!("Tone output on at {} Hz", osc.frequency());
                self.state = OutputState::Active(osc);
            }
            Err(e) => log::warn!("Failed to switch tone output on: {:#}", e),
        }
    }

    pub async fn switch_off(&mut self) {
        let OutputState::Active(mut osc) = std::mem::take(&mut self.state) else {
            return;
        };

        if let Err(e) = osc.stop().await {
            log::warn!("Failed to stop tone output: {:#}", e);
        }
        if let Err(e) = osc.disconnect().await {
            log::warn!("Failed to disconnect tone output: {:#}", e);
        }
        log::info!("Tone output off");
    }
}

async fn activate(audio: &dyn AudioBackend) -> Result<Box<dyn Oscillator>> {
    let mut osc = audio.create_oscillator().await?;
    osc.set_frequency(TONE_FREQUENCY_HZ);
    osc.connect().await?;

    if let Err(e) = osc.start().await {
        let _ = osc.disconnect().await;
        return Err(e);
    }
    Ok(osc)
}
