pub mod tone;

pub use tone::{CpalOscillator, CpalToneBackend};
