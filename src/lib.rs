pub mod blocks;
pub mod config;
pub mod core;
pub mod engine;
pub mod extension;
pub mod hal;
pub mod motion;
pub mod observability;
pub mod resilience;

pub use blocks::{BlockKind, BlockOpcode, BlockValue};
pub use config::SensingConfig;
pub use extension::WaniBoard;
