pub mod policy;
pub mod resilient_engine;

pub use policy::ErrorPolicy;
pub use resilient_engine::{lock_engine, ResilientEngine, SharedEngine};
