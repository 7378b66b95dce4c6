pub mod metrics;
pub mod monitor;

pub use metrics::SensingMetrics;
pub use monitor::SensingMonitor;
