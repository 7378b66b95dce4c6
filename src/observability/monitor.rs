use super::SensingMetrics;
use std::sync::Arc;

pub struct SensingMonitor {
    metrics: Arc<SensingMetrics>,
}

impl SensingMonitor {
    pub fn new(metrics: Arc<SensingMetrics>) -> Self {
        Self { metrics }
    }

    pub fn generate_report(&self) -> String {
        let m = &self.metrics;
        if m.wakeups() == 0 {
            return "Acquisition loop has not run".to_string();
        }

        let errors = match m.engine_errors() {
            0 => "0 errors".to_string(),
            1 => "1 error".to_string(),
            n => format!("{} errors", n),
        };

        format!(
            "=== Sensing Metrics ===\n  Wake-ups: {}\n  Frames: {} requested, {} accepted, {} empty\n  Engine: {}, {} skipped calls\n  Avg Ingest Latency: {}μs\n",
            m.wakeups(),
            m.frame_requests(),
            m.frames_accepted(),
            m.empty_captures(),
            errors,
            m.engine_skips(),
            m.avg_ingest_latency_us()
        )
    }

    pub fn metrics(&self) -> &SensingMetrics {
        &self.metrics
    }
}
