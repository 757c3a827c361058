//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (outcomes, durations)
//! - Encoding (passes by kind, bitrate search length)
//! - Network (downloaded bytes, uploads)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

// =============================================================================
// Jobs
// =============================================================================

/// Jobs finished, by mode and outcome.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("soundpost_jobs_total", "Total jobs finished"),
        &["mode", "outcome"], // "inject"/"extract", "succeeded"/"failed"/"cancelled"
    )
    .unwrap()
});

/// Job wall-clock duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("soundpost_job_duration_seconds", "Duration of a whole job")
            .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["mode"],
    )
    .unwrap()
});

// =============================================================================
// Encoding
// =============================================================================

/// Encode passes run by the size-targeting compressor.
pub static ENCODE_PASSES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("soundpost_encode_passes_total", "Compressor encode passes"),
        &["kind"], // "crf", "bitrate"
    )
    .unwrap()
});

/// Bitrate passes needed per compression (0 when the quality pass fit).
pub static BITRATE_ATTEMPTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "soundpost_bitrate_attempts",
            "Bitrate passes per size-targeted compression",
        )
        .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 8.0]),
        &["result"], // "fit", "unreachable"
    )
    .unwrap()
});

// =============================================================================
// Network
// =============================================================================

/// Bytes of audio downloaded.
pub static DOWNLOADED_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("soundpost_downloaded_bytes_total", "Audio bytes downloaded").unwrap()
});

/// Uploads attempted, by result.
pub static UPLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("soundpost_uploads_total", "Total audio uploads"),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(ENCODE_PASSES.clone()),
        Box::new(BITRATE_ATTEMPTS.clone()),
        Box::new(DOWNLOADED_BYTES.clone()),
        Box::new(UPLOADS_TOTAL.clone()),
    ]
}

/// Register all core metrics in `registry`.
pub fn register_metrics(registry: &Registry) -> prometheus::Result<()> {
    for metric in all_metrics() {
        registry.register(metric)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        let registry = Registry::new();
        register_metrics(&registry).unwrap();

        JOBS_TOTAL.with_label_values(&["inject", "succeeded"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "soundpost_jobs_total"));

        // Registering twice in one registry is rejected.
        assert!(register_metrics(&registry).is_err());
    }
}
