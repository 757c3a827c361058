//! Configuration for size-targeted compression.

use serde::{Deserialize, Serialize};

/// Tuning of the quality pass and the bounded bitrate search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressorConfig {
    /// Constant-quality value of the first pass.
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Encoder speed preset (x264 names; mapped for VP9).
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Lower bound of the bitrate band, bits/second.
    #[serde(default = "default_min_bitrate")]
    pub min_bitrate_bps: u64,

    /// Upper bound of the bitrate band, bits/second.
    #[serde(default = "default_max_bitrate")]
    pub max_bitrate_bps: u64,

    /// Multiplier applied to the first bitrate estimate to absorb container overhead.
    #[serde(default = "default_headroom")]
    pub headroom: f64,

    /// Extra multiplier applied on each proportional correction; biases towards undershoot.
    #[serde(default = "default_safety_factor")]
    pub safety_factor: f64,

    /// Maximum number of bitrate passes after the quality pass.
    #[serde(default = "default_max_attempts")]
    pub max_bitrate_attempts: u32,
}

fn default_crf() -> u8 {
    28
}

fn default_preset() -> String {
    "fast".to_string()
}

fn default_min_bitrate() -> u64 {
    100_000
}

fn default_max_bitrate() -> u64 {
    1_500_000
}

fn default_headroom() -> f64 {
    0.94
}

fn default_safety_factor() -> f64 {
    0.90
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            crf: default_crf(),
            preset: default_preset(),
            min_bitrate_bps: default_min_bitrate(),
            max_bitrate_bps: default_max_bitrate(),
            headroom: default_headroom(),
            safety_factor: default_safety_factor(),
            max_bitrate_attempts: default_max_attempts(),
        }
    }
}

impl CompressorConfig {
    /// Clamps a bitrate into the configured band.
    pub fn clamp_bitrate(&self, bitrate_bps: f64) -> u64 {
        let min = self.min_bitrate_bps as f64;
        let max = self.max_bitrate_bps as f64;
        if bitrate_bps.is_nan() {
            return self.min_bitrate_bps;
        }
        bitrate_bps.clamp(min, max).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompressorConfig::default();
        assert_eq!(config.crf, 28);
        assert_eq!(config.preset, "fast");
        assert_eq!(config.min_bitrate_bps, 100_000);
        assert_eq!(config.max_bitrate_bps, 1_500_000);
        assert_eq!(config.max_bitrate_attempts, 3);
    }

    #[test]
    fn test_clamp_bitrate() {
        let config = CompressorConfig::default();
        assert_eq!(config.clamp_bitrate(50_000.0), 100_000);
        assert_eq!(config.clamp_bitrate(9_000_000.0), 1_500_000);
        assert_eq!(config.clamp_bitrate(640_000.4), 640_000);
        assert_eq!(config.clamp_bitrate(f64::INFINITY), 1_500_000);
        assert_eq!(config.clamp_bitrate(f64::NAN), 100_000);
        assert_eq!(config.clamp_bitrate(-1.0), 100_000);
    }

    #[test]
    fn test_deserialize_overrides() {
        let config: CompressorConfig = toml::from_str(
            r#"
            crf = 30
            max_bitrate_attempts = 5
        "#,
        )
        .unwrap();
        assert_eq!(config.crf, 30);
        assert_eq!(config.max_bitrate_attempts, 5);
        assert_eq!(config.headroom, 0.94);
    }
}
