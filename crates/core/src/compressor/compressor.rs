//! Size-targeting video compressor.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::config::CompressorConfig;
use super::types::{CompressError, CompressionReport, EncodeAttempt, PassKind};
use crate::encoder::{Container, EncodeCommand, MediaEncoder};
use crate::metrics;

/// Rate control of a single silent re-encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateControl {
    Crf(u8),
    Bitrate(u64),
}

impl RateControl {
    fn pass_kind(&self) -> PassKind {
        match self {
            Self::Crf(_) => PassKind::Crf,
            Self::Bitrate(_) => PassKind::Bitrate,
        }
    }

    fn parameter(&self) -> u64 {
        match self {
            Self::Crf(crf) => u64::from(*crf),
            Self::Bitrate(bps) => *bps,
        }
    }
}

/// Re-encodes the video stream of `input` without audio.
pub fn silent_video_command(
    input: &Path,
    output: &Path,
    container: Container,
    rate: RateControl,
    preset: &str,
) -> EncodeCommand {
    let codec = container.video_codec();
    let mut args = vec![
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-an".to_string(),
        "-c:v".to_string(),
        codec.ffmpeg_codec().to_string(),
    ];
    match rate {
        RateControl::Crf(crf) => args.extend(codec.crf_args(crf)),
        RateControl::Bitrate(bps) => args.extend(codec.bitrate_args(bps)),
    }
    args.extend(codec.speed_args(preset));
    args.extend(["-pix_fmt".to_string(), "yuv420p".to_string()]);
    args.extend(container.muxer_args());
    args.push(output.to_string_lossy().to_string());

    EncodeCommand {
        args,
        output_path: output.to_path_buf(),
    }
}

/// Average bitrate (bits/second) that spends `budget_bytes` over `duration_secs`.
pub fn estimate_bitrate(budget_bytes: u64, duration_secs: f64) -> f64 {
    (budget_bytes as f64 * 8.0) / duration_secs
}

/// Produces a silent re-encode of a video no larger than a byte budget.
///
/// One constant-quality pass is tried first. If it overshoots, the source
/// duration is probed and a bounded series of constrained-bitrate passes
/// follows, each correcting the previous bitrate by how far the output
/// missed the budget.
pub struct SizeTargetingCompressor<E: MediaEncoder> {
    encoder: Arc<E>,
    config: CompressorConfig,
}

impl<E: MediaEncoder> SizeTargetingCompressor<E> {
    /// Creates a compressor over a shared encoder.
    pub fn new(encoder: Arc<E>, config: CompressorConfig) -> Self {
        Self { encoder, config }
    }

    /// Returns the compressor configuration.
    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    async fn pass(
        &self,
        input: &Path,
        output: &Path,
        container: Container,
        rate: RateControl,
    ) -> Result<EncodeAttempt, CompressError> {
        let command = silent_video_command(input, output, container, rate, &self.config.preset);
        let result = self.encoder.run(&command).await?;
        let kind = rate.pass_kind();
        metrics::ENCODE_PASSES
            .with_label_values(&[&kind.to_string()])
            .inc();

        debug!(
            pass = %kind,
            parameter = rate.parameter(),
            size_bytes = result.size_bytes,
            elapsed_ms = result.duration_ms,
            "Encode pass finished"
        );

        Ok(EncodeAttempt {
            pass_kind: kind,
            parameter: rate.parameter(),
            resulting_size_bytes: result.size_bytes,
        })
    }

    /// Compresses `input` into `output` so that it is at most `budget_bytes`.
    pub async fn compress(
        &self,
        input: &Path,
        output: &Path,
        budget_bytes: u64,
        container: Container,
    ) -> Result<CompressionReport, CompressError> {
        let mut attempts = Vec::new();

        let first = self
            .pass(input, output, container, RateControl::Crf(self.config.crf))
            .await?;
        attempts.push(first);
        if first.resulting_size_bytes <= budget_bytes {
            info!(
                size_bytes = first.resulting_size_bytes,
                budget_bytes, "Quality pass fits the budget"
            );
            return Ok(self.report(output, budget_bytes, attempts, "fit"));
        }

        let duration = match self.encoder.probe_duration(input).await {
            Ok(d) if d.is_finite() && d > 0.0 => d,
            Ok(d) => {
                return Err(CompressError::DurationUnknown {
                    reason: format!("probed duration {} is not positive", d),
                })
            }
            Err(e) => {
                return Err(CompressError::DurationUnknown {
                    reason: e.to_string(),
                })
            }
        };

        let estimate = estimate_bitrate(budget_bytes, duration);
        let mut bitrate = self.config.clamp_bitrate(estimate * self.config.headroom);
        info!(
            size_bytes = first.resulting_size_bytes,
            budget_bytes,
            duration_secs = duration,
            bitrate_bps = bitrate,
            "Quality pass too large, switching to bitrate targeting"
        );

        let mut best_size = first.resulting_size_bytes;
        let mut passes = 0u32;
        while passes < self.config.max_bitrate_attempts {
            passes += 1;
            let attempt = self
                .pass(input, output, container, RateControl::Bitrate(bitrate))
                .await?;
            attempts.push(attempt);
            best_size = best_size.min(attempt.resulting_size_bytes);

            if attempt.resulting_size_bytes <= budget_bytes {
                info!(
                    size_bytes = attempt.resulting_size_bytes,
                    bitrate_bps = bitrate,
                    passes,
                    "Bitrate pass fits the budget"
                );
                return Ok(self.report(output, budget_bytes, attempts, "fit"));
            }

            let ratio = budget_bytes as f64 / attempt.resulting_size_bytes as f64;
            let next = self
                .config
                .clamp_bitrate(bitrate as f64 * ratio * self.config.safety_factor);
            if next == bitrate {
                // Pinned at the band floor; another pass would repeat this one.
                warn!(bitrate_bps = bitrate, "Bitrate floor reached while still over budget");
                break;
            }
            debug!(from = bitrate, to = next, "Correcting bitrate");
            bitrate = next;
        }

        metrics::BITRATE_ATTEMPTS
            .with_label_values(&["unreachable"])
            .observe(f64::from(passes));
        if let Err(e) = tokio::fs::remove_file(output).await {
            debug!("Could not remove oversized output {}: {}", output.display(), e);
        }

        Err(CompressError::SizeTargetUnreachable {
            budget_bytes,
            best_size_bytes: best_size,
            bitrate_passes: passes,
        })
    }

    fn report(
        &self,
        output: &Path,
        budget_bytes: u64,
        attempts: Vec<EncodeAttempt>,
        result: &str,
    ) -> CompressionReport {
        let size_bytes = attempts
            .last()
            .map(|a| a.resulting_size_bytes)
            .unwrap_or_default();
        let report = CompressionReport {
            output_path: output.to_path_buf(),
            size_bytes,
            budget_bytes,
            attempts,
        };
        metrics::BITRATE_ATTEMPTS
            .with_label_values(&[result])
            .observe(report.bitrate_passes() as f64);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::ProbeError;
    use crate::testing::MockEncoder;
    use std::path::PathBuf;

    fn paths() -> (PathBuf, PathBuf) {
        (PathBuf::from("/ws/source.mp4"), PathBuf::from("/ws/compressed.mp4"))
    }

    #[test]
    fn test_silent_command_drops_audio() {
        let cmd = silent_video_command(
            Path::new("in.mp4"),
            Path::new("out.mp4"),
            Container::Mp4,
            RateControl::Crf(28),
            "fast",
        );
        assert!(cmd.args.contains(&"-an".to_string()));
        assert!(cmd.has_arg_pair("-crf", "28"));
        assert!(cmd.has_arg_pair("-preset", "fast"));
        assert!(cmd.has_arg_pair("-movflags", "+faststart"));
    }

    #[test]
    fn test_silent_command_bitrate_webm() {
        let cmd = silent_video_command(
            Path::new("in.webm"),
            Path::new("out.webm"),
            Container::Webm,
            RateControl::Bitrate(640_000),
            "fast",
        );
        assert!(cmd.has_arg_pair("-c:v", "libvpx-vp9"));
        assert!(cmd.has_arg_pair("-b:v", "640000"));
        assert!(cmd.has_arg_pair("-maxrate", "640000"));
        assert!(!cmd.args.contains(&"-crf".to_string()));
    }

    #[test]
    fn test_estimate_bitrate() {
        // 4 MiB over 60 s
        let bps = estimate_bitrate(4 * 1024 * 1024, 60.0);
        assert!((bps - 559_240.533).abs() < 1.0);
    }

    #[tokio::test]
    async fn test_quality_pass_fits() {
        let encoder = Arc::new(MockEncoder::new());
        encoder.push_output_size(3_000_000).await;

        let compressor = SizeTargetingCompressor::new(Arc::clone(&encoder), CompressorConfig::default());
        let (input, output) = paths();
        let report = compressor
            .compress(&input, &output, 4 * 1024 * 1024, Container::Mp4)
            .await
            .unwrap();

        assert_eq!(report.attempts.len(), 1);
        assert_eq!(report.attempts[0].pass_kind, PassKind::Crf);
        assert_eq!(report.size_bytes, 3_000_000);
        assert_eq!(encoder.probe_count().await, 0);
    }

    #[tokio::test]
    async fn test_bitrate_pass_after_overshoot() {
        let encoder = Arc::new(MockEncoder::new());
        encoder.push_output_size(9_000_000).await;
        encoder.push_output_size(4_000_000).await;
        encoder.set_duration(60.0).await;

        let compressor = SizeTargetingCompressor::new(Arc::clone(&encoder), CompressorConfig::default());
        let (input, output) = paths();
        let budget = 4 * 1024 * 1024;
        let report = compressor
            .compress(&input, &output, budget, Container::Mp4)
            .await
            .unwrap();

        assert_eq!(report.attempts.len(), 2);
        assert_eq!(report.bitrate_passes(), 1);
        assert!(report.size_bytes <= budget);

        // 559_240 bps estimate scaled by 0.94 headroom
        let expected = (estimate_bitrate(budget, 60.0) * 0.94).round() as u64;
        assert_eq!(report.attempts[1].parameter, expected);

        let commands = encoder.commands().await;
        assert!(commands[1].has_arg_pair("-b:v", &expected.to_string()));
    }

    #[tokio::test]
    async fn test_correction_is_proportional_and_clamped() {
        let encoder = Arc::new(MockEncoder::new());
        encoder.push_output_size(10_000_000).await;
        encoder.push_output_size(5_000_000).await;
        encoder.push_output_size(1_000_000).await;
        encoder.set_duration(10.0).await;

        let compressor = SizeTargetingCompressor::new(Arc::clone(&encoder), CompressorConfig::default());
        let (input, output) = paths();
        let report = compressor
            .compress(&input, &output, 4 * 1024 * 1024, Container::Mp4)
            .await
            .unwrap();

        // Estimate 3.3 Mbps clamps to the 1.5 Mbps ceiling.
        assert_eq!(report.attempts[1].parameter, 1_500_000);
        let second = report.attempts[2].parameter;
        let expected = (1_500_000.0_f64 * (4.0 * 1024.0 * 1024.0 / 5_000_000.0) * 0.9).round() as u64;
        assert_eq!(second, expected);
        assert!(second >= 100_000 && second <= 1_500_000);
    }

    #[tokio::test]
    async fn test_unreachable_after_max_attempts() {
        let encoder = Arc::new(MockEncoder::new());
        for size in [20_000_000, 9_000_000, 8_000_000, 7_000_000] {
            encoder.push_output_size(size).await;
        }
        encoder.set_duration(30.0).await;

        let compressor = SizeTargetingCompressor::new(Arc::clone(&encoder), CompressorConfig::default());
        let (input, output) = paths();
        let result = compressor
            .compress(&input, &output, 4 * 1024 * 1024, Container::Mp4)
            .await;

        match result {
            Err(CompressError::SizeTargetUnreachable {
                best_size_bytes,
                bitrate_passes,
                ..
            }) => {
                assert_eq!(best_size_bytes, 7_000_000);
                assert!(bitrate_passes <= 3);
            }
            other => panic!("expected SizeTargetUnreachable, got {:?}", other),
        }
        assert!(encoder.commands().await.len() <= 4);
    }

    #[tokio::test]
    async fn test_floor_stops_search_early() {
        let encoder = Arc::new(MockEncoder::new());
        for _ in 0..4 {
            encoder.push_output_size(50_000_000).await;
        }
        // Long source: estimate lands below the floor.
        encoder.set_duration(3600.0).await;

        let compressor = SizeTargetingCompressor::new(Arc::clone(&encoder), CompressorConfig::default());
        let (input, output) = paths();
        let result = compressor
            .compress(&input, &output, 4 * 1024 * 1024, Container::Mp4)
            .await;

        assert!(matches!(
            result,
            Err(CompressError::SizeTargetUnreachable { bitrate_passes: 1, .. })
        ));
        assert_eq!(encoder.commands().await.len(), 2);
    }

    #[tokio::test]
    async fn test_duration_unknown() {
        let encoder = Arc::new(MockEncoder::new());
        encoder.push_output_size(9_000_000).await;
        encoder
            .set_probe_error(ProbeError::Unparseable {
                output: "N/A".to_string(),
            })
            .await;

        let compressor = SizeTargetingCompressor::new(Arc::clone(&encoder), CompressorConfig::default());
        let (input, output) = paths();
        let result = compressor
            .compress(&input, &output, 4 * 1024 * 1024, Container::Mp4)
            .await;

        assert!(matches!(result, Err(CompressError::DurationUnknown { .. })));
        assert_eq!(encoder.commands().await.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_duration_is_unknown() {
        let encoder = Arc::new(MockEncoder::new());
        encoder.push_output_size(9_000_000).await;
        encoder.set_duration(0.0).await;

        let compressor = SizeTargetingCompressor::new(Arc::clone(&encoder), CompressorConfig::default());
        let (input, output) = paths();
        let result = compressor
            .compress(&input, &output, 1_000, Container::Mp4)
            .await;

        assert!(matches!(result, Err(CompressError::DurationUnknown { .. })));
    }
}
