use super::{types::Config, ConfigError};

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

fn is_unit_factor(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}

/// Validate configuration
/// Currently validates:
/// - Target size and download cap are positive
/// - Bitrate band is not inverted
/// - Headroom lies in (0, 1], safety factor in (0, 1)
/// - At least one bitrate attempt
/// - CRF within the encoders' range
/// - Upload endpoint is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.job.target_size_bytes == 0 {
        return Err(invalid("job.target_size_bytes cannot be 0"));
    }

    if config.download.max_bytes == 0 {
        return Err(invalid("download.max_bytes cannot be 0"));
    }
    if config.download.min_bytes > config.download.max_bytes {
        return Err(invalid("download.min_bytes exceeds download.max_bytes"));
    }

    let c = &config.compressor;
    if c.min_bitrate_bps > c.max_bitrate_bps {
        return Err(invalid(format!(
            "compressor.min_bitrate_bps ({}) exceeds compressor.max_bitrate_bps ({})",
            c.min_bitrate_bps, c.max_bitrate_bps
        )));
    }
    if !is_unit_factor(c.headroom) {
        return Err(invalid("compressor.headroom must be in (0, 1]"));
    }
    if !(c.safety_factor > 0.0 && c.safety_factor < 1.0) {
        return Err(invalid("compressor.safety_factor must be in (0, 1)"));
    }
    if c.max_bitrate_attempts == 0 {
        return Err(invalid("compressor.max_bitrate_attempts cannot be 0"));
    }
    if c.crf > 63 {
        return Err(invalid("compressor.crf must be between 0 and 63"));
    }

    if config.upload.endpoint.trim().is_empty() {
        return Err(invalid("upload.endpoint cannot be empty"));
    }

    Ok(())
}
