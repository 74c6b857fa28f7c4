use crate::config::types::Config;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.fetch.max_attempts < 1 || config.fetch.max_attempts > 20 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 20, got {}",
            config.fetch.max_attempts
        )));
    }

    if config.fetch.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.fetch.timeout_secs
        )));
    }

    if config.pacing.min_delay_secs < 0.0 {
        return Err(ConfigError::Validation(format!(
            "min-delay-secs must be >= 0, got {}",
            config.pacing.min_delay_secs
        )));
    }

    if config.pacing.max_delay_secs < config.pacing.min_delay_secs {
        return Err(ConfigError::Validation(format!(
            "max-delay-secs ({}) must be >= min-delay-secs ({})",
            config.pacing.max_delay_secs, config.pacing.min_delay_secs
        )));
    }

    if config.output.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = Config::default();
        config.fetch.max_attempts = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_inverted_delay_range_rejected() {
        let mut config = Config::default();
        config.pacing.min_delay_secs = 5.0;
        config.pacing.max_delay_secs = 1.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_output_directory_rejected() {
        let mut config = Config::default();
        config.output.directory = String::new();
        assert!(validate(&config).is_err());
    }
}
