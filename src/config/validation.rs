use crate::config::types::{CheckerConfig, Config, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on concurrent probes
const MAX_CONCURRENCY: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_checker_config(&config.checker)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates probe scheduling configuration
fn validate_checker_config(config: &CheckerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= 1ms, got {}ms",
            config.timeout_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Name: non-empty, alphanumeric + hyphens only
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if !config.name.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ConfigError::Validation(format!(
            "user-agent name must contain only alphanumeric characters and hyphens, got '{}'",
            config.name
        )));
    }

    if config.version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(concurrency: u32, timeout_ms: u64) -> CheckerConfig {
        CheckerConfig {
            concurrency,
            timeout_ms,
        }
    }

    #[test]
    fn test_validate_checker_bounds() {
        assert!(validate_checker_config(&checker(1, 1)).is_ok());
        assert!(validate_checker_config(&checker(100, 8000)).is_ok());

        assert!(validate_checker_config(&checker(0, 8000)).is_err());
        assert!(validate_checker_config(&checker(101, 8000)).is_err());
        assert!(validate_checker_config(&checker(5, 0)).is_err());
    }

    #[test]
    fn test_validate_user_agent() {
        let mut ua = UserAgentConfig::default();
        assert!(validate_user_agent_config(&ua).is_ok());

        ua.name = "bad name".to_string();
        assert!(validate_user_agent_config(&ua).is_err());

        ua = UserAgentConfig::default();
        ua.contact_url = Some("not a url".to_string());
        assert!(matches!(
            validate_user_agent_config(&ua),
            Err(ConfigError::InvalidUrl(_))
        ));
    }
}
