//! Configuration validation
//!
//! Validates loaded settings before the application starts so that
//! misconfiguration fails fast instead of surfacing mid-request.

use crate::config::Settings;
use crate::utils::errors::EventraError;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<(), EventraError> {
    validate_database_config(settings)?;
    validate_limits_config(settings)?;
    validate_logging_config(settings)?;
    Ok(())
}

fn validate_database_config(settings: &Settings) -> Result<(), EventraError> {
    if settings.database.url.is_empty() {
        return Err(EventraError::Config("Database URL is required".to_string()));
    }

    if !settings.database.url.starts_with("postgresql://")
        && !settings.database.url.starts_with("postgres://")
    {
        return Err(EventraError::Config(
            "Database URL must be a PostgreSQL connection string".to_string(),
        ));
    }

    if settings.database.max_connections == 0 {
        return Err(EventraError::Config(
            "Database max_connections must be greater than zero".to_string(),
        ));
    }

    if settings.database.min_connections > settings.database.max_connections {
        return Err(EventraError::Config(
            "Database min_connections cannot exceed max_connections".to_string(),
        ));
    }

    Ok(())
}

fn validate_limits_config(settings: &Settings) -> Result<(), EventraError> {
    if settings.limits.daily_application_limit == 0 {
        return Err(EventraError::Config(
            "daily_application_limit must be greater than zero".to_string(),
        ));
    }

    if settings.limits.default_page_size <= 0 {
        return Err(EventraError::Config(
            "default_page_size must be greater than zero".to_string(),
        ));
    }

    if settings.limits.max_page_size < settings.limits.default_page_size {
        return Err(EventraError::Config(
            "max_page_size cannot be smaller than default_page_size".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging_config(settings: &Settings) -> Result<(), EventraError> {
    if settings.logging.level.is_empty() {
        return Err(EventraError::Config("Logging level is required".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_empty_database_url_rejected() {
        let mut settings = Settings::default();
        settings.database.url = String::new();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_zero_daily_limit_rejected() {
        let mut settings = Settings::default();
        settings.limits.daily_application_limit = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_page_size_ordering_rejected() {
        let mut settings = Settings::default();
        settings.limits.max_page_size = 5;
        settings.limits.default_page_size = 10;
        assert!(validate_settings(&settings).is_err());
    }
}
