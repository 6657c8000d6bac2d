//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use chat_storage::config::TableConfig;

/// Variable holding the table name
const TABLE_NAME_VAR: &str = "GROUP_CHAT_TABLE";
/// Older variable name still set by some deployments
const LEGACY_TABLE_NAME_VAR: &str = "GroupChat_DB";

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Table configuration, resolved once at startup
    ///
    /// Falls back to the default table when neither variable is set.
    #[must_use]
    pub fn table_config(&self) -> TableConfig {
        let table_name = env::var(TABLE_NAME_VAR)
            .or_else(|_| env::var(LEGACY_TABLE_NAME_VAR))
            .ok();

        TableConfig::new(table_name)
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development | Self::Staging)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_storage::config::DEFAULT_TABLE_NAME;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_environment_from_env() {
        // Test development (default)
        env::remove_var("APP_ENV");
        assert_eq!(Environment::from_env(), Environment::Development);

        // Test staging
        env::set_var("APP_ENV", " Staging ");
        assert_eq!(Environment::from_env(), Environment::Staging);

        // Test production
        env::set_var("APP_ENV", "production");
        assert_eq!(Environment::from_env(), Environment::Production);

        env::remove_var("APP_ENV");
    }

    #[test]
    #[serial]
    #[should_panic(expected = "Invalid environment: invalid")]
    fn test_invalid_environment() {
        env::set_var("APP_ENV", "invalid");
        let _ = Environment::from_env();
    }

    #[test]
    #[serial]
    fn test_table_config_from_env() {
        env::remove_var(TABLE_NAME_VAR);
        env::remove_var(LEGACY_TABLE_NAME_VAR);
        let environment = Environment::Development;
        assert_eq!(environment.table_config().table_name(), DEFAULT_TABLE_NAME);

        env::set_var(LEGACY_TABLE_NAME_VAR, "legacy-table");
        assert_eq!(environment.table_config().table_name(), "legacy-table");

        env::set_var(TABLE_NAME_VAR, "chat-table");
        assert_eq!(environment.table_config().table_name(), "chat-table");

        // Cleanup
        env::remove_var(TABLE_NAME_VAR);
        env::remove_var(LEGACY_TABLE_NAME_VAR);
    }

    #[test]
    fn test_aws_endpoint_override() {
        assert_eq!(
            Environment::Development.override_aws_endpoint_url(),
            Some("http://localhost:4566")
        );
        assert_eq!(Environment::Production.override_aws_endpoint_url(), None);
        assert!(!Environment::Production.show_api_docs());
    }
}
