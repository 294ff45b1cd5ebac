//! Runtime settings for the backend client and the status poller.

use crate::domain::session::DEFAULT_MAX_ATTEMPTS;
use crate::error::{PaymentError, Result};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://autocare-pro-2.onrender.com/api/v1";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Where and how to reach the payment backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            auth_token: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PaymentError::Config(format!(
                "API URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(PaymentError::Config("HTTP timeout must be non-zero".into()));
        }
        Ok(())
    }

    /// Joins an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Timing of the status poll loop.
///
/// The first query happens after `initial_delay`; each later one after
/// `interval`. No backoff, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub initial_delay: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_POLL_INTERVAL,
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PollSchedule {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(PaymentError::Config("max attempts must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joining() {
        let config = GatewayConfig::new("http://localhost:5000/api/v1/");
        assert_eq!(
            config.endpoint("/daraja/initiate-payment"),
            "http://localhost:5000/api/v1/daraja/initiate-payment"
        );
        assert_eq!(
            GatewayConfig::default().endpoint("daraja/payment-status/x"),
            "https://autocare-pro-2.onrender.com/api/v1/daraja/payment-status/x"
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(GatewayConfig::default().validate().is_ok());
        assert!(matches!(
            GatewayConfig::new("localhost:5000").validate(),
            Err(PaymentError::Config(_))
        ));
        assert!(
            GatewayConfig::default()
                .with_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_default_schedule() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.initial_delay, Duration::from_secs(10));
        assert_eq!(schedule.interval, Duration::from_secs(10));
        assert_eq!(schedule.max_attempts, 30);
        assert!(
            PollSchedule {
                max_attempts: 0,
                ..schedule
            }
            .validate()
            .is_err()
        );
    }
}
