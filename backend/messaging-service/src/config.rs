use crate::error::ServiceError;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Stamped as `source` on every event envelope.
    pub service_name: String,
    /// Deadline the router applies to each forwarded call.
    pub request_timeout: Duration,
    pub chat_preview_count: usize,
    pub max_updates_range: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "messaging-service".into(),
            request_timeout: Duration::from_millis(5000),
            chat_preview_count: 5,
            max_updates_range: 200,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ServiceError> {
        dotenv().ok();
        let defaults = Self::default();

        let service_name =
            env::var("SERVICE_NAME").unwrap_or_else(|_| defaults.service_name.clone());
        let request_timeout = parse_var::<u64>("REQUEST_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_timeout);
        let chat_preview_count =
            parse_var("CHAT_PREVIEW_COUNT")?.unwrap_or(defaults.chat_preview_count);
        let max_updates_range =
            parse_var("MAX_UPDATES_RANGE")?.unwrap_or(defaults.max_updates_range);

        if max_updates_range == 0 {
            return Err(ServiceError::Config("MAX_UPDATES_RANGE must be positive".into()));
        }

        Ok(Self {
            service_name,
            request_timeout,
            chat_preview_count,
            max_updates_range,
        })
    }
}

/// `None` when unset; an error when set but not a number.
fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>, ServiceError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ServiceError::Config(format!("{key} must be a number, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.service_name, "messaging-service");
        assert_eq!(cfg.request_timeout, Duration::from_millis(5000));
        assert_eq!(cfg.chat_preview_count, 5);
        assert_eq!(cfg.max_updates_range, 200);
    }

    #[test]
    fn parse_var_rejects_garbage() {
        env::set_var("MESSAGING_TEST_PARSE_NUMBER", "12");
        assert_eq!(parse_var::<u64>("MESSAGING_TEST_PARSE_NUMBER").unwrap(), Some(12));

        env::set_var("MESSAGING_TEST_PARSE_GARBAGE", "twelve");
        assert!(matches!(
            parse_var::<u64>("MESSAGING_TEST_PARSE_GARBAGE"),
            Err(ServiceError::Config(_))
        ));

        assert_eq!(parse_var::<u64>("MESSAGING_TEST_PARSE_UNSET").unwrap(), None);
    }
}
