use std::path::PathBuf;
use std::time::Duration;

use crate::infrastructure::bitget_client::BITGET_API_BASE;

/// Default number of virtual sub-accounts to keep on the exchange
pub const DEFAULT_TARGET_SUBACCOUNTS: usize = 4;
/// The exchange caps virtual sub-accounts per main account
pub const MAX_TARGET_SUBACCOUNTS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base: String,
    pub target_subaccounts: usize,
    /// Pause between subscribe/redeem calls
    pub operation_delay: Duration,
    /// Pause between transfers
    pub transfer_delay: Duration,
    /// Pause between API key issuance calls
    pub apikey_delay: Duration,
    /// Wait before the after-snapshot so the exchange settles
    pub settle_wait: Duration,
    pub http_timeout: Duration,
    pub update_check: bool,
    /// Update check endpoint; the check is skipped when unset
    pub stats_url: Option<String>,
    pub accounts_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: BITGET_API_BASE.to_string(),
            target_subaccounts: DEFAULT_TARGET_SUBACCOUNTS,
            operation_delay: Duration::from_millis(200),
            transfer_delay: Duration::from_millis(300),
            apikey_delay: Duration::from_millis(500),
            settle_wait: Duration::from_secs(5),
            http_timeout: Duration::from_secs(10),
            update_check: true,
            stats_url: None,
            accounts_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppConfig {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Invalid values are logged and the default is kept
    pub fn from_lookup<F>(lookup: F) -> AppConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(base) = lookup("FLEXMAN_API_BASE") {
            let base = base.trim().trim_end_matches('/');
            if base.starts_with("http://") || base.starts_with("https://") {
                config.api_base = base.to_string();
            } else {
                tracing::warn!(
                    "Invalid FLEXMAN_API_BASE '{}' (must be an http(s) URL), using default: {}",
                    base,
                    config.api_base
                );
            }
        }

        if let Some(count) = lookup("FLEXMAN_TARGET_SUBACCOUNTS") {
            match count.trim().parse::<usize>() {
                Ok(value) if (1..=MAX_TARGET_SUBACCOUNTS).contains(&value) => {
                    config.target_subaccounts = value;
                }
                Ok(value) => {
                    tracing::warn!(
                        "Invalid FLEXMAN_TARGET_SUBACCOUNTS value: {} (must be between 1 and {}), using default: {}",
                        value,
                        MAX_TARGET_SUBACCOUNTS,
                        config.target_subaccounts
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse FLEXMAN_TARGET_SUBACCOUNTS '{}': {}, using default: {}",
                        count,
                        e,
                        config.target_subaccounts
                    );
                }
            }
        }

        if let Some(ms) = parse_millis(&lookup, "FLEXMAN_OPERATION_DELAY_MS") {
            config.operation_delay = ms;
        }
        if let Some(ms) = parse_millis(&lookup, "FLEXMAN_TRANSFER_DELAY_MS") {
            config.transfer_delay = ms;
        }
        if let Some(ms) = parse_millis(&lookup, "FLEXMAN_APIKEY_DELAY_MS") {
            config.apikey_delay = ms;
        }

        if let Some(secs) = lookup("FLEXMAN_SETTLE_SECONDS") {
            if let Ok(value) = secs.trim().parse::<u64>() {
                if value <= 60 {
                    config.settle_wait = Duration::from_secs(value);
                }
            }
        }

        if let Some(secs) = lookup("FLEXMAN_HTTP_TIMEOUT_SECONDS") {
            if let Ok(value) = secs.trim().parse::<u64>() {
                if value > 0 && value <= 120 {
                    config.http_timeout = Duration::from_secs(value);
                }
            }
        }

        if let Some(enabled) = lookup("FLEXMAN_UPDATE_CHECK") {
            let enabled = enabled.trim().to_lowercase();
            config.update_check = !(enabled == "false" || enabled == "0" || enabled == "no");
        }

        if let Some(url) = lookup("FLEXMAN_STATS_URL") {
            let url = url.trim();
            if !url.is_empty() {
                config.stats_url = Some(url.to_string());
            }
        }

        if let Some(path) = lookup("FLEXMAN_CONFIG") {
            if !path.trim().is_empty() {
                config.accounts_path = Some(PathBuf::from(path.trim()));
            }
        }

        config
    }

    /// The update check runs only when enabled and an endpoint is configured
    pub fn update_check_url(&self) -> Option<&str> {
        if self.update_check {
            self.stats_url.as_deref()
        } else {
            None
        }
    }
}

/// Delay in milliseconds, at most ten seconds
fn parse_millis<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) if value <= 10_000 => Some(Duration::from_millis(value)),
        Ok(value) => {
            tracing::warn!("Invalid {} value: {} (must be at most 10000), using default", key, value);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to parse {} '{}': {}, using default", key, raw, e);
            None
        }
    }
}
