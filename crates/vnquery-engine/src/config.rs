//! Configuration for query evaluation

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vnquery_core::{QueryError, Result};

/// Configuration for the query router and its engines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Timeout applied to each provider fetch
    pub fetch_timeout: Duration,

    /// Upper bound on concurrent per-ticker fetches in fan-out operations
    pub max_concurrent_fetches: usize,

    /// Calendar days fetched when a query carries no dates
    pub default_lookback_days: u32,

    /// Number of trailing bars returned for full-OHLCV requests
    pub ohlcv_tail: usize,

    /// Fallback symbol for company queries with no ticker
    pub default_ticker: String,

    /// SMA window used when the query names the indicator without windows
    pub default_sma_window: u32,

    /// RSI window used when the query names the indicator without windows
    pub default_rsi_window: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            max_concurrent_fetches: 4,
            default_lookback_days: 30,
            ohlcv_tail: 5,
            default_ticker: "VCB".to_string(),
            default_sma_window: 9,
            default_rsi_window: 14,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration builder
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_fetches == 0 {
            return Err(QueryError::Config(
                "max_concurrent_fetches must be greater than 0".to_string(),
            ));
        }

        if self.default_lookback_days == 0 {
            return Err(QueryError::Config(
                "default_lookback_days must be greater than 0".to_string(),
            ));
        }

        if self.ohlcv_tail == 0 {
            return Err(QueryError::Config(
                "ohlcv_tail must be greater than 0".to_string(),
            ));
        }

        if self.default_ticker.trim().is_empty() {
            return Err(QueryError::Config(
                "default_ticker must not be empty".to_string(),
            ));
        }

        if self.default_sma_window == 0 || self.default_rsi_window == 0 {
            return Err(QueryError::Config(
                "default indicator windows must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for EngineConfig
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    fetch_timeout: Option<Duration>,
    max_concurrent_fetches: Option<usize>,
    default_lookback_days: Option<u32>,
    ohlcv_tail: Option<usize>,
    default_ticker: Option<String>,
    default_sma_window: Option<u32>,
    default_rsi_window: Option<u32>,
}

impl EngineConfigBuilder {
    /// Set the per-fetch timeout
    pub fn fetch_timeout(mut self, duration: Duration) -> Self {
        self.fetch_timeout = Some(duration);
        self
    }

    /// Set the fan-out concurrency bound
    pub fn max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = Some(n);
        self
    }

    /// Set the dateless-query lookback in calendar days
    pub fn default_lookback_days(mut self, days: u32) -> Self {
        self.default_lookback_days = Some(days);
        self
    }

    /// Set the number of trailing bars for full-OHLCV responses
    pub fn ohlcv_tail(mut self, bars: usize) -> Self {
        self.ohlcv_tail = Some(bars);
        self
    }

    /// Set the fallback company-query ticker
    pub fn default_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.default_ticker = Some(ticker.into());
        self
    }

    /// Set the default SMA window
    pub fn default_sma_window(mut self, window: u32) -> Self {
        self.default_sma_window = Some(window);
        self
    }

    /// Set the default RSI window
    pub fn default_rsi_window(mut self, window: u32) -> Self {
        self.default_rsi_window = Some(window);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<EngineConfig> {
        let defaults = EngineConfig::default();

        let config = EngineConfig {
            fetch_timeout: self.fetch_timeout.unwrap_or(defaults.fetch_timeout),
            max_concurrent_fetches: self
                .max_concurrent_fetches
                .unwrap_or(defaults.max_concurrent_fetches),
            default_lookback_days: self
                .default_lookback_days
                .unwrap_or(defaults.default_lookback_days),
            ohlcv_tail: self.ohlcv_tail.unwrap_or(defaults.ohlcv_tail),
            default_ticker: self.default_ticker.unwrap_or(defaults.default_ticker),
            default_sma_window: self.default_sma_window.unwrap_or(defaults.default_sma_window),
            default_rsi_window: self.default_rsi_window.unwrap_or(defaults.default_rsi_window),
        };

        config.validate()?;
        Ok(config)
    }
}
