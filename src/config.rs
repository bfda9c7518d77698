//! Configuration
//!
//! Command-line flags with environment fallbacks. `.env` is read before parsing, so any variable
//! below can also live there.

use std::{path::PathBuf, time::Duration};

use clap::Args;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{client::ApiConfig, money::currency_for_code, store::JsonCartRepository};

/// Errors raised while interpreting configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The configured currency is not a known ISO code.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// The API URL is not an absolute `http(s)` URL.
    #[error("invalid API URL: {0}")]
    InvalidApiUrl(String),

    /// A zero HTTP timeout.
    #[error("HTTP timeout must be at least one second")]
    ZeroTimeout,
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Clone, Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

/// Store client configuration.
#[derive(Clone, Debug, Args)]
pub struct Config {
    /// Store API base URL
    #[arg(
        long,
        env = "FAMSHOP_API_URL",
        default_value = "http://localhost:8080/api",
        global = true
    )]
    pub api_url: String,

    /// Cart currency (ISO 4217 code)
    #[arg(long, env = "FAMSHOP_CURRENCY", default_value = "RUB", global = true)]
    pub currency: String,

    /// Location of the persisted cart
    #[arg(
        long,
        env = "FAMSHOP_CART_PATH",
        default_value = ".famshop/cart.json",
        global = true
    )]
    pub cart_path: PathBuf,

    /// Per-request HTTP timeout in seconds
    #[arg(
        long,
        env = "FAMSHOP_HTTP_TIMEOUT_SECONDS",
        default_value_t = 10_u64,
        global = true
    )]
    pub http_timeout_seconds: u64,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load `.env` into the process environment if present.
    pub fn load_dotenv() {
        // Missing .env is fine
        _ = dotenvy::dotenv();
    }

    /// The configured cart currency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] for an unrecognised code.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        currency_for_code(&self.currency)
            .ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))
    }

    /// Connection settings for the store API.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the URL is not `http(s)` or the timeout is zero.
    pub fn api(&self) -> Result<ApiConfig, ConfigError> {
        let base_url = self.api_url.trim();
        let invalid = || ConfigError::InvalidApiUrl(self.api_url.clone());

        let parsed = reqwest::Url::parse(base_url).map_err(|_err| invalid())?;

        if !matches!(parsed.scheme(), "http" | "https")
            || parsed.host_str().is_none_or(str::is_empty)
        {
            return Err(invalid());
        }

        if self.http_timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(ApiConfig {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(self.http_timeout_seconds),
        })
    }

    /// The file-backed cart store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] for an unrecognised currency.
    pub fn cart_repository(&self) -> Result<JsonCartRepository, ConfigError> {
        Ok(JsonCartRepository::new(&self.cart_path, self.currency()?))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rusty_money::iso::{EUR, RUB};
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        config: Config,
    }

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        Harness::try_parse_from(std::iter::once("famshop").chain(args.iter().copied()))
            .map(|harness| harness.config)
    }

    /// Valid flags, with any `(flag, value)` pair in `overrides` replacing the default.
    fn args<'a>(overrides: &[(&'a str, &'a str)]) -> Vec<&'a str> {
        let defaults = [
            ("--api-url", "https://shop.example/api"),
            ("--currency", "RUB"),
            ("--cart-path", "/tmp/cart.json"),
            ("--http-timeout-seconds", "5"),
            ("--log-level", "info"),
            ("--log-format", "compact"),
        ];

        defaults
            .into_iter()
            .flat_map(|(flag, value)| {
                let value = overrides
                    .iter()
                    .find(|(name, _)| *name == flag)
                    .map_or(value, |(_, value)| *value);

                [flag, value]
            })
            .collect()
    }

    #[test]
    fn flags_build_api_config() -> TestResult {
        let config = parse(&args(&[]))?;
        let api = config.api()?;

        assert_eq!(api.base_url, "https://shop.example/api");
        assert_eq!(api.timeout, Duration::from_secs(5));
        assert_eq!(config.currency()?, RUB);
        assert_eq!(config.logging.log_format, LogFormat::Compact);

        Ok(())
    }

    #[test]
    fn currency_is_case_insensitive() -> TestResult {
        assert_eq!(parse(&args(&[("--currency", "eur")]))?.currency()?, EUR);

        Ok(())
    }

    #[test]
    fn unknown_currency_is_rejected() -> TestResult {
        let config = parse(&args(&[("--currency", "XXQ")]))?;

        assert_eq!(
            config.currency(),
            Err(ConfigError::UnknownCurrency("XXQ".to_string()))
        );

        Ok(())
    }

    #[test]
    fn non_http_api_url_is_rejected() -> TestResult {
        for url in [
            "ftp://shop.example",
            "shop.example/api",
            "https://",
            "http://a b",
            "http://:80",
            "mailto:shop@example.com",
        ] {
            let config = parse(&args(&[("--api-url", url)]))?;

            assert_eq!(
                config.api().map(|api| api.base_url),
                Err(ConfigError::InvalidApiUrl(url.to_string())),
                "{url} should be rejected"
            );
        }

        Ok(())
    }

    #[test]
    fn api_url_with_port_and_path_is_accepted() -> TestResult {
        let config = parse(&args(&[("--api-url", " http://127.0.0.1:8080/api/v1 ")]))?;

        assert_eq!(config.api()?.base_url, "http://127.0.0.1:8080/api/v1");

        Ok(())
    }

    #[test]
    fn zero_timeout_is_rejected() -> TestResult {
        assert_eq!(
            parse(&args(&[("--http-timeout-seconds", "0")]))?.api().map(|api| api.base_url),
            Err(ConfigError::ZeroTimeout)
        );

        Ok(())
    }

    #[test]
    fn json_log_format_parses() -> TestResult {
        assert_eq!(parse(&args(&[("--log-format", "json")]))?.logging.log_format, LogFormat::Json);

        Ok(())
    }
}
