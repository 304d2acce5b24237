//! Environment-driven configuration.
//!
//! Loaded from environment variables via figment. Duration fields accept both
//! bare numbers (seconds) and unit strings ("30s", "2m", "1500ms").

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::Env;
use fundu::{DurationParser, TimeUnit};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Log level for this crate's target specifically.
    ///
    /// Valid values are: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Number of extraction workers.
    ///
    /// Defaults to the machine's available parallelism.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Wall-clock timeout for a single document's extraction.
    #[serde(
        default = "default_document_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub document_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            worker_count: default_worker_count(),
            document_timeout: default_document_timeout(),
        }
    }
}

/// Default log level of "info"
fn default_log_level() -> String {
    "info".to_string()
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(4)
}

/// Default per-document timeout of 30 seconds
fn default_document_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Load configuration from the environment.
pub fn load() -> Result<Config> {
    Figment::new()
        .merge(Env::raw())
        .extract()
        .context("failed to load config from environment")
}

/// Duration parser with seconds as the default unit.
///
/// Does not support fractions, exponents, or infinity values.
const DURATION_PARSER: DurationParser<'static> = DurationParser::builder()
    .time_units(&[TimeUnit::Second, TimeUnit::MilliSecond, TimeUnit::Minute])
    .allow_time_unit_delimiter()
    .disable_infinity()
    .disable_fraction()
    .disable_exponent()
    .default_unit(TimeUnit::Second)
    .build();

/// Deserialize a duration from either a number (seconds) or a unit string.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;

    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a duration string or number")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            DURATION_PARSER
                .parse(value)
                .map_err(|e| {
                    serde::de::Error::custom(format!(
                        "invalid duration '{value}': {e}. Examples: '30' (seconds), '1500ms', '2m'"
                    ))
                })?
                .try_into()
                .map_err(|e| serde::de::Error::custom(format!("duration conversion error: {e}")))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Duration::from_secs(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value < 0 {
                return Err(serde::de::Error::custom("duration cannot be negative"));
            }
            Ok(Duration::from_secs(value as u64))
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}
