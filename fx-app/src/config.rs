//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use fx_cache::CacheConfig;
use fx_client::DEFAULT_BASE_URL;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub upstream_url: String,
    pub cache: CacheConfig,
    pub query_timeout: Duration,
    pub single_flight: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = parse_var("PORT", 3000)?;

        let upstream_url =
            env::var("FX_UPSTREAM_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let max_cost = parse_var("FX_CACHE_MAX_COST", CacheConfig::default().max_cost)?;
        if max_cost == 0 {
            anyhow::bail!("FX_CACHE_MAX_COST must be greater than zero");
        }

        let stale_ttl_secs = parse_var(
            "FX_CACHE_STALE_TTL_SECS",
            CacheConfig::default().stale_ttl.as_secs(),
        )?;

        let timeout_secs: u64 = parse_var("FX_QUERY_TIMEOUT_SECS", 30)?;
        let single_flight = parse_var("FX_SINGLE_FLIGHT", false)?;

        Ok(Self {
            port,
            upstream_url,
            cache: CacheConfig {
                max_cost,
                stale_ttl: Duration::from_secs(stale_ttl_secs),
            },
            query_timeout: Duration::from_secs(timeout_secs),
            single_flight,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}={:?}: {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable so they can run in parallel.

    #[test]
    fn test_parse_var_defaults_when_unset() {
        let value: u64 = parse_var("FX_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_var_reads_and_trims() {
        unsafe { env::set_var("FX_TEST_TRIMMED_VAR", " true ") };
        let value: bool = parse_var("FX_TEST_TRIMMED_VAR", false).unwrap();
        assert!(value);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        unsafe { env::set_var("FX_TEST_GARBAGE_VAR", "lots") };
        let err = parse_var::<u16>("FX_TEST_GARBAGE_VAR", 3000).unwrap_err();
        assert!(err.to_string().contains("FX_TEST_GARBAGE_VAR"));
    }
}
