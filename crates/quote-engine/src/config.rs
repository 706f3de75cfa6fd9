//! Environment-variable configuration, loaded once at startup. `dotenvy`
//! loads an optional `.env` for local development; production deployments
//! set these directly in the process environment.

use std::env;

use thiserror::Error;

use crate::state::InstrumentConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is missing")]
    Missing(&'static str),
    #[error("environment variable {key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub quote_refresh_cycle_ms: u64,
    pub tickers: Vec<String>,
    pub spread_width_bp: i64,
    pub max_price_deviation_pct: f64,
    pub ethereal_subaccount_id: String,
    pub ethereal_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let quote_refresh_cycle_ms = parse_or_default("QUOTE_REFRESH_CYCLE", 5000)?;
        let tickers = env::var("TICKERS")
            .unwrap_or_else(|_| "BTCUSD,ETHUSD,SOLUSD".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let spread_width_bp = parse_or_default("SPREAD_WIDTH", 10)?;
        let max_price_deviation_pct = parse_or_default("MAX_PRICE_DEVIATION", 1.0)?;
        let ethereal_subaccount_id = required_subaccount()?;
        let ethereal_timeout_ms = parse_or_default("ETHEREAL_TIMEOUT", 10_000)?;

        Ok(Self {
            quote_refresh_cycle_ms,
            tickers,
            spread_width_bp,
            max_price_deviation_pct,
            ethereal_subaccount_id,
            ethereal_timeout_ms,
        })
    }

    /// Build the static per-instrument config table, applying the
    /// `{BASE}_USD_*` per-asset overrides over the global defaults.
    /// `product_id_for` maps an instrument symbol to its venue product id
    /// and tick/qty bounds (the product-catalog lookup, out of scope here).
    pub fn instrument_configs(
        &self,
        product_id_for: impl Fn(&str) -> (String, f64, f64, f64),
    ) -> Vec<InstrumentConfig> {
        self.tickers
            .iter()
            .map(|instrument| {
                let base = base_asset(instrument);
                let (product_id, tick_size, min_qty, max_qty) = product_id_for(instrument);
                InstrumentConfig {
                    instrument: instrument.clone(),
                    order_size: env_override_f64(&base, "ORDER_SIZE").unwrap_or(100.0),
                    spread_bp: env_override_i64(&base, "SPREAD_WIDTH").unwrap_or(self.spread_width_bp),
                    max_deviation_pct: env_override_f64(&base, "MAX_PRICE_DEVIATION")
                        .unwrap_or(self.max_price_deviation_pct),
                    tick_size,
                    min_qty,
                    max_qty,
                    product_id,
                }
            })
            .collect()
    }
}

/// `BTCUSD` -> `BTC`. Instruments are always `{BASE}USD`.
fn base_asset(instrument: &str) -> String {
    instrument.strip_suffix("USD").unwrap_or(instrument).to_string()
}

fn env_override_f64(base: &str, suffix: &str) -> Option<f64> {
    env::var(format!("{base}_USD_{suffix}")).ok().and_then(|v| v.parse().ok())
}

fn env_override_i64(base: &str, suffix: &str) -> Option<i64> {
    env::var(format!("{base}_USD_{suffix}")).ok().and_then(|v| v.parse().ok())
}

fn required_subaccount() -> Result<String, ConfigError> {
    env::var("ETHEREAL_SUBACCOUNT_ID")
        .or_else(|_| env::var("ETHEREAL_SUBACCOUNT"))
        .map_err(|_| ConfigError::Missing("ETHEREAL_SUBACCOUNT_ID"))
}

trait FromEnvStr: Sized {
    fn parse_env(raw: &str) -> Option<Self>;
}

impl FromEnvStr for u64 {
    fn parse_env(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl FromEnvStr for i64 {
    fn parse_env(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl FromEnvStr for f64 {
    fn parse_env(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

fn parse_or_default<T: FromEnvStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => T::parse_env(&raw).ok_or_else(|| ConfigError::Invalid {
            key,
            value: raw,
            reason: "could not parse".to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variable tests share process-global state; serialize them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for key in [
            "QUOTE_REFRESH_CYCLE",
            "TICKERS",
            "SPREAD_WIDTH",
            "MAX_PRICE_DEVIATION",
            "ETHEREAL_SUBACCOUNT_ID",
            "ETHEREAL_SUBACCOUNT",
            "ETHEREAL_TIMEOUT",
            "BTC_USD_ORDER_SIZE",
            "BTC_USD_SPREAD_WIDTH",
        ] {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    fn missing_subaccount_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ETHEREAL_SUBACCOUNT_ID")));
    }

    #[test]
    fn defaults_apply_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        unsafe { env::set_var("ETHEREAL_SUBACCOUNT_ID", "sub-1") };
        let config = Config::from_env().unwrap();
        assert_eq!(config.quote_refresh_cycle_ms, 5000);
        assert_eq!(config.tickers, vec!["BTCUSD", "ETHUSD", "SOLUSD"]);
        assert_eq!(config.spread_width_bp, 10);
        assert_eq!(config.max_price_deviation_pct, 1.0);
        assert_eq!(config.ethereal_timeout_ms, 10_000);
        clear_all();
    }

    #[test]
    fn per_asset_override_wins_over_global() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        unsafe {
            env::set_var("ETHEREAL_SUBACCOUNT_ID", "sub-1");
            env::set_var("TICKERS", "BTCUSD");
            env::set_var("SPREAD_WIDTH", "10");
            env::set_var("BTC_USD_SPREAD_WIDTH", "25");
        }
        let config = Config::from_env().unwrap();
        let instruments = config.instrument_configs(|_| ("BTCUSD_PERP".to_string(), 1.0, 0.0001, 100.0));
        assert_eq!(instruments[0].spread_bp, 25);
        clear_all();
    }
}
