/*
[INPUT]:  CLI arguments, environment configuration, OS shutdown signals
[OUTPUT]: Running quote engine with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ethereal_adapter::{ClientConfig, Ed25519Signer, EtherealClient, RequestSigner};
use rust_decimal::prelude::ToPrimitive;
use quote_engine::config::Config;
use quote_engine::engine::QuotingEngine;
use quote_engine::live::{LiveEventStream, LiveOracleFeed};
use quote_engine::state::InstrumentConfig;

#[derive(Parser, Debug)]
#[command(name = "quote-engine", version, about = "Automated perpetual-futures quoting engine")]
struct Cli {
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config = Config::from_env()
        .inspect_err(|err| error!(error = %err, "failed to load configuration"))
        .context("load configuration")?;
    info!(
        tickers = ?config.tickers,
        refresh_ms = config.quote_refresh_cycle_ms,
        "configuration loaded"
    );

    let signer = load_signer().context("load signing key")?;
    let base_url = std::env::var("ETHEREAL_BASE_URL")
        .unwrap_or_else(|_| ClientConfig::default().base_url);
    let client = Arc::new(
        EtherealClient::with_config(
            ClientConfig {
                base_url,
                timeout: std::time::Duration::from_millis(config.ethereal_timeout_ms),
                ..ClientConfig::default()
            },
            RequestSigner::new(signer),
            config.ethereal_subaccount_id.clone(),
        )
        .map_err(|err| anyhow!(err.to_string()))
        .context("build ethereal client")?,
    );

    let instruments = resolve_instruments(&client, &config).await?;
    if instruments.is_empty() {
        bail!("no instruments resolved from TICKERS; nothing to quote");
    }

    if args.dry_run {
        info!(instrument_count = instruments.len(), "dry-run requested; configuration validated");
        return Ok(());
    }

    let feed = Arc::new(LiveOracleFeed::new());
    let events = Arc::new(LiveEventStream::new());
    let engine = Arc::new(QuotingEngine::new(&config, instruments, client, feed, events));

    let shutdown = engine.shutdown_handle();
    setup_signal_handlers(shutdown);

    info!("starting quote engine");
    engine.run().await.context("quote engine run loop")?;
    info!("quote engine shut down cleanly");

    Ok(())
}

/// Resolve each configured ticker to its venue product id and tick/qty
/// bounds via the public product-catalog lookup. This sits outside the
/// three core traits; the core never performs catalog lookups itself.
async fn resolve_instruments(
    client: &EtherealClient,
    config: &Config,
) -> Result<Vec<InstrumentConfig>> {
    let mut resolved = Vec::with_capacity(config.tickers.len());
    for ticker in &config.tickers {
        let info = client
            .query_symbol_info(ticker)
            .await
            .with_context(|| format!("resolve symbol info for {ticker}"))?;
        resolved.push((
            ticker.clone(),
            info.product_id,
            info.tick_size.to_f64().unwrap_or(0.0),
            info.min_qty.to_f64().unwrap_or(0.0),
            info.max_qty.to_f64().unwrap_or(0.0),
        ));
    }

    let lookup = |ticker: &str| {
        resolved
            .iter()
            .find(|(t, ..)| t == ticker)
            .map(|(_, product_id, tick_size, min_qty, max_qty)| {
                (product_id.clone(), *tick_size, *min_qty, *max_qty)
            })
            .unwrap_or_default()
    };

    Ok(config.instrument_configs(lookup))
}

fn load_signer() -> Result<Ed25519Signer> {
    let hex_key = std::env::var("ETHEREAL_SIGNING_KEY")
        .context("ETHEREAL_SIGNING_KEY environment variable is required")?;
    let bytes = decode_hex_32(&hex_key)?;
    Ok(Ed25519Signer::from_secret_key(&bytes))
}

fn decode_hex_32(raw: &str) -> Result<[u8; 32]> {
    let raw = raw.trim();
    if raw.len() != 64 {
        bail!("ETHEREAL_SIGNING_KEY must be 64 hex characters (32 bytes), got {} chars", raw.len());
    }
    let mut bytes = [0u8; 32];
    for (i, byte) in bytes.iter_mut().enumerate() {
        let pair = &raw[i * 2..i * 2 + 2];
        *byte = u8::from_str_radix(pair, 16)
            .with_context(|| format!("invalid hex byte {pair:?} in ETHEREAL_SIGNING_KEY"))?;
    }
    Ok(bytes)
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn setup_signal_handlers(shutdown: tokio_util::sync::CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_for_quit = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });

        tokio::spawn(async move {
            match signal(SignalKind::quit()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGQUIT");
                    shutdown_for_quit.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGQUIT handler");
                }
            }
        });
    }
}
