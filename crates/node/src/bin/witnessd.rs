// Path: crates/node/src/bin/witnessd.rs
#![forbid(unsafe_code)]

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use witness_agent::config::load_config;
use witness_agent::notify::LogTransport;
use witness_agent::rpc::{HttpMailRelay, RemoteSigner, RpcLedgerClient};
use witness_agent::watcher::{signal_channel, ChainWatcher};
use witness_agent::{start_witnessing, WitnessDependencies};
use witness_api::MailTransport;
use witness_telemetry::http::Readiness;
use witness_telemetry::init::LogFormat;

#[derive(Parser, Debug)]
#[clap(name = "witnessd", about = "Single-address witnessing agent")]
struct WitnessOpts {
    #[clap(
        long,
        env = "WITNESS_CONFIG",
        default_value = "witness.toml",
        help = "Path to the witness.toml configuration file."
    )]
    config: PathBuf,
    #[clap(
        long,
        env = "WITNESS_LOG_FORMAT",
        default_value = "json",
        help = "Log output format: json or text."
    )]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = WitnessOpts::parse();
    witness_telemetry::init::init_tracing(opts.log_format)?;

    let config = load_config(&opts.config)?;
    config.validate()?;
    let readiness = Readiness::new();

    if let Some(listen) = &config.metrics_listen_address {
        let addr: SocketAddr = listen
            .parse()
            .with_context(|| format!("invalid metrics_listen_address '{listen}'"))?;
        let metrics_sink = witness_telemetry::prometheus::install()?;
        witness_telemetry::sinks::SINK
            .set(metrics_sink)
            .map_err(|_| anyhow!("metrics sink already installed"))?;
        tokio::spawn(witness_telemetry::http::run_server(addr, readiness.clone()));
    }

    let ledger_url = config
        .ledger_rpc_url
        .clone()
        .ok_or_else(|| anyhow!("ledger_rpc_url must be set"))?;
    let signer_url = config
        .signer_url
        .clone()
        .ok_or_else(|| anyhow!("signer_url must be set"))?;

    let ledger = Arc::new(RpcLedgerClient::new(ledger_url)?);
    let mail: Arc<dyn MailTransport> = match &config.mail_relay_url {
        Some(url) => Arc::new(HttpMailRelay::new(url.clone())?),
        None => {
            tracing::warn!(target: "witnessd", "No mail_relay_url configured, notifications are only logged");
            Arc::new(LogTransport)
        }
    };

    let controller = start_witnessing(
        &config,
        WitnessDependencies {
            identity: ledger.clone(),
            ledger: ledger.clone(),
            composer: ledger.clone(),
            signer: Arc::new(RemoteSigner::new(signer_url)?),
            broadcaster: ledger.clone(),
            mail,
        },
    )
    .await?;

    let (tx, rx) = signal_channel();
    let watcher = ChainWatcher::new(ledger, Duration::from_millis(config.poll_interval_ms));
    let watcher_handle = tokio::spawn(watcher.run(tx));
    let controller_handle = tokio::spawn(controller.run(rx));
    readiness.mark_ready();
    tracing::info!(target: "witnessd", "Witnessing agent ready");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(target: "witnessd", event = "shutdown", reason = "ctrl-c");
        }
        res = controller_handle => {
            if let Err(e) = res {
                tracing::error!(target: "witnessd", error = %e, "Controller task failed");
            }
        }
    }
    watcher_handle.abort();
    Ok(())
}
