use std::time::Duration;

use bganstat::{
    args::Args,
    monitor::{MonitorConfig, SignalMonitor},
    TerminalClient,
};
use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    run(&args).await
}

async fn run(args: &Args) -> Result<()> {
    info!("starting bganstat: {args:?}");

    let timeout = (args.request_timeout_secs > 0)
        .then(|| Duration::from_secs(args.request_timeout_secs));
    let client = TerminalClient::new(
        args.terminal_address.clone(),
        timeout,
        args.tunnel_bypass,
    )?;

    let config = MonitorConfig {
        status_interval: Duration::from_secs(args.status_poll_interval),
        history_interval: Duration::from_secs(args.history_poll_interval),
        history_limit: args.history_limit,
        reconcile_delay: Duration::from_millis(args.reconcile_delay_ms),
    };

    let monitor = SignalMonitor::start(client, config);
    let mut snapshots = monitor.snapshot();
    let mut history = monitor.history();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
            Ok(()) = snapshots.changed() => {
                let snap = snapshots.borrow_and_update().clone();
                info!(
                    signal_db = ?snap.signal_db,
                    percent = snap.signal_percent(),
                    quality = snap.quality().label(),
                    satellite = %snap.satellite_name,
                    network = snap.network_status.label(),
                    pdp_active = snap.pdp_active,
                    pdp_ip = ?snap.pdp_ip,
                    "terminal status",
                );
            }
            Ok(()) = history.changed() => {
                let samples = history.borrow_and_update().len();
                info!(samples, "signal history refreshed");
            }
        }
    }

    monitor.stop().await;
    info!("bganstat stopped");
    Ok(())
}
