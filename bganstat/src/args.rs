use clap::{
    builder::{styling::AnsiColor, Styles},
    Parser,
};
use url::Url;

#[derive(Debug, Parser)]
#[clap(version, about, styles = clap_v3_styles())]
pub struct Args {
    /// Base URL of the terminal's local status API.
    #[clap(
        long,
        env = "BGAN_TERMINAL_ADDRESS",
        default_value = "http://172.17.10.37:5000"
    )]
    pub terminal_address: Url,
    /// Status poll interval in seconds.
    #[clap(long, env = "BGAN_STATUS_POLL_INTERVAL", default_value = "10")]
    pub status_poll_interval: u64,
    /// Signal history poll interval in seconds.
    #[clap(long, env = "BGAN_HISTORY_POLL_INTERVAL", default_value = "30")]
    pub history_poll_interval: u64,
    /// Maximum number of retained signal history samples.
    #[clap(long, env = "BGAN_HISTORY_LIMIT", default_value = "50")]
    pub history_limit: usize,
    /// Delay in milliseconds before re-checking terminal state after a
    /// PDP command.
    #[clap(long, env = "BGAN_RECONCILE_DELAY_MS", default_value = "1500")]
    pub reconcile_delay_ms: u64,
    /// Per-request timeout in seconds. 0 disables the timeout and waits
    /// indefinitely, like the terminal's own web UI.
    #[clap(long, env = "BGAN_REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,
    /// Send the tunnel interstitial bypass header with every request.
    #[clap(long, env = "BGAN_TUNNEL_BYPASS")]
    pub tunnel_bypass: bool,
}

fn clap_v3_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default())
        .usage(AnsiColor::Green.on_default())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}
