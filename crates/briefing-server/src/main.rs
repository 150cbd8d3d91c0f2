use std::time::Duration;

use briefing_core::config::Config;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "briefing-server",
    about = "Relay investigation requests to an automation webhook and stream agent briefings back",
    version
)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "BRIEFING_PORT", default_value = "3199")]
    port: u16,

    /// Shared secret the agent must present in x-webhook-secret (unset = no check)
    #[arg(long, env = "BRIEFING_WEBHOOK_SECRET")]
    webhook_secret: Option<String>,

    /// Entry webhook investigation requests are forwarded to
    #[arg(long, env = "BRIEFING_ENTRY_WEBHOOK_URL")]
    entry_webhook_url: Option<String>,

    /// Fallback callback URL when none can be derived from the request
    #[arg(long, env = "BRIEFING_CALLBACK_URL")]
    results_callback_url: Option<String>,

    /// Tag identifying this UI in the dispatch envelope
    #[arg(long, env = "BRIEFING_UI_TAG", default_value = Config::DEFAULT_UI_TAG)]
    ui_tag: String,

    /// Maximum number of retained result entries
    #[arg(long, env = "BRIEFING_RESULT_CAP", default_value_t = Config::DEFAULT_RESULT_CAP)]
    result_cap: usize,

    /// Seconds between SSE heartbeat frames
    #[arg(long, env = "BRIEFING_HEARTBEAT_SECS", default_value_t = Config::DEFAULT_HEARTBEAT_SECS)]
    heartbeat_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let config = Config {
        webhook_secret: cli.webhook_secret,
        entry_webhook_url: cli.entry_webhook_url,
        results_callback_url: cli.results_callback_url,
        ui_tag: cli.ui_tag,
        result_cap: cli.result_cap,
        heartbeat_period: Duration::from_secs(cli.heartbeat_secs),
    };

    briefing_server::serve(config, cli.port).await
}
