// src/main.rs

use clap::Parser;
use kwizify::cli::{self, Cli};
use kwizify::config::Config;
use kwizify::state::AppState;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration from environment (and .env, if present)
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "kwizify.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    // Terminal gets warnings only; the file gets everything RUST_LOG allows
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(LevelFilter::WARN);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::debug!("Using API at {}", config.api_url);

    let state = AppState::new(config);
    if let Err(e) = cli::run(cli, state).await {
        tracing::debug!("Command failed: {:?}", e);
        eprintln!("Error: {}", e.message());
        std::process::exit(1);
    }
}
