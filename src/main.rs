use anyhow::Result;
use chatterm::app;
use chatterm::cli::Cli;
use chatterm::config::Settings;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Install default crypto provider for Rustls TLS before any request.
    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        eprintln!("Warning: Failed to install default crypto provider: {e:?}");
    }

    // Initialize logging; WARN keeps the transcript readable.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    let mut settings = Settings::load_or_init()?;
    settings.apply_env_overrides();
    app::dispatch::run(cli, settings).await
}
