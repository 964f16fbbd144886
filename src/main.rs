use dialog_relay::config::{self, ServerSettings};
use dialog_relay::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dialog_relay=info,warn".into()),
        )
        .init();

    let config_dir = config::get_config_dir()?;
    std::fs::create_dir_all(&config_dir)?;
    let settings = ServerSettings::load(&config_dir)?;

    tracing::info!("dialog-relay config dir: {:?}", config_dir);

    server::run(settings).await?;

    Ok(())
}
