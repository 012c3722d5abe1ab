use serde_json::Value;
use walrus_notes::application_impl::*;
use walrus_notes::auth::*;
use walrus_notes::logger::*;
use walrus_notes::settings::*;

// Fetches the note list from the configured API with the stored session,
// refreshing the access token if it has expired.
// $ cargo run --bin api_demo -- --settings=settings/dev.toml
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = Logger::new_bootstrap();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let store = credential_store_from_settings(&project_settings.credentials)?;
    let transport = refresh_transport_from_settings(&project_settings.api)?;
    let guard = TokenRefreshGuard::new(store, transport);
    let client = ApiClient::try_new(&ApiClientConfig::from(&project_settings.api), guard)?;

    match client.get_json::<Value>("/notes").await {
        Ok(notes) => info!("notes: {}", notes),
        Err(e) if e.is_session_lost() => warn!("not signed in: {}", e),
        Err(e) => error!("request failed: {}", e),
    }

    Ok(())
}
