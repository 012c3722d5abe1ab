use std::sync::Arc;
use std::time::Duration;
use walrus_notes::application_impl::*;
use walrus_notes::application_port::*;
use walrus_notes::auth::*;
use walrus_notes::domain_model::Credentials;
use walrus_notes::logger::*;
use walrus_notes::settings::{Cli, Parser, parse_settings};

// Ten concurrent requests hit an expired token; watch a single refresh
// episode serve all of them.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logger = Logger::new_bootstrap();
    let cli = Cli::parse();
    let settings = parse_settings(cli.settings.as_deref())?;

    let store = credential_store_from_settings(&settings.credentials)?;
    store
        .set(&Credentials::new("expired-access", "refresh-1"))
        .await?;
    let transport = Arc::new(FakeRefreshTransport::with_delay(Duration::from_millis(200)));
    let guard = TokenRefreshGuard::new(store.clone(), transport.clone());

    let mut handles = Vec::new();
    for n in 0..10 {
        let guard = guard.clone();
        handles.push(tokio::spawn(async move {
            guard
                .perform(|credentials| async move {
                    if credentials.access() == "expired-access" {
                        Err(ApiError::with_status(401, "token expired"))
                    } else {
                        Ok(format!("request {n} served with {}", credentials.access()))
                    }
                })
                .await
        }));
    }

    for handle in handles {
        match handle.await? {
            Ok(line) => info!("{}", line),
            Err(e) => warn!("request failed: {}", e),
        }
    }
    info!("refresh calls: {}", transport.calls());
    info!("stored access token: {:?}", store.get().await?.map(|c| c.access().to_owned()));

    Ok(())
}
