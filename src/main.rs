use walrus_notes::logger::*;
use walrus_notes::server::*;
use walrus_notes::settings::*;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let server = StaticServer::try_new(&project_settings)?;
    server
        .run(async {
            if let Err(e) = signal::ctrl_c().await {
                error!("could not listen for SIGINT: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
