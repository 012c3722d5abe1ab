use walrus_notes::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");

    let config = LogConfig {
        filter: "walrus_notes=trace".to_string(),
    };
    logger.reload_from_config(&config)?;
    trace!("application trace log");
    debug!("application debug log");
    info!("application info log");

    // an invalid directive is rejected and the previous filter stays
    let bad = LogConfig {
        filter: "walrus_notes=[".to_string(),
    };
    info!("invalid filter rejected: {}", logger.reload_from_config(&bad).is_err());

    Ok(())
}
