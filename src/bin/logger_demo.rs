use admitgate::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");

    let config = LogConfig {
        filter: "admitgate=debug,logger_demo=trace".to_string(),
    };
    logger.reload_from_config(&config)?;
    trace!("application trace log");
    debug!(request_id = "demo", "application debug log");
    info!("application info log");

    let is_err = logger
        .reload_from_config(&LogConfig {
            filter: "not a [valid filter".to_string(),
        })
        .is_err();
    info!(is_err, "invalid filter rejected");

    Ok(())
}
