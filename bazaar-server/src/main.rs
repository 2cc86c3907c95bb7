use bazaar_server::{Config, init_logger, init_logger_with_file};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    if config.log_to_file {
        let log_dir = format!("{}/logs", config.work_dir);
        init_logger_with_file(None, Some(&log_dir));
    } else {
        init_logger();
    }

    tracing::info!(port = config.http_port, "Bazaar server starting");

    if let Err(e) = bazaar_server::core::run(config).await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
