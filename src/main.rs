use archview::{config::AppConfig, logger, server};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_loaded = dotenv::dotenv().is_ok();

    let config = AppConfig::from_env();
    logger::init_with_config(config.logger.clone())?;

    if env_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    logger::log_startup_info(&config);

    if let Err(e) = server::run(config).await {
        log::error!("❌ Server stopped: {}", e);
        return Err(e.into());
    }

    Ok(())
}
