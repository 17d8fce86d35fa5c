use aqualink_sos::AppResources;
use aqualink_sos::api::start_webserver;
use aqualink_sos::config::load_config_or_panic;
use aqualink_sos::dispatch::HttpSmsGateway;
use aqualink_sos::rate_limit::RedisSlidingWindow;
use redis::aio::ConnectionManager;
use rustls::crypto;
use rustls::crypto::CryptoProvider;
use sea_orm::Database;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "aqualink_sos=info,hyper=warn,sea_orm=info";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install().expect("Failed to install `color_eyre::install`");
    dotenvy::dotenv().ok();

    initialize_tracing();

    let config = Arc::new(load_config_or_panic());

    let ring_provider = crypto::ring::default_provider();
    CryptoProvider::install_default(ring_provider).expect("Failed to install crypto provider");

    // Relational store for alerts, contacts, settings and logs.
    let db = Arc::new(
        Database::connect(&config.database_url)
            .await
            .expect("Failed to connect to database"),
    );

    // Shared rate-limiter state lives in Redis so every instance admits
    // against the same window.
    let redis_client =
        redis::Client::open(config.redis_url.as_str()).expect("Invalid redis URL");
    let mut redis_conn = ConnectionManager::new(redis_client)
        .await
        .expect("Failed to connect to Redis");
    redis::cmd("PING")
        .query_async::<String>(&mut redis_conn)
        .await
        .expect("Failed to ping Redis");
    let limiter = Arc::new(RedisSlidingWindow::new(
        redis_conn,
        config.rate_limit.clone(),
    ));

    let gateway = Arc::new(
        HttpSmsGateway::new(config.sms.clone()).expect("Failed to build SMS gateway client"),
    );

    let resources = AppResources {
        db,
        gateway,
        limiter,
        config,
    };

    start_webserver(resources).await?;
    Ok(())
}
