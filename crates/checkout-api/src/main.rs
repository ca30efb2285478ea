//! Checkout API - Entry point.

use checkout_api::{
    api::{create_router_with_rate_limit, with_permissive_cors, AppState, RateLimitState},
    config::Config,
    sessions::OtpSessions,
};
use otp_coordinator::OtpBackends;
use payment_dispatch::{KnownApps, PaymentDispatcher};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    info!("Starting Checkout API");

    // OTP backends shared by every login session
    if config.otp.identity.api_key.is_empty() {
        warn!("OTP__IDENTITY__API_KEY not set, phone verification will fail");
    }
    let backends = match OtpBackends::from_config(&config.otp) {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to create OTP backends: {}", e);
            std::process::exit(1);
        }
    };
    let otp = OtpSessions::new(config.otp.clone(), backends, &config.sessions);

    // Payment dispatcher with the start-up profile set
    let apps = Arc::new(KnownApps::new(config.payments.installed_apps.clone()));
    let payments = PaymentDispatcher::new(config.payments.clone(), apps);
    info!(
        gateways = payments.registry().len(),
        environment = ?config.payments.environment,
        "Payment gateways registered"
    );

    let state = AppState::new(otp, payments);
    let rate_limit = RateLimitState::from_config(&config.rate_limit);

    let mut app = create_router_with_rate_limit(state, rate_limit);
    if config.server.allow_any_origin {
        app = with_permissive_cors(app);
    }

    // Bind to address
    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Checkout API stopped");
}

fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    if config.log.is_json() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
