use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use daybook::config::AppConfig;
use daybook::db;
use daybook::routes;
use daybook::services::mail::relay::RelayMailer;
use daybook::services::mail::{LogMailer, Mailer};
use daybook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    if config.auth_secret == "changeme" {
        tracing::warn!("AUTH_SECRET is not set, using the insecure default");
    }

    let conn = db::init_db(&config.database_url)?;

    let mailer: Box<dyn Mailer> = match &config.mail_relay_url {
        Some(url) => {
            tracing::info!("sending mail through relay at {url}");
            Box::new(RelayMailer::new(url.clone(), config.mail_from.clone()))
        }
        None => {
            tracing::info!("MAIL_RELAY_URL not set, verification links will be logged");
            Box::new(LogMailer)
        }
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        mailer,
    });

    let app = routes::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
