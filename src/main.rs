use stepboard::api::{build_api, AppState};
use stepboard::cache::poller::spawn_pollers;
use stepboard::cache::Caches;
use stepboard::checklist::ChecklistRule;
use stepboard::config::AppConfig;
use stepboard::http::ApiClient;
use stepboard::session::service::SessionStore;
use stepboard::status::classify::Classifier;
use stepboard::store::RemoteStore;
use stepboard::time::display_offset;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let client = ApiClient::new(&config.remote_base_url, config.request_timeout())?;
    let store = RemoteStore::new(client);

    let session = Arc::new(SessionStore::new(config.session_path.clone()));
    session.hydrate().await;
    let caches = Arc::new(Caches::new());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pollers = spawn_pollers(
        store.clone(),
        session.clone(),
        caches.clone(),
        config.poll_intervals(),
        shutdown_rx,
    );

    let state = AppState::new(
        store,
        session,
        caches,
        Classifier::new(display_offset(config.display_utc_offset_hours)),
        ChecklistRule::new(config.checklist_step_id),
    );
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("stepboard listening on {}", config.listen_addr);
    axum::serve(listener, build_api(state, config.cors_origins()))
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("could not listen for ctrl-c: {}", err);
            }
            info!("shutting down");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    futures::future::join_all(pollers).await;
    Ok(())
}
