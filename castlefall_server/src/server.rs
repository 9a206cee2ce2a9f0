use crate::{
    connection,
    error::{Error, Result},
    hub::{Hub, HubCommand},
};
use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    response::Response,
    routing::get,
    Router,
};
use castlefall_core::WordLists;
use log::{error, info};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::{net::TcpListener, sync::mpsc};

const HUB_QUEUE: usize = 256;

#[derive(Clone)]
struct AppState {
    hub: mpsc::Sender<HubCommand>,
    next_id: Arc<AtomicU64>,
}

async fn upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    let id = state.next_id.fetch_add(1, Ordering::Relaxed);
    ws.on_upgrade(move |socket| connection::serve(socket, peer, id, state.hub))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(upgrade))
        .route("/ws", get(upgrade))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

pub async fn run(addr: SocketAddr, lists: WordLists) -> Result<()> {
    let (commands, receiver) = mpsc::channel(HUB_QUEUE);
    tokio::spawn(Hub::new(lists, StdRng::from_entropy()).run(receiver));

    let state = AppState {
        hub: commands,
        next_id: Arc::new(AtomicU64::new(1)),
    };
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind { addr, source })?;
    info!("listening on ws://{addr}");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}
