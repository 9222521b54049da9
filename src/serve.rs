//! Dev server: static files over HTTP plus live-reload notifications.
//!
//! Serves the configured root directory with `ServeDir` and accepts reload
//! subscribers on a `GET /__reload` websocket route. Pipelines broadcast
//! through a [`ReloadHub`]; every socket connected at broadcast time receives
//! one `"reload"` text frame. The signal carries no payload and is not
//! persisted: a client connecting after a broadcast receives nothing until
//! the next one.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

/// Dev server error
#[derive(Debug, Error)]
pub enum ServeError {
    /// Could not bind the listen port
    #[error("Failed to bind port {port}: {source}")]
    Bind {
        /// Requested port
        port: u16,
        /// Underlying bind error
        source: std::io::Error,
    },
    /// Serving failed after startup
    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// Fan-out point for reload notifications.
///
/// Cheap to clone; all clones share one broadcast channel. `broadcast` is
/// fire-and-forget: with no subscribers the signal is dropped, and a slow
/// subscriber that lags past the channel capacity just misses signals.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<()>,
}

impl ReloadHub {
    /// Create a hub with no subscribers.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Subscribe to reload notifications from this point forward.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify all currently connected subscribers.
    pub fn broadcast(&self) {
        // Err means no subscribers; nothing to notify
        let _ = self.tx.send(());
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Serve `root` over HTTP on `port` until the process is killed.
///
/// Prints a line once the listener is up, mirroring the watch-mode startup
/// messages.
pub async fn serve(root: PathBuf, port: u16, hub: ReloadHub) -> Result<(), ServeError> {
    let app = Router::new()
        .route("/__reload", get(reload_ws))
        .fallback_service(ServeDir::new(root))
        .with_state(hub);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { port, source })?;
    println!("server started on port {}", port);

    axum::serve(listener, app).await.map_err(ServeError::Serve)
}

/// Upgrade a reload subscriber connection.
async fn reload_ws(ws: WebSocketUpgrade, State(hub): State<ReloadHub>) -> impl IntoResponse {
    // Subscribe at upgrade time so signals during the handshake are not lost
    let receiver = hub.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, receiver))
}

/// Forward reload signals to one connected subscriber.
async fn handle_socket(socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(()) => {
                        if sender.send(Message::Text("reload".to_string())).await.is_err() {
                            break; // Client disconnected
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        // Subscriber fell behind; the next signal still reloads
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue, // Ignore other messages
                    Some(Err(_)) => break,
                }
            }
        }
    }
}
