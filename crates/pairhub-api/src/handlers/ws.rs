//! WebSocket upgrade handler and per-connection socket actor.

use std::net::SocketAddr;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use pairhub_core::types::IpHash;
use pairhub_realtime::connection::Outbound;

use crate::state::AppState;

/// GET /ws — WebSocket upgrade.
///
/// No query-string authentication: the client must send an AUTH frame
/// within the configured window. The source address is salted-hashed
/// before the upgrade completes and the raw value never retained.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let ip_hash = IpHash::from_addr(
        &client_addr(&headers, addr),
        &state.config.realtime.ip_salt,
    );
    ws.on_upgrade(move |socket| run_connection(state, socket, ip_hash))
}

/// The client source address: first `X-Forwarded-For` hop when present
/// (deployments behind a proxy), otherwise the socket address.
fn client_addr(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string())
}

/// Drives one established WebSocket connection.
async fn run_connection(state: AppState, socket: WebSocket, ip_hash: IpHash) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (handle, mut rx) = state.engine.connect(ip_hash);
    let socket_id = handle.socket_id.clone();

    info!(socket_id = %socket_id, "websocket connection established");

    // Outbound writer: drains the engine's channel onto the socket.
    let writer = tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            let result = match item {
                Outbound::Frame(text) => ws_tx.send(Message::Text(text)).await,
                Outbound::Ping => ws_tx.send(Message::Ping(Vec::new())).await,
                Outbound::Close { code, reason } => {
                    let _ = ws_tx
                        .send(Message::Close(Some(CloseFrame {
                            code,
                            reason: reason.into(),
                        })))
                        .await;
                    break;
                }
            };
            if result.is_err() {
                break;
            }
        }
    });

    // Inbound loop: feeds the dispatcher until the socket closes.
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                state.engine.handle_frame(&handle, &text).await;
            }
            Ok(Message::Pong(_)) => {
                handle.set_alive(true);
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(socket_id = %handle.socket_id, error = %e, "websocket error");
                break;
            }
        }
    }

    state.engine.handle_disconnect(&handle).await;
    writer.abort();

    info!(socket_id = %socket_id, "websocket connection closed");
}
