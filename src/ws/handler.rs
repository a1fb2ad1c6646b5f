//! WebSocket upgrade handler and session loop

use std::net::SocketAddr;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{JoinReply, WorldCommand};
use crate::session::SessionInfo;
use crate::util::rate_limit::SessionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, remote_addr, state))
}

/// Handle the upgraded WebSocket connection.
///
/// Connecting: join handshake allocates an entity and delivers the full
/// snapshot. Active: the session loop. Disconnected: registry cleanup and a
/// Leave command folded into the next tick's drain.
async fn handle_socket(socket: WebSocket, remote_addr: SocketAddr, state: AppState) {
    // Subscribe before joining so no delta between snapshot and loop is lost
    let updates = state.world.subscribe();

    let (reply_tx, reply_rx) = oneshot::channel();
    if state
        .world
        .command_tx
        .send(WorldCommand::Join { reply: reply_tx })
        .await
        .is_err()
    {
        warn!("World task gone, rejecting connection");
        return;
    }
    let Ok(JoinReply {
        entity_id,
        snapshot,
    }) = reply_rx.await
    else {
        warn!("Join handshake dropped, closing connection");
        return;
    };

    info!(entity_id = %entity_id, remote_addr = %remote_addr, "Session active");
    state.sessions.register(
        entity_id,
        SessionInfo {
            connected_at: unix_millis(),
            remote_addr,
        },
    );

    let (mut ws_sink, ws_stream) = socket.split();
    let close_early = match serde_json::to_string(&snapshot) {
        Ok(json) => ws_sink.send(Message::Text(json)).await.is_err(),
        Err(e) => {
            warn!(entity_id = %entity_id, error = %e, "Failed to encode snapshot");
            true
        }
    };

    if !close_early {
        run_session(entity_id, &state, ws_sink, ws_stream, updates).await;
    }

    state.sessions.unregister(entity_id);
    let _ = state
        .world
        .command_tx
        .send(WorldCommand::Leave { id: entity_id })
        .await;

    info!(entity_id = %entity_id, "Session closed");
}

/// The active session loop: forward world deltas out, feed client inputs in,
/// answer pings inline.
async fn run_session(
    entity_id: Uuid,
    state: &AppState,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    mut updates: broadcast::Receiver<ServerMsg>,
) {
    let rate_limiter = SessionRateLimiter::new();

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(msg) => {
                        if send_msg(&mut ws_sink, &msg).await.is_err() {
                            debug!(entity_id = %entity_id, "WebSocket send failed");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Slow client skipped some deltas; keep it connected
                        warn!(entity_id = %entity_id, lagged_count = n, "Client lagged, skipping {} updates", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(entity_id = %entity_id, "Update channel closed");
                        break;
                    }
                }
            }

            incoming = ws_stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if !rate_limiter.check_input() {
                            warn!(entity_id = %entity_id, "Rate limited input message");
                            continue;
                        }
                        match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(msg) => {
                                if handle_client_msg(entity_id, state, &mut ws_sink, msg).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                // Malformed message: discard, connection stays open
                                warn!(entity_id = %entity_id, error = %e, "Failed to parse client message");
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!(entity_id = %entity_id, "Received binary message, ignoring");
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!(entity_id = %entity_id, "Client initiated close");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(entity_id = %entity_id, error = %e, "WebSocket error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }
}

/// Dispatch one parsed client message.
///
/// Errors only when the session must end (world gone or socket dead).
async fn handle_client_msg(
    entity_id: Uuid,
    state: &AppState,
    ws_sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: ClientMsg,
) -> Result<(), ()> {
    match msg {
        ClientMsg::Move {
            direction,
            sequence_number,
        } => state
            .world
            .command_tx
            .send(WorldCommand::Move {
                id: entity_id,
                direction,
                sequence_number,
            })
            .await
            .map_err(|_| ()),

        ClientMsg::Shoot {
            bullet_id,
            angle,
            target_x,
            target_y,
        } => state
            .world
            .command_tx
            .send(WorldCommand::Shoot {
                id: entity_id,
                bullet_id,
                angle,
                target_x,
                target_y,
            })
            .await
            .map_err(|_| ()),

        // Latency probe: answered at the session layer, never queued
        ClientMsg::Ping { id } => send_msg(ws_sink, &ServerMsg::Pong { id })
            .await
            .map_err(|_| ()),
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
