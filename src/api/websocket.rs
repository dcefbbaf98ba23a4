//! WebSocket gateway for real-time presence connections
//!
//! One task per socket. The task owns a [`Connection`], whose drop runs the
//! room leave path, so every exit from the loop releases the session.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::AppState;
use crate::engine::{
    ClientMessage, ConnectionId, JoinRequest, Outbox, Room, ServerMessage, SessionError,
};

/// Close code sent when the room dropped a session that stopped draining
const CLOSE_SESSION_DROPPED: u16 = 1008;

struct Membership {
    room: Arc<Room>,
    rx: mpsc::Receiver<ServerMessage>,
}

/// Per-socket state
struct Connection {
    id: ConnectionId,
    joined: Option<Membership>,
}

impl Connection {
    fn new() -> Self {
        Self {
            id: ConnectionId::next(),
            joined: None,
        }
    }

    /// Leave the current room, if any
    fn leave(&mut self) {
        if let Some(membership) = self.joined.take() {
            membership.room.leave(self.id);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.leave();
    }
}

/// Handle WebSocket upgrade
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Next queued message for a joined connection; pending forever otherwise
async fn next_outbound(joined: &mut Option<Membership>) -> Option<ServerMessage> {
    match joined {
        Some(membership) => membership.rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn send_close(socket: &mut WebSocket, code: u16, reason: String) {
    let frame = CloseFrame {
        code,
        reason: reason.into(),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut connection = Connection::new();
    let conn = connection.id;
    info!(%conn, "websocket connected");

    loop {
        tokio::select! {
            outbound = next_outbound(&mut connection.joined) => match outbound {
                Some(msg) => {
                    let json = match msg.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(%conn, error = %e, "failed to encode message");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        debug!(%conn, error = %SessionError::ConnectionLost, "send failed");
                        break;
                    }
                }
                None => {
                    // The room removed this session after a failed delivery
                    connection.joined = None;
                    warn!(%conn, "session dropped by room");
                    send_close(&mut socket, CLOSE_SESSION_DROPPED, "session dropped".into()).await;
                    break;
                }
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if let Err(err) = handle_text(&state, &mut connection, text.as_str()).await {
                        info!(%conn, error = %err, code = err.close_code(), "join failed");
                        send_close(&mut socket, err.close_code(), err.to_string()).await;
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(%conn, error = %e, "{}", SessionError::ConnectionLost);
                    break;
                }
                // Binary frames are ignored; pings are answered by axum
                Some(Ok(_)) => {}
            }
        }
    }

    drop(connection);
    info!(%conn, "websocket disconnected");
}

/// Apply one inbound text frame. An error is a failed join and ends the
/// connection; malformed frames are dropped.
async fn handle_text(
    state: &AppState,
    connection: &mut Connection,
    text: &str,
) -> Result<(), SessionError> {
    let msg = match ClientMessage::parse(text) {
        Ok(msg) => msg,
        Err(e) => {
            debug!(conn = %connection.id, error = %e, "dropping frame");
            return Ok(());
        }
    };

    match msg {
        ClientMessage::Join(request) => join(state, connection, request).await,
        ClientMessage::Movement(request) => {
            match &connection.joined {
                Some(membership) => {
                    membership.room.move_session(connection.id, request.target());
                }
                None => debug!(conn = %connection.id, "movement before join dropped"),
            }
            Ok(())
        }
        ClientMessage::Leave(_) => {
            connection.leave();
            Ok(())
        }
    }
}

async fn join(
    state: &AppState,
    connection: &mut Connection,
    request: JoinRequest,
) -> Result<(), SessionError> {
    // A connection is in at most one room. The old outbox is not drained
    // while lookups run, so leave first.
    connection.leave();

    let user_id = state.identity.verify_token(&request.token).await?;
    let space = state.spaces.get_space(&request.space_id).await?;

    let (outbox, rx) = Outbox::channel(state.outbox_capacity);
    let (room, _spawn) = state
        .registry
        .join(&space, connection.id, user_id, outbox)?;
    connection.joined = Some(Membership { room, rx });
    Ok(())
}
