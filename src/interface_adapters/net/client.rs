use crate::domain::{Notice, Peer, PeerError, PeerLink};
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::next_conn_id;
use crate::use_cases::run_session;

use async_trait::async_trait;
use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{sync::Arc, time::Duration};
use tokio::time::timeout;
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes handshake failures so the caller can pick a log level.
    #[allow(dead_code)]
    Ws(axum::Error),
    JoinRequired,
    InvalidName,
    ClosedBeforeJoin,
}

const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_DISPLAY_NAME_LEN: usize = 32;

/// One client's WebSocket as seen by the game loop.
pub struct WsLink {
    socket: WebSocket,
}

#[async_trait]
impl PeerLink for WsLink {
    async fn send(&mut self, notice: &Notice) -> Result<(), PeerError> {
        // Serialization of our own DTOs cannot fail in practice; report it as transport anyway.
        let txt = serde_json::to_string(&ServerMessage::from(notice))
            .map_err(|e| PeerError::Transport(e.to_string()))?;
        self.socket
            .send(Message::Text(txt.into()))
            .await
            .map_err(|e| PeerError::Transport(e.to_string()))
    }

    async fn recv(&mut self) -> Result<String, PeerError> {
        loop {
            let Some(incoming) = self.socket.recv().await else {
                return Err(PeerError::Disconnected);
            };

            let message = incoming.map_err(|e| PeerError::Transport(e.to_string()))?;
            match message {
                Message::Text(text) => {
                    return match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::Reply { text }) => Ok(text),
                        Ok(ClientMessage::Join { .. }) => {
                            Err(PeerError::Malformed("already joined".to_string()))
                        }
                        Err(e) => Err(PeerError::Malformed(format!("unreadable message: {e}"))),
                    };
                }
                Message::Binary(_) => {
                    return Err(PeerError::Malformed(
                        "binary messages not supported".to_string(),
                    ));
                }
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => return Err(PeerError::Disconnected),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.socket.close().await {
            debug!(error = %e, "socket close error");
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Connection id doubles as the peer id once the join succeeds.
    let conn_id = next_conn_id();
    let span = info_span!("conn", conn_id, player = tracing::field::Empty);

    async move {
        let mut socket = socket;

        let display_name =
            match timeout(JOIN_HANDSHAKE_TIMEOUT, read_join_handshake(&mut socket)).await {
                Ok(Ok(name)) => name,
                Ok(Err(NetError::ClosedBeforeJoin)) => {
                    info!("client disconnected before join handshake");
                    return;
                }
                Ok(Err(e)) => {
                    warn!(error = ?e, "join handshake rejected");
                    return;
                }
                Err(_) => {
                    let _ = send_close_with_reason(&mut socket, close_code::POLICY, "join timeout")
                        .await;
                    warn!("join handshake timed out");
                    return;
                }
            };

        tracing::Span::current().record("player", display_name.as_str());
        info!("client joined");

        let peer = Peer::new(conn_id, display_name, WsLink { socket });
        // Whichever connection waited first owns the session; the other one
        // returns here once its peer has been handed over.
        if let Some(session) = state.registry.matchmake(peer).await {
            run_session(session, &state.game_settings, state.recorder.as_ref()).await;
        }
    }
    .instrument(span)
    .await
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

fn validate_display_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return None;
    }
    Some(name.to_string())
}

// Reads the identification frame. Anything other than a valid Join ends the
// connection with a close frame.
async fn read_join_handshake(socket: &mut WebSocket) -> Result<String, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        let message = incoming.map_err(NetError::Ws)?;
        match message {
            Message::Text(text) => {
                let display_name = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join { display_name }) => display_name,
                    Ok(ClientMessage::Reply { .. }) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        return Err(NetError::JoinRequired);
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        return Err(NetError::JoinRequired);
                    }
                };

                let Some(name) = validate_display_name(&display_name) else {
                    let _ =
                        send_close_with_reason(socket, close_code::POLICY, "invalid display name")
                            .await;
                    return Err(NetError::InvalidName);
                };
                return Ok(name);
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_name_has_padding_then_it_is_trimmed() {
        assert_eq!(validate_display_name("  alice \n"), Some("alice".to_string()));
    }

    #[test]
    fn when_name_is_blank_or_too_long_then_it_is_rejected() {
        assert_eq!(validate_display_name("   "), None);
        assert_eq!(validate_display_name(&"x".repeat(33)), None);
        assert!(validate_display_name(&"x".repeat(32)).is_some());
    }
}
