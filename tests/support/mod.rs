// Server bootstrapping and WebSocket client helpers shared by integration tests.
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use rps_server::GameSettings;
use rps_server::interface_adapters::protocol::{ClientMessage, ServerMessage};
use std::{
    // `Arc` shares the publish slot with the server thread; `OnceLock` writes it once.
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

// Settings with short timeouts so failure paths resolve quickly.
pub fn fast_settings() -> GameSettings {
    GameSettings {
        reply_timeout: Duration::from_secs(5),
        max_invalid_replies: 3,
        farewell_timeout: Duration::from_millis(500),
    }
}

// Start a dedicated server and return its `host:port`.
// Each test gets its own server so players from different tests never pair up.
pub fn spawn_server(settings: GameSettings) -> String {
    let published_addr = Arc::new(OnceLock::<String>::new());
    let published_addr_thread = Arc::clone(&published_addr);

    // An OS thread keeps the server alive independently of the test runtime.
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("test runtime");
        runtime.block_on(async move {
            // Ephemeral port avoids collisions with local services.
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral test port");
            let addr = listener.local_addr().expect("get local addr");
            let _ = published_addr_thread.set(addr.to_string());
            rps_server::run_with_settings(listener, settings)
                .await
                .expect("server failed");
        });
    });

    wait_for_readiness(published_addr)
}

// Wait for address publication, then for the socket to accept TCP connections.
fn wait_for_readiness(published_addr: Arc<OnceLock<String>>) -> String {
    let addr = loop {
        if let Some(addr) = published_addr.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return addr;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(addr: &str) -> Self {
        let (ws, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .expect("websocket connect");
        Self { ws }
    }

    // Connect and send the identification frame.
    pub async fn join(addr: &str, name: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client
            .send(&ClientMessage::Join {
                display_name: name.to_string(),
            })
            .await;
        client
    }

    pub async fn send(&mut self, msg: &ClientMessage) {
        let text = serde_json::to_string(msg).expect("serialize client message");
        self.send_raw(&text).await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_string().into()))
            .await
            .expect("send frame");
    }

    pub async fn reply(&mut self, text: &str) {
        self.send(&ClientMessage::Reply {
            text: text.to_string(),
        })
        .await;
    }

    pub async fn next_message(&mut self) -> ServerMessage {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for server message")
                .expect("stream ended")
                .expect("websocket error");
            match frame {
                Message::Text(text) => {
                    return serde_json::from_str(&text).expect("decode server message");
                }
                Message::Close(frame) => panic!("connection closed: {frame:?}"),
                _ => {}
            }
        }
    }

    // Returns the reason of the close frame, or None when the stream just ends.
    pub async fn close_reason(&mut self) -> Option<String> {
        loop {
            let next = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for close");
            match next {
                None | Some(Err(_)) => return None,
                Some(Ok(Message::Close(frame))) => return frame.map(|f| f.reason.to_string()),
                Some(Ok(_)) => {}
            }
        }
    }

    // Drop the socket without a closing handshake.
    pub fn hang_up(self) {
        drop(self.ws);
    }
}

pub async fn get_json<T: serde::de::DeserializeOwned>(addr: &str, path: &str) -> T {
    reqwest::get(format!("http://{addr}{path}"))
        .await
        .expect("request should succeed")
        .json::<T>()
        .await
        .expect("json body")
}
