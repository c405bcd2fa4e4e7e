// Terminal client: joins the server, prints prompts and relays stdin lines as replies.

use futures::{SinkExt, StreamExt};
use rps_server::interface_adapters::protocol::{ClientMessage, EndReasonDto, ServerMessage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::Message};

const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:12345/ws";

type ClientResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> ClientResult<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let url = std::env::var("RPS_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    let display_name = match std::env::args().nth(1) {
        Some(name) => name,
        None => {
            println!("Enter your name:");
            stdin.next_line().await?.unwrap_or_default()
        }
    };

    let (ws, _) = connect_async(url.as_str()).await.inspect_err(|e| {
        tracing::error!(%url, error = %e, "failed to connect");
    })?;
    let (mut sink, mut stream) = ws.split();

    send(&mut sink, &ClientMessage::Join { display_name }).await?;

    loop {
        tokio::select! {
            incoming = stream.next() => {
                let Some(frame) = incoming else {
                    println!("Connection closed by server.");
                    return Ok(());
                };
                match frame? {
                    Message::Text(text) => match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(msg) => {
                            let finished = matches!(msg, ServerMessage::GameOver(_));
                            render(&msg);
                            if finished {
                                let _ = sink.close().await;
                                return Ok(());
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "unreadable server message"),
                    },
                    Message::Close(frame) => {
                        match frame {
                            Some(frame) => println!("Disconnected: {}", frame.reason),
                            None => println!("Disconnected."),
                        }
                        return Ok(());
                    }
                    _ => {}
                }
            }
            line = stdin.next_line() => {
                let Some(text) = line? else {
                    let _ = sink.close().await;
                    return Ok(());
                };
                send(&mut sink, &ClientMessage::Reply { text }).await?;
            }
        }
    }
}

async fn send<S>(sink: &mut S, msg: &ClientMessage) -> ClientResult<()>
where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let text = serde_json::to_string(msg)?;
    sink.send(Message::Text(text.into())).await?;
    Ok(())
}

fn render(msg: &ServerMessage) {
    match msg {
        ServerMessage::Waiting => println!("Waiting for an opponent..."),
        ServerMessage::GameStart { opponent, .. } => {
            println!("Game starting against {opponent}!");
        }
        ServerMessage::MovePrompt { round, prompt } => println!("[round {round}] {prompt}"),
        ServerMessage::InvalidReply { reason } => println!("Invalid input: {reason}"),
        ServerMessage::RoundOutcome(outcome) => {
            for play in &outcome.plays {
                println!("{} chose {}", play.name, play.choice);
            }
            println!("{}", outcome.summary);
            let scores: Vec<String> = outcome
                .standings
                .iter()
                .map(|s| format!("{}: {}", s.name, s.score))
                .collect();
            println!("Score - {}", scores.join(", "));
        }
        ServerMessage::ContinuePrompt { prompt } => println!("{prompt}"),
        ServerMessage::GameOver(over) => {
            if let EndReasonDto::PeerLost { name } = &over.reason {
                println!("{name} left the game.");
            }
            println!("{}", over.summary);
        }
    }
}
