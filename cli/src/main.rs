use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use events::{ClientMessage, Room, ServerEvent, parse_event};
use futures_util::{SinkExt, StreamExt};
use relay::{ConnectionStatus, RelayClient, RelayConfig};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing token; pass --token or set RELAY_TOKEN")]
    MissingToken,
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("authentication rejected")]
    AuthRejected,
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
    #[error("connection failed after exhausting reconnect attempts")]
    ConnectionFailed,
    #[error("malformed server event: {0}")]
    Parse(#[from] events::ParseError),
}

#[derive(Parser, Debug)]
#[command(name = "relay-cli", about = "Hosting portal realtime relay CLI")]
struct Cli {
    #[arg(long, env = "RELAY_URL", default_value = "ws://127.0.0.1:4000/ws")]
    url: String,

    #[arg(long, env = "RELAY_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow rooms and print their events to stdout.
    Tail(TailArgs),
    /// Measure application-level round-trip time.
    Ping(PingArgs),
}

#[derive(Args, Debug)]
struct TailArgs {
    /// Rooms to follow (notifications, servers, tickets, balance).
    /// Follows every room when omitted.
    rooms: Vec<Room>,

    /// Stop after this many events.
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct PingArgs {
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Tail(args) => run_tail(&cli.url, cli.token, args).await,
        Command::Ping(args) => run_ping(&cli.url, cli.token, &args).await,
    }
}

async fn run_tail(url: &str, token: Option<String>, args: TailArgs) -> Result<(), CliError> {
    if token.is_none() {
        return Err(CliError::MissingToken);
    }

    let config = RelayConfig::from_env()
        .with_token(token)
        .with_url(url.to_owned());
    let client = RelayClient::connect(config);

    let rooms = if args.rooms.is_empty() {
        Room::ALL.to_vec()
    } else {
        args.rooms
    };

    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    for room in rooms {
        let mut subscription = client.subscribe(room);
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                if events_tx.send((subscription.room(), event)).is_err() {
                    break;
                }
            }
        });
    }
    drop(events_tx);

    let mut status = client.watch_status();
    let mut printed = 0_usize;
    loop {
        tokio::select! {
            received = events_rx.recv() => {
                let Some((room, event)) = received else { break };
                println!("[{room}] {event:?}");
                printed = printed.saturating_add(1);
                if args.limit.is_some_and(|limit| printed >= limit) {
                    break;
                }
            }
            failed = status.wait_for(|s| *s == ConnectionStatus::Failed) => {
                if failed.is_ok() {
                    return Err(CliError::ConnectionFailed);
                }
                break;
            }
        }
    }

    client.shutdown();
    Ok(())
}

async fn run_ping(url: &str, token: Option<String>, args: &PingArgs) -> Result<(), CliError> {
    let token = token.ok_or(CliError::MissingToken)?;
    let timeout = Duration::from_millis(args.timeout_ms);

    let (mut stream, _) = connect_async(url)
        .await
        .map_err(|error| CliError::WsConnect(Box::new(error)))?;

    send(&mut stream, &ClientMessage::Auth { token }).await?;
    let auth = recv_matching(&mut stream, timeout, "auth response", |event| {
        matches!(
            event,
            ServerEvent::AuthSuccess { .. } | ServerEvent::AuthError { .. }
        )
    })
    .await?;
    if matches!(auth, ServerEvent::AuthError { .. }) {
        return Err(CliError::AuthRejected);
    }

    let started = Instant::now();
    send(&mut stream, &ClientMessage::Ping).await?;
    recv_matching(&mut stream, timeout, "pong", |event| {
        matches!(event, ServerEvent::Pong)
    })
    .await?;

    println!("pong: {}ms", started.elapsed().as_millis());
    let _ = stream.close(None).await;
    Ok(())
}

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn send(stream: &mut WsStream, message: &ClientMessage) -> Result<(), CliError> {
    stream
        .send(Message::Text(message.to_text().into()))
        .await
        .map_err(|error| CliError::WsConnect(Box::new(error)))
}

async fn recv_matching(
    stream: &mut WsStream,
    timeout: Duration,
    what: &'static str,
    matches: impl Fn(&ServerEvent) -> bool,
) -> Result<ServerEvent, CliError> {
    let fut = async {
        loop {
            let Some(message) = stream.next().await else {
                return Err(CliError::WsClosed);
            };
            match message.map_err(|error| CliError::WsConnect(Box::new(error)))? {
                Message::Text(text) => {
                    let event = parse_event(text.as_str())?;
                    if matches(&event) {
                        return Ok(event);
                    }
                }
                Message::Close(_) => return Err(CliError::WsClosed),
                _ => {}
            }
        }
    };

    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| CliError::Timeout(what))?
}
