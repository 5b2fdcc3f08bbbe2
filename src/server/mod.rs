pub mod protocol;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::scene::{SceneCommand, SceneMode};
use protocol::{CommandReply, HealthStatus};

/// A client command on its way to the tick loop, with a slot for the reply.
#[derive(Debug)]
pub struct CommandRequest {
    pub command: SceneCommand,
    pub reply: oneshot::Sender<String>,
}

/// Shared server state accessible from all connection handlers and the tick loop.
pub struct ServerState {
    /// Latest scene frame (JSON, ready to send) for newly connected clients.
    pub frame_json: RwLock<String>,
    /// Broadcast channel for per-tick frames.
    pub frame_sender: broadcast::Sender<String>,
    /// Commands forwarded to the single owner of the scene.
    pub commands: mpsc::Sender<CommandRequest>,
    pub health: RwLock<HealthData>,
    clients: AtomicUsize,
}

pub struct HealthData {
    pub session: String,
    pub biome: String,
    pub tick: u64,
    pub mode: SceneMode,
    pub active_agents: usize,
    pub recent_tick_durations_ms: Vec<f32>,
}

impl HealthData {
    pub fn tick_rate(&self) -> f32 {
        if self.recent_tick_durations_ms.is_empty() {
            return 0.0;
        }
        let avg_ms: f32 = self.recent_tick_durations_ms.iter().sum::<f32>()
            / self.recent_tick_durations_ms.len() as f32;
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }
}

impl ServerState {
    /// Create the state and the receiving end of the command channel.
    pub fn new(
        initial_frame_json: String,
        session: String,
        biome: String,
    ) -> (Self, mpsc::Receiver<CommandRequest>) {
        let (tx, _) = broadcast::channel(64);
        let (command_tx, command_rx) = mpsc::channel(256);
        let state = ServerState {
            frame_json: RwLock::new(initial_frame_json),
            frame_sender: tx,
            commands: command_tx,
            health: RwLock::new(HealthData {
                session,
                biome,
                tick: 0,
                mode: SceneMode::Explore,
                active_agents: 0,
                recent_tick_durations_ms: Vec::new(),
            }),
            clients: AtomicUsize::new(0),
        };
        (state, command_rx)
    }

    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }

    /// Publish the frame produced by a tick and record health data.
    pub async fn on_tick(
        &self,
        frame_json: String,
        tick: u64,
        mode: SceneMode,
        active_agents: usize,
        tick_duration_ms: f32,
    ) {
        *self.frame_json.write().await = frame_json.clone();

        // No receivers is fine.
        let _ = self.frame_sender.send(frame_json);

        let mut health = self.health.write().await;
        health.tick = tick;
        health.mode = mode;
        health.active_agents = active_agents;
        health.recent_tick_durations_ms.push(tick_duration_ms);
        if health.recent_tick_durations_ms.len() > 100 {
            health.recent_tick_durations_ms.remove(0);
        }
    }
}

/// Start the WebSocket + HTTP server on the given address.
pub async fn start_server(
    state: Arc<ServerState>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, state).await {
                error!(%peer, "Connection error: {}", e);
            }
        });
    }
}

/// Route a connection to the WebSocket handler or a plain HTTP response.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut buf = [0u8; 512];
    let n = stream.peek(&mut buf).await?;
    let request_line = String::from_utf8_lossy(&buf[..n]).to_lowercase();

    if request_line.contains("upgrade: websocket") {
        handle_websocket(stream, peer, state).await
    } else if request_line.contains("get /health") {
        handle_health_request(stream, state).await
    } else {
        handle_not_found(stream).await
    }
}

/// Send the latest frame, then stream frames and relay commands until the client leaves.
async fn handle_websocket(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let clients = state.clients.fetch_add(1, Ordering::Relaxed) + 1;
    info!(%peer, clients, "WebSocket connected");

    let (mut write, mut read) = ws_stream.split();

    let result = async {
        let frame = state.frame_json.read().await.clone();
        write.send(Message::Text(frame.into())).await?;

        let mut rx = state.frame_sender.subscribe();

        loop {
            tokio::select! {
                frame = rx.recv() => {
                    match frame {
                        Ok(json) => {
                            if write.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(%peer, lagged = n, "Client lagged behind on frames");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let reply = relay_command(&state, text.as_str()).await;
                            match reply {
                                Some(json) => {
                                    if write.send(Message::Text(json.into())).await.is_err() {
                                        break;
                                    }
                                }
                                // Tick loop is gone.
                                None => break,
                            }
                        }
                        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                        _ => {}
                    }
                }
            }
        }
        Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
    }
    .await;

    let clients = state.clients.fetch_sub(1, Ordering::Relaxed) - 1;
    info!(%peer, clients, "WebSocket disconnected");
    result
}

/// Parse a client message and hand it to the tick loop. `None` once the loop has stopped.
async fn relay_command(state: &ServerState, text: &str) -> Option<String> {
    let command: SceneCommand = match serde_json::from_str(text) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "Rejected client message");
            return Some(protocol::reply_json(&CommandReply::error(format!(
                "invalid command: {}",
                e
            ))));
        }
    };
    let (reply_tx, reply_rx) = oneshot::channel();
    state
        .commands
        .send(CommandRequest {
            command,
            reply: reply_tx,
        })
        .await
        .ok()?;
    reply_rx.await.ok()
}

async fn handle_not_found(
    mut stream: TcpStream,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut buf = vec![0u8; 4096];
    let _ = stream.read(&mut buf).await?;

    let body = "not found";
    let response = format!(
        "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

async fn handle_health_request(
    mut stream: TcpStream,
    state: Arc<ServerState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut buf = vec![0u8; 4096];
    let _ = stream.read(&mut buf).await?;

    let status = {
        let health = state.health.read().await;
        HealthStatus {
            session: health.session.clone(),
            biome: health.biome.clone(),
            tick: health.tick,
            tick_rate: health.tick_rate(),
            mode: health.mode,
            active_agents: health.active_agents,
            clients: state.client_count(),
        }
    };

    let body = serde_json::to_string(&status)?;
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );

    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;

    Ok(())
}
