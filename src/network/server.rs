//! WebSocket Game Server
//!
//! Async WebSocket server for player connections.
//! Handles the join handshake, routes requests into the lobby and writes
//! lobby notifications back out.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::ControlFlow;
use std::str::FromStr;
use std::sync::{Arc, RwLock as StdRwLock};
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock, broadcast};
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::game::events::{Notification, Recipient};
use crate::game::player::PlayerName;
use crate::network::auth::{resolve_player_name, AuthConfig};
use crate::network::lobby::{Lobby, NotificationSink};
use crate::network::protocol::{
    ClientMessage, ServerMessage, ServerError, JoinRequest, JoinResult, ErrorCode,
};

/// Outbound queue of one connection.
pub type Outbox = mpsc::Sender<ServerMessage>;

/// Messages a connection may have queued before further ones are dropped.
pub const OUTBOX_CAPACITY: usize = 64;

/// How long a closing connection may take to flush its outbox.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Time a new connection has to send `join`.
    pub join_timeout: Duration,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            join_timeout: Duration::from_secs(30),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env_or("GOT_BIND_ADDR", defaults.bind_addr),
            max_connections: env_or("GOT_MAX_CONNECTIONS", defaults.max_connections),
            join_timeout: Duration::from_secs(env_or(
                "GOT_JOIN_TIMEOUT_SECS",
                defaults.join_timeout.as_secs(),
            )),
            version: defaults.version,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),
}

// =============================================================================
// DELIVERY
// =============================================================================

/// Notification sink backed by one bounded channel per joined player.
///
/// A full outbox means the client stopped reading; the message is dropped.
#[derive(Default)]
pub struct ChannelSink {
    outboxes: StdRwLock<BTreeMap<PlayerName, Outbox>>,
}

impl ChannelSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered outboxes.
    pub fn len(&self) -> usize {
        self.outboxes.read().map(|o| o.len()).unwrap_or(0)
    }

    /// Check if no outbox is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for ChannelSink {
    type Endpoint = Outbox;

    fn attach(&self, name: &PlayerName, endpoint: Outbox) {
        if let Ok(mut outboxes) = self.outboxes.write() {
            outboxes.insert(name.clone(), endpoint);
        }
    }

    fn detach(&self, name: &PlayerName) {
        if let Ok(mut outboxes) = self.outboxes.write() {
            outboxes.remove(name);
        }
    }

    fn deliver(&self, notification: Notification) {
        let Ok(outboxes) = self.outboxes.read() else {
            return;
        };
        let message = ServerMessage::from(notification.message);

        match notification.recipient {
            Recipient::Player(name) => match outboxes.get(&name) {
                Some(outbox) => push(&name, outbox, message),
                None => debug!("No outbox for {}", name),
            },
            Recipient::All => {
                for (name, outbox) in outboxes.iter() {
                    push(name, outbox, message.clone());
                }
            }
        }
    }
}

fn push(name: &PlayerName, outbox: &Outbox, message: ServerMessage) {
    match outbox.try_send(message) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => warn!("Outbox for {} is full, dropping message", name),
        Err(TrySendError::Closed(_)) => debug!("Outbox for {} already closed", name),
    }
}

// =============================================================================
// SERVER
// =============================================================================

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Identity resolution for joins.
    auth: Arc<AuthConfig>,
    /// Shared lobby.
    lobby: Arc<Lobby<ChannelSink>>,
    /// Open connections and when they were accepted.
    clients: Arc<RwLock<BTreeMap<SocketAddr, Instant>>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig, auth: AuthConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            auth: Arc::new(auth),
            lobby: Arc::new(Lobby::new(Arc::new(ChannelSink::new()))),
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener until shutdown.
    #[instrument(skip_all)]
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!("Game server listening on {}", listener.local_addr()?);
        if self.auth.is_configured() {
            info!("Token authentication enabled");
        }

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            {
                                let mut clients = self.clients.write().await;
                                if clients.len() >= self.config.max_connections {
                                    warn!("Connection limit reached, rejecting {}", addr);
                                    continue;
                                }
                                clients.insert(addr, Instant::now());
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let lobby = self.lobby.clone();
        let auth = self.auth.clone();
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    clients.write().await.remove(&addr);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(OUTBOX_CAPACITY);

            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                let _ = ws_sender.close().await;
            });

            let join_deadline = tokio::time::sleep(config.join_timeout);
            tokio::pin!(join_deadline);
            let mut player: Option<PlayerName> = None;

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        reply_error(&msg_tx, ServerError::new(
                                            ErrorCode::InvalidInput,
                                            "Invalid message format",
                                        )).await;
                                        continue;
                                    }
                                };

                                let flow = Self::handle_client_message(
                                    client_msg,
                                    &mut player,
                                    &lobby,
                                    &auth,
                                    &config,
                                    &msg_tx,
                                ).await;
                                if flow.is_break() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                warn!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = &mut join_deadline, if player.is_none() => {
                        warn!("Client {} did not join within {:?}", addr, config.join_timeout);
                        break;
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            // Cleanup
            if let Some(name) = player {
                lobby.leave(name.as_str()).await;
            }
            drop(msg_tx);
            if tokio::time::timeout(FLUSH_TIMEOUT, sender_task).await.is_err() {
                debug!("Outbox for {} not flushed in time", addr);
            }

            if let Some(connected_at) = clients.write().await.remove(&addr) {
                info!("Client {} cleaned up after {:?}", addr, connected_at.elapsed());
            }
        });
    }

    /// Handle a client message. Breaks when the connection should close.
    async fn handle_client_message(
        msg: ClientMessage,
        player: &mut Option<PlayerName>,
        lobby: &Lobby<ChannelSink>,
        auth: &AuthConfig,
        config: &ServerConfig,
        sender: &Outbox,
    ) -> ControlFlow<()> {
        let result = match msg {
            ClientMessage::Join(request) => {
                if let Some(name) = player.as_ref() {
                    reply_error(sender, ServerError::new(
                        ErrorCode::AlreadyJoined,
                        format!("Already joined as {}", name),
                    )).await;
                } else {
                    *player = Self::handle_join(request, lobby, auth, config, sender).await;
                }
                return ControlFlow::Continue(());
            }
            ClientMessage::Ping { timestamp } => {
                let server_time = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
                let _ = sender.send(ServerMessage::Pong { timestamp, server_time }).await;
                return ControlFlow::Continue(());
            }
            ClientMessage::Leave => return ControlFlow::Break(()),
            request => {
                let Some(name) = player.as_ref() else {
                    reply_error(sender, ServerError::new(
                        ErrorCode::NotJoined,
                        "Join with a username first",
                    )).await;
                    return ControlFlow::Continue(());
                };

                match request {
                    ClientMessage::Start => lobby.request_start(name.as_str()).await.map(|_| ()),
                    ClientMessage::Number { value } => lobby.submit_seed(name.as_str(), value).await,
                    ClientMessage::Play(instruction) => lobby.submit_move(name.as_str(), instruction).await,
                    ClientMessage::Join(_) | ClientMessage::Ping { .. } | ClientMessage::Leave => Ok(()),
                }
            }
        };

        if let Err(e) = result {
            debug!("Request rejected: {}", e);
            reply_error(sender, ServerError::from(&e)).await;
        }
        ControlFlow::Continue(())
    }

    /// Resolve the identity and register it with the lobby.
    async fn handle_join(
        request: JoinRequest,
        lobby: &Lobby<ChannelSink>,
        auth: &AuthConfig,
        config: &ServerConfig,
        sender: &Outbox,
    ) -> Option<PlayerName> {
        let requested = match resolve_player_name(&request.username, request.token.as_deref(), auth) {
            Ok(name) => name,
            Err(e) => {
                warn!("Join rejected: {}", e);
                reply_error(sender, ServerError::new(ErrorCode::AuthFailed, e.to_string())).await;
                return None;
            }
        };

        match lobby.join(&requested, sender.clone()).await {
            Ok(name) => {
                let _ = sender.send(ServerMessage::Joined(JoinResult {
                    username: name.clone(),
                    server_version: config.version.clone(),
                })).await;
                Some(name)
            }
            Err(e) => {
                reply_error(sender, ServerError::from(&e)).await;
                None
            }
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// The lobby connections are routed into.
    pub fn lobby(&self) -> &Arc<Lobby<ChannelSink>> {
        &self.lobby
    }
}

async fn reply_error(sender: &Outbox, error: ServerError) {
    let _ = sender.send(ServerMessage::Error(error)).await;
}
