//! Connection lifecycle and state synchronization.
//!
//! `connect` performs the handshake/login exchange inline, then hands the
//! stream halves to background tasks: a reader decoding frames into a
//! channel and a writer draining an outbound queue. The game loop calls
//! [`Client::update`] every frame to drain inbound packets, push local
//! movement, and advance interpolation.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use vox_proto::frame::{encode_frame, write_packet, FrameReader};
use vox_proto::packets::{
    BlockBreak, BlockPlace, ChatMessage, ChunkRequest, Disconnect, Handshake, KeepAlive,
    LoginRequest, PlayerMove,
};
use vox_proto::{Packet, ProtoError, PROTOCOL_VERSION};
use vox_world::{Chunk, ChunkPos, World};

use crate::error::ClientError;
use crate::events::ClientEvent;
use crate::remote::{RemoteEntity, INTERPOLATION_ALPHA};

/// Seconds between client keep-alive probes.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Chat messages retained for the UI.
const CHAT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub username: String,
    /// Build string sent in the handshake, for server logs.
    pub client_version: String,
    pub protocol_version: i32,
    /// Chunks are requested in a square of this radius around spawn.
    pub view_radius: i32,
    /// How long to wait for the login response before giving up.
    pub login_timeout: Duration,
}

impl ClientConfig {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            client_version: env!("CARGO_PKG_VERSION").into(),
            protocol_version: PROTOCOL_VERSION,
            view_radius: 8,
            login_timeout: Duration::from_secs(10),
        }
    }
}

/// What the reader task feeds the game loop.
enum Inbound {
    Packet(Packet),
    Corrupt(ProtoError),
    Closed,
}

#[derive(Debug)]
pub struct Client {
    player_id: u32,
    username: String,
    spawn: (f32, f32, f32),
    world: World,
    remotes: HashMap<u32, RemoteEntity>,
    chat_history: VecDeque<ChatMessage>,
    /// Requested but not yet received.
    pending_chunks: HashSet<ChunkPos>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    outbound: Option<mpsc::UnboundedSender<Bytes>>,
    // Local player state, applied immediately (prediction) and streamed to
    // the server every tick.
    x: f32,
    y: f32,
    z: f32,
    yaw: f32,
    pitch: f32,
    on_ground: bool,
    last_keep_alive: Instant,
    connected: bool,
    disconnect_reason: Option<String>,
}

impl Client {
    /// Connect, handshake, and log in. On rejection the server's reason comes
    /// back verbatim in the error; nothing retries automatically.
    pub async fn connect(addr: impl ToSocketAddrs, config: ClientConfig) -> Result<Client, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("failed to set TCP_NODELAY: {e}");
        }
        let (mut read_half, mut write_half) = stream.into_split();

        write_packet(
            &mut write_half,
            &Packet::Handshake(Handshake::new(
                config.protocol_version,
                config.client_version.clone(),
            )),
        )
        .await?;
        write_packet(
            &mut write_half,
            &Packet::LoginRequest(LoginRequest::new(config.username.clone())),
        )
        .await?;

        let mut reader = FrameReader::new();
        let response = tokio::time::timeout(config.login_timeout, async {
            loop {
                match reader.read_packet(&mut read_half).await? {
                    Some(Packet::LoginResponse(r)) => return Ok(r),
                    Some(Packet::Disconnect(d)) => return Err(ClientError::Disconnected(d.reason)),
                    Some(other) => {
                        debug!(tag = other.tag(), "ignoring packet before login response")
                    }
                    None => return Err(ClientError::ConnectionLost),
                }
            }
        })
        .await
        .map_err(|_| ClientError::LoginTimeout)??;

        if !response.success {
            info!(reason = %response.reason, "login rejected");
            return Err(ClientError::LoginRejected(response.reason));
        }
        info!(
            player_id = response.player_id,
            seed = response.world_seed,
            "logged in as {}",
            config.username
        );

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Bytes>();
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if write_half.write_all(&frame).await.is_err() {
                    break;
                }
            }
            let _ = write_half.shutdown().await;
        });

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        // The reader keeps its buffer: frames that arrived right behind the
        // login response (spawn replays, chat) must not be lost.
        tokio::spawn(async move {
            loop {
                match reader.read_packet(&mut read_half).await {
                    Ok(Some(packet)) => {
                        if inbound_tx.send(Inbound::Packet(packet)).is_err() {
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(error) => {
                        let _ = inbound_tx.send(Inbound::Corrupt(error));
                        break;
                    }
                }
            }
            let _ = inbound_tx.send(Inbound::Closed);
        });

        let spawn = (response.spawn_x, response.spawn_y, response.spawn_z);
        let mut client = Client {
            player_id: response.player_id,
            username: config.username,
            spawn,
            // The mirror never generates; it fills in as ChunkData arrives.
            world: World::mirror(response.world_seed),
            remotes: HashMap::new(),
            chat_history: VecDeque::new(),
            pending_chunks: HashSet::new(),
            inbound: inbound_rx,
            outbound: Some(outbound_tx),
            x: spawn.0,
            y: spawn.1,
            z: spawn.2,
            yaw: 0.0,
            pitch: 0.0,
            on_ground: false,
            last_keep_alive: Instant::now(),
            connected: true,
            disconnect_reason: None,
        };

        let center = ChunkPos::containing(spawn.0.floor() as i32, spawn.2.floor() as i32);
        let radius = config.view_radius.max(0);
        for cx in (center.x - radius)..=(center.x + radius) {
            for cz in (center.z - radius)..=(center.z + radius) {
                client.request_chunk(cx, cz);
            }
        }

        Ok(client)
    }

    /// One client tick: drain inbound packets, stream local movement, probe
    /// keep-alive, and advance remote-player interpolation. Returns the
    /// events the embedding loop should react to.
    pub fn update(&mut self) -> Vec<ClientEvent> {
        let mut events = Vec::new();

        while self.connected {
            match self.inbound.try_recv() {
                Ok(Inbound::Packet(packet)) => self.apply_packet(packet, &mut events),
                Ok(Inbound::Corrupt(error)) => {
                    warn!("stream desynchronized: {error}");
                    self.teardown(format!("Protocol error: {error}"), &mut events);
                }
                Ok(Inbound::Closed) => self.teardown("Connection lost".into(), &mut events),
                Err(_) => break,
            }
        }

        if self.connected {
            // Movement goes out unconditionally every tick; there is no
            // pacing beyond the client's own frame rate.
            self.send_packet(&Packet::PlayerMove(PlayerMove {
                player_id: self.player_id,
                x: self.x,
                y: self.y,
                z: self.z,
                yaw: self.yaw,
                pitch: self.pitch,
                on_ground: self.on_ground,
            }));

            if self.last_keep_alive.elapsed() >= KEEP_ALIVE_INTERVAL {
                self.last_keep_alive = Instant::now();
                self.send_packet(&Packet::KeepAlive(KeepAlive {
                    id: rand::random(),
                    timestamp: unix_millis(),
                }));
            }
        }

        for remote in self.remotes.values_mut() {
            remote.interpolate(INTERPOLATION_ALPHA);
        }

        events
    }

    fn apply_packet(&mut self, packet: Packet, events: &mut Vec<ClientEvent>) {
        match packet {
            Packet::KeepAlive(p) => {
                // Echo so the server can measure round-trip latency.
                self.send_packet(&Packet::KeepAlive(p));
            }
            Packet::ChunkData(p) => {
                let pos = ChunkPos::new(p.chunk_x, p.chunk_z);
                match Chunk::from_bytes(pos, &p.blocks) {
                    Some(chunk) => {
                        self.world.insert_chunk(chunk);
                        self.pending_chunks.remove(&pos);
                        events.push(ClientEvent::ChunkLoaded { pos });
                    }
                    None => warn!(
                        "chunk ({}, {}) payload has wrong size {}, dropped",
                        pos.x,
                        pos.z,
                        p.blocks.len()
                    ),
                }
            }
            Packet::ChunkUnload(p) => {
                let pos = ChunkPos::new(p.chunk_x, p.chunk_z);
                if self.world.unload_chunk(pos) {
                    events.push(ClientEvent::ChunkUnloaded { pos });
                }
            }
            Packet::PlayerSpawn(p) => {
                // Never create a proxy for oneself.
                if p.player_id == self.player_id {
                    return;
                }
                debug!(player_id = p.player_id, "{} entered view", p.username);
                events.push(ClientEvent::PlayerJoined {
                    id: p.player_id,
                    username: p.username.clone(),
                });
                self.remotes.insert(
                    p.player_id,
                    RemoteEntity::new(p.player_id, p.username, p.x, p.y, p.z, p.yaw, p.pitch),
                );
            }
            Packet::PlayerDespawn(p) => {
                if self.remotes.remove(&p.player_id).is_some() {
                    events.push(ClientEvent::PlayerLeft { id: p.player_id });
                }
            }
            Packet::PlayerMove(p) => {
                // Target state only; the rendered state catches up per frame.
                if let Some(remote) = self.remotes.get_mut(&p.player_id) {
                    remote.set_target(p.x, p.y, p.z, p.yaw, p.pitch, p.on_ground);
                }
            }
            Packet::BlockUpdate(p) => {
                if self.world.set_block(p.x, p.y, p.z, p.block_id) {
                    events.push(ClientEvent::BlockChanged {
                        x: p.x,
                        y: p.y,
                        z: p.z,
                        block_id: p.block_id,
                    });
                }
            }
            Packet::ChatMessage(p) => {
                self.chat_history.push_back(p.clone());
                if self.chat_history.len() > CHAT_HISTORY_LIMIT {
                    self.chat_history.pop_front();
                }
                events.push(ClientEvent::Chat(p));
            }
            Packet::Disconnect(p) => {
                info!(reason = %p.reason, "server closed the connection");
                self.teardown(p.reason, events);
            }
            other => {
                warn!(tag = other.tag(), "unexpected packet from server, ignored");
            }
        }
    }

    fn teardown(&mut self, reason: String, events: &mut Vec<ClientEvent>) {
        if !self.connected {
            return;
        }
        self.connected = false;
        self.outbound = None;
        self.remotes.clear();
        self.disconnect_reason = Some(reason.clone());
        events.push(ClientEvent::Disconnected { reason });
    }

    /// Announce a graceful disconnect and close. Safe to call twice.
    pub fn disconnect(&mut self, reason: &str) {
        if !self.connected {
            return;
        }
        self.send_packet(&Packet::Disconnect(Disconnect::new(reason)));
        self.connected = false;
        // Dropping the sender lets the writer flush the farewell and close.
        self.outbound = None;
        self.disconnect_reason = Some(reason.to_string());
        info!("disconnected: {reason}");
    }

    /// Apply local movement immediately (prediction); it streams to the
    /// server on the next tick.
    pub fn set_position(&mut self, x: f32, y: f32, z: f32, yaw: f32, pitch: f32, on_ground: bool) {
        self.x = x;
        self.y = y;
        self.z = z;
        self.yaw = yaw;
        self.pitch = pitch;
        self.on_ground = on_ground;
    }

    pub fn request_chunk(&mut self, chunk_x: i32, chunk_z: i32) {
        let pos = ChunkPos::new(chunk_x, chunk_z);
        if self.world.has_chunk(pos) || !self.pending_chunks.insert(pos) {
            return;
        }
        self.send_packet(&Packet::ChunkRequest(ChunkRequest { chunk_x, chunk_z }));
    }

    /// Request a placement. The mirror is NOT touched here: the block appears
    /// when the authoritative BlockUpdate comes back, so a rejection never
    /// leaves a ghost block.
    pub fn send_block_place(&mut self, x: i32, y: i32, z: i32, block_id: u8) {
        self.send_packet(&Packet::BlockPlace(BlockPlace { x, y, z, block_id }));
    }

    pub fn send_block_break(&mut self, x: i32, y: i32, z: i32) {
        self.send_packet(&Packet::BlockBreak(BlockBreak { x, y, z }));
    }

    pub fn send_chat(&mut self, message: &str) {
        let message = message.trim();
        if message.is_empty() {
            return;
        }
        self.send_packet(&Packet::ChatMessage(ChatMessage {
            sender_id: self.player_id,
            // The server stamps the name; sending it would just be ignored.
            sender_name: None,
            message: message.to_string(),
            timestamp: unix_millis(),
            system: false,
        }));
    }

    fn send_packet(&self, packet: &Packet) {
        let Some(outbound) = &self.outbound else {
            return;
        };
        match encode_frame(packet) {
            Ok(frame) => {
                let _ = outbound.send(frame);
            }
            Err(e) => warn!("failed to encode outbound packet: {e}"),
        }
    }

    pub fn player_id(&self) -> u32 {
        self.player_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn spawn_position(&self) -> (f32, f32, f32) {
        self.spawn
    }

    pub fn position(&self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn disconnect_reason(&self) -> Option<&str> {
        self.disconnect_reason.as_deref()
    }

    pub fn remote_players(&self) -> impl Iterator<Item = &RemoteEntity> {
        self.remotes.values()
    }

    pub fn remote_player_count(&self) -> usize {
        self.remotes.len()
    }

    pub fn chat_history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.chat_history.iter()
    }

    /// Chunks requested and not yet delivered.
    pub fn pending_chunk_count(&self) -> usize {
        self.pending_chunks.len()
    }
}

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::new("Steve");
        assert_eq!(config.username, "Steve");
        assert_eq!(config.protocol_version, PROTOCOL_VERSION);
        assert_eq!(config.view_radius, 8);
    }

    #[tokio::test]
    async fn connect_refused_when_nothing_listens() {
        // Bind-then-drop to get a port with no listener behind it.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = Client::connect(addr, ClientConfig::new("Steve"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
    }

    #[tokio::test]
    async fn connect_times_out_on_silent_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept but never respond.
        tokio::spawn(async move {
            let _held = listener.accept().await;
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let mut config = ClientConfig::new("Steve");
        config.login_timeout = Duration::from_millis(100);
        let err = Client::connect(addr, config).await.unwrap_err();
        assert!(matches!(err, ClientError::LoginTimeout));
    }
}
