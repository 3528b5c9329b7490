//! The server event loop.
//!
//! One central task owns all mutable state (world, session registry). It
//! receives decoded packets from per-connection reader tasks over an mpsc
//! channel and multiplexes them with the fixed-rate tick and the shutdown
//! signal. Outbound traffic goes through a writer task per connection fed by
//! an unbounded queue, so sending is fire-and-forget and a slow peer can
//! never stall a broadcast. Per-peer ordering comes from the queue plus TCP;
//! nothing is promised across peers.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use vox_proto::frame::{encode_frame, FrameReader};
use vox_proto::packets::{
    BlockBreak, BlockPlace, BlockUpdate, ChatMessage, ChunkData, ChunkRequest, ChunkUnload,
    Disconnect, Handshake, KeepAlive, LoginRequest, LoginResponse, PlayerDespawn, PlayerMove,
    PlayerSpawn,
};
use vox_proto::{Packet, ProtoError, PROTOCOL_VERSION};
use vox_world::{block, ChunkPos, World};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::events::ServerEvent;
use crate::session::{Session, SessionState, MAX_USERNAME_CHARS};

/// Fixed tick period (20 TPS).
pub const TICK_MILLIS: u64 = 50;

/// Spawn point handed to every new player.
const SPAWN_X: f32 = 0.0;
const SPAWN_Y: f32 = 70.0;
const SPAWN_Z: f32 = 0.0;

/// Raised by the network tasks, consumed by the central loop.
enum NetEvent {
    Connected {
        conn_id: u32,
        addr: SocketAddr,
        outbound: mpsc::UnboundedSender<Bytes>,
    },
    Packet {
        conn_id: u32,
        packet: Packet,
    },
    /// Framing or decode failure: the stream is desynchronized.
    Corrupt {
        conn_id: u32,
        error: ProtoError,
    },
    Closed {
        conn_id: u32,
    },
}

pub struct Server {
    config: ServerConfig,
    world: World,
    sessions: HashMap<u32, Session>,
    events: mpsc::UnboundedReceiver<NetEvent>,
    subscribers: Vec<mpsc::UnboundedSender<ServerEvent>>,
    local_addr: SocketAddr,
    last_keep_alive: Instant,
    last_probe: Option<KeepAlive>,
    next_keep_alive_id: i64,
}

impl Server {
    /// Bind the listener and start accepting connections. The returned server
    /// does nothing until [`Server::run`] is awaited.
    pub async fn bind(config: ServerConfig, world: World) -> Result<Server, ServerError> {
        let bind_addr = format!("{}:{}", config.server.address, config.server.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(ServerError::Bind)?;
        let local_addr = listener.local_addr()?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(accept_loop(listener, event_tx));
        info!(%local_addr, seed = world.seed(), "server listening");
        Ok(Server {
            config,
            world,
            sessions: HashMap::new(),
            events: event_rx,
            subscribers: Vec::new(),
            local_addr,
            last_keep_alive: Instant::now(),
            last_probe: None,
            next_keep_alive_id: 0,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Subscribe an external collaborator to session/chat/block events.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Drive the server until shutdown is signalled or the network side goes
    /// away entirely.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(Duration::from_millis(TICK_MILLIS));
        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = tick.tick() => self.tick(),
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        self.shutdown();
                        break;
                    }
                }
            }
        }
        info!("server stopped");
    }

    fn handle_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::Connected {
                conn_id,
                addr,
                outbound,
            } => self.handle_connected(conn_id, addr, outbound),
            NetEvent::Packet { conn_id, packet } => self.handle_packet(conn_id, packet),
            NetEvent::Corrupt { conn_id, error } => {
                warn!(session_id = conn_id, %error, "protocol error, disconnecting");
                self.drop_session(conn_id, Some("Protocol error"));
            }
            NetEvent::Closed { conn_id } => {
                if self.sessions.contains_key(&conn_id) {
                    self.drop_session(conn_id, None);
                }
            }
        }
    }

    fn handle_connected(
        &mut self,
        conn_id: u32,
        addr: SocketAddr,
        outbound: mpsc::UnboundedSender<Bytes>,
    ) {
        if self.sessions.len() >= self.config.server.max_players as usize {
            info!(%addr, "rejecting connection, server is full");
            if let Ok(frame) = encode_frame(&Packet::Disconnect(Disconnect::new("Server is full")))
            {
                let _ = outbound.send(frame);
            }
            return;
        }
        info!(session_id = conn_id, %addr, "client connected");
        self.sessions
            .insert(conn_id, Session::new(conn_id, addr, outbound));
    }

    /// Malformed or out-of-place packets kill exactly this session; errors
    /// never propagate past here.
    fn handle_packet(&mut self, conn_id: u32, packet: Packet) {
        let Some(session) = self.sessions.get_mut(&conn_id) else {
            // Raced with removal; the reader task dies on its own.
            return;
        };
        session.touch();
        match packet {
            Packet::Handshake(p) => self.handle_handshake(conn_id, p),
            Packet::LoginRequest(p) => self.handle_login(conn_id, p),
            Packet::KeepAlive(p) => self.handle_keep_alive(conn_id, p),
            Packet::Disconnect(p) => {
                info!(session_id = conn_id, reason = %p.reason, "client requested disconnect");
                self.drop_session(conn_id, None);
            }
            Packet::ChunkRequest(p) => self.handle_chunk_request(conn_id, p),
            Packet::PlayerMove(p) => self.handle_player_move(conn_id, p),
            Packet::BlockPlace(p) => self.handle_block_place(conn_id, p),
            Packet::BlockBreak(p) => self.handle_block_break(conn_id, p),
            Packet::ChatMessage(p) => self.handle_chat(conn_id, p),
            // Client-bound kinds arriving from a client mean the peer is
            // broken or hostile.
            Packet::LoginResponse(_)
            | Packet::ChunkData(_)
            | Packet::ChunkUnload(_)
            | Packet::PlayerSpawn(_)
            | Packet::PlayerDespawn(_)
            | Packet::BlockUpdate(_) => {
                warn!(
                    session_id = conn_id,
                    tag = packet.tag(),
                    "client sent a server-to-client packet, disconnecting"
                );
                self.drop_session(conn_id, Some("Protocol violation"));
            }
        }
    }

    fn handle_handshake(&mut self, conn_id: u32, p: Handshake) {
        let Some(state) = self.sessions.get(&conn_id).map(|s| s.state) else {
            return;
        };
        if state != SessionState::Connected {
            warn!(session_id = conn_id, ?state, "handshake out of order");
            self.drop_session(conn_id, Some("Protocol violation"));
            return;
        }
        if p.protocol_version != PROTOCOL_VERSION {
            info!(
                session_id = conn_id,
                client_version = %p.client_version,
                "protocol version mismatch: server {PROTOCOL_VERSION}, client {}",
                p.protocol_version
            );
            let reason = format!(
                "Incompatible protocol version. Server: {PROTOCOL_VERSION}, Client: {}",
                p.protocol_version
            );
            self.drop_session(conn_id, Some(&reason));
            return;
        }
        debug!(session_id = conn_id, client_version = %p.client_version, "handshake ok");
        if let Some(session) = self.sessions.get_mut(&conn_id) {
            session.state = SessionState::HandshakeOk;
        }
    }

    fn handle_login(&mut self, conn_id: u32, p: LoginRequest) {
        let Some(state) = self.sessions.get(&conn_id).map(|s| s.state) else {
            return;
        };
        if state != SessionState::HandshakeOk {
            warn!(session_id = conn_id, ?state, "login out of order");
            self.drop_session(conn_id, Some("Protocol violation"));
            return;
        }

        let username = p.username.trim().to_string();
        let rejection = if username.is_empty() {
            Some("Invalid username".to_string())
        } else if username.chars().count() > MAX_USERNAME_CHARS {
            Some(format!(
                "Username too long (max {MAX_USERNAME_CHARS} characters)"
            ))
        } else if self.sessions.values().any(|s| {
            s.id != conn_id && s.is_logged_in() && s.username.as_deref() == Some(username.as_str())
        }) {
            Some("Username already taken".to_string())
        } else {
            None
        };

        if let Some(reason) = rejection {
            info!(session_id = conn_id, %username, %reason, "login rejected");
            if let Some(session) = self.sessions.get(&conn_id) {
                session.send(&Packet::LoginResponse(LoginResponse::failure(
                    reason.clone(),
                )));
            }
            self.drop_session(conn_id, Some(&reason));
            return;
        }

        let seed = self.world.seed();
        if let Some(session) = self.sessions.get_mut(&conn_id) {
            session.state = SessionState::LoggedIn;
            session.username = Some(username.clone());
            session.update_position(SPAWN_X, SPAWN_Y, SPAWN_Z, 0.0, 0.0, false);
            session.send(&Packet::LoginResponse(LoginResponse::success(
                conn_id, SPAWN_X, SPAWN_Y, SPAWN_Z, seed,
            )));
        }

        // Announce the newcomer to everyone else...
        self.broadcast_except(
            conn_id,
            &Packet::PlayerSpawn(PlayerSpawn {
                player_id: conn_id,
                username: username.clone(),
                x: SPAWN_X,
                y: SPAWN_Y,
                z: SPAWN_Z,
                yaw: 0.0,
                pitch: 0.0,
            }),
        );
        // ...and replay everyone else to the newcomer, so both sides converge
        // on the same peer list.
        let replays: Vec<Packet> = self
            .sessions
            .values()
            .filter(|s| s.id != conn_id && s.is_logged_in())
            .map(|s| {
                Packet::PlayerSpawn(PlayerSpawn {
                    player_id: s.id,
                    username: s.username.clone().unwrap_or_default(),
                    x: s.x,
                    y: s.y,
                    z: s.z,
                    yaw: s.yaw,
                    pitch: s.pitch,
                })
            })
            .collect();
        if let Some(session) = self.sessions.get(&conn_id) {
            for packet in &replays {
                session.send(packet);
            }
        }

        info!(session_id = conn_id, %username, "player logged in");
        self.broadcast(&Packet::ChatMessage(ChatMessage::system(
            format!("{username} joined the game"),
            unix_millis(),
        )));
        self.emit(ServerEvent::PlayerJoined {
            id: conn_id,
            username,
        });
    }

    fn handle_keep_alive(&mut self, conn_id: u32, p: KeepAlive) {
        // Inbound traffic already refreshed the timeout clock; the echo is
        // only interesting for latency.
        if let Some(probe) = self.last_probe {
            if p.id == probe.id {
                if let Some(session) = self.sessions.get_mut(&conn_id) {
                    let rtt = unix_millis().saturating_sub(probe.timestamp).max(0);
                    session.latency_ms = Some(rtt);
                    debug!(session_id = conn_id, rtt_ms = rtt, "keep-alive echo");
                }
            }
        }
    }

    fn handle_chunk_request(&mut self, conn_id: u32, p: ChunkRequest) {
        if !self.session_logged_in(conn_id) {
            debug!(session_id = conn_id, "chunk request before login, ignored");
            return;
        }
        let pos = ChunkPos::new(p.chunk_x, p.chunk_z);
        let Some(chunk) = self.world.get_or_create_chunk(pos) else {
            warn!("world cannot produce chunk ({}, {})", pos.x, pos.z);
            return;
        };
        let blocks = chunk.to_bytes();
        if let Some(session) = self.sessions.get_mut(&conn_id) {
            session.send(&Packet::ChunkData(ChunkData::new(pos.x, pos.z, blocks)));
            session.sent_chunks.insert(pos);
        }
    }

    fn handle_player_move(&mut self, conn_id: u32, p: PlayerMove) {
        if !self.session_logged_in(conn_id) {
            debug!(session_id = conn_id, "move before login, ignored");
            return;
        }
        if let Some(session) = self.sessions.get_mut(&conn_id) {
            session.update_position(p.x, p.y, p.z, p.yaw, p.pitch, p.on_ground);
        }
        // Rebroadcast verbatim under the mover's server-side id, to every
        // logged-in session. No spatial interest management: every peer gets
        // every move, which is a known scalability limitation.
        self.broadcast_except(
            conn_id,
            &Packet::PlayerMove(PlayerMove {
                player_id: conn_id,
                ..p
            }),
        );
        self.sweep_far_chunks(conn_id, p.x, p.z);
    }

    /// Tell the peer to free chunks that fell out of its view. Only coords in
    /// `sent_chunks` are ever unloaded, so the client always knows them.
    fn sweep_far_chunks(&mut self, conn_id: u32, x: f32, z: f32) {
        let unload_distance = self.config.world.view_radius + 2;
        let center = ChunkPos::containing(x.floor() as i32, z.floor() as i32);
        let Some(session) = self.sessions.get_mut(&conn_id) else {
            return;
        };
        let far: Vec<ChunkPos> = session
            .sent_chunks
            .iter()
            .filter(|c| (c.x - center.x).abs() > unload_distance || (c.z - center.z).abs() > unload_distance)
            .copied()
            .collect();
        for pos in far {
            session.sent_chunks.remove(&pos);
            session.send(&Packet::ChunkUnload(ChunkUnload {
                chunk_x: pos.x,
                chunk_z: pos.z,
            }));
        }
    }

    fn handle_block_place(&mut self, conn_id: u32, p: BlockPlace) {
        if !self.session_logged_in(conn_id) {
            debug!(session_id = conn_id, "block place before login, ignored");
            return;
        }
        self.apply_block_change(p.x, p.y, p.z, p.block_id);
    }

    fn handle_block_break(&mut self, conn_id: u32, p: BlockBreak) {
        if !self.session_logged_in(conn_id) {
            debug!(session_id = conn_id, "block break before login, ignored");
            return;
        }
        self.apply_block_change(p.x, p.y, p.z, block::AIR);
    }

    /// Mutate the world and echo the authoritative update to everyone,
    /// including the requester, so all clients apply changes on one code path.
    fn apply_block_change(&mut self, x: i32, y: i32, z: i32, block_id: u8) {
        if !self.world.set_block(x, y, z, block_id) {
            debug!("block change at ({x}, {y}, {z}) out of range, ignored");
            return;
        }
        self.broadcast(&Packet::BlockUpdate(BlockUpdate { x, y, z, block_id }));
        self.emit(ServerEvent::BlockChanged { x, y, z, block_id });
    }

    fn handle_chat(&mut self, conn_id: u32, p: ChatMessage) {
        if !self.session_logged_in(conn_id) {
            debug!(session_id = conn_id, "chat before login, ignored");
            return;
        }
        let message = p.message.trim();
        if message.is_empty() {
            return;
        }
        let Some(session) = self.sessions.get(&conn_id) else {
            return;
        };
        let stamped = ChatMessage {
            sender_id: conn_id,
            sender_name: session.username.clone(),
            message: message.to_string(),
            timestamp: unix_millis(),
            system: false,
        };
        info!("<{}> {}", session.display_name(), message);
        self.broadcast(&Packet::ChatMessage(stamped.clone()));
        self.emit(ServerEvent::Chat(stamped));
    }

    /// Remove a session, optionally sending a final Disconnect with `reason`.
    /// Dropping the session drops its outbound queue; the writer task flushes
    /// whatever is already queued and closes the socket.
    fn drop_session(&mut self, conn_id: u32, reason: Option<&str>) {
        let Some(mut session) = self.sessions.remove(&conn_id) else {
            return;
        };
        if let Some(reason) = reason {
            session.send(&Packet::Disconnect(Disconnect::new(reason)));
        }
        let was_logged_in = session.is_logged_in();
        session.state = SessionState::Disconnected;
        if was_logged_in {
            let username = session.username.clone().unwrap_or_default();
            info!(session_id = conn_id, %username, "player disconnected");
            self.broadcast(&Packet::PlayerDespawn(PlayerDespawn { player_id: conn_id }));
            self.broadcast(&Packet::ChatMessage(ChatMessage::system(
                format!("{username} left the game"),
                unix_millis(),
            )));
            self.emit(ServerEvent::PlayerLeft {
                id: conn_id,
                username,
            });
        } else {
            info!(session_id = conn_id, "connection closed");
        }
    }

    /// Fixed-rate housekeeping: periodic keep-alive probes and the staleness
    /// sweep. Everything else is handled as it arrives.
    fn tick(&mut self) {
        let interval = Duration::from_secs(self.config.network.keep_alive_interval);
        if self.last_keep_alive.elapsed() >= interval {
            self.last_keep_alive = Instant::now();
            let probe = KeepAlive {
                id: self.next_keep_alive_id,
                timestamp: unix_millis(),
            };
            self.next_keep_alive_id = self.next_keep_alive_id.wrapping_add(1);
            self.last_probe = Some(probe);
            if let Ok(frame) = encode_frame(&Packet::KeepAlive(probe)) {
                for session in self.sessions.values() {
                    session.send_frame(frame.clone());
                }
            }
        }

        let timeout = Duration::from_secs(self.config.network.connection_timeout);
        let stale: Vec<u32> = self
            .sessions
            .values()
            .filter(|s| s.is_stale(timeout))
            .map(|s| s.id)
            .collect();
        for conn_id in stale {
            info!(session_id = conn_id, "connection timed out");
            self.drop_session(conn_id, Some("Connection timeout"));
        }
    }

    fn shutdown(&mut self) {
        info!("shutting down, disconnecting {} session(s)", self.sessions.len());
        if let Ok(frame) = encode_frame(&Packet::Disconnect(Disconnect::new(
            "Server shutting down",
        ))) {
            for session in self.sessions.values() {
                session.send_frame(frame.clone());
            }
        }
        self.sessions.clear();
    }

    fn session_logged_in(&self, conn_id: u32) -> bool {
        self.sessions
            .get(&conn_id)
            .is_some_and(|s| s.is_logged_in())
    }

    /// Send to every logged-in session. The frame is encoded once.
    fn broadcast(&mut self, packet: &Packet) {
        match encode_frame(packet) {
            Ok(frame) => {
                for session in self.sessions.values().filter(|s| s.is_logged_in()) {
                    session.send_frame(frame.clone());
                }
            }
            Err(e) => warn!("failed to encode broadcast: {e}"),
        }
    }

    fn broadcast_except(&mut self, except: u32, packet: &Packet) {
        match encode_frame(packet) {
            Ok(frame) => {
                for session in self
                    .sessions
                    .values()
                    .filter(|s| s.id != except && s.is_logged_in())
                {
                    session.send_frame(frame.clone());
                }
            }
            Err(e) => warn!("failed to encode broadcast: {e}"),
        }
    }

    fn emit(&mut self, event: ServerEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

async fn accept_loop(listener: TcpListener, events: mpsc::UnboundedSender<NetEvent>) {
    let mut next_conn_id: u32 = 1;
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                if events.is_closed() {
                    break;
                }
                let conn_id = next_conn_id;
                next_conn_id += 1;
                tokio::spawn(connection_task(stream, conn_id, addr, events.clone()));
            }
            Err(e) => {
                if events.is_closed() {
                    break;
                }
                warn!("accept failed: {e}");
            }
        }
    }
}

/// Per-connection network plumbing: a writer task draining the outbound
/// queue, and this task reading frames until EOF or a framing error.
async fn connection_task(
    stream: TcpStream,
    conn_id: u32,
    addr: SocketAddr,
    events: mpsc::UnboundedSender<NetEvent>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(session_id = conn_id, "failed to set TCP_NODELAY: {e}");
    }
    let (mut read_half, mut write_half) = stream.into_split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Bytes>();

    tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if write_half.write_all(&frame).await.is_err() {
                break;
            }
        }
        let _ = write_half.shutdown().await;
    });

    if events
        .send(NetEvent::Connected {
            conn_id,
            addr,
            outbound: outbound_tx,
        })
        .is_err()
    {
        return;
    }

    let mut reader = FrameReader::new();
    loop {
        match reader.read_packet(&mut read_half).await {
            Ok(Some(packet)) => {
                if events.send(NetEvent::Packet { conn_id, packet }).is_err() {
                    return;
                }
            }
            Ok(None) => break,
            Err(error) => {
                let _ = events.send(NetEvent::Corrupt { conn_id, error });
                break;
            }
        }
    }
    let _ = events.send(NetEvent::Closed { conn_id });
}

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
