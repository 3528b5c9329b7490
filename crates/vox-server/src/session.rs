//! Per-connection session state.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::warn;

use vox_proto::frame::encode_frame;
use vox_proto::Packet;
use vox_world::ChunkPos;

/// Longest accepted display name, in characters.
pub const MAX_USERNAME_CHARS: usize = 16;

/// Connection state machine. `Disconnected` is terminal; a session in that
/// state is only kept long enough to be removed from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// TCP accepted, nothing received yet.
    Connected,
    /// Handshake validated, waiting for LoginRequest.
    HandshakeOk,
    /// Login accepted; the session participates in broadcasts.
    LoggedIn,
    /// Torn down.
    Disconnected,
}

/// One connected player.
pub struct Session {
    pub id: u32,
    pub addr: SocketAddr,
    pub state: SessionState,
    /// Set exactly once, at successful login.
    pub username: Option<String>,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
    /// Chunk coordinates this peer has been sent and not yet told to unload.
    pub sent_chunks: HashSet<ChunkPos>,
    /// Last time any traffic arrived from this peer.
    pub last_traffic: Instant,
    /// Round-trip latency measured from the most recent keep-alive echo.
    pub latency_ms: Option<i64>,
    outbound: mpsc::UnboundedSender<Bytes>,
}

impl Session {
    pub fn new(id: u32, addr: SocketAddr, outbound: mpsc::UnboundedSender<Bytes>) -> Self {
        Self {
            id,
            addr,
            state: SessionState::Connected,
            username: None,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            on_ground: false,
            sent_chunks: HashSet::new(),
            last_traffic: Instant::now(),
            latency_ms: None,
            outbound,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == SessionState::LoggedIn
    }

    /// The display name, or a placeholder for pre-login logging.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("<anonymous>")
    }

    /// Record inbound traffic for the timeout sweep.
    pub fn touch(&mut self) {
        self.last_traffic = Instant::now();
    }

    pub fn is_stale(&self, timeout: Duration) -> bool {
        self.last_traffic.elapsed() > timeout
    }

    pub fn update_position(&mut self, x: f32, y: f32, z: f32, yaw: f32, pitch: f32, on_ground: bool) {
        self.x = x;
        self.y = y;
        self.z = z;
        self.yaw = yaw;
        self.pitch = pitch;
        self.on_ground = on_ground;
    }

    /// Queue a packet for this peer. Fire-and-forget: write failures surface
    /// through the connection's close event, never here.
    pub fn send(&self, packet: &Packet) {
        match encode_frame(packet) {
            Ok(frame) => self.send_frame(frame),
            Err(e) => warn!(session_id = self.id, "failed to encode outbound packet: {e}"),
        }
    }

    /// Queue an already-encoded frame. Used by broadcasts so the encode cost
    /// is paid once per packet, not once per peer.
    pub fn send_frame(&self, frame: Bytes) {
        // A send error just means the writer task is gone; the Closed event
        // for this connection is already in flight.
        let _ = self.outbound.send(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox_proto::packets::KeepAlive;

    fn test_session() -> (Session, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
        (Session::new(7, addr, tx), rx)
    }

    #[test]
    fn new_session_is_pre_handshake() {
        let (session, _rx) = test_session();
        assert_eq!(session.state, SessionState::Connected);
        assert!(!session.is_logged_in());
        assert!(session.username.is_none());
        assert!(session.sent_chunks.is_empty());
    }

    #[test]
    fn staleness_uses_last_traffic() {
        let (mut session, _rx) = test_session();
        session.last_traffic = Instant::now() - Duration::from_secs(60);
        assert!(session.is_stale(Duration::from_secs(30)));
        session.touch();
        assert!(!session.is_stale(Duration::from_secs(30)));
    }

    #[test]
    fn send_frames_preserve_order() {
        let (session, mut rx) = test_session();
        session.send(&Packet::KeepAlive(KeepAlive { id: 1, timestamp: 0 }));
        session.send(&Packet::KeepAlive(KeepAlive { id: 2, timestamp: 0 }));
        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_ne!(first, second);
        // Length prefix then tag byte.
        assert_eq!(first[4], vox_proto::packets::tag::KEEP_ALIVE);
    }

    #[test]
    fn send_after_writer_gone_is_silent() {
        let (session, rx) = test_session();
        drop(rx);
        session.send(&Packet::KeepAlive(KeepAlive { id: 1, timestamp: 0 }));
    }
}
