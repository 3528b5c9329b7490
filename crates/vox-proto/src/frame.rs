//! Length-prefixed message framing over a byte stream.
//!
//! Every message on the wire is a u32 big-endian length prefix (the byte
//! count of what follows) and then the tag+payload produced by the packet
//! codec. Partial reads are buffered until a full frame is available; a
//! declared length beyond [`MAX_FRAME_SIZE`] is a fatal framing error.

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ProtoError;
use crate::packets::Packet;

/// Maximum tag+payload size of a single frame. Generous enough for one full
/// chunk payload plus headroom.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Size of the length prefix preceding every frame.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Incremental frame extractor over a growable receive buffer.
///
/// Feed it raw bytes from the socket; it yields complete tag+payload frames
/// and never misinterprets a partial read as a message boundary.
#[derive(Debug, Default)]
pub struct FrameReader {
    buf: BytesMut,
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(8 * 1024),
        }
    }

    /// Append raw bytes received from the transport.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Pop the next complete frame, or `None` if more bytes are needed.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>, ProtoError> {
        if self.buf.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }
        let len = u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if len == 0 {
            return Err(ProtoError::EmptyFrame);
        }
        if len > MAX_FRAME_SIZE {
            tracing::warn!("peer declared a {len}-byte frame (max {MAX_FRAME_SIZE})");
            return Err(ProtoError::FrameTooLarge {
                len,
                max: MAX_FRAME_SIZE,
            });
        }
        if self.buf.len() < LENGTH_PREFIX_SIZE + len {
            self.buf.reserve(LENGTH_PREFIX_SIZE + len - self.buf.len());
            return Ok(None);
        }
        self.buf.advance(LENGTH_PREFIX_SIZE);
        Ok(Some(self.buf.split_to(len).freeze()))
    }

    /// Read from `stream` until one full frame is buffered and decode it as a
    /// packet. Returns `Ok(None)` on a clean EOF between frames.
    pub async fn read_packet<R>(&mut self, stream: &mut R) -> Result<Option<Packet>, ProtoError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if let Some(mut frame) = self.next_frame()? {
                return Packet::decode(&mut frame).map(Some);
            }
            let n = stream.read_buf(&mut self.buf).await?;
            if n == 0 {
                return if self.buf.is_empty() {
                    Ok(None)
                } else {
                    Err(ProtoError::TruncatedFrame)
                };
            }
        }
    }
}

/// Encode `packet` as one frame: length prefix, tag, payload.
pub fn encode_frame(packet: &Packet) -> Result<Bytes, ProtoError> {
    let body = packet.encode();
    if body.len() > MAX_FRAME_SIZE {
        return Err(ProtoError::FrameTooLarge {
            len: body.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    let mut out = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + body.len());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    Ok(out.freeze())
}

/// Write `packet` as one frame to `stream`.
pub async fn write_packet<W>(stream: &mut W, packet: &Packet) -> Result<(), ProtoError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(packet)?;
    stream.write_all(&frame).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::{ChunkRequest, KeepAlive};

    fn frame_bytes(packet: &Packet) -> Bytes {
        encode_frame(packet).unwrap()
    }

    #[test]
    fn single_frame() {
        let pkt = Packet::KeepAlive(KeepAlive {
            id: 7,
            timestamp: 1234,
        });
        let mut reader = FrameReader::new();
        reader.extend(&frame_bytes(&pkt));
        let mut frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(Packet::decode(&mut frame).unwrap(), pkt);
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn partial_reads_are_buffered() {
        let pkt = Packet::ChunkRequest(ChunkRequest {
            chunk_x: -3,
            chunk_z: 12,
        });
        let bytes = frame_bytes(&pkt);
        let mut reader = FrameReader::new();
        // Drip the frame in one byte at a time; no boundary may be invented.
        for (i, b) in bytes.iter().enumerate() {
            reader.extend(&[*b]);
            let got = reader.next_frame().unwrap();
            if i + 1 < bytes.len() {
                assert!(got.is_none(), "frame yielded early at byte {i}");
            } else {
                let mut frame = got.unwrap();
                assert_eq!(Packet::decode(&mut frame).unwrap(), pkt);
            }
        }
    }

    #[test]
    fn two_frames_in_one_read() {
        let a = Packet::KeepAlive(KeepAlive { id: 1, timestamp: 2 });
        let b = Packet::ChunkRequest(ChunkRequest {
            chunk_x: 0,
            chunk_z: 0,
        });
        let mut reader = FrameReader::new();
        let mut joined = BytesMut::new();
        joined.extend_from_slice(&frame_bytes(&a));
        joined.extend_from_slice(&frame_bytes(&b));
        reader.extend(&joined);

        let mut f1 = reader.next_frame().unwrap().unwrap();
        let mut f2 = reader.next_frame().unwrap().unwrap();
        assert_eq!(Packet::decode(&mut f1).unwrap(), a);
        assert_eq!(Packet::decode(&mut f2).unwrap(), b);
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn oversized_frame_rejected() {
        let mut reader = FrameReader::new();
        reader.extend(&((MAX_FRAME_SIZE as u32 + 1).to_be_bytes()));
        let err = reader.next_frame().unwrap_err();
        assert!(matches!(err, ProtoError::FrameTooLarge { .. }));
    }

    #[test]
    fn zero_length_frame_rejected() {
        let mut reader = FrameReader::new();
        reader.extend(&0u32.to_be_bytes());
        assert!(matches!(
            reader.next_frame().unwrap_err(),
            ProtoError::EmptyFrame
        ));
    }

    #[tokio::test]
    async fn read_packet_across_split_stream() {
        let pkt = Packet::KeepAlive(KeepAlive {
            id: 99,
            timestamp: -1,
        });
        let bytes = frame_bytes(&pkt);
        let (client, server) = tokio::io::duplex(64);
        let write = async move {
            let mut client = client;
            // Two writes split mid-frame.
            client.write_all(&bytes[..3]).await.unwrap();
            client.write_all(&bytes[3..]).await.unwrap();
            drop(client);
        };
        let read = async move {
            let mut server = server;
            let mut reader = FrameReader::new();
            let got = reader.read_packet(&mut server).await.unwrap().unwrap();
            assert_eq!(got, pkt);
            // Clean EOF after the frame.
            assert!(reader.read_packet(&mut server).await.unwrap().is_none());
        };
        tokio::join!(write, read);
    }

    #[tokio::test]
    async fn eof_mid_frame_is_an_error() {
        let pkt = Packet::KeepAlive(KeepAlive { id: 1, timestamp: 1 });
        let bytes = frame_bytes(&pkt);
        let (mut client, server) = tokio::io::duplex(64);
        client.write_all(&bytes[..5]).await.unwrap();
        drop(client);

        let mut server = server;
        let mut reader = FrameReader::new();
        let err = reader.read_packet(&mut server).await.unwrap_err();
        assert!(matches!(err, ProtoError::TruncatedFrame));
    }
}
