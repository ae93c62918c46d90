//! Transport-agnostic connection halves.
//!
//! A [`Connection`] is a message-framed, bidirectional channel to one peer,
//! split into a read half (owned by whichever loop consumes it) and a
//! cloneable [`ConnectionWriter`]. The writer is shared between a client's
//! own read loop (direct replies) and the pool control loop (fan-out), so the
//! underlying sink sits behind an async mutex. Once closed, the writer refuses
//! further frames with [`HubError::ConnectionClosed`].

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Sink, SinkExt, Stream};
use tokio::sync::Mutex;

use super::Envelope;
use crate::error::HubError;

/// One message frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
}

impl Frame {
    /// Raw payload bytes regardless of frame kind.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }
}

/// Boxed write half.
pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = HubError> + Send>>;

/// Boxed read half. `None` means the peer closed the connection.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame, HubError>> + Send>>;

struct WriteHalf {
    sink: FrameSink,
    closed: bool,
}

/// Cloneable handle to the write half of a connection.
#[derive(Clone)]
pub struct ConnectionWriter {
    half: Arc<Mutex<WriteHalf>>,
}

impl ConnectionWriter {
    /// Writes one frame.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::ConnectionClosed`] after [`ConnectionWriter::close`],
    /// otherwise the transport error reported by the sink.
    pub async fn send(&self, frame: Frame) -> Result<(), HubError> {
        let mut half = self.half.lock().await;
        if half.closed {
            return Err(HubError::ConnectionClosed);
        }
        half.sink.send(frame).await
    }

    /// Writes pre-encoded JSON text.
    ///
    /// # Errors
    ///
    /// Returns the transport error reported by the sink.
    pub async fn send_text(&self, text: String) -> Result<(), HubError> {
        self.send(Frame::Text(text)).await
    }

    /// Encodes and writes an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Serialize`] or the transport error.
    pub async fn send_envelope(&self, envelope: &Envelope) -> Result<(), HubError> {
        self.send_text(envelope.encode()?).await
    }

    /// Closes the write half. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the transport error reported while flushing or closing.
    pub async fn close(&self) -> Result<(), HubError> {
        let mut half = self.half.lock().await;
        if half.closed {
            return Ok(());
        }
        half.closed = true;
        half.sink.close().await
    }
}

impl fmt::Debug for ConnectionWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionWriter").finish_non_exhaustive()
    }
}

/// A bidirectional message-framed connection to one peer.
pub struct Connection {
    writer: ConnectionWriter,
    reader: FrameStream,
}

impl Connection {
    /// Wraps a sink/stream pair.
    pub fn new<S, R>(sink: S, stream: R) -> Self
    where
        S: Sink<Frame, Error = HubError> + Send + 'static,
        R: Stream<Item = Result<Frame, HubError>> + Send + 'static,
    {
        Self {
            writer: ConnectionWriter {
                half: Arc::new(Mutex::new(WriteHalf {
                    sink: Box::pin(sink),
                    closed: false,
                })),
            },
            reader: Box::pin(stream),
        }
    }

    /// Returns a handle to the write half.
    #[must_use]
    pub fn writer(&self) -> ConnectionWriter {
        self.writer.clone()
    }

    /// Splits into the write handle and the read half.
    #[must_use]
    pub fn into_parts(self) -> (ConnectionWriter, FrameStream) {
        (self.writer, self.reader)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use futures_util::StreamExt;

    use super::testing::memory;
    use super::*;

    #[tokio::test]
    async fn writer_clones_share_the_sink() {
        let (conn, mut peer) = memory();
        let a = conn.writer();
        let b = conn.writer();
        assert!(a.send_text("one".to_string()).await.is_ok());
        assert!(b.send_envelope(&Envelope::login()).await.is_ok());

        let frames = peer.drain();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames.first(), Some(&Frame::Text("one".to_string())));
    }

    #[tokio::test]
    async fn write_fails_once_peer_is_gone() {
        let (conn, peer) = memory();
        drop(peer);
        let result = conn.writer().send_text("lost".to_string()).await;
        assert!(matches!(result, Err(HubError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn repeated_writes_to_a_gone_peer_keep_failing_cleanly() {
        let (conn, peer) = memory();
        drop(peer);
        let writer = conn.writer();
        for _ in 0..3 {
            let result = writer.send_text("lost".to_string()).await;
            assert!(matches!(result, Err(HubError::ConnectionClosed)));
        }
    }

    #[tokio::test]
    async fn writes_after_close_are_refused() {
        let (conn, mut peer) = memory();
        let writer = conn.writer();
        let other = conn.writer();

        assert!(writer.close().await.is_ok());
        assert!(writer.close().await.is_ok());
        let result = other.send_envelope(&Envelope::default()).await;

        assert!(matches!(result, Err(HubError::ConnectionClosed)));
        assert!(peer.drain().is_empty());
    }

    #[tokio::test]
    async fn reader_ends_when_peer_hangs_up() {
        let (conn, peer) = memory();
        peer.push("hi");
        drop(peer);
        let (_writer, mut reader) = conn.into_parts();

        let Some(Ok(frame)) = reader.next().await else {
            panic!("expected one frame");
        };
        assert_eq!(frame.payload(), b"hi");
        assert!(reader.next().await.is_none());
    }
}
