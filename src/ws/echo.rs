//! Echo loop: every frame is written straight back to its sender.

use futures_util::StreamExt;

use crate::domain::Connection;
use crate::error::HubError;

/// Echoes frames until the peer hangs up or the connection faults.
///
/// Frame kinds are preserved. The pool is never involved.
///
/// # Errors
///
/// Returns the read or write fault that ended the loop.
pub async fn run_echo(connection: Connection) -> Result<(), HubError> {
    let (writer, mut reader) = connection.into_parts();
    while let Some(frame) = reader.next().await {
        let frame = frame?;
        tracing::debug!(bytes = frame.payload().len(), "echoing frame");
        writer.send(frame).await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Frame;
    use crate::domain::connection::testing::memory;

    #[tokio::test]
    async fn frames_come_back_unchanged() {
        let (conn, mut peer) = memory();
        let task = tokio::spawn(run_echo(conn));

        peer.push("not even json");
        let _ = peer.inbound.send(Ok(Frame::Binary(vec![0, 255])));
        let Some(first) = peer.outbound.recv().await else {
            panic!("no echo");
        };
        let Some(second) = peer.outbound.recv().await else {
            panic!("no echo");
        };
        assert_eq!(first, Frame::Text("not even json".to_string()));
        assert_eq!(second, Frame::Binary(vec![0, 255]));

        drop(peer);
        let Ok(result) = task.await else {
            panic!("echo task panicked");
        };
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn write_fault_ends_the_loop() {
        let (conn, peer) = memory();
        peer.push("x");
        let crate::domain::connection::testing::Peer { inbound, outbound } = peer;
        drop(outbound);

        let result = run_echo(conn).await;
        assert!(matches!(result, Err(HubError::ConnectionClosed)));
        drop(inbound);
    }
}
