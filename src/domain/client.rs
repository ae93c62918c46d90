//! A connected client and its read/classify loop.

use futures_util::StreamExt;

use super::{
    Classified, ClientId, ConnectionWriter, Envelope, FrameStream, InboundMessage, PoolHandle,
};
use crate::config::ClientConfig;
use crate::error::HubError;

/// One connected peer: identity, write half, and a handle back to the pool.
///
/// The read half is passed to [`Client::run`], which consumes the client.
#[derive(Debug)]
pub struct Client {
    id: ClientId,
    writer: ConnectionWriter,
    pool: PoolHandle,
    config: ClientConfig,
}

impl Client {
    /// Creates a client; it is not registered until [`Client::register`].
    #[must_use]
    pub fn new(
        id: ClientId,
        writer: ConnectionWriter,
        pool: PoolHandle,
        config: ClientConfig,
    ) -> Self {
        Self {
            id,
            writer,
            pool,
            config,
        }
    }

    /// Client identity.
    #[must_use]
    pub const fn id(&self) -> ClientId {
        self.id
    }

    /// Submits this client to the pool's register intake.
    pub async fn register(&self) {
        self.pool.register(self.id, self.writer.clone()).await;
    }

    /// Runs the read loop until the connection faults or closes, then
    /// unregisters from the pool and closes the connection, in that order.
    ///
    /// # Errors
    ///
    /// Returns the fault that ended the loop: a transport error, a decode
    /// error, or a failed ping reply. `Ok(())` means the peer hung up.
    pub async fn run(self, mut reader: FrameStream) -> Result<(), HubError> {
        let result = self.read_loop(&mut reader).await;
        match &result {
            Ok(()) => tracing::info!(client_id = %self.id, "client disconnected"),
            Err(e) => tracing::warn!(client_id = %self.id, error = %e, "client read loop terminated"),
        }

        self.pool.unregister(self.id).await;
        if let Err(e) = self.writer.close().await {
            tracing::debug!(client_id = %self.id, error = %e, "close after read loop failed");
        }
        result
    }

    async fn read_loop(&self, reader: &mut FrameStream) -> Result<(), HubError> {
        while let Some(frame) = reader.next().await {
            let frame = frame?;
            let message = InboundMessage::parse(frame.payload())?;

            match message.classify()? {
                Classified::Ping { body } => {
                    tokio::time::sleep(self.config.ping_delay).await;
                    self.writer
                        .send_envelope(&Envelope::ping_reply(body))
                        .await?;
                }
                Classified::Forward { action, body } => {
                    tracing::debug!(client_id = %self.id, action = ?action, "forwarding message to pool");
                    let envelope = if self.config.forward_payload {
                        Envelope::new(action.unwrap_or_default(), body.unwrap_or_default())
                    } else {
                        Envelope::default()
                    };
                    self.pool.broadcast(envelope).await;
                }
            }
        }
        Ok(())
    }
}
