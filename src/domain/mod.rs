//! Domain layer: client identity, envelopes, connections, and the pool.
//!
//! This module contains the hub's core: the [`Pool`] actor that owns
//! membership and fans messages out, the per-connection [`Client`] read
//! loop, and the envelope types they exchange.

pub mod client;
pub mod client_id;
pub mod connection;
pub mod envelope;
pub mod membership;
pub mod pool;

pub use client::Client;
pub use client_id::ClientId;
pub use connection::{Connection, ConnectionWriter, Frame, FrameSink, FrameStream};
pub use envelope::{BaseMessage, Classified, Envelope, InboundMessage};
pub use membership::Membership;
pub use pool::{Member, Pool, PoolCommand, PoolExit, PoolHandle, PoolState, PoolStatus};
