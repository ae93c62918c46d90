//! WebSocket layer: upgrade handlers and the axum transport adapter.
//!
//! `/ws` connects a client to the pool; `/echo` writes every frame straight
//! back to its sender.

pub mod echo;
pub mod handler;
pub mod socket;
