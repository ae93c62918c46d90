//! # fanout-hub
//!
//! Real-time fan-out hub for WebSocket clients.
//!
//! Clients connect over `/ws`, send JSON messages, and the hub relays them
//! to every connected client while announcing joins and leaves. A single
//! [`domain::Pool`] task owns the membership set; every other component
//! talks to it through three intake channels (register, unregister,
//! broadcast), so membership is never touched concurrently.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket)
//!     │
//!     ├── WS Handler (ws/)          upgrade, origin policy, buffer hints
//!     │
//!     ├── Client read loop (domain/) classify: ping → reply, else → broadcast
//!     │
//!     └── Pool control loop (domain/) register / unregister / broadcast
//!             │
//!             └── member connections
//! ```

pub mod api;
pub mod app;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod ws;
