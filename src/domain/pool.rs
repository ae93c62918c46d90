//! The connection pool: a single-owner actor that serialises membership
//! changes and message fan-out.
//!
//! [`Pool`] owns the [`Membership`] set and three intake channels
//! (register, unregister, broadcast). Its control loop is the only code that
//! ever touches the set; everything else talks to it through a cloneable
//! [`PoolHandle`]. Each loop iteration, including every write it makes to
//! member connections, finishes before the next intake event is taken.
//!
//! Register and unregister are a rendezvous: the caller is resumed only once
//! the loop has serviced the request. A client that unregisters and then
//! closes its connection is therefore never written to after the close.
//!
//! ```text
//! Client read loops ──register──┐
//!                  ──unregister─┼──▶ Pool::run ──▶ member connections
//!                  ──broadcast──┘        │
//!                                        └──▶ watch<PoolStatus>
//! ```

use std::ops::ControlFlow;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::{ClientId, ConnectionWriter, Envelope, Membership};
use crate::config::{BroadcastFaultPolicy, PoolConfig};

/// Lifecycle of the control loop. `Stopped` is terminal.
///
/// Serialises as `"running"` / `"stopped"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    /// Servicing intake events.
    Running,
    /// Loop exited; no further requests are serviced.
    Stopped,
}

/// Snapshot published by the control loop after every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Current lifecycle state.
    pub state: PoolState,
    /// Number of registered clients.
    pub members: usize,
}

/// Why the control loop exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolExit {
    /// Every [`PoolHandle`] was dropped.
    AllHandlesDropped,
    /// A broadcast write failed under [`BroadcastFaultPolicy::Abort`].
    BroadcastFault {
        /// The member whose connection failed.
        client_id: ClientId,
    },
}

/// A registration request: the client identity plus its write half.
#[derive(Debug, Clone)]
pub struct Member {
    /// Client identity.
    pub id: ClientId,
    /// Write half used for fan-out.
    pub writer: ConnectionWriter,
}

/// One intake event, as serviced by [`Pool::handle`].
#[derive(Debug)]
pub enum PoolCommand {
    /// Add a client and send every member a login notification.
    Register(Member),
    /// Remove a client (if present) and send the rest a logout notification.
    Unregister(ClientId),
    /// Write an envelope to every member.
    Broadcast(Envelope),
}

/// A request paired with the ack the loop fires once it has serviced it.
type Acked<T> = (T, oneshot::Sender<()>);

/// Sends `request` and waits for the loop's ack. Returns `false` if the loop
/// stopped before servicing it.
async fn rendezvous<T>(intake: &mpsc::Sender<Acked<T>>, request: T) -> bool {
    let (ack, serviced) = oneshot::channel();
    if intake.send((request, ack)).await.is_err() {
        return false;
    }
    serviced.await.is_ok()
}

/// Cloneable front door of the pool.
///
/// Requests never fail: once the loop has stopped they are dropped without
/// error and without blocking. [`PoolHandle::register`] and
/// [`PoolHandle::unregister`] return after the loop has serviced them;
/// [`PoolHandle::broadcast`] returns once the envelope is queued.
#[derive(Debug, Clone)]
pub struct PoolHandle {
    register: mpsc::Sender<Acked<Member>>,
    unregister: mpsc::Sender<Acked<ClientId>>,
    broadcast: mpsc::Sender<Envelope>,
    status: watch::Receiver<PoolStatus>,
}

impl PoolHandle {
    /// Adds `id` and waits until every member has been sent the login.
    pub async fn register(&self, id: ClientId, writer: ConnectionWriter) {
        if !rendezvous(&self.register, Member { id, writer }).await {
            tracing::debug!(client_id = %id, "pool stopped; register dropped");
        }
    }

    /// Removes `id` and waits until the pool no longer writes to it.
    pub async fn unregister(&self, id: ClientId) {
        if !rendezvous(&self.unregister, id).await {
            tracing::debug!(client_id = %id, "pool stopped; unregister dropped");
        }
    }

    /// Asks the pool to deliver `envelope` to every member.
    pub async fn broadcast(&self, envelope: Envelope) {
        if self.broadcast.send(envelope).await.is_err() {
            tracing::debug!("pool stopped; broadcast dropped");
        }
    }

    /// Latest status published by the control loop.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        *self.status.borrow()
    }

    /// Returns `true` while the control loop is servicing requests.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status().state == PoolState::Running && !self.register.is_closed()
    }

    /// Waits until a published status satisfies `predicate` and returns it.
    ///
    /// If the loop is gone the last published status is returned as is.
    pub async fn wait_for_status(
        &self,
        mut predicate: impl FnMut(&PoolStatus) -> bool,
    ) -> PoolStatus {
        let mut status = self.status.clone();
        let result = status.wait_for(|s| predicate(s)).await.map(|s| *s);
        result.unwrap_or_else(|_| *self.status.borrow())
    }

    /// Resolves once the control loop has stopped.
    pub async fn stopped(&self) {
        self.wait_for_status(|s| s.state == PoolState::Stopped).await;
    }
}

/// The pool actor.
#[derive(Debug)]
pub struct Pool {
    register_rx: mpsc::Receiver<Acked<Member>>,
    unregister_rx: mpsc::Receiver<Acked<ClientId>>,
    broadcast_rx: mpsc::Receiver<Envelope>,
    members: Membership,
    fault_policy: BroadcastFaultPolicy,
    status_tx: watch::Sender<PoolStatus>,
}

impl Pool {
    /// Creates the actor and its handle. Nothing runs until [`Pool::run`].
    #[must_use]
    pub fn new(config: PoolConfig) -> (Self, PoolHandle) {
        let capacity = config.intake_capacity.max(1);
        let (register, register_rx) = mpsc::channel(capacity);
        let (unregister, unregister_rx) = mpsc::channel(capacity);
        let (broadcast, broadcast_rx) = mpsc::channel(capacity);
        let (status_tx, status) = watch::channel(PoolStatus {
            state: PoolState::Running,
            members: 0,
        });

        let pool = Self {
            register_rx,
            unregister_rx,
            broadcast_rx,
            members: Membership::new(),
            fault_policy: config.broadcast_fault_policy,
            status_tx,
        };
        let handle = PoolHandle {
            register,
            unregister,
            broadcast,
            status,
        };
        (pool, handle)
    }

    /// Creates the actor and runs it on a tokio task.
    #[must_use]
    pub fn spawn(config: PoolConfig) -> (PoolHandle, JoinHandle<PoolExit>) {
        let (pool, handle) = Self::new(config);
        (handle, tokio::spawn(pool.run()))
    }

    /// Read-only view of the current members.
    #[must_use]
    pub fn members(&self) -> &Membership {
        &self.members
    }

    /// Runs the control loop until it stops.
    ///
    /// Selection among simultaneously ready intake channels is random.
    pub async fn run(mut self) -> PoolExit {
        tracing::info!("pool control loop started");

        let exit = loop {
            let (command, ack) = tokio::select! {
                Some((member, ack)) = self.register_rx.recv() => {
                    (PoolCommand::Register(member), Some(ack))
                }
                Some((id, ack)) = self.unregister_rx.recv() => {
                    (PoolCommand::Unregister(id), Some(ack))
                }
                Some(envelope) = self.broadcast_rx.recv() => (PoolCommand::Broadcast(envelope), None),
                else => break PoolExit::AllHandlesDropped,
            };
            let flow = self.handle(command).await;
            if let Some(ack) = ack {
                // The caller may have given up waiting.
                let _ = ack.send(());
            }
            if let ControlFlow::Break(exit) = flow {
                break exit;
            }
        };

        self.status_tx.send_replace(PoolStatus {
            state: PoolState::Stopped,
            members: self.members.len(),
        });
        match exit {
            PoolExit::AllHandlesDropped => tracing::info!("pool control loop stopped"),
            PoolExit::BroadcastFault { client_id } => {
                tracing::error!(client_id = %client_id, "pool control loop stopped on broadcast fault");
            }
        }
        exit
    }

    /// Services one intake event.
    pub async fn handle(&mut self, command: PoolCommand) -> ControlFlow<PoolExit> {
        let flow = match command {
            PoolCommand::Register(Member { id, writer }) => {
                self.members.insert(id, writer);
                tracing::info!(client_id = %id, pool_size = self.members.len(), "client registered");
                self.notify_all(&Envelope::login()).await;
                ControlFlow::Continue(())
            }
            PoolCommand::Unregister(id) => {
                let was_member = self.members.remove(&id);
                tracing::info!(
                    client_id = %id,
                    was_member,
                    pool_size = self.members.len(),
                    "client unregistered"
                );
                self.notify_all(&Envelope::logout()).await;
                ControlFlow::Continue(())
            }
            PoolCommand::Broadcast(envelope) => self.broadcast(&envelope).await,
        };

        self.status_tx.send_replace(PoolStatus {
            state: PoolState::Running,
            members: self.members.len(),
        });
        flow
    }

    /// Sends a notification to every member; a failed write only affects
    /// that member.
    async fn notify_all(&self, envelope: &Envelope) {
        let text = match envelope.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode notification");
                return;
            }
        };
        for (id, writer) in self.members.iter() {
            if let Err(e) = writer.send_text(text.clone()).await {
                tracing::warn!(client_id = %id, error = %e, "notification write failed");
            }
        }
    }

    /// Writes an envelope to every member, applying the fault policy.
    async fn broadcast(&mut self, envelope: &Envelope) -> ControlFlow<PoolExit> {
        let text = match envelope.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode broadcast");
                return ControlFlow::Continue(());
            }
        };
        tracing::debug!(pool_size = self.members.len(), "broadcasting to all clients");

        let mut faulted = Vec::new();
        for (id, writer) in self.members.iter() {
            let Err(e) = writer.send_text(text.clone()).await else {
                continue;
            };
            match self.fault_policy {
                BroadcastFaultPolicy::Abort => {
                    tracing::error!(client_id = %id, error = %e, "broadcast write failed");
                    return ControlFlow::Break(PoolExit::BroadcastFault { client_id: *id });
                }
                BroadcastFaultPolicy::Evict => {
                    tracing::warn!(client_id = %id, error = %e, "broadcast write failed; evicting");
                    faulted.push(*id);
                }
            }
        }

        for id in faulted {
            self.members.remove(&id);
            tracing::info!(client_id = %id, pool_size = self.members.len(), "client evicted");
            self.notify_all(&Envelope::logout()).await;
        }
        ControlFlow::Continue(())
    }
}
