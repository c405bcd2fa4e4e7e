// Session registry: pairs connected peers two at a time, first come first served.

use crate::domain::{Notice, Peer, PeerLink, Session};
use std::{collections::VecDeque, time::Duration};
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info};

// Upper bound on closing the link of a peer that left while waiting.
const DEPARTED_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of the atomic registration step.
pub enum Registration<L> {
    /// No one was waiting. The caller keeps the peer and holds it until an
    /// opponent is handed over.
    Pending(PendingPeer<L>),
    /// A waiting context received this peer and now owns the session.
    Handed { session_id: u64 },
}

/// A peer parked in the wait pool, still owned by its connection context.
pub struct PendingPeer<L> {
    pub peer: Peer<L>,
    ticket: u64,
    opponent_rx: oneshot::Receiver<Peer<L>>,
}

impl<L> PendingPeer<L> {
    #[cfg(test)]
    fn ticket(&self) -> u64 {
        self.ticket
    }

    // Waits for the opponent without watching the peer's own channel.
    #[cfg(test)]
    async fn opponent(self) -> Option<Session<L>> {
        let opponent = self.opponent_rx.await.ok()?;
        Some(Session::new(self.ticket, self.peer, opponent))
    }
}

/// How holding a pending peer ended.
pub enum HoldOutcome<L> {
    Paired(Session<L>),
    // The peer went away and nobody else needs a seat.
    Left,
    // This peer still needs an opponent and must register again.
    Requeue(Peer<L>),
}

struct WaitingSlot<L> {
    ticket: u64,
    name: String,
    handoff: oneshot::Sender<Peer<L>>,
}

struct WaitPool<L> {
    slots: VecDeque<WaitingSlot<L>>,
    next_ticket: u64,
}

/// Thread-safe wait pool. The lock is held only for the check-and-update of a
/// registration, never across peer I/O.
pub struct SessionRegistry<L> {
    pool: Mutex<WaitPool<L>>,
}

impl<L> Default for SessionRegistry<L> {
    fn default() -> Self {
        Self {
            pool: Mutex::new(WaitPool {
                slots: VecDeque::new(),
                next_ticket: 0,
            }),
        }
    }
}

impl<L: PeerLink> SessionRegistry<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a peer. Pairs it with the oldest waiting peer if there is one,
    /// otherwise parks it.
    pub async fn register(&self, peer: Peer<L>) -> Registration<L> {
        let mut pool = self.pool.lock().await;
        let mut peer = peer;

        while let Some(slot) = pool.slots.pop_front() {
            match slot.handoff.send(peer) {
                Ok(()) => {
                    info!(
                        session_id = slot.ticket,
                        first = %slot.name,
                        "session formed"
                    );
                    return Registration::Handed {
                        session_id: slot.ticket,
                    };
                }
                Err(returned) => {
                    // The waiting context is gone; its slot was stale.
                    debug!(ticket = slot.ticket, "dropping stale wait slot");
                    peer = returned;
                }
            }
        }

        pool.next_ticket += 1;
        let ticket = pool.next_ticket;
        let (handoff, opponent_rx) = oneshot::channel();
        pool.slots.push_back(WaitingSlot {
            ticket,
            name: peer.name.clone(),
            handoff,
        });
        debug!(ticket, name = %peer.name, "peer waiting for opponent");

        Registration::Pending(PendingPeer {
            peer,
            ticket,
            opponent_rx,
        })
    }

    /// Removes a waiting slot. Returns false if it was already taken.
    pub async fn withdraw(&self, ticket: u64) -> bool {
        let mut pool = self.pool.lock().await;
        let before = pool.slots.len();
        pool.slots.retain(|slot| slot.ticket != ticket);
        pool.slots.len() != before
    }

    #[cfg(test)]
    async fn waiting_count(&self) -> usize {
        self.pool.lock().await.slots.len()
    }

    /// Tells the pending peer to wait, then blocks until an opponent is handed
    /// over or the peer's own channel fails.
    pub async fn hold(&self, pending: PendingPeer<L>) -> HoldOutcome<L> {
        let PendingPeer {
            mut peer,
            ticket,
            mut opponent_rx,
        } = pending;

        if peer.link.send(&Notice::Waiting).await.is_err() {
            return self.abandon(peer, ticket, opponent_rx).await;
        }

        loop {
            tokio::select! {
                opponent = &mut opponent_rx => {
                    return match opponent {
                        Ok(opponent) => HoldOutcome::Paired(Session::new(ticket, peer, opponent)),
                        // Slot vanished without a handoff; try again from scratch.
                        Err(_) => HoldOutcome::Requeue(peer),
                    };
                }
                reply = peer.link.recv() => match reply {
                    Ok(text) => {
                        debug!(ticket, bytes = text.len(), "ignoring reply while waiting");
                    }
                    Err(e) if !e.is_fatal() => {
                        debug!(ticket, error = ?e, "ignoring malformed frame while waiting");
                    }
                    Err(e) => {
                        info!(ticket, name = %peer.name, error = ?e, "waiting peer left");
                        return self.abandon(peer, ticket, opponent_rx).await;
                    }
                },
            }
        }
    }

    // Releases a pending peer that went away. An opponent handed over in the
    // same instant is returned for re-registration rather than stranded.
    async fn abandon(
        &self,
        mut peer: Peer<L>,
        ticket: u64,
        mut opponent_rx: oneshot::Receiver<Peer<L>>,
    ) -> HoldOutcome<L> {
        self.withdraw(ticket).await;
        if tokio::time::timeout(DEPARTED_CLOSE_TIMEOUT, peer.link.close())
            .await
            .is_err()
        {
            debug!(ticket, "close of departed peer timed out");
        }

        match opponent_rx.try_recv() {
            Ok(opponent) => {
                info!(ticket, name = %opponent.name, "re-queueing opponent of departed peer");
                HoldOutcome::Requeue(opponent)
            }
            Err(_) => HoldOutcome::Left,
        }
    }

    /// Runs registration to completion for one peer. Returns the session if this
    /// context ends up owning it, `None` if the peer was handed to another
    /// context or left before pairing.
    pub async fn matchmake(&self, peer: Peer<L>) -> Option<Session<L>> {
        let mut peer = peer;
        loop {
            let pending = match self.register(peer).await {
                Registration::Handed { .. } => return None,
                Registration::Pending(pending) => pending,
            };

            match self.hold(pending).await {
                HoldOutcome::Paired(session) => return Some(session),
                HoldOutcome::Left => return None,
                HoldOutcome::Requeue(next) => peer = next,
            }
        }
    }
}
