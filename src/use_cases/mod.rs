// Use cases layer: pairing, round coordination and the per-session game loop.

pub mod game;
pub mod registry;
pub mod round;

#[cfg(test)]
pub(crate) mod test_support;

pub use game::{GameSettings, run_session};
pub use registry::{HoldOutcome, PendingPeer, Registration, SessionRegistry};
pub use round::ReplyPolicy;
