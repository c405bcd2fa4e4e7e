// Domain layer: game rules, session bookkeeping and ports.

pub mod errors;
pub mod ports;
pub mod rules;
pub mod session;

pub use errors::{PeerError, SeatFault};
pub use ports::{LeaderboardEntry, MatchRecord, MatchRecorder, PeerLink};
pub use rules::{Move, RoundResult, Seat, resolve};
pub use session::{
    Continuation, EndReason, GameReport, Notice, Peer, Play, RoundReport, Scoreboard, Session,
    SessionPhase, Standing,
};
