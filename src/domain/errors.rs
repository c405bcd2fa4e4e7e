// Domain-level errors for peer I/O during a session.

use super::rules::Seat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerError {
    // Channel closed cleanly (close frame or end of stream).
    Disconnected,
    // Read or write failed underneath the channel.
    Transport(String),
    // No reply within the configured reply timeout.
    TimedOut,
    // A frame arrived but could not be understood.
    Malformed(String),
    // The peer kept answering with garbage past the retry cap.
    TooManyInvalidReplies,
}

impl PeerError {
    /// Everything except a single malformed frame ends the session.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PeerError::Malformed(_))
    }
}

/// A fatal peer error tagged with the seat it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatFault {
    pub seat: Seat,
    pub error: PeerError,
}
