use async_trait::async_trait;

use crate::domain::errors::PeerError;
use crate::domain::session::Notice;

// Port for one connected client's message channel.
#[async_trait]
pub trait PeerLink: Send {
    async fn send(&mut self, notice: &Notice) -> Result<(), PeerError>;
    // Next text reply from the client. Blocks until one arrives or the channel fails.
    async fn recv(&mut self) -> Result<String, PeerError>;
    // Best-effort release of the underlying channel.
    async fn close(&mut self);
}

// Result of one finished session as handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub session_id: u64,
    pub players: [String; 2],
    pub scores: [u32; 2],
    pub rounds: u32,
    pub winner: Option<String>,
    // True when the session ended because a peer was lost.
    pub abandoned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub wins: u32,
    pub games: u32,
}

// Port for match history and the per-name leaderboard.
#[async_trait]
pub trait MatchRecorder: Send + Sync {
    async fn record_match(&self, record: MatchRecord) -> Result<(), String>;
    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, String>;
    async fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>, String>;
}
