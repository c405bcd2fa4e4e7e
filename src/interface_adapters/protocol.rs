// Wire protocol DTOs and conversions for client-facing game messages.
// Both directions derive Serialize and Deserialize so the bundled client and
// the integration tests speak the same types.

use crate::domain::{
    EndReason, GameReport, LeaderboardEntry, MatchRecord, Notice, Play, RoundReport, Standing,
};
use serde::{Deserialize, Serialize};

pub const MOVE_PROMPT: &str = "Your move (rock, paper, scissors):";
pub const CONTINUE_PROMPT: &str = "Do you want to play another round? (yes/no)";

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // No opponent yet.
    Waiting,
    GameStart { session_id: String, opponent: String },
    MovePrompt { round: u32, prompt: String },
    // Previous reply was rejected; the prompt follows again.
    InvalidReply { reason: String },
    RoundOutcome(RoundOutcomeDto),
    ContinuePrompt { prompt: String },
    GameOver(GameOverDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Identification; must be the first frame.
    Join { display_name: String },
    // Move or yes/no answer to the latest prompt.
    Reply { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayDto {
    pub name: String,
    pub choice: String,
}

impl From<&Play> for PlayDto {
    fn from(play: &Play) -> Self {
        Self {
            name: play.name.clone(),
            choice: play.choice.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingDto {
    pub name: String,
    pub score: u32,
}

impl From<&Standing> for StandingDto {
    fn from(standing: &Standing) -> Self {
        Self {
            name: standing.name.clone(),
            score: standing.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcomeDto {
    pub round: u32,
    pub plays: Vec<PlayDto>,
    pub winner: Option<String>,
    pub summary: String,
    pub standings: Vec<StandingDto>,
}

impl From<&RoundReport> for RoundOutcomeDto {
    fn from(report: &RoundReport) -> Self {
        Self {
            round: report.round,
            plays: report.plays.iter().map(PlayDto::from).collect(),
            winner: report.winner.clone(),
            summary: report.summary.clone(),
            standings: report.standings.iter().map(StandingDto::from).collect(),
        }
    }
}

/// Why a session ended, as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndReasonDto {
    Declined,
    PeerLost { name: String },
}

impl From<&EndReason> for EndReasonDto {
    fn from(reason: &EndReason) -> Self {
        match reason {
            EndReason::Declined => EndReasonDto::Declined,
            EndReason::PeerLost { name } => EndReasonDto::PeerLost { name: name.clone() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOverDto {
    pub reason: EndReasonDto,
    pub rounds_played: u32,
    pub standings: Vec<StandingDto>,
    pub champion: Option<String>,
    pub summary: String,
}

impl From<&GameReport> for GameOverDto {
    fn from(report: &GameReport) -> Self {
        Self {
            reason: EndReasonDto::from(&report.reason),
            rounds_played: report.rounds_played,
            standings: report.standings.iter().map(StandingDto::from).collect(),
            champion: report.champion.clone(),
            summary: report.summary.clone(),
        }
    }
}

impl From<&Notice> for ServerMessage {
    fn from(notice: &Notice) -> Self {
        match notice {
            Notice::Waiting => ServerMessage::Waiting,
            Notice::GameStart {
                session_id,
                opponent,
            } => ServerMessage::GameStart {
                session_id: session_id.to_string(),
                opponent: opponent.clone(),
            },
            Notice::MovePrompt { round } => ServerMessage::MovePrompt {
                round: *round,
                prompt: MOVE_PROMPT.to_string(),
            },
            Notice::InvalidReply { reason } => ServerMessage::InvalidReply {
                reason: reason.clone(),
            },
            Notice::RoundOutcome(report) => ServerMessage::RoundOutcome(report.into()),
            Notice::ContinuePrompt => ServerMessage::ContinuePrompt {
                prompt: CONTINUE_PROMPT.to_string(),
            },
            Notice::GameOver(report) => ServerMessage::GameOver(report.into()),
        }
    }
}

// Read-side DTOs for the HTTP leaderboard routes.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntryDto {
    pub name: String,
    pub wins: u32,
    pub games: u32,
}

impl From<LeaderboardEntry> for LeaderboardEntryDto {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            name: entry.name,
            wins: entry.wins,
            games: entry.games,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecordDto {
    pub session_id: String,
    pub players: Vec<String>,
    pub scores: Vec<u32>,
    pub rounds: u32,
    pub winner: Option<String>,
    pub abandoned: bool,
}

impl From<MatchRecord> for MatchRecordDto {
    fn from(record: MatchRecord) -> Self {
        Self {
            session_id: record.session_id.to_string(),
            players: record.players.to_vec(),
            scores: record.scores.to_vec(),
            rounds: record.rounds,
            winner: record.winner,
            abandoned: record.abandoned,
        }
    }
}
