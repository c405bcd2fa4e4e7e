// Rock-paper-scissors rules. Pure functions over the closed set of moves.

use std::fmt;
use std::str::FromStr;

/// One of the three playable choices.
///
/// The discriminants are cyclic: each move beats the move one step before it
/// (mod 3), which is how `resolve` decides a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Move {
    Rock = 0,
    Paper = 1,
    Scissors = 2,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    pub fn as_str(self) -> &'static str {
        match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        }
    }

    /// Returns true if `self` beats `other`.
    pub fn beats(self, other: Move) -> bool {
        (self as u8 + 3 - other as u8) % 3 == 1
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected move text, kept for the re-prompt message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMove(pub String);

impl FromStr for Move {
    type Err = InvalidMove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" => Ok(Move::Rock),
            "paper" => Ok(Move::Paper),
            "scissors" => Ok(Move::Scissors),
            _ => Err(InvalidMove(s.trim().to_string())),
        }
    }
}

/// Position of a peer inside a session. `First` is the peer that waited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }

    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundResult {
    Win(Seat),
    Tie,
}

/// Resolves one round. Total over all nine move pairs.
pub fn resolve(first: Move, second: Move) -> RoundResult {
    if first == second {
        RoundResult::Tie
    } else if first.beats(second) {
        RoundResult::Win(Seat::First)
    } else {
        RoundResult::Win(Seat::Second)
    }
}
