// Session bookkeeping: peers, scores, phases and the notices a session emits.

use super::rules::{Move, RoundResult, Seat};
use std::str::FromStr;

/// A connected client with its display name and message channel.
///
/// Not `Clone`: a peer is owned by exactly one context at a time, which is what
/// keeps the two seats of a session distinct.
#[derive(Debug)]
pub struct Peer<L> {
    pub id: u64,
    pub name: String,
    pub link: L,
}

impl<L> Peer<L> {
    pub fn new(id: u64, name: impl Into<String>, link: L) -> Self {
        Self {
            id,
            name: name.into(),
            link,
        }
    }
}

/// A paired match between exactly two peers.
#[derive(Debug)]
pub struct Session<L> {
    pub id: u64,
    pub peers: [Peer<L>; 2],
    pub round: u32,
    pub scores: Scoreboard,
}

impl<L> Session<L> {
    pub fn new(id: u64, first: Peer<L>, second: Peer<L>) -> Self {
        Self {
            id,
            peers: [first, second],
            round: 0,
            scores: Scoreboard::default(),
        }
    }

    pub fn peer(&self, seat: Seat) -> &Peer<L> {
        &self.peers[seat.index()]
    }

    pub fn names(&self) -> [String; 2] {
        [self.peers[0].name.clone(), self.peers[1].name.clone()]
    }

    pub fn standings(&self) -> [Standing; 2] {
        [Seat::First, Seat::Second].map(|seat| Standing {
            name: self.peer(seat).name.clone(),
            score: self.scores.get(seat),
        })
    }

    pub fn champion(&self) -> Option<String> {
        self.scores
            .leader()
            .map(|seat| self.peer(seat).name.clone())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scoreboard([u32; 2]);

impl Scoreboard {
    pub fn record(&mut self, result: RoundResult) {
        if let RoundResult::Win(seat) = result {
            self.0[seat.index()] += 1;
        }
    }

    pub fn get(&self, seat: Seat) -> u32 {
        self.0[seat.index()]
    }

    pub fn as_array(&self) -> [u32; 2] {
        self.0
    }

    /// Seat with the strictly higher score, if any.
    pub fn leader(&self) -> Option<Seat> {
        let [first, second] = self.0;
        match first.cmp(&second) {
            std::cmp::Ordering::Greater => Some(Seat::First),
            std::cmp::Ordering::Less => Some(Seat::Second),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Answer to "play another round?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    Yes,
    No,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAnswer(pub String);

impl FromStr for Continuation {
    type Err = InvalidAnswer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Ok(Continuation::Yes),
            "no" | "n" => Ok(Continuation::No),
            _ => Err(InvalidAnswer(s.trim().to_string())),
        }
    }
}

/// Both sides must agree to play on.
pub fn both_continue(answers: [Continuation; 2]) -> bool {
    answers.iter().all(|a| *a == Continuation::Yes)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    AwaitingMoves,
    RoundResolved([Move; 2]),
    AwaitingContinue,
    Terminated(EndReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    Declined,
    PeerLost { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Play {
    pub name: String,
    pub choice: Move,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    pub round: u32,
    pub plays: [Play; 2],
    pub winner: Option<String>,
    pub summary: String,
    pub standings: [Standing; 2],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameReport {
    pub reason: EndReason,
    pub rounds_played: u32,
    pub standings: [Standing; 2],
    pub champion: Option<String>,
    pub summary: String,
}

/// Everything a session tells its peers. Wire encoding lives in the adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Waiting,
    GameStart { session_id: u64, opponent: String },
    MovePrompt { round: u32 },
    InvalidReply { reason: String },
    RoundOutcome(RoundReport),
    ContinuePrompt,
    GameOver(GameReport),
}

pub fn describe_round(plays: &[Play; 2], result: RoundResult) -> String {
    match result {
        RoundResult::Tie => "It's a tie!".to_string(),
        RoundResult::Win(seat) => {
            let winner = &plays[seat.index()];
            let loser = &plays[seat.other().index()];
            format!(
                "{} wins with {} over {}!",
                winner.name, winner.choice, loser.choice
            )
        }
    }
}

pub fn describe_game(standings: &[Standing; 2], champion: Option<&str>) -> String {
    let [a, b] = standings;
    let tail = match champion {
        Some(name) => format!("{name} wins the session!"),
        None => "The session is a tie!".to_string(),
    };
    format!(
        "Final Score - {}: {}, {}: {}. {tail}",
        a.name, a.score, b.name, b.score
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plays(a: Move, b: Move) -> [Play; 2] {
        [
            Play {
                name: "alice".to_string(),
                choice: a,
            },
            Play {
                name: "bob".to_string(),
                choice: b,
            },
        ]
    }

    #[test]
    fn when_round_is_won_then_only_winner_scores() {
        let mut scores = Scoreboard::default();
        scores.record(RoundResult::Win(Seat::Second));
        scores.record(RoundResult::Tie);

        assert_eq!(scores.as_array(), [0, 1]);
        assert_eq!(scores.leader(), Some(Seat::Second));
    }

    #[test]
    fn when_scores_are_level_then_there_is_no_leader() {
        let mut scores = Scoreboard::default();
        scores.record(RoundResult::Win(Seat::First));
        scores.record(RoundResult::Win(Seat::Second));

        assert_eq!(scores.leader(), None);
    }

    #[test]
    fn when_answer_is_yes_or_no_then_it_parses_loosely() {
        assert_eq!("YES".parse::<Continuation>(), Ok(Continuation::Yes));
        assert_eq!(" y ".parse::<Continuation>(), Ok(Continuation::Yes));
        assert_eq!("No".parse::<Continuation>(), Ok(Continuation::No));
        assert_eq!("n".parse::<Continuation>(), Ok(Continuation::No));
        assert_eq!(
            "maybe".parse::<Continuation>(),
            Err(InvalidAnswer("maybe".to_string()))
        );
    }

    #[test]
    fn when_either_answer_is_no_then_session_does_not_continue() {
        use Continuation::{No, Yes};

        assert!(both_continue([Yes, Yes]));
        assert!(!both_continue([Yes, No]));
        assert!(!both_continue([No, Yes]));
        assert!(!both_continue([No, No]));
    }

    #[test]
    fn when_round_is_described_then_winner_and_moves_are_named() {
        let summary = describe_round(
            &plays(Move::Rock, Move::Scissors),
            RoundResult::Win(Seat::First),
        );
        assert_eq!(summary, "alice wins with rock over scissors!");

        let summary = describe_round(
            &plays(Move::Rock, Move::Paper),
            RoundResult::Win(Seat::Second),
        );
        assert_eq!(summary, "bob wins with paper over rock!");

        let summary = describe_round(&plays(Move::Paper, Move::Paper), RoundResult::Tie);
        assert_eq!(summary, "It's a tie!");
    }
}
