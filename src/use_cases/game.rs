// Per-session game loop: rounds until either side declines or drops.

use super::round::{ReplyPolicy, broadcast, collect_answers, collect_moves, send_within};
use crate::domain::session::{both_continue, describe_game, describe_round};
use crate::domain::{
    EndReason, GameReport, MatchRecord, MatchRecorder, Move, Notice, PeerLink, Play, RoundReport,
    RoundResult, Seat, SeatFault, Session, SessionPhase, resolve,
};
use std::time::Duration;
use tracing::{Instrument, debug, info, info_span, warn};

/// Limits applied to every session.
#[derive(Debug, Clone)]
pub struct GameSettings {
    pub reply_timeout: Duration,
    pub max_invalid_replies: u32,
    /// Upper bound for best-effort notices sent while tearing down.
    pub farewell_timeout: Duration,
}

impl GameSettings {
    fn reply_policy(&self) -> ReplyPolicy {
        ReplyPolicy {
            reply_timeout: self.reply_timeout,
            max_invalid_replies: self.max_invalid_replies,
        }
    }
}

/// Drives a paired session to completion, then records it once.
pub async fn run_session<L: PeerLink>(
    session: Session<L>,
    settings: &GameSettings,
    recorder: &dyn MatchRecorder,
) -> MatchRecord {
    let span = info_span!("session", session_id = session.id);
    drive(session, settings, recorder).instrument(span).await
}

async fn drive<L: PeerLink>(
    mut session: Session<L>,
    settings: &GameSettings,
    recorder: &dyn MatchRecorder,
) -> MatchRecord {
    let policy = settings.reply_policy();
    let [first, second] = session.names();
    info!(%first, %second, "game starting");

    let mut lost_seat: Option<Seat> = None;
    let mut phase = match announce_start(&mut session, &policy).await {
        Ok(()) => SessionPhase::AwaitingMoves,
        Err(fault) => peer_lost(&session, &fault, &mut lost_seat),
    };

    let reason = loop {
        phase = match phase {
            SessionPhase::AwaitingMoves => match collect_moves(&mut session, &policy).await {
                Ok(moves) => SessionPhase::RoundResolved(moves),
                Err(fault) => peer_lost(&session, &fault, &mut lost_seat),
            },
            SessionPhase::RoundResolved(moves) => {
                let report = settle_round(&mut session, moves);
                info!(round = report.round, summary = %report.summary, "round resolved");
                match broadcast(&mut session, &Notice::RoundOutcome(report), &policy).await {
                    Ok(()) => SessionPhase::AwaitingContinue,
                    Err(fault) => peer_lost(&session, &fault, &mut lost_seat),
                }
            }
            SessionPhase::AwaitingContinue => match collect_answers(&mut session, &policy).await {
                Ok(answers) if both_continue(answers) => SessionPhase::AwaitingMoves,
                Ok(answers) => {
                    debug!(?answers, "continuation declined");
                    SessionPhase::Terminated(EndReason::Declined)
                }
                Err(fault) => peer_lost(&session, &fault, &mut lost_seat),
            },
            SessionPhase::Terminated(reason) => break reason,
        };
    };

    finish(session, reason, lost_seat, settings, recorder).await
}

async fn announce_start<L: PeerLink>(
    session: &mut Session<L>,
    policy: &ReplyPolicy,
) -> Result<(), SeatFault> {
    let session_id = session.id;
    let [first, second] = &mut session.peers;
    let opponents = [second.name.clone(), first.name.clone()];

    for (seat, peer) in [(Seat::First, first), (Seat::Second, second)] {
        let notice = Notice::GameStart {
            session_id,
            opponent: opponents[seat.index()].clone(),
        };
        send_within(&mut peer.link, &notice, policy.reply_timeout)
            .await
            .map_err(|error| SeatFault { seat, error })?;
    }
    Ok(())
}

fn peer_lost<L>(
    session: &Session<L>,
    fault: &SeatFault,
    lost_seat: &mut Option<Seat>,
) -> SessionPhase {
    let name = session.peer(fault.seat).name.clone();
    warn!(%name, error = ?fault.error, "peer lost; ending session");
    *lost_seat = Some(fault.seat);
    SessionPhase::Terminated(EndReason::PeerLost { name })
}

// Applies the rules, updates the score and builds the outcome report.
fn settle_round<L>(session: &mut Session<L>, moves: [Move; 2]) -> RoundReport {
    let result = resolve(moves[0], moves[1]);
    session.scores.record(result);
    session.round += 1;

    let plays = [Seat::First, Seat::Second].map(|seat| Play {
        name: session.peer(seat).name.clone(),
        choice: moves[seat.index()],
    });
    let winner = match result {
        RoundResult::Win(seat) => Some(session.peer(seat).name.clone()),
        RoundResult::Tie => None,
    };

    RoundReport {
        round: session.round,
        summary: describe_round(&plays, result),
        plays,
        winner,
        standings: session.standings(),
    }
}

async fn finish<L: PeerLink>(
    mut session: Session<L>,
    reason: EndReason,
    lost_seat: Option<Seat>,
    settings: &GameSettings,
    recorder: &dyn MatchRecorder,
) -> MatchRecord {
    let standings = session.standings();
    let champion = session.champion();
    let mut summary = describe_game(&standings, champion.as_deref());
    if let EndReason::PeerLost { name } = &reason {
        summary = format!("{name} left the game. {summary}");
    }

    let record = MatchRecord {
        session_id: session.id,
        players: session.names(),
        scores: session.scores.as_array(),
        rounds: session.round,
        winner: champion.clone(),
        abandoned: matches!(reason, EndReason::PeerLost { .. }),
    };

    let game_over = Notice::GameOver(GameReport {
        reason,
        rounds_played: session.round,
        standings,
        champion,
        summary,
    });

    for seat in [Seat::First, Seat::Second] {
        let peer = &mut session.peers[seat.index()];
        if lost_seat != Some(seat) {
            // Best effort: a peer that cannot take the notice is dropped anyway.
            if let Err(error) =
                send_within(&mut peer.link, &game_over, settings.farewell_timeout).await
            {
                debug!(name = %peer.name, ?error, "game over notice not delivered");
            }
        }
        if tokio::time::timeout(settings.farewell_timeout, peer.link.close())
            .await
            .is_err()
        {
            debug!(name = %peer.name, "socket close timed out");
        }
    }

    info!(
        rounds = record.rounds,
        scores = ?record.scores,
        winner = ?record.winner,
        abandoned = record.abandoned,
        "game over"
    );

    if let Err(error) = recorder.record_match(record.clone()).await {
        warn!(%error, "failed to record match");
    }

    record
}
