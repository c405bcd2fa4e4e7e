// Round coordination: prompt both peers of a session and join their replies.

use crate::domain::rules::InvalidMove;
use crate::domain::session::InvalidAnswer;
use crate::domain::{Continuation, Move, Notice, Peer, PeerError, PeerLink, Seat, SeatFault, Session};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Bounds on how long and how often a single prompt is retried.
#[derive(Debug, Clone)]
pub struct ReplyPolicy {
    /// Longest wait for any one reply before the peer counts as gone.
    pub reply_timeout: Duration,
    /// Invalid replies tolerated per prompt; one more ends the session.
    pub max_invalid_replies: u32,
}

/// Sends one notice, treating a send that outlasts `limit` as a lost peer.
pub async fn send_within<L: PeerLink>(
    link: &mut L,
    notice: &Notice,
    limit: Duration,
) -> Result<(), PeerError> {
    match timeout(limit, link.send(notice)).await {
        Ok(sent) => sent,
        Err(_) => Err(PeerError::TimedOut),
    }
}

fn parse_move(text: &str) -> Result<Move, String> {
    text.parse::<Move>().map_err(|InvalidMove(text)| {
        format!("'{text}' is not a valid move; choose rock, paper or scissors")
    })
}

fn parse_answer(text: &str) -> Result<Continuation, String> {
    text.parse::<Continuation>()
        .map_err(|InvalidAnswer(text)| format!("'{text}' is not an answer; reply yes or no"))
}

/// Sends `prompt` and reads until a reply parses, re-prompting on bad input.
pub async fn request_reply<L, T, F>(
    seat: Seat,
    peer: &mut Peer<L>,
    prompt: &Notice,
    policy: &ReplyPolicy,
    parse: F,
) -> Result<T, SeatFault>
where
    L: PeerLink,
    F: Fn(&str) -> Result<T, String>,
{
    let fault = move |error| SeatFault { seat, error };

    send_within(&mut peer.link, prompt, policy.reply_timeout)
        .await
        .map_err(fault)?;

    let mut invalid: u32 = 0;
    loop {
        let reason = match timeout(policy.reply_timeout, peer.link.recv()).await {
            Err(_) => return Err(fault(PeerError::TimedOut)),
            Ok(Ok(text)) => match parse(&text) {
                Ok(value) => return Ok(value),
                Err(reason) => reason,
            },
            Ok(Err(PeerError::Malformed(reason))) => reason,
            Ok(Err(error)) => return Err(fault(error)),
        };

        invalid += 1;
        if invalid > policy.max_invalid_replies {
            warn!(name = %peer.name, invalid, "too many invalid replies");
            return Err(fault(PeerError::TooManyInvalidReplies));
        }

        debug!(name = %peer.name, %reason, "invalid reply; prompting again");
        send_within(
            &mut peer.link,
            &Notice::InvalidReply { reason },
            policy.reply_timeout,
        )
        .await
        .map_err(fault)?;
        send_within(&mut peer.link, prompt, policy.reply_timeout)
            .await
            .map_err(fault)?;
    }
}

/// Collects one move from each seat. Resolves only once both are in; the first
/// fatal error on either side cancels the other read.
pub async fn collect_moves<L: PeerLink>(
    session: &mut Session<L>,
    policy: &ReplyPolicy,
) -> Result<[Move; 2], SeatFault> {
    let prompt = Notice::MovePrompt {
        round: session.round + 1,
    };
    let [first, second] = &mut session.peers;

    let (a, b) = tokio::try_join!(
        request_reply(Seat::First, first, &prompt, policy, parse_move),
        request_reply(Seat::Second, second, &prompt, policy, parse_move),
    )?;
    Ok([a, b])
}

/// Asks both seats whether to play on and waits for both answers.
pub async fn collect_answers<L: PeerLink>(
    session: &mut Session<L>,
    policy: &ReplyPolicy,
) -> Result<[Continuation; 2], SeatFault> {
    let prompt = Notice::ContinuePrompt;
    let [first, second] = &mut session.peers;

    let (a, b) = tokio::try_join!(
        request_reply(Seat::First, first, &prompt, policy, parse_answer),
        request_reply(Seat::Second, second, &prompt, policy, parse_answer),
    )?;
    Ok([a, b])
}

/// Sends the same notice to both seats.
pub async fn broadcast<L: PeerLink>(
    session: &mut Session<L>,
    notice: &Notice,
    policy: &ReplyPolicy,
) -> Result<(), SeatFault> {
    let [first, second] = &mut session.peers;
    let limit = policy.reply_timeout;

    tokio::try_join!(
        async {
            send_within(&mut first.link, notice, limit)
                .await
                .map_err(|error| SeatFault {
                    seat: Seat::First,
                    error,
                })
        },
        async {
            send_within(&mut second.link, notice, limit)
                .await
                .map_err(|error| SeatFault {
                    seat: Seat::Second,
                    error,
                })
        },
    )?;
    Ok(())
}
