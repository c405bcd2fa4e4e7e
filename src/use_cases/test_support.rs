use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{
    LeaderboardEntry, MatchRecord, MatchRecorder, Notice, Peer, PeerError, PeerLink,
};

// In-memory peer channel driven by a `PeerDriver` from the test body.
pub(crate) struct ChannelLink {
    inbox: mpsc::UnboundedReceiver<Result<String, PeerError>>,
    outbox: mpsc::UnboundedSender<Notice>,
}

#[async_trait]
impl PeerLink for ChannelLink {
    async fn send(&mut self, notice: &Notice) -> Result<(), PeerError> {
        self.outbox
            .send(notice.clone())
            .map_err(|_| PeerError::Disconnected)
    }

    async fn recv(&mut self) -> Result<String, PeerError> {
        match self.inbox.recv().await {
            Some(reply) => reply,
            None => Err(PeerError::Disconnected),
        }
    }

    async fn close(&mut self) {
        self.inbox.close();
    }
}

// Test-side handle: scripts replies and observes notices.
pub(crate) struct PeerDriver {
    replies: Option<mpsc::UnboundedSender<Result<String, PeerError>>>,
    notices: mpsc::UnboundedReceiver<Notice>,
}

impl PeerDriver {
    pub(crate) fn say(&self, text: &str) {
        if let Some(replies) = &self.replies {
            let _ = replies.send(Ok(text.to_string()));
        }
    }

    pub(crate) fn garble(&self) {
        if let Some(replies) = &self.replies {
            let _ = replies.send(Err(PeerError::Malformed("not json".to_string())));
        }
    }

    // Drops the reply side so the next read sees a closed channel.
    pub(crate) fn hang_up(&mut self) {
        self.replies = None;
    }

    // Refuses further notices so the next send to this peer fails.
    pub(crate) fn stop_listening(&mut self) {
        self.notices.close();
    }

    pub(crate) async fn next_notice(&mut self) -> Notice {
        tokio::time::timeout(Duration::from_secs(2), self.notices.recv())
            .await
            .expect("timed out waiting for notice")
            .expect("notice channel closed")
    }

    // Notices delivered so far, without waiting.
    pub(crate) fn drain(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            out.push(notice);
        }
        out
    }

    pub(crate) fn link_closed(&self) -> bool {
        self.replies.as_ref().is_none_or(|replies| replies.is_closed())
    }
}

pub(crate) fn scripted_peer(id: u64, name: &str) -> (Peer<ChannelLink>, PeerDriver) {
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let peer = Peer::new(
        id,
        name,
        ChannelLink {
            inbox: reply_rx,
            outbox: notice_tx,
        },
    );
    let driver = PeerDriver {
        replies: Some(reply_tx),
        notices: notice_rx,
    };
    (peer, driver)
}

#[derive(Clone, Default)]
pub(crate) struct RecordingRecorder {
    records: Arc<Mutex<Vec<MatchRecord>>>,
    fail: bool,
}

impl RecordingRecorder {
    pub(crate) fn failing() -> Self {
        Self {
            records: Arc::default(),
            fail: true,
        }
    }

    pub(crate) fn records(&self) -> Vec<MatchRecord> {
        self.records.lock().expect("records mutex poisoned").clone()
    }
}

#[async_trait]
impl MatchRecorder for RecordingRecorder {
    async fn record_match(&self, record: MatchRecord) -> Result<(), String> {
        if self.fail {
            return Err("record failed".to_string());
        }
        self.records
            .lock()
            .expect("records mutex poisoned")
            .push(record);
        Ok(())
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, String> {
        if self.fail {
            return Err("leaderboard unavailable".to_string());
        }
        Ok(Vec::new())
    }

    async fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>, String> {
        let records = self.records();
        Ok(records.into_iter().rev().take(limit).collect())
    }
}
