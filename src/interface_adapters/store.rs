// In-memory match history and leaderboard behind the `MatchRecorder` port.

use crate::domain::{LeaderboardEntry, MatchRecord, MatchRecorder};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

/// Most recent matches kept for the history route. Older ones only live on in
/// the leaderboard totals.
pub const MATCH_HISTORY_CAPACITY: usize = 200;

#[derive(Default)]
struct Tables {
    // Oldest first.
    matches: VecDeque<MatchRecord>,
    // name -> (wins, games)
    players: HashMap<String, (u32, u32)>,
}

pub struct InMemoryMatchStore {
    tables: Mutex<Tables>,
    history_capacity: usize,
}

impl Default for InMemoryMatchStore {
    fn default() -> Self {
        Self::with_history_capacity(MATCH_HISTORY_CAPACITY)
    }
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_capacity(history_capacity: usize) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            history_capacity,
        }
    }
}

#[async_trait]
impl MatchRecorder for InMemoryMatchStore {
    async fn record_match(&self, record: MatchRecord) -> Result<(), String> {
        let mut tables = self.tables.lock().await;

        for name in &record.players {
            tables.players.entry(name.clone()).or_default().1 += 1;
        }
        if let Some(winner) = &record.winner {
            tables.players.entry(winner.clone()).or_default().0 += 1;
        }
        if tables.matches.len() >= self.history_capacity {
            tables.matches.pop_front();
        }
        tables.matches.push_back(record);
        Ok(())
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, String> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<LeaderboardEntry> = tables
            .players
            .iter()
            .map(|(name, (wins, games))| LeaderboardEntry {
                name: name.clone(),
                wins: *wins,
                games: *games,
            })
            .collect();
        entries.sort_by(|a, b| b.wins.cmp(&a.wins).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    async fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>, String> {
        let tables = self.tables.lock().await;
        Ok(tables.matches.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, players: [&str; 2], winner: Option<&str>) -> MatchRecord {
        MatchRecord {
            session_id: id,
            players: players.map(str::to_string),
            scores: [0, 0],
            rounds: 1,
            winner: winner.map(str::to_string),
            abandoned: false,
        }
    }

    #[tokio::test]
    async fn when_matches_are_recorded_then_leaderboard_counts_session_wins() {
        let store = InMemoryMatchStore::new();
        store
            .record_match(record(1, ["alice", "bob"], Some("alice")))
            .await
            .expect("record");
        store
            .record_match(record(2, ["bob", "carol"], Some("bob")))
            .await
            .expect("record");
        store
            .record_match(record(3, ["alice", "carol"], Some("alice")))
            .await
            .expect("record");

        let board = store.leaderboard().await.expect("leaderboard");

        assert_eq!(
            board,
            vec![
                LeaderboardEntry {
                    name: "alice".to_string(),
                    wins: 2,
                    games: 2
                },
                LeaderboardEntry {
                    name: "bob".to_string(),
                    wins: 1,
                    games: 2
                },
                LeaderboardEntry {
                    name: "carol".to_string(),
                    wins: 0,
                    games: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn when_session_is_tied_then_nobody_gains_a_win() {
        let store = InMemoryMatchStore::new();
        store
            .record_match(record(1, ["alice", "bob"], None))
            .await
            .expect("record");

        let board = store.leaderboard().await.expect("leaderboard");

        assert!(board.iter().all(|entry| entry.wins == 0 && entry.games == 1));
    }

    #[tokio::test]
    async fn when_recent_matches_are_listed_then_newest_come_first() {
        let store = InMemoryMatchStore::new();
        for id in 1..=3 {
            store
                .record_match(record(id, ["a", "b"], None))
                .await
                .expect("record");
        }

        let recent = store.recent_matches(2).await.expect("recent");

        let ids: Vec<u64> = recent.iter().map(|r| r.session_id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn when_history_is_full_then_oldest_match_is_dropped_but_totals_remain() {
        let store = InMemoryMatchStore::with_history_capacity(2);
        for id in 1..=3 {
            store
                .record_match(record(id, ["a", "b"], Some("a")))
                .await
                .expect("record");
        }

        let recent = store.recent_matches(10).await.expect("recent");
        let ids: Vec<u64> = recent.iter().map(|r| r.session_id).collect();
        assert_eq!(ids, vec![3, 2]);

        let board = store.leaderboard().await.expect("leaderboard");
        assert_eq!(board[0].name, "a");
        assert_eq!(board[0].wins, 3);
    }
}
