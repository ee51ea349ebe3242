use crate::models::info_hash::InfoHash;
use crate::models::torrent::TorrentStats;
use crate::models::user::UserStats;
use dashmap::DashMap;

/// Pending counter deltas waiting for the next periodic flush.
///
/// Recording merges additively per key; draining removes each entry exactly
/// once, so a delta reaches the store at most once.
#[derive(Default)]
pub struct StatsBatch {
    torrents: DashMap<InfoHash, TorrentStats>,
    users: DashMap<String, UserStats>,
}

impl StatsBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_torrent(&self, stats: TorrentStats) {
        self.torrents
            .entry(stats.info_hash)
            .and_modify(|pending| pending.merge(&stats))
            .or_insert(stats);
    }

    pub fn record_user(&self, stats: UserStats) {
        self.users
            .entry(stats.passkey.clone())
            .and_modify(|pending| pending.merge(&stats))
            .or_insert(stats);
    }

    pub fn drain_torrents(&self) -> Vec<TorrentStats> {
        let keys: Vec<InfoHash> = self.torrents.iter().map(|e| *e.key()).collect();
        keys.into_iter()
            .filter_map(|k| self.torrents.remove(&k).map(|(_, v)| v))
            .collect()
    }

    pub fn drain_users(&self) -> Vec<UserStats> {
        let keys: Vec<String> = self.users.iter().map(|e| e.key().clone()).collect();
        keys.into_iter()
            .filter_map(|k| self.users.remove(&k).map(|(_, v)| v))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.torrents.is_empty() && self.users.is_empty()
    }
}
