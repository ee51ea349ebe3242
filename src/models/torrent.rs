use crate::models::info_hash::InfoHash;
use crate::utils::time::current_timestamp;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Torrent {
    /// 20-byte SHA-1 info hash, primary key
    pub info_hash: InfoHash,
    /// Peers holding the complete file
    pub seeders: u32,
    /// Peers still downloading
    pub leechers: u32,
    /// Completed download events
    pub snatches: u32,
    pub uploaded: u64,
    pub downloaded: u64,
    pub announces: u64,
    /// Soft-delete flag; durable drivers keep the row for ratio history
    pub is_deleted: bool,
    pub created_on: i64,
    pub updated_on: i64,
}

impl Torrent {
    pub fn new(info_hash: InfoHash) -> Self {
        let now = current_timestamp();
        Self {
            info_hash,
            seeders: 0,
            leechers: 0,
            snatches: 0,
            uploaded: 0,
            downloaded: 0,
            announces: 0,
            is_deleted: false,
            created_on: now,
            updated_on: now,
        }
    }
}

/// Additive counter deltas for one torrent, applied by `Store::torrent_sync`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TorrentStats {
    pub info_hash: InfoHash,
    pub seeders: i64,
    pub leechers: i64,
    pub snatches: u32,
    pub uploaded: u64,
    pub downloaded: u64,
    pub announces: u64,
}

impl TorrentStats {
    pub fn new(info_hash: InfoHash) -> Self {
        Self {
            info_hash,
            ..Default::default()
        }
    }

    pub fn merge(&mut self, other: &TorrentStats) {
        self.seeders = self.seeders.saturating_add(other.seeders);
        self.leechers = self.leechers.saturating_add(other.leechers);
        self.snatches = self.snatches.saturating_add(other.snatches);
        self.uploaded = self.uploaded.saturating_add(other.uploaded);
        self.downloaded = self.downloaded.saturating_add(other.downloaded);
        self.announces = self.announces.saturating_add(other.announces);
    }

    pub fn apply_to(&self, torrent: &mut Torrent) {
        torrent.seeders = apply_signed(torrent.seeders, self.seeders);
        torrent.leechers = apply_signed(torrent.leechers, self.leechers);
        torrent.snatches = torrent.snatches.saturating_add(self.snatches);
        torrent.uploaded = torrent.uploaded.saturating_add(self.uploaded);
        torrent.downloaded = torrent.downloaded.saturating_add(self.downloaded);
        torrent.announces = torrent.announces.saturating_add(self.announces);
    }
}

fn apply_signed(value: u32, delta: i64) -> u32 {
    (value as i64 + delta).clamp(0, u32::MAX as i64) as u32
}
