use crate::models::info_hash::{InfoHash, PeerId};
use crate::models::peer::Peer;
use crate::utils::time::{current_timestamp, is_expired};
use dashmap::DashMap;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct SwarmCounters {
    seeders: AtomicU32,
    leechers: AtomicU32,
}

impl SwarmCounters {
    fn counter(&self, seeder: bool) -> &AtomicU32 {
        if seeder {
            &self.seeders
        } else {
            &self.leechers
        }
    }

    fn increment(&self, seeder: bool) {
        self.counter(seeder).fetch_add(1, Ordering::Relaxed);
    }

    fn decrement(&self, seeder: bool) {
        let _ = self
            .counter(seeder)
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }
}

/// Change in a swarm's seeder/leecher counts caused by one mutation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwarmDelta {
    pub seeders: i64,
    pub leechers: i64,
}

impl SwarmDelta {
    pub fn joined(seeder: bool) -> Self {
        if seeder {
            Self { seeders: 1, leechers: 0 }
        } else {
            Self { seeders: 0, leechers: 1 }
        }
    }

    pub fn left(seeder: bool) -> Self {
        let joined = Self::joined(seeder);
        Self {
            seeders: -joined.seeders,
            leechers: -joined.leechers,
        }
    }
}

/// In-memory swarms, one per torrent, with live seeder/leecher counters
pub struct PeerStore {
    peers: DashMap<InfoHash, DashMap<PeerId, Peer>>,
    stats: DashMap<InfoHash, Arc<SwarmCounters>>,
}

impl PeerStore {
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
            stats: DashMap::new(),
        }
    }

    fn counters(&self, info_hash: InfoHash) -> Arc<SwarmCounters> {
        Arc::clone(&self.stats.entry(info_hash).or_default())
    }

    /// Insert or replace a peer, returning the record it replaced.
    ///
    /// The swarm entry stays locked for the whole update, so the traffic
    /// deltas stored on `peer` are measured against exactly the record
    /// being replaced.
    pub fn upsert_peer(&self, info_hash: InfoHash, mut peer: Peer) -> (Option<Peer>, SwarmDelta) {
        let swarm = self.peers.entry(info_hash).or_default();
        let counters = self.counters(info_hash);
        let is_seeder = peer.is_seeder;

        let (uploaded, downloaded) = {
            let existing = swarm.get(&peer.peer_id);
            peer.deltas_since(existing.as_deref())
        };
        peer.uploaded_delta = uploaded;
        peer.downloaded_delta = downloaded;

        let previous = swarm.insert(peer.peer_id, peer);

        let delta = match &previous {
            None => {
                counters.increment(is_seeder);
                SwarmDelta::joined(is_seeder)
            }
            Some(old) if old.is_seeder != is_seeder => {
                counters.decrement(old.is_seeder);
                counters.increment(is_seeder);
                let left = SwarmDelta::left(old.is_seeder);
                let joined = SwarmDelta::joined(is_seeder);
                SwarmDelta {
                    seeders: left.seeders + joined.seeders,
                    leechers: left.leechers + joined.leechers,
                }
            }
            Some(_) => SwarmDelta::default(),
        };

        (previous, delta)
    }

    /// Remove a peer from its swarm, dropping the swarm once it is empty
    pub fn remove_peer(&self, info_hash: InfoHash, peer_id: &PeerId) -> Option<(Peer, SwarmDelta)> {
        let removed = {
            let swarm = self.peers.get(&info_hash)?;
            let (_, removed) = swarm.remove(peer_id)?;
            if let Some(counters) = self.stats.get(&info_hash) {
                counters.decrement(removed.is_seeder);
            }
            removed
        };

        self.peers.remove_if(&info_hash, |_, swarm| self.prune_if_empty(&info_hash, swarm));

        let delta = SwarmDelta::left(removed.is_seeder);
        Some((removed, delta))
    }

    /// Called with the swarm's shard write-locked, so no peer can join
    /// between the emptiness check and the counter removal.
    fn prune_if_empty(&self, info_hash: &InfoHash, swarm: &DashMap<PeerId, Peer>) -> bool {
        if swarm.is_empty() {
            self.stats.remove(info_hash);
            true
        } else {
            false
        }
    }

    pub fn get_peer(&self, info_hash: InfoHash, peer_id: &PeerId) -> Option<Peer> {
        self.peers
            .get(&info_hash)?
            .get(peer_id)
            .map(|p| p.value().clone())
    }

    /// Random selection of at most `num_want` peers, excluding the requester
    pub fn get_peers(&self, info_hash: InfoHash, num_want: usize, exclude: &PeerId) -> Vec<Peer> {
        let mut peers: Vec<Peer> = match self.peers.get(&info_hash) {
            Some(map) => map
                .iter()
                .filter(|entry| entry.key() != exclude)
                .map(|entry| entry.value().clone())
                .collect(),
            None => return Vec::new(),
        };

        peers.shuffle(&mut rand::rng());
        peers.truncate(num_want);
        peers
    }

    /// Live (seeders, leechers) for a torrent
    pub fn get_stats(&self, info_hash: InfoHash) -> (u32, u32) {
        match self.stats.get(&info_hash) {
            Some(stats) => (
                stats.seeders.load(Ordering::Relaxed),
                stats.leechers.load(Ordering::Relaxed),
            ),
            None => (0, 0),
        }
    }

    /// Drop peers that have not announced within `timeout` seconds
    pub fn cleanup_stale_peers(&self, timeout: i64) -> Vec<(InfoHash, Peer)> {
        let now = current_timestamp();
        let mut removed = Vec::new();

        for swarm in self.peers.iter() {
            let info_hash = *swarm.key();

            let stale: Vec<PeerId> = swarm
                .value()
                .iter()
                .filter(|entry| is_expired(entry.value().last_announce, timeout, now))
                .map(|entry| *entry.key())
                .collect();

            for peer_id in stale {
                if let Some((_, peer)) = swarm.value().remove(&peer_id) {
                    if let Some(counters) = self.stats.get(&info_hash) {
                        counters.decrement(peer.is_seeder);
                    }
                    removed.push((info_hash, peer));
                }
            }
        }

        self.peers
            .retain(|info_hash, swarm| !self.prune_if_empty(info_hash, swarm));
        removed
    }

    pub fn total_peers(&self) -> usize {
        self.peers.iter().map(|entry| entry.value().len()).sum()
    }

    /// Number of torrents with at least one peer
    pub fn active_torrents(&self) -> usize {
        self.peers.len()
    }

    /// Number of torrents with live counters
    pub fn tracked_counters(&self) -> usize {
        self.stats.len()
    }
}

impl Default for PeerStore {
    fn default() -> Self {
        Self::new()
    }
}
