use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::core::error::StoreError;
use crate::core::state::AppState;
use crate::models::torrent::TorrentStats;
use crate::stores::peer_store::SwarmDelta;

/// Insert the configured whitelist entries; entries already present are kept
pub async fn seed_whitelist(state: &AppState) -> Result<usize, StoreError> {
    let mut added = 0;
    for client in &state.config.whitelist {
        match state.store.whitelist_add(client.clone()).await {
            Ok(()) => added += 1,
            Err(StoreError::Duplicate) => {
                debug!(prefix = %client.client_prefix, "Whitelist entry already present");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(added)
}

/// Remove stale peers once, feeding the swarm changes into the stats batch
pub fn cleanup_once(state: &AppState) -> usize {
    let removed = state.peer_store.cleanup_stale_peers(state.config.tracker.peer_timeout);

    for (info_hash, peer) in &removed {
        let delta = SwarmDelta::left(peer.is_seeder);
        state.stats.record_torrent(TorrentStats {
            seeders: delta.seeders,
            leechers: delta.leechers,
            ..TorrentStats::new(*info_hash)
        });
    }

    removed.len()
}

/// Hand every pending delta to the store.
///
/// Deltas are drained before syncing; a failed sync drops them.
pub async fn flush_stats(state: &AppState) {
    let torrents = state.stats.drain_torrents();
    let users = state.stats.drain_users();

    if torrents.is_empty() && users.is_empty() {
        debug!("No stats to flush");
        return;
    }

    let (torrent_count, user_count) = (torrents.len(), users.len());

    if !torrents.is_empty() {
        if let Err(e) = state.store.torrent_sync(torrents).await {
            error!(error = %e, dropped = torrent_count, "Torrent stats sync failed");
        }
    }

    if !users.is_empty() {
        if let Err(e) = state.store.user_sync(users).await {
            error!(error = %e, dropped = user_count, "User stats sync failed");
        }
    }

    debug!(torrents = torrent_count, users = user_count, "Stats flushed");
}

/// Spawn a background task that periodically cleans up stale peers
pub fn spawn_cleanup_task(state: Arc<AppState>) {
    let period = Duration::from_secs(state.config.tracker.cleanup_interval);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;

            debug!("Running peer cleanup");
            let removed = cleanup_once(&state);

            if removed > 0 {
                info!(
                    removed_peers = removed,
                    active_peers = state.peer_store.total_peers(),
                    active_torrents = state.peer_store.active_torrents(),
                    "Peer cleanup completed"
                );
            } else {
                debug!("Peer cleanup completed, no stale peers found");
            }
        }
    });
}

/// Spawn a background task that periodically flushes the stats batch
pub fn spawn_flush_task(state: Arc<AppState>) {
    let period = Duration::from_secs(state.config.tracker.sync_interval);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            flush_stats(&state).await;
        }
    });
}

/// Run the final flush and release the store
pub async fn shutdown(state: &AppState) {
    flush_stats(state).await;

    if let Err(e) = state.store.close().await {
        warn!(error = %e, "Failed to close store cleanly");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::models::info_hash::{InfoHash, PeerId};
    use crate::models::peer::Peer;
    use crate::models::user::{User, UserStats};
    use crate::models::whitelist::WhiteListClient;
    use crate::stores::memory::MemoryStore;
    use std::net::{IpAddr, Ipv4Addr};

    fn create_test_state() -> AppState {
        let config: Config = toml::from_str(
            r#"
            [admin]
            api_key = "k"

            [[whitelist]]
            prefix = "-qB"
            name = "qBittorrent"

            [[whitelist]]
            prefix = "-TR"
            name = "Transmission"
            "#,
        )
        .unwrap();
        AppState::new(config, Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_seed_whitelist_is_idempotent() {
        let state = create_test_state();
        state
            .store
            .whitelist_add(WhiteListClient::new("-TR", "Transmission"))
            .await
            .unwrap();

        assert_eq!(seed_whitelist(&state).await.unwrap(), 1);
        assert_eq!(seed_whitelist(&state).await.unwrap(), 0);
        assert_eq!(state.store.whitelist_get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_flush_applies_and_drains() {
        let state = create_test_state();
        let ih = InfoHash([3; 20]);
        state.store.torrent_add(ih).await.unwrap();
        let role = state
            .store
            .role_add(crate::models::role::Role::new("Member".into(), 1))
            .await
            .unwrap();
        state
            .store
            .user_add(User::new("carol".into(), "pk".into(), role.role_id))
            .await
            .unwrap();

        state.stats.record_torrent(TorrentStats { seeders: 2, snatches: 1, ..TorrentStats::new(ih) });
        state.stats.record_user(UserStats { uploaded: 42, announces: 1, ..UserStats::new("pk".into()) });

        flush_stats(&state).await;
        assert!(state.stats.is_empty());

        let torrent = state.store.torrent_get(&ih, false).await.unwrap();
        assert_eq!((torrent.seeders, torrent.snatches), (2, 1));
        let user = state.store.user_get_by_passkey("pk").await.unwrap();
        assert_eq!(user.uploaded, 42);

        // Nothing is applied twice
        flush_stats(&state).await;
        let torrent = state.store.torrent_get(&ih, false).await.unwrap();
        assert_eq!(torrent.seeders, 2);
    }

    #[tokio::test]
    async fn test_cleanup_records_departures() {
        let state = create_test_state();
        let ih = InfoHash([4; 20]);
        let peer = Peer::new(
            1,
            PeerId([9; 20]),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            6881,
            0,
            0,
            0,
            0,
        );
        state.peer_store.upsert_peer(ih, peer);

        assert_eq!(cleanup_once(&state), 1);
        assert_eq!(state.peer_store.total_peers(), 0);

        let pending = state.stats.drain_torrents();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].seeders, -1);
    }
}
