use crate::bencode::response::{build_scrape_response, ScrapeEntry};
use crate::core::error::{ErrorCode, StoreError, TrackerError};
use crate::core::state::AppState;
use crate::handlers::announce::tracker_response;
use crate::models::info_hash::InfoHash;
use crate::security::auth_gate::authenticate;
use crate::validation::params::{passkey_from_query, Query};
use axum::{
    extract::{Path, RawQuery, State},
    http::Uri,
    response::Response,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// GET /scrape
#[instrument(skip_all)]
pub async fn scrape_handler(
    State(state): State<Arc<AppState>>,
    RawQuery(raw_query): RawQuery,
    uri: Uri,
) -> Response {
    let raw_query = raw_query.unwrap_or_default();
    tracker_response(handle_scrape(&state, &raw_query, None).await, &uri)
}

/// GET /scrape/{passkey}
#[instrument(skip_all)]
pub async fn scrape_passkey_handler(
    State(state): State<Arc<AppState>>,
    Path(passkey): Path<String>,
    RawQuery(raw_query): RawQuery,
    uri: Uri,
) -> Response {
    let raw_query = raw_query.unwrap_or_default();
    tracker_response(handle_scrape(&state, &raw_query, Some(passkey)).await, &uri)
}

/// Aggregate statistics for every requested torrent that exists.
///
/// Undecodable and unknown hashes are skipped individually; a request
/// without any `info_hash` is rejected rather than answered with every torrent.
pub async fn handle_scrape(
    state: &AppState,
    raw_query: &str,
    path_passkey: Option<String>,
) -> Result<Vec<u8>, TrackerError> {
    let passkey = path_passkey.or_else(|| passkey_from_query(raw_query));
    authenticate(state.store.as_ref(), state.config.tracker.public, passkey.as_deref()).await?;

    let query = Query::parse(raw_query);

    if query.info_hashes.is_empty() {
        return Err(ErrorCode::MalformedRequest.into());
    }

    let mut files = BTreeMap::new();
    for raw in &query.info_hashes {
        let Ok(info_hash) = InfoHash::from_bytes(raw) else {
            debug!(len = raw.len(), "Skipping undecodable info_hash in scrape");
            continue;
        };

        let torrent = match state.store.torrent_get(&info_hash, false).await {
            Ok(torrent) => torrent,
            Err(StoreError::NotFound) => {
                debug!(info_hash = %info_hash, "Skipping unknown torrent in scrape");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        files.insert(
            info_hash.to_string(),
            ScrapeEntry {
                complete: torrent.seeders,
                downloaded: torrent.snatches,
                incomplete: torrent.leechers,
            },
        );
    }

    debug!(requested = query.info_hashes.len(), found = files.len(), "Scrape completed");

    Ok(build_scrape_response(&files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::models::user::User;
    use crate::stores::memory::MemoryStore;

    const IH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const IH_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const IH_C: &str = "cccccccccccccccccccccccccccccccccccccccc";

    async fn create_test_state() -> AppState {
        let config: Config = toml::from_str("[admin]\napi_key = \"k\"").unwrap();
        let state = AppState::new(config, Arc::new(MemoryStore::new()));

        let role = state
            .store
            .role_add(crate::models::role::Role::new("Member".into(), 1))
            .await
            .unwrap();
        state
            .store
            .user_add(User::new("bob".into(), "pk".into(), role.role_id))
            .await
            .unwrap();

        for (hex, seeders, leechers, snatches) in [(IH_A, 3, 1, 0), (IH_B, 0, 0, 5)] {
            let ih: InfoHash = hex.parse().unwrap();
            state.store.torrent_add(ih).await.unwrap();
            let mut torrent = state.store.torrent_get(&ih, false).await.unwrap();
            torrent.seeders = seeders;
            torrent.leechers = leechers;
            torrent.snatches = snatches;
            state.store.torrent_save(&torrent).await.unwrap();
        }
        state
    }

    #[tokio::test]
    async fn test_scrape_skips_unknown_hashes() {
        let state = create_test_state().await;
        let raw = format!("passkey=pk&info_hash={IH_A}&info_hash={IH_B}&info_hash={IH_C}");

        let body = handle_scrape(&state, &raw, None).await.unwrap();

        let expected = format!(
            "d5:filesd40:{IH_A}d8:completei3e10:downloadedi0e10:incompletei1ee\
             40:{IH_B}d8:completei0e10:downloadedi5e10:incompletei0eeee"
        );
        assert_eq!(body, expected.into_bytes());
    }

    #[tokio::test]
    async fn test_scrape_skips_undecodable_hashes() {
        let state = create_test_state().await;
        let raw = format!("info_hash=short&info_hash={IH_B}");

        let body = handle_scrape(&state, &raw, Some("pk".into())).await.unwrap();
        assert!(body.starts_with(format!("d5:filesd40:{IH_B}").as_bytes()));
    }

    #[tokio::test]
    async fn test_scrape_skips_malformed_percent_encoding() {
        let state = create_test_state().await;
        let raw = format!("passkey=pk&info_hash=%zz&info_hash={IH_A}");

        let body = handle_scrape(&state, &raw, None).await.unwrap();

        let expected = format!(
            "d5:filesd40:{IH_A}d8:completei3e10:downloadedi0e10:incompletei1eeee"
        );
        assert_eq!(body, expected.into_bytes());
    }

    #[tokio::test]
    async fn test_scrape_without_info_hash_is_malformed() {
        let state = create_test_state().await;
        let err = handle_scrape(&state, "passkey=pk", None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedRequest);
    }

    #[tokio::test]
    async fn test_scrape_hides_deleted_torrents() {
        let state = create_test_state().await;
        state.store.torrent_delete(&IH_A.parse().unwrap(), false).await.unwrap();

        let raw = format!("passkey=pk&info_hash={IH_A}");
        let body = handle_scrape(&state, &raw, None).await.unwrap();
        assert_eq!(body, b"d5:filesdee".to_vec());
    }

    #[tokio::test]
    async fn test_scrape_requires_auth() {
        let state = create_test_state().await;
        let raw = format!("info_hash={IH_A}");
        let err = handle_scrape(&state, &raw, None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidAuth);
    }
}
