use crate::bencode::response::{build_announce_response, AnnounceIntervals};
use crate::core::error::{ErrorCode, StoreError, TrackerError};
use crate::core::state::AppState;
use crate::models::peer::Peer;
use crate::models::role::Role;
use crate::models::torrent::TorrentStats;
use crate::models::user::{User, UserStats};
use crate::security::auth_gate::authenticate;
use crate::security::client_whitelist::is_whitelisted;
use crate::security::ip_resolver::resolve_ip;
use crate::security::role_policy::{self, Direction};
use crate::stores::peer_store::SwarmDelta;
use crate::utils::time::current_timestamp;
use crate::validation::params::{passkey_from_query, AnnounceEvent, AnnounceRequest, Query};
use axum::{
    extract::{ConnectInfo, Path, RawQuery, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// GET /announce
#[instrument(skip_all, fields(remote = %addr))]
pub async fn announce_handler(
    State(state): State<Arc<AppState>>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
    uri: Uri,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    let raw_query = raw_query.unwrap_or_default();
    let result = handle_announce(&state, &raw_query, None, &headers, &addr.to_string()).await;
    tracker_response(result, &uri)
}

/// GET /announce/{passkey}
#[instrument(skip_all, fields(remote = %addr))]
pub async fn announce_passkey_handler(
    State(state): State<Arc<AppState>>,
    Path(passkey): Path<String>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
    uri: Uri,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    let raw_query = raw_query.unwrap_or_default();
    let result =
        handle_announce(&state, &raw_query, Some(passkey), &headers, &addr.to_string()).await;
    tracker_response(result, &uri)
}

/// Turn a tracker result into a bencoded response, logging failures
pub fn tracker_response(result: Result<Vec<u8>, TrackerError>, uri: &Uri) -> Response {
    match result {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            body,
        )
            .into_response(),
        Err(e) => {
            let code = e.code();
            error!(
                code = code.code(),
                message = code.message(),
                uri = %uri,
                "Tracker request failed"
            );
            e.into_response()
        }
    }
}

/// Process one announce.
///
/// Order: authenticate, parse, validate, resolve the IP, check the client
/// whitelist, check the role policy, locate (or register) the torrent.
/// Nothing is mutated until every check has passed.
pub async fn handle_announce(
    state: &AppState,
    raw_query: &str,
    path_passkey: Option<String>,
    headers: &HeaderMap,
    remote_addr: &str,
) -> Result<Vec<u8>, TrackerError> {
    let tracker = &state.config.tracker;
    let store = state.store.as_ref();

    let passkey = path_passkey.or_else(|| passkey_from_query(raw_query));
    let user = authenticate(store, tracker.public, passkey.as_deref()).await?;

    let query = Query::parse(raw_query);
    let req = AnnounceRequest::from_query(&query, tracker.max_numwant)?;
    let ip = resolve_ip(&query, headers, remote_addr, tracker.allow_client_ip)?;

    if tracker.enforce_whitelist {
        let user_agent = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok());
        if !is_whitelisted(store, &req.peer_id, user_agent).await? {
            warn!(peer_id = ?req.peer_id, user_agent = ?user_agent, "Client not whitelisted");
            return Err(ErrorCode::BadClient.into());
        }
    }

    let role = role_for(state, &user).await?;
    let direction = Direction::from_left(req.left);
    if !role_policy::is_permitted(&role, &user, direction) {
        warn!(
            user_id = user.user_id,
            role_id = role.role_id,
            direction = ?direction,
            "Role does not permit announce direction"
        );
        return Err(ErrorCode::BadClient.into());
    }

    ensure_torrent(state, &req).await?;

    let mut peer = Peer::new(
        user.user_id,
        req.peer_id,
        ip,
        req.port,
        req.uploaded,
        req.downloaded,
        req.left,
        current_timestamp(),
    );

    // Deltas are measured against the record this announce actually replaced
    let snatched = req.event == Some(AnnounceEvent::Completed);
    let (previous, swarm_delta) = match req.event {
        Some(AnnounceEvent::Stopped) => {
            info!(user_id = user.user_id, info_hash = %req.info_hash, "Peer stopped");
            match state.peer_store.remove_peer(req.info_hash, &req.peer_id) {
                Some((removed, delta)) => (Some(removed), delta),
                None => (None, SwarmDelta::default()),
            }
        }
        _ => {
            if snatched {
                peer.is_seeder = true;
                info!(user_id = user.user_id, info_hash = %req.info_hash, "Peer completed download");
            }
            state.peer_store.upsert_peer(req.info_hash, peer.clone())
        }
    };
    let (uploaded_delta, downloaded_delta) = peer.deltas_since(previous.as_ref());

    record_stats(
        state,
        &req,
        &user,
        &role,
        swarm_delta,
        snatched,
        (uploaded_delta, downloaded_delta),
    );

    let peers = if req.event == Some(AnnounceEvent::Stopped) {
        Vec::new()
    } else {
        state
            .peer_store
            .get_peers(req.info_hash, req.numwant, &req.peer_id)
    };
    let (seeders, leechers) = state.peer_store.get_stats(req.info_hash);

    debug!(
        info_hash = %req.info_hash,
        seeders,
        leechers,
        peers_returned = peers.len(),
        "Building announce response"
    );

    Ok(build_announce_response(
        &peers,
        seeders,
        leechers,
        req.compact,
        AnnounceIntervals {
            interval: tracker.announce_interval,
            min_interval: tracker.min_announce_interval,
        },
    ))
}

/// Fail with 480 for unknown torrents unless auto-registration is enabled
async fn ensure_torrent(state: &AppState, req: &AnnounceRequest) -> Result<(), TrackerError> {
    match state.store.torrent_get(&req.info_hash, false).await {
        Ok(_) => Ok(()),
        Err(StoreError::NotFound) if state.config.tracker.auto_register => {
            match state.store.torrent_add(req.info_hash).await {
                Ok(()) => {
                    info!(info_hash = %req.info_hash, "Torrent registered on first announce");
                    Ok(())
                }
                // Raced with a concurrent first announce
                Err(StoreError::Duplicate) => Ok(()),
                Err(e) => Err(e.into()),
            }
        }
        Err(StoreError::NotFound) => Err(ErrorCode::InfoHashNotFound.into()),
        Err(e) => Err(e.into()),
    }
}

async fn role_for(state: &AppState, user: &User) -> Result<Role, TrackerError> {
    if user.is_public_sentinel() {
        return Ok(Role::unrestricted());
    }
    Ok(state.store.role_get_by_id(user.role_id).await?)
}

fn record_stats(
    state: &AppState,
    req: &AnnounceRequest,
    user: &User,
    role: &Role,
    swarm: SwarmDelta,
    snatched: bool,
    (uploaded, downloaded): (u64, u64),
) {
    state.stats.record_torrent(TorrentStats {
        seeders: swarm.seeders,
        leechers: swarm.leechers,
        snatches: u32::from(snatched),
        uploaded,
        downloaded,
        announces: 1,
        ..TorrentStats::new(req.info_hash)
    });

    if user.is_public_sentinel() {
        return;
    }

    let (credited_up, credited_down) = role_policy::credit(role, uploaded, downloaded);
    state.stats.record_user(UserStats {
        uploaded: credited_up,
        downloaded: credited_down,
        announces: 1,
        ..UserStats::new(user.passkey.clone())
    });
}
