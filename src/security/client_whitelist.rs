use crate::core::error::StoreError;
use crate::models::info_hash::PeerId;
use crate::models::whitelist::WhiteListClient;
use crate::stores::store::Store;

/// Whether the client's peer id or User-Agent starts with a whitelisted prefix
pub fn matches_any(clients: &[WhiteListClient], peer_id: &PeerId, user_agent: Option<&str>) -> bool {
    clients.iter().any(|client| {
        let prefix = client.client_prefix.as_bytes();
        !prefix.is_empty()
            && (peer_id.as_bytes().starts_with(prefix)
                || user_agent.is_some_and(|ua| ua.as_bytes().starts_with(prefix)))
    })
}

/// Check an announcing client against the store's whitelist
pub async fn is_whitelisted(
    store: &dyn Store,
    peer_id: &PeerId,
    user_agent: Option<&str>,
) -> Result<bool, StoreError> {
    let clients = store.whitelist_get_all().await?;
    Ok(matches_any(&clients, peer_id, user_agent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::memory::MemoryStore;

    fn peer_id(s: &str) -> PeerId {
        PeerId::from_bytes(s.as_bytes()).unwrap()
    }

    #[test]
    fn test_prefix_match_on_peer_id() {
        let clients = vec![WhiteListClient::new("-qB", "qBittorrent")];

        assert!(matches_any(&clients, &peer_id("-qB4250-abcdefghijkl"), None));
        assert!(!matches_any(&clients, &peer_id("-TR3000-abcdefghijkl"), None));
    }

    #[test]
    fn test_prefix_match_on_user_agent() {
        let clients = vec![WhiteListClient::new("Transmission/", "Transmission")];
        let pid = peer_id("-XX0000-abcdefghijkl");

        assert!(matches_any(&clients, &pid, Some("Transmission/3.00")));
        assert!(!matches_any(&clients, &pid, Some("curl/8.0")));
        assert!(!matches_any(&clients, &pid, None));
    }

    #[test]
    fn test_empty_whitelist_matches_nothing() {
        assert!(!matches_any(&[], &peer_id("-qB4250-abcdefghijkl"), Some("qBittorrent")));
    }

    #[tokio::test]
    async fn test_is_whitelisted_reads_store() {
        let store = MemoryStore::new();
        let pid = peer_id("-qB4250-abcdefghijkl");
        assert!(!is_whitelisted(&store, &pid, None).await.unwrap());

        store
            .whitelist_add(WhiteListClient::new("-qB", "qBittorrent"))
            .await
            .unwrap();
        assert!(is_whitelisted(&store, &pid, None).await.unwrap());
    }
}
