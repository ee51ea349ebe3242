use crate::models::info_hash::PeerId;
use std::net::IpAddr;

/// Represents an active peer inside a torrent's swarm
#[derive(Clone, Debug)]
pub struct Peer {
    /// Owning user, `0` for the public-mode sentinel
    pub user_id: u32,
    /// 20-byte peer identifier
    pub peer_id: PeerId,
    /// IP address (IPv4 or IPv6)
    pub ip: IpAddr,
    /// Port number
    pub port: u16,
    /// Session upload total as last reported by the client
    pub uploaded: u64,
    /// Session download total as last reported by the client
    pub downloaded: u64,
    /// Upload delta credited by the latest announce
    pub uploaded_delta: u64,
    /// Download delta credited by the latest announce
    pub downloaded_delta: u64,
    /// Bytes left to download (0 for seeders)
    pub left: u64,
    /// Unix timestamp of last announce
    pub last_announce: i64,
    /// Whether this peer is a seeder (left == 0)
    pub is_seeder: bool,
}

impl Peer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: u32,
        peer_id: PeerId,
        ip: IpAddr,
        port: u16,
        uploaded: u64,
        downloaded: u64,
        left: u64,
        last_announce: i64,
    ) -> Self {
        Self {
            user_id,
            peer_id,
            ip,
            port,
            uploaded,
            downloaded,
            uploaded_delta: 0,
            downloaded_delta: 0,
            left,
            last_announce,
            is_seeder: left == 0,
        }
    }

    /// Traffic since `previous` was recorded.
    ///
    /// Clients report cumulative session totals, so a restarted session
    /// (totals going backwards) credits the new totals as-is.
    pub fn deltas_since(&self, previous: Option<&Peer>) -> (u64, u64) {
        match previous {
            Some(prev) => (
                session_delta(prev.uploaded, self.uploaded),
                session_delta(prev.downloaded, self.downloaded),
            ),
            None => (self.uploaded, self.downloaded),
        }
    }
}

fn session_delta(previous: u64, current: u64) -> u64 {
    if current >= previous {
        current - previous
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn peer(uploaded: u64, downloaded: u64) -> Peer {
        Peer::new(
            1,
            PeerId([1u8; 20]),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            6881,
            uploaded,
            downloaded,
            10,
            0,
        )
    }

    #[test]
    fn test_first_announce_credits_reported_totals() {
        assert_eq!(peer(100, 50).deltas_since(None), (100, 50));
    }

    #[test]
    fn test_deltas_against_previous_announce() {
        let old = peer(100, 50);
        assert_eq!(peer(300, 80).deltas_since(Some(&old)), (200, 30));
    }

    #[test]
    fn test_restarted_session_credits_new_totals() {
        let old = peer(1000, 1000);
        assert_eq!(peer(20, 10).deltas_since(Some(&old)), (20, 10));
    }

    #[test]
    fn test_seeder_flag_follows_left() {
        let mut p = peer(0, 0);
        assert!(!p.is_seeder);
        p = Peer::new(1, PeerId([1u8; 20]), IpAddr::V4(Ipv4Addr::LOCALHOST), 1, 0, 0, 0, 0);
        assert!(p.is_seeder);
    }
}
