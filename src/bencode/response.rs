use crate::models::peer::Peer;
use std::collections::BTreeMap;
use std::net::IpAddr;

use super::encoder::{encode_bytes_header, BencodeEncode, DictWriter};

/// Announce timing advertised to clients
#[derive(Clone, Copy, Debug)]
pub struct AnnounceIntervals {
    pub interval: u32,
    pub min_interval: u32,
}

/// Aggregate swarm statistics for one scraped torrent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrapeEntry {
    /// Seeders
    pub complete: u32,
    /// Snatches
    pub downloaded: u32,
    /// Leechers
    pub incomplete: u32,
}

/// Build a bencode-encoded announce response
///
/// Compact responses split peers into `peers` (IPv4, 6 bytes each) and
/// `peers6` (IPv6, 18 bytes each); otherwise `peers` is a list of
/// `{ip, peer id, port}` dictionaries.
pub fn build_announce_response(
    peers: &[Peer],
    seeders: u32,
    leechers: u32,
    compact: bool,
    intervals: AnnounceIntervals,
) -> Vec<u8> {
    let per_peer = if compact { 6 } else { 50 };
    let mut buf = Vec::with_capacity(100 + peers.len() * per_peer);

    let mut dict = DictWriter::new(&mut buf);
    dict.entry("complete", &seeders)
        .entry("incomplete", &leechers)
        .entry("interval", &intervals.interval)
        .entry("min interval", &intervals.min_interval);

    if compact {
        dict.entry_with("peers", |b| encode_compact_peers_ipv4(peers, b))
            .entry_with("peers6", |b| encode_compact_peers_ipv6(peers, b));
    } else {
        dict.entry_with("peers", |b| encode_dict_peers(peers, b));
    }
    dict.finish();

    buf
}

/// Build a scrape response keyed by the canonical (hex) info hash
pub fn build_scrape_response(files: &BTreeMap<String, ScrapeEntry>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + files.len() * 96);

    let mut dict = DictWriter::new(&mut buf);
    dict.entry_with("files", |b| {
        let mut files_dict = DictWriter::new(b);
        for (info_hash, entry) in files {
            files_dict.entry_with(info_hash, |b| {
                let mut stats = DictWriter::new(b);
                stats
                    .entry("complete", &entry.complete)
                    .entry("downloaded", &entry.downloaded)
                    .entry("incomplete", &entry.incomplete);
                stats.finish();
            });
        }
        files_dict.finish();
    });
    dict.finish();

    buf
}

/// Build the `{"failure reason": <message>}` error body
pub fn build_error_response(message: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(24 + message.len());
    let mut dict = DictWriter::new(&mut buf);
    dict.entry("failure reason", message);
    dict.finish();
    buf
}

fn encode_compact_peers_ipv4(peers: &[Peer], buf: &mut Vec<u8>) {
    let count = peers.iter().filter(|p| p.ip.is_ipv4()).count();
    encode_bytes_header(count * 6, buf);

    for peer in peers {
        if let IpAddr::V4(ip) = peer.ip {
            buf.extend_from_slice(&ip.octets());
            buf.extend_from_slice(&peer.port.to_be_bytes());
        }
    }
}

fn encode_compact_peers_ipv6(peers: &[Peer], buf: &mut Vec<u8>) {
    let count = peers.iter().filter(|p| p.ip.is_ipv6()).count();
    encode_bytes_header(count * 18, buf);

    for peer in peers {
        if let IpAddr::V6(ip) = peer.ip {
            buf.extend_from_slice(&ip.octets());
            buf.extend_from_slice(&peer.port.to_be_bytes());
        }
    }
}

fn encode_dict_peers(peers: &[Peer], buf: &mut Vec<u8>) {
    buf.push(b'l');

    for peer in peers {
        let mut dict = DictWriter::new(buf);
        dict.entry("ip", &peer.ip.to_string())
            .entry("peer id", peer.peer_id.as_bytes().as_slice())
            .entry("port", &peer.port);
        dict.finish();
    }

    buf.push(b'e');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::info_hash::PeerId;
    use std::net::{Ipv4Addr, Ipv6Addr};

    const INTERVALS: AnnounceIntervals = AnnounceIntervals {
        interval: 1800,
        min_interval: 900,
    };

    fn peer(ip: IpAddr, port: u16) -> Peer {
        Peer::new(1, PeerId([b'a'; 20]), ip, port, 0, 0, 0, 0)
    }

    #[test]
    fn test_build_announce_response_compact() {
        let peers = vec![
            peer(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)), 6881),
            peer(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 51413),
        ];

        let response = build_announce_response(&peers, 5, 3, true, INTERVALS);

        let mut expected = b"d8:completei5e10:incompletei3e8:intervali1800e12:min intervali900e5:peers12:".to_vec();
        expected.extend_from_slice(&[192, 168, 1, 1]);
        expected.extend_from_slice(&6881u16.to_be_bytes());
        expected.extend_from_slice(&[10, 0, 0, 1]);
        expected.extend_from_slice(&51413u16.to_be_bytes());
        expected.extend_from_slice(b"6:peers60:e");

        assert_eq!(response, expected);
    }

    #[test]
    fn test_build_announce_response_dict() {
        let peers = vec![peer(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)), 6881)];

        let response = build_announce_response(&peers, 0, 1, false, INTERVALS);
        let text = String::from_utf8_lossy(&response);

        assert!(text.ends_with(
            "5:peersld2:ip11:192.168.1.17:peer id20:aaaaaaaaaaaaaaaaaaaa4:porti6881eeee"
        ));
        assert!(!text.contains("peers6"));
    }

    #[test]
    fn test_compact_ipv6_peers() {
        let v6 = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1);
        let peers = vec![
            peer(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)), 6881),
            peer(IpAddr::V6(v6), 6882),
        ];

        let mut buf = Vec::new();
        encode_compact_peers_ipv4(&peers, &mut buf);
        assert_eq!(&buf[0..2], b"6:");
        assert_eq!(buf.len(), 2 + 6);

        let mut buf = Vec::new();
        encode_compact_peers_ipv6(&peers, &mut buf);
        assert_eq!(&buf[0..3], b"18:");
        assert_eq!(&buf[3..19], &v6.octets());
        assert_eq!(&buf[19..21], &6882u16.to_be_bytes());
    }

    #[test]
    fn test_compact_peers_empty() {
        let mut buf = Vec::new();
        encode_compact_peers_ipv4(&[], &mut buf);
        assert_eq!(buf, b"0:");
    }

    #[test]
    fn test_build_scrape_response() {
        let mut files = BTreeMap::new();
        files.insert(
            "bb".to_string(),
            ScrapeEntry { complete: 0, downloaded: 5, incomplete: 0 },
        );
        files.insert(
            "aa".to_string(),
            ScrapeEntry { complete: 3, downloaded: 0, incomplete: 1 },
        );

        let response = build_scrape_response(&files);
        assert_eq!(
            response,
            b"d5:filesd2:aad8:completei3e10:downloadedi0e10:incompletei1ee\
              2:bbd8:completei0e10:downloadedi5e10:incompletei0eeee"
                .to_vec()
        );
    }

    #[test]
    fn test_build_scrape_response_empty() {
        assert_eq!(build_scrape_response(&BTreeMap::new()), b"d5:filesdee");
    }

    #[test]
    fn test_build_error_response() {
        assert_eq!(
            build_error_response("Malformed request"),
            b"d14:failure reason17:Malformed requeste"
        );
    }
}
