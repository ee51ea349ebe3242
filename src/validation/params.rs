use crate::core::error::ErrorCode;
use crate::models::info_hash::{InfoHash, PeerId};
use percent_encoding::percent_decode_str;
use tracing::debug;

/// Peers returned when the client does not ask for a specific amount
pub const DEFAULT_NUMWANT: usize = 30;

/// Ports commonly abused or used by other services; announces on them are refused
const BLACKLISTED_PORTS: &[u16] = &[
    // Kazaa
    1214,
    // Microsoft WBT Server (Remote Desktop)
    3389,
    // eDonkey 2000
    4662,
    // Gnutella
    6346, 6347,
    // WinMX, Napster
    6699,
    // HTTP alternates
    8080, 8081,
];

/// Raw announce/scrape parameters, decoded but not yet validated.
///
/// Decoding is lenient: a malformed `%` escape is kept literally, so a bad
/// value only fails the field it belongs to. Numeric fields that fail to
/// parse fall back to their defaults here; protocol-required fields are
/// checked by [`AnnounceRequest::from_query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Every `info_hash` occurrence in request order
    pub info_hashes: Vec<Vec<u8>>,
    pub peer_id: Option<Vec<u8>>,
    pub port: Option<String>,
    pub uploaded: u64,
    pub downloaded: u64,
    pub left: u64,
    pub compact: bool,
    /// `None` when absent or unparsable
    pub numwant: Option<usize>,
    pub event: Option<String>,
    pub ip: Option<String>,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub passkey: Option<String>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            info_hashes: Vec::new(),
            peer_id: None,
            port: None,
            uploaded: 0,
            downloaded: 0,
            left: 0,
            compact: true,
            numwant: None,
            event: None,
            ip: None,
            ipv4: None,
            ipv6: None,
            passkey: None,
        }
    }
}

impl Query {
    /// Parse a raw query string (without the leading `?`)
    pub fn parse(raw: &str) -> Self {
        let mut query = Query::default();

        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let bytes: Vec<u8> = percent_decode_str(value).collect();

            match key {
                "info_hash" => query.info_hashes.push(bytes),
                "peer_id" => query.peer_id = Some(bytes),
                "port" => query.port = Some(lossy(bytes)),
                "uploaded" => query.uploaded = parse_or_zero(&bytes),
                "downloaded" => query.downloaded = parse_or_zero(&bytes),
                "left" => query.left = parse_or_zero(&bytes),
                "compact" => query.compact = bytes.as_slice() != b"0",
                "numwant" => query.numwant = lossy(bytes).parse().ok(),
                "event" => query.event = Some(lossy(bytes)).filter(|e| !e.is_empty()),
                "ip" => query.ip = Some(lossy(bytes)),
                "ipv4" => query.ipv4 = Some(lossy(bytes)),
                "ipv6" => query.ipv6 = Some(lossy(bytes)),
                "passkey" => query.passkey = Some(lossy(bytes)),
                _ => debug!(key, "Ignoring unknown query parameter"),
            }
        }

        query
    }
}

/// Find the passkey without validating the rest of the query
pub fn passkey_from_query(raw: &str) -> Option<String> {
    raw.split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "passkey")
        .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().into_owned())
}

fn lossy(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn parse_or_zero(bytes: &[u8]) -> u64 {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnounceEvent {
    Started,
    Stopped,
    Completed,
}

/// Fully validated announce parameters
#[derive(Debug, Clone)]
pub struct AnnounceRequest {
    pub info_hash: InfoHash,
    pub peer_id: PeerId,
    pub port: u16,
    pub uploaded: u64,
    pub downloaded: u64,
    pub left: u64,
    pub event: Option<AnnounceEvent>,
    pub numwant: usize,
    pub compact: bool,
}

impl AnnounceRequest {
    pub fn from_query(query: &Query, max_numwant: usize) -> Result<Self, ErrorCode> {
        let info_hash = match query.info_hashes.as_slice() {
            [] => return Err(ErrorCode::MissingInfoHash),
            [single] => InfoHash::from_bytes(single).map_err(|_| ErrorCode::InvalidInfoHash)?,
            _ => return Err(ErrorCode::MalformedRequest),
        };

        let peer_id = query.peer_id.as_deref().ok_or(ErrorCode::MissingPeerId)?;
        let peer_id = PeerId::from_bytes(peer_id).map_err(|_| ErrorCode::InvalidPeerId)?;

        let port = query.port.as_deref().ok_or(ErrorCode::MissingPort)?;
        let port = validate_port(port)?;

        let numwant = match query.numwant {
            None => DEFAULT_NUMWANT,
            Some(n) if n > max_numwant => return Err(ErrorCode::InvalidNumWant),
            Some(n) => n,
        };

        let event = match query.event.as_deref() {
            None => None,
            Some("started") => Some(AnnounceEvent::Started),
            Some("stopped") => Some(AnnounceEvent::Stopped),
            Some("completed") => Some(AnnounceEvent::Completed),
            Some(_) => return Err(ErrorCode::MalformedRequest),
        };

        Ok(Self {
            info_hash,
            peer_id,
            port,
            uploaded: query.uploaded,
            downloaded: query.downloaded,
            left: query.left,
            event,
            numwant,
            compact: query.compact,
        })
    }
}

fn validate_port(raw: &str) -> Result<u16, ErrorCode> {
    match raw.parse::<u16>() {
        Ok(port) if port != 0 && !BLACKLISTED_PORTS.contains(&port) => Ok(port),
        _ => Err(ErrorCode::InvalidPort),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IH_ENC: &str = "%12%34%56%78%9a%bc%de%f0%11%22%33%44%55%66%77%88%99%aa%bb%cc";
    const PEER_ID: &str = "-qB4250-abcdefghijkl";

    fn announce_query(extra: &str) -> String {
        format!("info_hash={IH_ENC}&peer_id={PEER_ID}&port=6881{extra}")
    }

    #[test]
    fn test_parse_announce_query() {
        let q = Query::parse(&announce_query(
            "&uploaded=100&downloaded=50&left=10&event=started&numwant=20&compact=0&passkey=abc",
        ));

        assert_eq!(q.info_hashes.len(), 1);
        assert_eq!(q.info_hashes[0].len(), 20);
        assert_eq!(q.peer_id.as_deref(), Some(PEER_ID.as_bytes()));
        assert_eq!(q.port.as_deref(), Some("6881"));
        assert_eq!((q.uploaded, q.downloaded, q.left), (100, 50, 10));
        assert_eq!(q.event.as_deref(), Some("started"));
        assert_eq!(q.numwant, Some(20));
        assert!(!q.compact);
        assert_eq!(q.passkey.as_deref(), Some("abc"));
    }

    #[test]
    fn test_optional_numerics_fall_back_to_defaults() {
        let q = Query::parse(&announce_query("&uploaded=lots&left=-1&numwant=many"));
        assert_eq!(q.uploaded, 0);
        assert_eq!(q.left, 0);
        assert_eq!(q.numwant, None);
        assert!(q.compact);

        let req = AnnounceRequest::from_query(&q, 200).unwrap();
        assert_eq!(req.numwant, DEFAULT_NUMWANT);
    }

    #[test]
    fn test_repeated_info_hash_keeps_order() {
        let hex_a = "aa".repeat(20);
        let hex_b = "bb".repeat(20);
        let q = Query::parse(&format!("info_hash={hex_a}&info_hash={hex_b}"));

        assert_eq!(q.info_hashes, vec![hex_a.into_bytes(), hex_b.into_bytes()]);
    }

    #[test]
    fn test_bad_percent_encoding_only_affects_its_value() {
        let hex_a = "aa".repeat(20);
        let q = Query::parse(&format!("info_hash=%zz&info_hash={hex_a}&port=6881"));

        assert_eq!(q.info_hashes, vec![b"%zz".to_vec(), hex_a.into_bytes()]);
        assert!(InfoHash::from_bytes(&q.info_hashes[0]).is_err());
        assert_eq!(q.port.as_deref(), Some("6881"));
    }

    #[test]
    fn test_passkey_from_query() {
        assert_eq!(passkey_from_query("a=1&passkey=xyz&b=2").as_deref(), Some("xyz"));
        assert_eq!(passkey_from_query("a=1"), None);
    }

    #[test]
    fn test_announce_request_valid() {
        let q = Query::parse(&announce_query("&left=0&event=completed"));
        let req = AnnounceRequest::from_query(&q, 200).unwrap();

        assert_eq!(req.info_hash.as_bytes()[0], 0x12);
        assert_eq!(req.peer_id.as_bytes(), PEER_ID.as_bytes());
        assert_eq!(req.port, 6881);
        assert_eq!(req.event, Some(AnnounceEvent::Completed));
        assert!(req.compact);
    }

    #[test]
    fn test_announce_required_field_codes() {
        let check = |raw: &str| AnnounceRequest::from_query(&Query::parse(raw), 200).unwrap_err();

        assert_eq!(check(&format!("peer_id={PEER_ID}&port=1")), ErrorCode::MissingInfoHash);
        assert_eq!(
            check(&format!("info_hash={IH_ENC}&info_hash={IH_ENC}&peer_id={PEER_ID}&port=1")),
            ErrorCode::MalformedRequest
        );
        assert_eq!(check(&format!("info_hash=abc&peer_id={PEER_ID}&port=1")), ErrorCode::InvalidInfoHash);
        assert_eq!(check(&format!("info_hash={IH_ENC}&port=1")), ErrorCode::MissingPeerId);
        assert_eq!(check(&format!("info_hash={IH_ENC}&peer_id=short&port=1")), ErrorCode::InvalidPeerId);
        assert_eq!(check(&format!("info_hash={IH_ENC}&peer_id={PEER_ID}")), ErrorCode::MissingPort);
    }

    #[test]
    fn test_invalid_ports() {
        for port in ["0", "abc", "70000", "6346", "8080"] {
            let q = Query::parse(&format!("info_hash={IH_ENC}&peer_id={PEER_ID}&port={port}"));
            assert_eq!(
                AnnounceRequest::from_query(&q, 200).unwrap_err(),
                ErrorCode::InvalidPort,
                "port {port}"
            );
        }
    }

    #[test]
    fn test_numwant_above_max() {
        let q = Query::parse(&announce_query("&numwant=500"));
        assert_eq!(AnnounceRequest::from_query(&q, 200).unwrap_err(), ErrorCode::InvalidNumWant);
    }

    #[test]
    fn test_unknown_event_is_malformed() {
        let q = Query::parse(&announce_query("&event=paused"));
        assert_eq!(AnnounceRequest::from_query(&q, 200).unwrap_err(), ErrorCode::MalformedRequest);

        let q = Query::parse(&announce_query("&event="));
        assert_eq!(AnnounceRequest::from_query(&q, 200).unwrap().event, None);
    }
}
