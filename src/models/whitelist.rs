use serde::{Deserialize, Serialize};

/// A BitTorrent client allowed to announce, matched by peer-id / User-Agent prefix
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhiteListClient {
    #[serde(alias = "prefix")]
    pub client_prefix: String,
    #[serde(alias = "name")]
    pub client_name: String,
}

impl WhiteListClient {
    pub fn new(client_prefix: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            client_prefix: client_prefix.into(),
            client_name: client_name.into(),
        }
    }
}
