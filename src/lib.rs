pub mod core {
    pub mod config;
    pub mod error;
    pub mod routes;
    pub mod startup;
    pub mod state;
    pub mod tracing_init;
}

pub mod admin {
    pub mod service;
}

pub mod bencode {
    pub mod encoder;
    pub mod response;
}

pub mod handlers {
    pub mod admin;
    pub mod announce;
    pub mod fallback;
    pub mod health;
    pub mod scrape;
}

pub mod models {
    pub mod admin;
    pub mod info_hash;
    pub mod peer;
    pub mod role;
    pub mod torrent;
    pub mod user;
    pub mod whitelist;
}

pub mod security {
    pub mod auth_gate;
    pub mod client_whitelist;
    pub mod ip_resolver;
    pub mod role_policy;
}

pub mod stores {
    pub mod memory;
    pub mod peer_store;
    pub mod registry;
    pub mod stats_batch;
    pub mod store;
}

pub mod utils {
    pub mod auth;
    pub mod passkey;
    pub mod time;
}

pub mod validation {
    pub mod params;
}
