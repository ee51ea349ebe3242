// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers::{admin, announce, fallback, health, scrape};
use axum::{routing::get, Router};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Tracker protocol
        .route("/announce", get(announce::announce_handler))
        .route("/announce/{passkey}", get(announce::announce_passkey_handler))
        .route("/scrape", get(scrape::scrape_handler))
        .route("/scrape/{passkey}", get(scrape::scrape_passkey_handler))
        .route("/health", get(health::health_handler))

        // Admin endpoints (require API key)
        .route("/admin/role/add", get(admin::role_add_handler))
        .route("/admin/role/all", get(admin::role_all_handler))
        .route("/admin/role/delete", get(admin::role_delete_handler))
        .route("/admin/role/set", get(admin::role_set_handler))
        .route("/admin/user/add", get(admin::user_add_handler))
        .route("/admin/user/get", get(admin::user_get_handler))
        .route("/admin/user/delete", get(admin::user_delete_handler))
        .route("/admin/torrent/add", get(admin::torrent_add_handler))
        .route("/admin/torrent/delete", get(admin::torrent_delete_handler))
        .route("/admin/whitelist/add", get(admin::whitelist_add_handler))
        .route("/admin/whitelist/delete", get(admin::whitelist_delete_handler))
        .route("/admin/whitelist/all", get(admin::whitelist_all_handler))
        .route("/admin/config/all", get(admin::config_all_handler))
        .route("/admin/config/save", get(admin::config_save_handler))

        .fallback(fallback::fallback_handler)

        .with_state(state)
}
