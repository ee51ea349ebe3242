//! Backend-agnostic persistence contract.
//!
//! Every driver must behave identically:
//!
//! - `*_add` fails with [`StoreError::Duplicate`] when the key exists and
//!   leaves state untouched. Users and roles get ids from a monotonically
//!   increasing counter that never reuses a value.
//! - Lookups fail with [`StoreError::NotFound`], except the passkey lookup which
//!   always answers [`StoreError::Unauthorized`] so empty and unknown passkeys
//!   are indistinguishable.
//! - Soft-deleted torrents are hidden unless the caller opts in.
//! - A role referenced by any user cannot be deleted ([`StoreError::RoleInUse`]).
//! - `*_sync` adds counter deltas onto persisted rows. It is not idempotent:
//!   replaying a batch counts it twice.
//!
//! No operation spans more than one entity family, so there is no
//! cross-entity atomicity.

use crate::core::error::StoreError;
use crate::models::info_hash::InfoHash;
use crate::models::role::Role;
use crate::models::torrent::{Torrent, TorrentStats};
use crate::models::user::{User, UserStats};
use crate::models::whitelist::WhiteListClient;
use async_trait::async_trait;

#[async_trait]
pub trait Store: Send + Sync {
    /// Driver name as used in `[store] driver`
    fn name(&self) -> &'static str;

    async fn torrent_add(&self, info_hash: InfoHash) -> Result<(), StoreError>;

    /// Look up a torrent; `include_deleted` exposes soft-deleted rows
    async fn torrent_get(
        &self,
        info_hash: &InfoHash,
        include_deleted: bool,
    ) -> Result<Torrent, StoreError>;

    /// Remove a torrent. Durable drivers only soft-delete unless `drop_row` is set.
    async fn torrent_delete(&self, info_hash: &InfoHash, drop_row: bool) -> Result<(), StoreError>;

    async fn torrent_save(&self, torrent: &Torrent) -> Result<(), StoreError>;

    async fn torrent_all(&self) -> Result<Vec<Torrent>, StoreError>;

    async fn torrent_sync(&self, batch: Vec<TorrentStats>) -> Result<(), StoreError>;

    /// Persist a new user and return it with its assigned id
    async fn user_add(&self, user: User) -> Result<User, StoreError>;

    async fn user_get_by_passkey(&self, passkey: &str) -> Result<User, StoreError>;

    async fn user_get_by_id(&self, user_id: u32) -> Result<User, StoreError>;

    async fn user_get_by_remote_id(&self, remote_id: u64) -> Result<User, StoreError>;

    async fn user_delete(&self, passkey: &str) -> Result<(), StoreError>;

    /// Overwrite the mutable fields of an existing user, matched by id
    async fn user_save(&self, user: &User) -> Result<(), StoreError>;

    async fn user_all(&self) -> Result<Vec<User>, StoreError>;

    async fn user_sync(&self, batch: Vec<UserStats>) -> Result<(), StoreError>;

    async fn role_add(&self, role: Role) -> Result<Role, StoreError>;

    async fn role_get_by_id(&self, role_id: u32) -> Result<Role, StoreError>;

    async fn role_delete(&self, role_id: u32) -> Result<(), StoreError>;

    /// Upsert: an unpersisted role (id 0) is added, otherwise updated in place
    async fn role_save(&self, role: &Role) -> Result<Role, StoreError>;

    /// All roles ordered by ascending priority, then id
    async fn role_all(&self) -> Result<Vec<Role>, StoreError>;

    async fn whitelist_add(&self, client: WhiteListClient) -> Result<(), StoreError>;

    async fn whitelist_get(&self, prefix: &str) -> Result<WhiteListClient, StoreError>;

    async fn whitelist_delete(&self, prefix: &str) -> Result<(), StoreError>;

    async fn whitelist_get_all(&self) -> Result<Vec<WhiteListClient>, StoreError>;

    /// Release backend resources
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
