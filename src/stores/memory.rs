use crate::core::config::StoreConfig;
use crate::core::error::StoreError;
use crate::models::info_hash::InfoHash;
use crate::models::role::Role;
use crate::models::torrent::{Torrent, TorrentStats};
use crate::models::user::{User, UserStats};
use crate::models::whitelist::WhiteListClient;
use crate::stores::store::Store;
use crate::utils::time::current_timestamp;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::debug;

pub const DRIVER_NAME: &str = "memory";

/// Reference driver keeping everything in process memory.
///
/// Each entity family has its own lock; deletes are hard.
pub struct MemoryStore {
    torrents: RwLock<HashMap<InfoHash, Torrent>>,
    /// Keyed by passkey
    users: RwLock<HashMap<String, User>>,
    roles: RwLock<HashMap<u32, Role>>,
    whitelist: RwLock<HashMap<String, WhiteListClient>>,
    user_id: AtomicU32,
    role_id: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            torrents: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
            roles: RwLock::new(HashMap::new()),
            whitelist: RwLock::new(HashMap::new()),
            user_id: AtomicU32::new(0),
            role_id: AtomicU32::new(0),
        }
    }

    fn next_id(counter: &AtomicU32) -> u32 {
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Registry constructor; the memory driver ignores the DSN
pub fn build(_config: &StoreConfig) -> Result<Arc<dyn Store>, StoreError> {
    Ok(Arc::new(MemoryStore::new()))
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    async fn torrent_add(&self, info_hash: InfoHash) -> Result<(), StoreError> {
        let mut torrents = self.torrents.write();
        if torrents.contains_key(&info_hash) {
            return Err(StoreError::Duplicate);
        }
        torrents.insert(info_hash, Torrent::new(info_hash));
        Ok(())
    }

    async fn torrent_get(
        &self,
        info_hash: &InfoHash,
        include_deleted: bool,
    ) -> Result<Torrent, StoreError> {
        match self.torrents.read().get(info_hash) {
            Some(t) if include_deleted || !t.is_deleted => Ok(t.clone()),
            _ => Err(StoreError::NotFound),
        }
    }

    async fn torrent_delete(&self, info_hash: &InfoHash, _drop_row: bool) -> Result<(), StoreError> {
        self.torrents
            .write()
            .remove(info_hash)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn torrent_save(&self, torrent: &Torrent) -> Result<(), StoreError> {
        let mut torrents = self.torrents.write();
        let existing = torrents
            .get_mut(&torrent.info_hash)
            .ok_or(StoreError::NotFound)?;
        *existing = Torrent {
            created_on: existing.created_on,
            updated_on: current_timestamp(),
            ..torrent.clone()
        };
        Ok(())
    }

    async fn torrent_all(&self) -> Result<Vec<Torrent>, StoreError> {
        Ok(self.torrents.read().values().cloned().collect())
    }

    async fn torrent_sync(&self, batch: Vec<TorrentStats>) -> Result<(), StoreError> {
        let now = current_timestamp();
        let mut torrents = self.torrents.write();
        for stats in batch {
            match torrents.get_mut(&stats.info_hash) {
                Some(torrent) => {
                    stats.apply_to(torrent);
                    torrent.updated_on = now;
                }
                None => debug!(info_hash = %stats.info_hash, "Dropping stats for unknown torrent"),
            }
        }
        Ok(())
    }

    async fn user_add(&self, mut user: User) -> Result<User, StoreError> {
        let user_id = Self::next_id(&self.user_id);
        let mut users = self.users.write();
        if user.passkey.is_empty() || users.contains_key(&user.passkey) {
            return Err(StoreError::Duplicate);
        }
        user.user_id = user_id;
        users.insert(user.passkey.clone(), user.clone());
        Ok(user)
    }

    async fn user_get_by_passkey(&self, passkey: &str) -> Result<User, StoreError> {
        if passkey.is_empty() {
            return Err(StoreError::Unauthorized);
        }
        self.users
            .read()
            .get(passkey)
            .cloned()
            .ok_or(StoreError::Unauthorized)
    }

    async fn user_get_by_id(&self, user_id: u32) -> Result<User, StoreError> {
        self.users
            .read()
            .values()
            .find(|u| u.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn user_get_by_remote_id(&self, remote_id: u64) -> Result<User, StoreError> {
        self.users
            .read()
            .values()
            .find(|u| u.remote_id == remote_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn user_delete(&self, passkey: &str) -> Result<(), StoreError> {
        self.users
            .write()
            .remove(passkey)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn user_save(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write();
        let old_passkey = users
            .values()
            .find(|u| u.user_id == user.user_id)
            .map(|u| u.passkey.clone())
            .ok_or(StoreError::NotFound)?;

        if old_passkey != user.passkey && users.contains_key(&user.passkey) {
            return Err(StoreError::Duplicate);
        }

        let created_on = users
            .remove(&old_passkey)
            .map(|u| u.created_on)
            .unwrap_or(user.created_on);
        users.insert(
            user.passkey.clone(),
            User {
                created_on,
                updated_on: current_timestamp(),
                ..user.clone()
            },
        );
        Ok(())
    }

    async fn user_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.read().values().cloned().collect())
    }

    async fn user_sync(&self, batch: Vec<UserStats>) -> Result<(), StoreError> {
        let now = current_timestamp();
        let mut users = self.users.write();
        for stats in batch {
            match users.get_mut(&stats.passkey) {
                Some(user) => {
                    stats.apply_to(user);
                    user.updated_on = now;
                }
                None => debug!("Dropping stats for unknown user"),
            }
        }
        Ok(())
    }

    async fn role_add(&self, mut role: Role) -> Result<Role, StoreError> {
        let role_id = Self::next_id(&self.role_id);
        let mut roles = self.roles.write();
        if roles.values().any(|r| r.same_name(&role.role_name)) {
            return Err(StoreError::Duplicate);
        }
        role.role_id = role_id;
        roles.insert(role_id, role.clone());
        Ok(role)
    }

    async fn role_get_by_id(&self, role_id: u32) -> Result<Role, StoreError> {
        self.roles
            .read()
            .get(&role_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn role_delete(&self, role_id: u32) -> Result<(), StoreError> {
        // Users and roles are separate lock domains; the reference check and
        // the delete are not atomic with respect to user updates.
        let in_use = self
            .users
            .read()
            .values()
            .filter(|u| u.role_id == role_id)
            .count();
        if in_use > 0 {
            return Err(StoreError::RoleInUse(in_use));
        }

        self.roles
            .write()
            .remove(&role_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn role_save(&self, role: &Role) -> Result<Role, StoreError> {
        if !role.is_persisted() {
            return self.role_add(role.clone()).await;
        }

        let mut roles = self.roles.write();
        if roles
            .values()
            .any(|r| r.role_id != role.role_id && r.same_name(&role.role_name))
        {
            return Err(StoreError::Duplicate);
        }

        let existing = roles.get_mut(&role.role_id).ok_or(StoreError::NotFound)?;
        *existing = Role {
            created_on: existing.created_on,
            updated_on: current_timestamp(),
            ..role.clone()
        };
        Ok(existing.clone())
    }

    async fn role_all(&self) -> Result<Vec<Role>, StoreError> {
        let mut roles: Vec<Role> = self.roles.read().values().cloned().collect();
        roles.sort_by_key(|r| (r.priority, r.role_id));
        Ok(roles)
    }

    async fn whitelist_add(&self, client: WhiteListClient) -> Result<(), StoreError> {
        let mut whitelist = self.whitelist.write();
        if whitelist.contains_key(&client.client_prefix) {
            return Err(StoreError::Duplicate);
        }
        whitelist.insert(client.client_prefix.clone(), client);
        Ok(())
    }

    async fn whitelist_get(&self, prefix: &str) -> Result<WhiteListClient, StoreError> {
        self.whitelist
            .read()
            .get(prefix)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn whitelist_delete(&self, prefix: &str) -> Result<(), StoreError> {
        self.whitelist
            .write()
            .remove(prefix)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn whitelist_get_all(&self) -> Result<Vec<WhiteListClient>, StoreError> {
        let mut clients: Vec<WhiteListClient> = self.whitelist.read().values().cloned().collect();
        clients.sort_by(|a, b| a.client_prefix.cmp(&b.client_prefix));
        Ok(clients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::store::tests::run_contract;

    #[tokio::test]
    async fn test_memory_store_contract() {
        run_contract(|| Arc::new(MemoryStore::new()) as Arc<dyn Store>).await;
    }

    #[tokio::test]
    async fn test_failed_add_still_consumes_id() {
        let store = MemoryStore::new();
        let first = store.role_add(Role::new("A".into(), 1)).await.unwrap();
        assert!(store.role_add(Role::new("a".into(), 1)).await.is_err());
        let second = store.role_add(Role::new("B".into(), 1)).await.unwrap();

        assert_eq!(first.role_id, 1);
        assert_eq!(second.role_id, 3);
    }

    #[tokio::test]
    async fn test_concurrent_user_adds_get_unique_ids() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();

        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .user_add(User::new(format!("u{i}"), format!("pk{i}"), 1))
                    .await
                    .unwrap()
                    .user_id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 32);
    }
}
