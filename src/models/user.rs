use crate::utils::time::current_timestamp;
use serde::Serialize;

/// Reserved id of the identity bound to every request in public mode.
///
/// Allocated user ids start at 1, so the sentinel never collides with a real account.
pub const PUBLIC_USER_ID: u32 = 0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct User {
    /// Tracker-assigned id, `0` until persisted
    pub user_id: u32,
    pub role_id: u32,
    /// Id of the account in the external site database
    pub remote_id: u64,
    pub user_name: String,
    /// Capability token used in announce URLs
    pub passkey: String,
    pub is_deleted: bool,
    pub download_enabled: bool,
    pub downloaded: u64,
    pub uploaded: u64,
    pub announces: u64,
    pub created_on: i64,
    pub updated_on: i64,
}

impl User {
    pub fn new(user_name: String, passkey: String, role_id: u32) -> Self {
        let now = current_timestamp();
        Self {
            user_id: 0,
            role_id,
            remote_id: 0,
            user_name,
            passkey,
            is_deleted: false,
            download_enabled: true,
            downloaded: 0,
            uploaded: 0,
            announces: 0,
            created_on: now,
            updated_on: now,
        }
    }

    /// Identity every request is bound to when the tracker runs in public mode
    pub fn public_sentinel() -> Self {
        Self {
            user_id: PUBLIC_USER_ID,
            created_on: 0,
            updated_on: 0,
            ..Self::new("public".to_string(), String::new(), 0)
        }
    }

    pub fn is_public_sentinel(&self) -> bool {
        self.user_id == PUBLIC_USER_ID
    }

    /// A resolved user may only authenticate when persisted, live and keyed
    pub fn is_valid(&self) -> bool {
        self.user_id > 0 && !self.is_deleted && !self.passkey.is_empty()
    }
}

/// Additive per-user deltas, applied by `Store::user_sync`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserStats {
    pub passkey: String,
    pub uploaded: u64,
    pub downloaded: u64,
    pub announces: u64,
}

impl UserStats {
    pub fn new(passkey: String) -> Self {
        Self {
            passkey,
            ..Default::default()
        }
    }

    pub fn merge(&mut self, other: &UserStats) {
        self.uploaded = self.uploaded.saturating_add(other.uploaded);
        self.downloaded = self.downloaded.saturating_add(other.downloaded);
        self.announces = self.announces.saturating_add(other.announces);
    }

    pub fn apply_to(&self, user: &mut User) {
        user.uploaded = user.uploaded.saturating_add(self.uploaded);
        user.downloaded = user.downloaded.saturating_add(self.downloaded);
        user.announces = user.announces.saturating_add(self.announces);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpersisted_user_is_invalid() {
        let user = User::new("alice".to_string(), "pk".to_string(), 1);
        assert!(!user.is_valid());
    }

    #[test]
    fn test_deleted_user_is_invalid() {
        let mut user = User::new("alice".to_string(), "pk".to_string(), 1);
        user.user_id = 7;
        assert!(user.is_valid());

        user.is_deleted = true;
        assert!(!user.is_valid());
    }

    #[test]
    fn test_public_sentinel() {
        let user = User::public_sentinel();
        assert!(user.is_public_sentinel());
        assert_eq!(user.user_id, PUBLIC_USER_ID);
    }

    #[test]
    fn test_user_stats_merge_saturates() {
        let mut a = UserStats { uploaded: u64::MAX, announces: 1, ..UserStats::new("pk".into()) };
        let b = UserStats { uploaded: u64::MAX, downloaded: 3, announces: 1, ..UserStats::new("pk".into()) };

        a.merge(&b);

        assert_eq!(a.uploaded, u64::MAX);
        assert_eq!(a.downloaded, 3);
        assert_eq!(a.announces, 2);
    }
}
