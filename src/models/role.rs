use crate::utils::time::current_timestamp;
use serde::Serialize;

/// Permission and credit policy shared by a group of users.
///
/// Lower `priority` values outrank higher ones.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Role {
    /// Tracker-assigned id; a role with id `0` has never been persisted
    pub role_id: u32,
    pub remote_id: u64,
    /// Unique, compared case-insensitively
    pub role_name: String,
    pub priority: i32,
    pub multi_up: f64,
    pub multi_down: f64,
    pub download_enabled: bool,
    pub upload_enabled: bool,
    pub created_on: i64,
    pub updated_on: i64,
}

impl Role {
    pub fn new(role_name: String, priority: i32) -> Self {
        let now = current_timestamp();
        Self {
            role_id: 0,
            remote_id: 0,
            role_name,
            priority,
            multi_up: 1.0,
            multi_down: 1.0,
            download_enabled: true,
            upload_enabled: true,
            created_on: now,
            updated_on: now,
        }
    }

    /// Policy applied to the public-mode sentinel user
    pub fn unrestricted() -> Self {
        Self {
            created_on: 0,
            updated_on: 0,
            ..Self::new("public".to_string(), i32::MAX)
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.role_id != 0
    }

    pub fn same_name(&self, other: &str) -> bool {
        self.role_name.to_lowercase() == other.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_role_is_not_persisted() {
        assert!(!Role::new("Member".to_string(), 10).is_persisted());
    }

    #[test]
    fn test_same_name_ignores_case() {
        let role = Role::new("Admin".to_string(), 1);
        assert!(role.same_name("admin"));
        assert!(role.same_name("ADMIN"));
        assert!(!role.same_name("Administrator"));
    }
}
