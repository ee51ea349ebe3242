use crate::core::error::{AdminError, StoreError};
use crate::models::admin::{
    ConfigSaveParams, RoleAddParams, RoleIdParams, RoleSetParams, UserAddParams, UserIdParams,
};
use crate::models::info_hash::InfoHash;
use crate::models::role::Role;
use crate::models::user::User;
use crate::models::whitelist::WhiteListClient;
use crate::stores::store::Store;
use crate::utils::passkey::generate_passkey;
use std::sync::Arc;
use tracing::info;

/// Administrative operations over the store.
///
/// Store errors are passed through unchanged; only authentication on the
/// announce path collapses failure causes.
#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn Store>,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn role_add(&self, params: RoleAddParams) -> Result<Role, AdminError> {
        let name = params.name.trim();
        if name.is_empty() {
            return Err(AdminError::InvalidParameter("name must not be empty".into()));
        }

        let role = Role {
            remote_id: params.remote_id,
            multi_up: params.multi_up,
            multi_down: params.multi_down,
            download_enabled: params.download_enabled,
            upload_enabled: params.upload_enabled,
            ..Role::new(name.to_string(), params.priority)
        };
        let role = self.store.role_add(role).await?;

        info!(role_id = role.role_id, role_name = %role.role_name, "Role added");
        Ok(role)
    }

    /// Roles ordered by ascending priority
    pub async fn role_all(&self) -> Result<Vec<Role>, AdminError> {
        Ok(self.store.role_all().await?)
    }

    pub async fn role_delete(&self, params: RoleIdParams) -> Result<(), AdminError> {
        let role = self.resolve_role(&params).await?;
        self.store.role_delete(role.role_id).await?;

        info!(role_id = role.role_id, role_name = %role.role_name, "Role deleted");
        Ok(())
    }

    /// Apply only the supplied fields
    pub async fn role_set(&self, params: RoleSetParams) -> Result<Role, AdminError> {
        let mut role = self.store.role_get_by_id(params.role_id).await?;

        if let Some(name) = params.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AdminError::InvalidParameter("name must not be empty".into()));
            }
            role.role_name = name.to_string();
        }
        if let Some(remote_id) = params.remote_id {
            role.remote_id = remote_id;
        }
        if let Some(priority) = params.priority {
            role.priority = priority;
        }
        if let Some(multi_up) = params.multi_up {
            role.multi_up = multi_up;
        }
        if let Some(multi_down) = params.multi_down {
            role.multi_down = multi_down;
        }
        if let Some(enabled) = params.download_enabled {
            role.download_enabled = enabled;
        }
        if let Some(enabled) = params.upload_enabled {
            role.upload_enabled = enabled;
        }

        let role = self.store.role_save(&role).await?;
        info!(role_id = role.role_id, "Role updated");
        Ok(role)
    }

    async fn resolve_role(&self, params: &RoleIdParams) -> Result<Role, AdminError> {
        match (params.role_id, params.role_name.as_deref()) {
            (Some(role_id), _) => Ok(self.store.role_get_by_id(role_id).await?),
            (None, Some(name)) => self
                .store
                .role_all()
                .await?
                .into_iter()
                .find(|r| r.same_name(name))
                .ok_or(AdminError::Store(StoreError::NotFound)),
            (None, None) => Err(AdminError::InvalidParameter(
                "role_id or role_name is required".into(),
            )),
        }
    }

    pub async fn user_add(&self, params: UserAddParams) -> Result<User, AdminError> {
        let role = self.store.role_get_by_id(params.role_id).await?;

        let passkey = if params.passkey.is_empty() {
            generate_passkey()
        } else {
            params.passkey
        };

        let user = User {
            remote_id: params.remote_id,
            download_enabled: params.download_enabled,
            ..User::new(params.name, passkey, role.role_id)
        };
        let user = self.store.user_add(user).await?;

        info!(user_id = user.user_id, role_id = role.role_id, "User added");
        Ok(user)
    }

    pub async fn user_get(&self, params: UserIdParams) -> Result<User, AdminError> {
        match params {
            UserIdParams { passkey: Some(passkey), .. } => {
                Ok(self.store.user_get_by_passkey(&passkey).await?)
            }
            UserIdParams { user_id: Some(user_id), .. } => {
                Ok(self.store.user_get_by_id(user_id).await?)
            }
            UserIdParams { remote_id: Some(remote_id), .. } => {
                Ok(self.store.user_get_by_remote_id(remote_id).await?)
            }
            _ => Err(AdminError::InvalidParameter(
                "passkey, user_id or remote_id is required".into(),
            )),
        }
    }

    pub async fn user_delete(&self, passkey: &str) -> Result<(), AdminError> {
        self.store.user_delete(passkey).await?;
        info!("User deleted");
        Ok(())
    }

    pub async fn torrent_add(&self, info_hash: &str) -> Result<InfoHash, AdminError> {
        let info_hash = parse_info_hash(info_hash)?;
        self.store.torrent_add(info_hash).await?;

        info!(info_hash = %info_hash, "Torrent added");
        Ok(info_hash)
    }

    pub async fn torrent_delete(&self, info_hash: &str) -> Result<(), AdminError> {
        let info_hash = parse_info_hash(info_hash)?;
        self.store.torrent_delete(&info_hash, false).await?;

        info!(info_hash = %info_hash, "Torrent deleted");
        Ok(())
    }

    pub async fn whitelist_add(&self, client: WhiteListClient) -> Result<(), AdminError> {
        if client.client_prefix.is_empty() {
            return Err(AdminError::InvalidParameter("prefix must not be empty".into()));
        }
        info!(prefix = %client.client_prefix, name = %client.client_name, "Whitelist client added");
        Ok(self.store.whitelist_add(client).await?)
    }

    pub async fn whitelist_delete(&self, prefix: &str) -> Result<(), AdminError> {
        self.store.whitelist_delete(prefix).await?;
        info!(prefix = %prefix, "Whitelist client deleted");
        Ok(())
    }

    pub async fn whitelist_all(&self) -> Result<Vec<WhiteListClient>, AdminError> {
        Ok(self.store.whitelist_get_all().await?)
    }

    pub async fn config_all(&self) -> Result<Vec<(String, String)>, AdminError> {
        Err(AdminError::Unimplemented)
    }

    pub async fn config_save(&self, _params: ConfigSaveParams) -> Result<(), AdminError> {
        Err(AdminError::Unimplemented)
    }
}

fn parse_info_hash(raw: &str) -> Result<InfoHash, AdminError> {
    raw.parse()
        .map_err(|e| AdminError::InvalidParameter(format!("info_hash: {e}")))
}
