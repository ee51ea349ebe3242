use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ApiKeyQuery {
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleAddParams {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub remote_id: u64,
    #[serde(default = "default_multiplier")]
    pub multi_up: f64,
    #[serde(default = "default_multiplier")]
    pub multi_down: f64,
    #[serde(default = "default_true")]
    pub download_enabled: bool,
    #[serde(default = "default_true")]
    pub upload_enabled: bool,
}

/// Identifies a role by id or by (case-insensitive) name
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleIdParams {
    pub role_id: Option<u32>,
    pub role_name: Option<String>,
}

/// Partial role update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleSetParams {
    pub role_id: u32,
    pub name: Option<String>,
    pub remote_id: Option<u64>,
    pub priority: Option<i32>,
    pub multi_up: Option<f64>,
    pub multi_down: Option<f64>,
    pub download_enabled: Option<bool>,
    pub upload_enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserAddParams {
    pub name: String,
    /// Generated when empty
    #[serde(default)]
    pub passkey: String,
    pub role_id: u32,
    #[serde(default)]
    pub remote_id: u64,
    #[serde(default = "default_true")]
    pub download_enabled: bool,
}

/// Identifies a user by passkey, tracker id or remote id, checked in that order
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserIdParams {
    pub passkey: Option<String>,
    pub user_id: Option<u32>,
    pub remote_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasskeyParams {
    pub passkey: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfoHashParams {
    pub info_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrefixParams {
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSaveParams {
    pub key: String,
    pub value: String,
}

fn default_true() -> bool {
    true
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
