use crate::core::error::AdminError;
use crate::core::state::AppState;
use crate::models::admin::{
    ApiKeyQuery, ConfigSaveParams, DataResponse, InfoHashParams, PasskeyParams, PrefixParams,
    RoleAddParams, RoleIdParams, RoleSetParams, SuccessResponse, UserAddParams, UserIdParams,
};
use crate::models::whitelist::WhiteListClient;
use crate::utils::auth::verify_api_key;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Reject the request unless `api_key` matches the configured admin key
fn authorize(state: &AppState, auth: &ApiKeyQuery, action: &str) -> Result<(), AdminError> {
    if !verify_api_key(&auth.api_key, &state.config.admin.api_key) {
        warn!(action, "Unauthorized admin request");
        return Err(AdminError::InvalidApiKey);
    }
    Ok(())
}

fn success(message: &str) -> Response {
    (StatusCode::OK, Json(SuccessResponse::new(message))).into_response()
}

fn data<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(DataResponse::new(data))).into_response()
}

/// GET /admin/role/add?api_key=<key>&name=<name>&priority=<n>[&multi_up=..&multi_down=..]
pub async fn role_add_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
    Query(params): Query<RoleAddParams>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "role_add")?;

    let role = state.admin.role_add(params).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(role))).into_response())
}

/// GET /admin/role/all?api_key=<key>
pub async fn role_all_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "role_all")?;
    Ok(data(state.admin.role_all().await?))
}

/// GET /admin/role/delete?api_key=<key>&role_id=<id> or &role_name=<name>
pub async fn role_delete_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
    Query(params): Query<RoleIdParams>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "role_delete")?;

    state.admin.role_delete(params).await?;

    Ok(success("Role deleted successfully"))
}

/// GET /admin/role/set?api_key=<key>&role_id=<id>[&field=value...]
pub async fn role_set_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
    Query(params): Query<RoleSetParams>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "role_set")?;

    Ok(data(state.admin.role_set(params).await?))
}

/// GET /admin/user/add?api_key=<key>&name=<name>&role_id=<id>[&passkey=<passkey>]
pub async fn user_add_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
    Query(params): Query<UserAddParams>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "user_add")?;

    let user = state.admin.user_add(params).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(user))).into_response())
}

/// GET /admin/user/get?api_key=<key>&passkey=<pk> (or user_id / remote_id)
pub async fn user_get_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
    Query(params): Query<UserIdParams>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "user_get")?;
    Ok(data(state.admin.user_get(params).await?))
}

/// GET /admin/user/delete?api_key=<key>&passkey=<passkey>
pub async fn user_delete_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
    Query(params): Query<PasskeyParams>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "user_delete")?;

    state.admin.user_delete(&params.passkey).await?;

    Ok(success("User deleted successfully"))
}

/// GET /admin/torrent/add?api_key=<key>&info_hash=<hex>
pub async fn torrent_add_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
    Query(params): Query<InfoHashParams>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "torrent_add")?;

    state.admin.torrent_add(&params.info_hash).await?;

    Ok(success("Torrent added successfully"))
}

/// GET /admin/torrent/delete?api_key=<key>&info_hash=<hex>
pub async fn torrent_delete_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
    Query(params): Query<InfoHashParams>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "torrent_delete")?;

    state.admin.torrent_delete(&params.info_hash).await?;

    Ok(success("Torrent deleted successfully"))
}

/// GET /admin/whitelist/add?api_key=<key>&prefix=<prefix>&name=<client name>
pub async fn whitelist_add_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
    Query(client): Query<WhiteListClient>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "whitelist_add")?;

    state.admin.whitelist_add(client).await?;

    Ok(success("Client whitelisted successfully"))
}

/// GET /admin/whitelist/delete?api_key=<key>&prefix=<prefix>
pub async fn whitelist_delete_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
    Query(params): Query<PrefixParams>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "whitelist_delete")?;

    state.admin.whitelist_delete(&params.prefix).await?;

    Ok(success("Client removed from whitelist"))
}

/// GET /admin/whitelist/all?api_key=<key>
pub async fn whitelist_all_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "whitelist_all")?;
    Ok(data(state.admin.whitelist_all().await?))
}

/// GET /admin/config/all?api_key=<key>
pub async fn config_all_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "config_all")?;
    Ok(data(state.admin.config_all().await?))
}

/// GET /admin/config/save?api_key=<key>&key=<name>&value=<value>
pub async fn config_save_handler(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<ApiKeyQuery>,
    Query(params): Query<ConfigSaveParams>,
) -> Result<Response, AdminError> {
    authorize(&state, &auth, "config_save")?;

    state.admin.config_save(params).await?;
    Ok(success("Configuration saved"))
}
