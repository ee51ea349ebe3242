use crate::core::error::AuthError;
use crate::models::user::User;
use crate::stores::store::Store;
use tracing::debug;

/// Resolve the user a request acts as.
///
/// In public mode every request, whatever its passkey, is bound to the
/// public sentinel. Otherwise empty, unknown and invalid passkeys all
/// produce the same [`AuthError::InvalidAuth`].
pub async fn authenticate(
    store: &dyn Store,
    public: bool,
    passkey: Option<&str>,
) -> Result<User, AuthError> {
    if public {
        return Ok(User::public_sentinel());
    }

    let passkey = passkey.unwrap_or_default();
    if passkey.is_empty() {
        return Err(AuthError::InvalidAuth);
    }

    let user = store.user_get_by_passkey(passkey).await.map_err(|e| {
        debug!(error = %e, "Passkey lookup failed");
        AuthError::InvalidAuth
    })?;

    if !user.is_valid() {
        debug!(user_id = user.user_id, "Resolved user is not valid");
        return Err(AuthError::InvalidAuth);
    }

    Ok(user)
}
