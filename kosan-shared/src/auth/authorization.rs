/// Resource ownership checks
///
/// Listings belong to exactly one owner. Every owner-scoped operation
/// (owner read, update, delete) loads the listing first and then calls
/// [`require_owner`] with the listing's `pemilik_id`, so a non-owner gets a
/// forbidden error before anything is mutated.
///
/// # Example
///
/// ```
/// use kosan_shared::auth::authorization::{require_owner, AuthzError};
/// use kosan_shared::auth::middleware::AuthContext;
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let auth = AuthContext { user_id: owner, email: "pemilik@example.com".into() };
///
/// assert!(require_owner(&auth, owner).is_ok());
/// assert!(matches!(require_owner(&auth, Uuid::new_v4()), Err(AuthzError::NotOwner)));
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Session subject does not own the resource
    #[error("Not the owner of this resource")]
    NotOwner,
}

/// Checks that the session owns the resource
///
/// # Errors
///
/// Returns `AuthzError::NotOwner` if `auth.user_id != owner_id`
pub fn require_owner(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if !auth.owns(owner_id) {
        tracing::warn!(
            user_id = %auth.user_id,
            owner_id = %owner_id,
            "Rejected access to a resource owned by another user"
        );
        return Err(AuthzError::NotOwner);
    }

    Ok(())
}
