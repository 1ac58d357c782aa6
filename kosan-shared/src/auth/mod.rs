/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Session token generation and validation
/// - [`middleware`]: Session extraction (cookie or bearer) and cookie helpers
/// - [`authorization`]: Listing ownership checks
///
/// # Example
///
/// ```
/// use kosan_shared::auth::password::{hash_password, verify_password};
/// use kosan_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "pemilik@example.com");
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!!")?;
/// assert!(validate_token(&token, "secret-key-at-least-32-bytes-long!!").is_ok());
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
