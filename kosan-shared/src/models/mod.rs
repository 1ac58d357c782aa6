/// Database models
///
/// # Models
///
/// - `user`: Active owner accounts
/// - `pending_payment`: Registrations awaiting payment, and activation
/// - `kosan`: Listings, district codes and the public catalogue query
///
/// # Example
///
/// ```no_run
/// use kosan_shared::models::kosan::Kosan;
/// use kosan_shared::models::user::User;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// if let Some(user) = User::find_by_id(&pool, user_id).await? {
///     let listings = Kosan::list_by_owner(&pool, user.id).await?;
///     println!("{} owns {} listings", user.nama_lengkap, listings.len());
/// }
/// # Ok(())
/// # }
/// ```

pub mod kosan;
pub mod pending_payment;
pub mod user;
