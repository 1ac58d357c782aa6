/// Owner account model
///
/// Users are never created by a direct API call. A row appears only when the
/// payment webhook activates a pending registration (see
/// [`PendingPayment::activate`](super::pending_payment::PendingPayment::activate)).
/// The API reads users at login and for the profile view, and updates the
/// WhatsApp number in place. Users are never deleted through the API.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     nama_lengkap VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     no_whatsapp VARCHAR(20) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use kosan_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// if let Some(user) = User::find_by_email(&pool, "pemilik@example.com").await? {
///     println!("{} ({})", user.nama_lengkap, user.no_whatsapp);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Unique constraint on `users.email`
pub const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

/// Unique constraint on `users.no_whatsapp`
pub const WHATSAPP_UNIQUE_CONSTRAINT: &str = "users_no_whatsapp_key";

/// Active owner account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Full name
    pub nama_lengkap: String,

    /// Email address, unique across users and pending registrations
    pub email: String,

    /// WhatsApp number in normalized `62...` form
    pub no_whatsapp: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// When the account was activated
    pub created_at: DateTime<Utc>,

    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, without the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub nama_lengkap: String,
    pub email: String,
    pub no_whatsapp: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            nama_lengkap: user.nama_lengkap,
            email: user.email,
            no_whatsapp: user.no_whatsapp,
        }
    }
}

/// Fields copied from a pending registration at activation
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub nama_lengkap: String,
    pub email: String,
    pub no_whatsapp: String,
    pub password_hash: String,
}

const USER_COLUMNS: &str =
    "id, nama_lengkap, email, no_whatsapp, password_hash, created_at, updated_at";

impl User {
    /// Inserts a user using any executor
    ///
    /// Takes a generic executor so activation can run it inside the same
    /// transaction that deletes the pending row.
    ///
    /// # Errors
    ///
    /// Returns a database error on unique violations
    /// ([`EMAIL_UNIQUE_CONSTRAINT`], [`WHATSAPP_UNIQUE_CONSTRAINT`]) or
    /// connection failure
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO users (nama_lengkap, email, no_whatsapp, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(data.nama_lengkap)
            .bind(data.email)
            .bind(data.no_whatsapp)
            .bind(data.password_hash)
            .fetch_one(executor)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by exact email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by normalized WhatsApp number
    pub async fn find_by_whatsapp(
        pool: &PgPool,
        no_whatsapp: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM users WHERE no_whatsapp = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&sql)
            .bind(no_whatsapp)
            .fetch_optional(pool)
            .await
    }

    /// Returns true if a user other than `except_id` holds the number
    pub async fn whatsapp_taken_by_other(
        pool: &PgPool,
        no_whatsapp: &str,
        except_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE no_whatsapp = $1 AND id <> $2)",
        )
        .bind(no_whatsapp)
        .bind(except_id)
        .fetch_one(pool)
        .await
    }

    /// Replaces the user's WhatsApp number
    ///
    /// Returns `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns a unique violation on [`WHATSAPP_UNIQUE_CONSTRAINT`] if another
    /// user claimed the number after the caller's duplicate check
    pub async fn update_whatsapp(
        pool: &PgPool,
        id: Uuid,
        no_whatsapp: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE users SET no_whatsapp = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(no_whatsapp)
            .fetch_optional(pool)
            .await
    }
}
