/// Registrations awaiting payment
///
/// A pending row is written once the payment gateway has issued a Snap
/// session token for the registration. When the gateway later reports the
/// order as settled or captured, [`PendingPayment::activate`] copies the row
/// into `users` and deletes it in a single transaction.
///
/// # Lifecycle
///
/// ```text
/// submitted ──► pending ──(settlement | capture)──► activated (row deleted)
///                  │
///                  └──(any other status)──► unchanged
/// ```
///
/// # Example
///
/// ```no_run
/// use kosan_shared::models::pending_payment::{generate_order_id, PendingPayment};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let order_id = generate_order_id("pemilik@example.com");
///
/// if let Some(pending) = PendingPayment::find_by_order_id(&pool, &order_id).await? {
///     let user = PendingPayment::activate(&pool, pending.id).await?;
///     println!("Activated {}", user.email);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::{CreateUser, User};

/// Unique constraint on `pending_payments.email`
pub const EMAIL_UNIQUE_CONSTRAINT: &str = "pending_payments_email_key";

/// Payment state of a pending registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingStatus {
    /// Waiting for the gateway to confirm payment
    Pending,
    /// Payment confirmed, activation not yet finished
    Paid,
}

impl PendingStatus {
    /// Column value
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingStatus::Pending => "pending",
            PendingStatus::Paid => "paid",
        }
    }
}

impl TryFrom<String> for PendingStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(PendingStatus::Pending),
            "paid" => Ok(PendingStatus::Paid),
            other => Err(format!("unknown pending payment status: {}", other)),
        }
    }
}

/// Pending registration row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingPayment {
    pub id: Uuid,
    pub nama_lengkap: String,
    pub email: String,
    pub no_whatsapp: String,
    pub password_hash: String,

    /// Session token issued by the payment gateway
    pub snap_token: String,

    #[sqlx(try_from = "String")]
    pub status: PendingStatus,

    /// Gateway order reference, see [`generate_order_id`]
    pub order_id: String,

    pub created_at: DateTime<Utc>,
}

/// Input for a new pending registration
#[derive(Debug, Clone)]
pub struct CreatePendingPayment {
    pub nama_lengkap: String,
    pub email: String,
    pub no_whatsapp: String,
    pub password_hash: String,
    pub snap_token: String,
    pub order_id: String,
}

/// Builds a gateway order id for a registration
///
/// Format: `reg_<first 8 hex chars of SHA-256(email)>_<12 random hex chars>`.
/// The hash prefix lets operators correlate orders with an email without
/// storing it in the gateway.
pub fn generate_order_id(email: &str) -> String {
    let digest = hex::encode(Sha256::digest(email.as_bytes()));
    let random = Uuid::new_v4().simple().to_string();

    format!("reg_{}_{}", &digest[..8], &random[..12])
}

const PENDING_COLUMNS: &str = "id, nama_lengkap, email, no_whatsapp, password_hash, \
                               snap_token, status, order_id, created_at";

impl PendingPayment {
    /// Stores a new registration with status `pending`
    ///
    /// # Errors
    ///
    /// Returns a unique violation on [`EMAIL_UNIQUE_CONSTRAINT`] when two
    /// registrations for one email race past the duplicate check
    pub async fn create(pool: &PgPool, data: CreatePendingPayment) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO pending_payments
                 (nama_lengkap, email, no_whatsapp, password_hash, snap_token, status, order_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            PENDING_COLUMNS
        );

        sqlx::query_as::<_, PendingPayment>(&sql)
            .bind(data.nama_lengkap)
            .bind(data.email)
            .bind(data.no_whatsapp)
            .bind(data.password_hash)
            .bind(data.snap_token)
            .bind(PendingStatus::Pending.as_str())
            .bind(data.order_id)
            .fetch_one(pool)
            .await
    }

    /// Finds a pending registration by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM pending_payments WHERE email = $1",
            PENDING_COLUMNS
        );

        sqlx::query_as::<_, PendingPayment>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds the first pending registration holding a WhatsApp number
    pub async fn find_by_whatsapp(
        pool: &PgPool,
        no_whatsapp: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM pending_payments WHERE no_whatsapp = $1 LIMIT 1",
            PENDING_COLUMNS
        );

        sqlx::query_as::<_, PendingPayment>(&sql)
            .bind(no_whatsapp)
            .fetch_optional(pool)
            .await
    }

    /// Finds a pending registration by gateway order id
    pub async fn find_by_order_id(
        pool: &PgPool,
        order_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM pending_payments WHERE order_id = $1",
            PENDING_COLUMNS
        );

        sqlx::query_as::<_, PendingPayment>(&sql)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    /// Promotes a pending registration to an active user
    ///
    /// Locks the pending row, inserts the user and deletes the pending row in
    /// one transaction. Either both writes commit or neither does.
    ///
    /// # Errors
    ///
    /// - `sqlx::Error::RowNotFound` if the pending row is already gone
    ///   (a concurrent replay activated it first)
    /// - a unique violation if the email or number was taken by a user in the
    ///   meantime
    pub async fn activate(pool: &PgPool, id: Uuid) -> Result<User, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM pending_payments WHERE id = $1 FOR UPDATE",
            PENDING_COLUMNS
        );
        let pending = sqlx::query_as::<_, PendingPayment>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let user = User::create(
            &mut *tx,
            CreateUser {
                nama_lengkap: pending.nama_lengkap,
                email: pending.email,
                no_whatsapp: pending.no_whatsapp,
                password_hash: pending.password_hash,
            },
        )
        .await?;

        sqlx::query("DELETE FROM pending_payments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %user.id,
            order_id = %pending.order_id,
            "Activated registration"
        );

        Ok(user)
    }
}
