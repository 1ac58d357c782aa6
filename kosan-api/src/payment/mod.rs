/// Payment gateway abstraction
///
/// Registration needs exactly one thing from the gateway: a Snap session
/// token for an order, which the client uses to open the hosted payment
/// widget. Settlement comes back asynchronously through the webhook.
///
/// # Implementations
///
/// - [`midtrans::MidtransSnap`]: the real Snap API over HTTPS
/// - [`fake::FakeGateway`]: in-memory gateway for tests
///
/// # Flow
///
/// ```text
/// POST /api/register
///   └─> PaymentGateway::create_transaction(order)  ──► Snap token
///         └─> pending_payments row (status = pending)
///
/// POST /api/webhook (settlement | capture)
///   └─> verify_signature ──► PendingPayment::activate
/// ```
///
/// # Example
///
/// ```
/// use kosan_api::payment::{fake::FakeGateway, CustomerDetails, PaymentGateway, SnapOrder};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = FakeGateway::new();
/// let session = gateway
///     .create_transaction(&SnapOrder {
///         order_id: "reg_1a2b3c4d_0123456789ab".to_string(),
///         gross_amount: 50_000,
///         customer: CustomerDetails {
///             first_name: "Budi".to_string(),
///             email: "budi@example.com".to_string(),
///             phone: "6281234567890".to_string(),
///         },
///     })
///     .await?;
/// assert!(!session.token.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod fake;
pub mod midtrans;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

/// Payment gateway errors
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Request could not be sent or timed out
    #[error("Gateway request failed: {0}")]
    Transport(String),

    /// Gateway answered with a non-success status
    #[error("Gateway rejected the transaction ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Gateway answer could not be decoded
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),
}

/// Customer shown on the payment page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub email: String,
    pub phone: String,
}

/// Order to open a payment session for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapOrder {
    pub order_id: String,

    /// Amount in rupiah
    pub gross_amount: i64,

    pub customer: CustomerDetails,
}

/// Session returned by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapSession {
    /// Token for the client-side widget
    pub token: String,
}

/// Gateway seam used by the registration handler
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Opens a payment session for the order
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` on transport failure or gateway rejection.
    /// No retry is attempted.
    async fn create_transaction(&self, order: &SnapOrder) -> Result<SnapSession, PaymentError>;
}

/// Computes the notification signature the gateway sends
///
/// `hex(SHA-512(order_id + status_code + gross_amount + server_key))`
pub fn notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks a notification's `signature_key`
///
/// Comparison is case-insensitive on the hex digits and runs over the whole
/// string regardless of where the first mismatch is.
pub fn verify_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
    signature_key: &str,
) -> bool {
    let expected = notification_signature(order_id, status_code, gross_amount, server_key);
    let provided = signature_key.trim().to_ascii_lowercase();

    if expected.len() != provided.len() {
        return false;
    }

    expected
        .bytes()
        .zip(provided.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
