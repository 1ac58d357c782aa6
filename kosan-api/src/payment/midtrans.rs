/// Midtrans Snap client
///
/// Opens Snap payment sessions with `POST {base}/snap/v1/transactions`,
/// authenticated with HTTP Basic auth (server key as user, empty password).
///
/// # Endpoints
///
/// - Sandbox: `https://app.sandbox.midtrans.com`
/// - Production: `https://app.midtrans.com`
///
/// The matching widget script is served from `{base}/snap/snap.js`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CustomerDetails, PaymentError, PaymentGateway, SnapOrder, SnapSession};
use crate::config::MidtransConfig;

/// Sandbox Snap host
pub const SANDBOX_BASE_URL: &str = "https://app.sandbox.midtrans.com";

/// Production Snap host
pub const PRODUCTION_BASE_URL: &str = "https://app.midtrans.com";

/// Returns the Snap host for the environment
pub fn base_url(is_production: bool) -> &'static str {
    if is_production {
        PRODUCTION_BASE_URL
    } else {
        SANDBOX_BASE_URL
    }
}

/// Returns the URL of the client-side widget script
pub fn snap_script_url(is_production: bool) -> String {
    format!("{}/snap/snap.js", base_url(is_production))
}

#[derive(Debug, Serialize)]
struct TransactionDetails<'a> {
    order_id: &'a str,
    gross_amount: i64,
}

#[derive(Debug, Serialize)]
struct SnapRequest<'a> {
    transaction_details: TransactionDetails<'a>,
    customer_details: &'a CustomerDetails,
}

#[derive(Debug, Deserialize)]
struct SnapErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
}

/// Snap API client
#[derive(Debug, Clone)]
pub struct MidtransSnap {
    client: reqwest::Client,
    server_key: String,
    base_url: String,
}

impl MidtransSnap {
    /// Builds a client for the configured environment
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Transport` if the HTTP client cannot be built
    pub fn new(config: &MidtransConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| PaymentError::Transport(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            server_key: config.server_key.clone(),
            base_url: base_url(config.is_production).to_string(),
        })
    }

    /// Points the client at a different host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn transactions_url(&self) -> String {
        format!("{}/snap/v1/transactions", self.base_url)
    }
}

#[async_trait]
impl PaymentGateway for MidtransSnap {
    fn name(&self) -> &str {
        "midtrans"
    }

    async fn create_transaction(&self, order: &SnapOrder) -> Result<SnapSession, PaymentError> {
        let body = SnapRequest {
            transaction_details: TransactionDetails {
                order_id: &order.order_id,
                gross_amount: order.gross_amount,
            },
            customer_details: &order.customer,
        };

        tracing::debug!(order_id = %order.order_id, "Creating Snap transaction");

        let response = self
            .client
            .post(self.transactions_url())
            .basic_auth(&self.server_key, Some(""))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<SnapErrorBody>()
                .await
                .ok()
                .map(|b| b.error_messages.join("; "))
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

            tracing::warn!(
                order_id = %order.order_id,
                status = status.as_u16(),
                message = %message,
                "Snap transaction rejected"
            );

            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<SnapSession>()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))
    }
}
