/// Payment notification receiver
///
/// ```text
/// POST /api/webhook
/// Content-Type: application/json
///
/// {
///   "transaction_status": "settlement",
///   "order_id": "reg_1a2b3c4d_0123456789ab",
///   "status_code": "200",
///   "gross_amount": "50000.00",
///   "signature_key": "<hex sha512>"
/// }
/// ```
///
/// `settlement` and `capture` activate the pending registration; every other
/// status is logged and acknowledged. Unknown orders and replays are
/// acknowledged with `{ "received": true }` so the gateway stops retrying.
///
/// # Errors
///
/// - `400`: body is not JSON or lacks `transaction_status` / `order_id`
/// - `401`: signature checking is on and the signature is missing or wrong

use axum::{body::Bytes, extract::State, Json};
use kosan_shared::models::pending_payment::PendingPayment;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    payment::verify_signature,
};

const INVALID_PAYLOAD: &str = "Invalid payload";

/// Gateway notification, as far as activation needs it
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub transaction_status: Option<String>,
    pub order_id: Option<String>,

    #[serde(deserialize_with = "string_or_number")]
    pub status_code: Option<String>,

    #[serde(deserialize_with = "string_or_number")]
    pub gross_amount: Option<String>,

    pub signature_key: Option<String>,
    pub payment_type: Option<String>,
    pub fraud_status: Option<String>,
}

/// Accepts `"50000.00"` as well as `50000`, keeping the text the gateway signed
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// What a notification asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    Activate,
    Ignore,
}

impl NotificationAction {
    pub fn for_status(transaction_status: &str) -> Self {
        match transaction_status {
            "settlement" | "capture" => NotificationAction::Activate,
            _ => NotificationAction::Ignore,
        }
    }
}

impl Notification {
    fn is_authentic(&self, server_key: &str) -> bool {
        match (
            &self.order_id,
            &self.status_code,
            &self.gross_amount,
            &self.signature_key,
        ) {
            (Some(order_id), Some(status_code), Some(gross_amount), Some(signature)) => {
                verify_signature(order_id, status_code, gross_amount, server_key, signature)
            }
            _ => false,
        }
    }
}

/// Webhook handler
pub async fn webhook(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<WebhookAck>> {
    let notification: Notification = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Undecodable payment notification");
        ApiError::BadRequest(INVALID_PAYLOAD.to_string())
    })?;

    let (Some(transaction_status), Some(order_id)) = (
        notification.transaction_status.as_deref(),
        notification.order_id.as_deref(),
    ) else {
        return Err(ApiError::BadRequest(INVALID_PAYLOAD.to_string()));
    };

    let midtrans = &state.config.midtrans;
    if midtrans.verify_signature && !notification.is_authentic(&midtrans.server_key) {
        tracing::warn!(order_id = %order_id, "Rejected notification with bad signature");
        return Err(ApiError::Unauthorized("Invalid signature".to_string()));
    }

    let Some(pending) = PendingPayment::find_by_order_id(&state.db, order_id).await? else {
        tracing::info!(
            order_id = %order_id,
            transaction_status = %transaction_status,
            "Notification for unknown or already activated order"
        );
        return Ok(Json(WebhookAck { received: true }));
    };

    match NotificationAction::for_status(transaction_status) {
        NotificationAction::Activate => match PendingPayment::activate(&state.db, pending.id).await
        {
            Ok(_) => {}
            Err(sqlx::Error::RowNotFound) => {
                tracing::info!(order_id = %order_id, "Registration already activated");
            }
            Err(e) => {
                tracing::error!(order_id = %order_id, error = %e, "Activation failed");
                return Err(ApiError::InternalError(format!("Activation failed: {}", e)));
            }
        },
        NotificationAction::Ignore => {
            tracing::info!(
                order_id = %order_id,
                transaction_status = %transaction_status,
                payment_type = notification.payment_type.as_deref().unwrap_or("unknown"),
                "Payment not settled, registration left pending"
            );
        }
    }

    Ok(Json(WebhookAck { received: true }))
}
