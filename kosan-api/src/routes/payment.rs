/// Payment widget settings for the client
///
/// ```text
/// GET /api/payment/config
/// ```
///
/// ```json
/// {
///   "clientKey": "SB-Mid-client-...",
///   "snapScriptUrl": "https://app.sandbox.midtrans.com/snap/snap.js",
///   "isProduction": false
/// }
/// ```

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{app::AppState, payment::midtrans};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfigResponse {
    pub client_key: String,
    pub snap_script_url: String,
    pub is_production: bool,
}

pub async fn payment_config(State(state): State<AppState>) -> Json<PaymentConfigResponse> {
    let midtrans_config = &state.config.midtrans;

    Json(PaymentConfigResponse {
        client_key: midtrans_config.client_key.clone(),
        snap_script_url: midtrans::snap_script_url(midtrans_config.is_production),
        is_production: midtrans_config.is_production,
    })
}
