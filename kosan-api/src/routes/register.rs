/// Owner registration
///
/// ```text
/// POST /api/register
/// Content-Type: application/json
///
/// {
///   "namaLengkap": "Budi Santoso",
///   "email": "budi@example.com",
///   "noWhatsapp": "0812-3456-7890",
///   "password": "rahasia123"
/// }
/// ```
///
/// Opens a Snap payment session for the activation fee and stores the
/// registration as pending. The account itself is only created by the
/// webhook once the payment settles.
///
/// ```json
/// { "snapToken": "66e4fa55-fdac-4ef9-91b5-733b97d1b862" }
/// ```
///
/// # Errors
///
/// - `400`: missing fields, bad email, bad phone, email or number already
///   registered or awaiting payment
/// - `500`: the payment gateway failed; nothing is stored

use axum::{extract::State, Json};
use kosan_shared::{
    auth::password,
    models::{
        pending_payment::{generate_order_id, CreatePendingPayment, PendingPayment},
        user::User,
    },
    phone::normalize_whatsapp,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{non_blank, JsonBody};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, EMAIL_TAKEN, WHATSAPP_TAKEN},
    payment::{CustomerDetails, SnapOrder},
};

/// Registration body as sent by the client
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub nama_lengkap: Option<String>,
    pub email: Option<String>,
    pub no_whatsapp: Option<String>,
    pub password: Option<String>,
}

/// Registration with every field present
#[derive(Debug, Validate)]
struct Registration {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    nama_lengkap: String,

    #[validate(email(message = "Invalid email format"))]
    email: String,

    no_whatsapp: String,
    password: String,
}

impl RegisterRequest {
    fn into_registration(self) -> ApiResult<Registration> {
        let missing = || ApiError::BadRequest("All fields are required".to_string());

        // The password is taken as typed; only the text fields are trimmed.
        let password = self.password.filter(|p| !p.is_empty()).ok_or_else(missing)?;

        Ok(Registration {
            nama_lengkap: non_blank(self.nama_lengkap).ok_or_else(missing)?,
            email: non_blank(self.email).ok_or_else(missing)?.to_lowercase(),
            no_whatsapp: non_blank(self.no_whatsapp).ok_or_else(missing)?,
            password,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub snap_token: String,
}

/// Registration handler
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    let registration = req.into_registration()?;
    registration.validate()?;

    let no_whatsapp = normalize_whatsapp(&registration.no_whatsapp)?;

    if User::find_by_email(&state.db, &registration.email).await?.is_some()
        || PendingPayment::find_by_email(&state.db, &registration.email)
            .await?
            .is_some()
    {
        return Err(ApiError::BadRequest(EMAIL_TAKEN.to_string()));
    }

    if User::find_by_whatsapp(&state.db, &no_whatsapp).await?.is_some()
        || PendingPayment::find_by_whatsapp(&state.db, &no_whatsapp)
            .await?
            .is_some()
    {
        return Err(ApiError::BadRequest(WHATSAPP_TAKEN.to_string()));
    }

    let password_hash = password::hash_password(&registration.password)?;
    let order_id = generate_order_id(&registration.email);

    let order = SnapOrder {
        order_id: order_id.clone(),
        gross_amount: state.config.midtrans.registration_fee,
        customer: CustomerDetails {
            first_name: registration.nama_lengkap.clone(),
            email: registration.email.clone(),
            phone: no_whatsapp.clone(),
        },
    };

    let session = state.payment.create_transaction(&order).await.map_err(|e| {
        tracing::error!(
            gateway = state.payment.name(),
            order_id = %order_id,
            error = %e,
            "Failed to open payment session"
        );
        ApiError::from(e)
    })?;

    PendingPayment::create(
        &state.db,
        CreatePendingPayment {
            nama_lengkap: registration.nama_lengkap,
            email: registration.email,
            no_whatsapp,
            password_hash,
            snap_token: session.token.clone(),
            order_id: order_id.clone(),
        },
    )
    .await?;

    tracing::info!(order_id = %order_id, "Registration awaiting payment");

    Ok(Json(RegisterResponse {
        snap_token: session.token,
    }))
}
