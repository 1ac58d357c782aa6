/// Authentication endpoints
///
/// - `POST /api/auth/login` - verify credentials, set the session cookie
/// - `POST /api/auth/logout` - expire the session cookie
/// - `GET /api/auth/me` - profile of the session user
/// - `PUT|PATCH /api/auth/update-whatsapp` - change the contact number
///
/// The session token is a signed JWT carried in the `token` cookie or an
/// `Authorization: Bearer` header.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    Extension, Json,
};
use kosan_shared::{
    auth::{
        jwt,
        middleware::{expired_session_cookie, session_cookie, AuthContext},
        password,
    },
    models::{
        pending_payment::{PendingPayment, PendingStatus},
        user::{User, UserProfile},
    },
    phone::normalize_whatsapp,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::JsonBody;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,

    /// Same token as the cookie, for bearer clients
    pub token: String,

    pub user: UserProfile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: UserProfile,
}

/// WhatsApp update request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateWhatsappRequest {
    pub whatsapp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateWhatsappResponse {
    pub success: bool,
    pub message: String,
    pub user: UserProfile,
}

/// Login endpoint
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `401 Unauthorized`: unknown account, unpaid or activating
///   registration, wrong password
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<(HeaderMap, Json<LoginResponse>)> {
    let email = req.email.trim().to_lowercase();
    let req = LoginRequest { email, ..req };
    req.validate()?;

    let Some(user) = User::find_by_email(&state.db, &req.email).await? else {
        return Err(unactivated_account(&state, &req.email).await?);
    };

    // An unparseable stored hash is treated like a wrong password
    let valid = match password::verify_password(&req.password, &user.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::error!(user_id = %user.id, error = %e, "Stored password hash is unusable");
            false
        }
    };
    if !valid {
        tracing::debug!(user_id = %user.id, "Password mismatch");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let claims = jwt::Claims::new(user.id, user.email.clone());
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&session_cookie(&token, state.secure_cookies()))
            .map_err(|e| ApiError::InternalError(format!("Invalid cookie header: {}", e)))?,
    );

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        headers,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            token,
            user: user.into(),
        }),
    ))
}

/// Explains why an email without a user row cannot log in
async fn unactivated_account(state: &AppState, email: &str) -> ApiResult<ApiError> {
    let message = match PendingPayment::find_by_email(&state.db, email).await? {
        Some(pending) if pending.status == PendingStatus::Pending => "Payment not completed",
        Some(_) => "Account activation in progress",
        None => "Account not found",
    };

    Ok(ApiError::Unauthorized(message.to_string()))
}

/// Logout endpoint
pub async fn logout(State(state): State<AppState>) -> ApiResult<(HeaderMap, Json<MessageResponse>)> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&expired_session_cookie(state.secure_cookies()))
            .map_err(|e| ApiError::InternalError(format!("Invalid cookie header: {}", e)))?,
    );

    Ok((
        headers,
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    ))
}

/// Session profile
///
/// # Errors
///
/// - `401 Unauthorized`: no valid session (rejected by the middleware)
/// - `404 Not Found`: the account behind the token no longer exists
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse { user: user.into() }))
}

/// Changes the session user's WhatsApp number
///
/// # Errors
///
/// - `400 Bad Request`: the number does not normalize (with valid examples)
/// - `404 Not Found`: the account no longer exists
/// - `409 Conflict`: another user holds the number
pub async fn update_whatsapp(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<UpdateWhatsappRequest>,
) -> ApiResult<Json<UpdateWhatsappResponse>> {
    let no_whatsapp = normalize_whatsapp(req.whatsapp.as_deref().unwrap_or_default())?;

    if User::whatsapp_taken_by_other(&state.db, &no_whatsapp, auth.user_id).await? {
        return Err(ApiError::Conflict(
            "WhatsApp number is already in use".to_string(),
        ));
    }

    let user = User::update_whatsapp(&state.db, auth.user_id, &no_whatsapp)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "WhatsApp number updated");

    Ok(Json(UpdateWhatsappResponse {
        success: true,
        message: "WhatsApp number updated".to_string(),
        user: user.into(),
    }))
}
