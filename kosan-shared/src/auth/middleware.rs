/// Session extraction for Axum
///
/// Authenticated routes accept the session token from either the `token`
/// cookie or an `Authorization: Bearer <token>` header. Once validated, the
/// token becomes an [`AuthContext`] stored in the request extensions, and
/// handlers receive the session explicitly instead of reading ambient
/// client state.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware::{self, Next}, routing::get, Extension, Router};
/// use kosan_shared::auth::middleware::{session_auth_middleware, AuthContext};
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.email)
/// }
///
/// let secret = "your-secret-key-at-least-32-bytes".to_string();
/// let app: Router = Router::new()
///     .route("/protected", get(handler))
///     .layer(middleware::from_fn(move |req: Request, next: Next| {
///         session_auth_middleware(secret.clone(), req, next)
///     }));
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use cookie::{time::Duration, Cookie, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{session_duration, validate_token, Claims, JwtError};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "token";

/// Authenticated session added to request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID (token subject)
    pub user_id: Uuid,

    /// Email the token was issued for
    pub email: String,
}

impl AuthContext {
    /// Creates the session from validated claims
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }

    /// Returns true if this session belongs to the given owner
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id
    }
}

/// Error type for session extraction
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Neither a cookie nor an Authorization header was present
    #[error("Token not found")]
    MissingCredentials,

    /// Authorization header present but not a Bearer token
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid token issuer".to_string()),
            _ => AuthError::InvalidToken("Invalid token".to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "code": "unauthorized",
        }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Reads a cookie value from the request headers
///
/// Quoted values are unquoted. Malformed pairs are skipped.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value_trimmed().to_string())
        .filter(|value| !value.is_empty())
}

/// Reads the bearer token from the Authorization header, if one was sent
fn bearer_token(headers: &HeaderMap) -> Option<Result<String, AuthError>> {
    let auth_header = headers.get(header::AUTHORIZATION)?;

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    Some(token.map(str::to_string).ok_or_else(|| {
        AuthError::InvalidFormat("Expected Bearer token".to_string())
    }))
}

/// Reads the session token, preferring an explicit bearer header over the cookie
///
/// # Errors
///
/// - `AuthError::MissingCredentials` if neither source is present
/// - `AuthError::InvalidFormat` if the Authorization header is not `Bearer`
///   and no cookie was sent
pub fn extract_token(headers: &HeaderMap) -> Result<String, AuthError> {
    match (bearer_token(headers), cookie_value(headers, SESSION_COOKIE)) {
        (Some(Ok(token)), _) => Ok(token),
        (_, Some(token)) => Ok(token),
        (Some(Err(err)), None) => Err(err),
        (None, None) => Err(AuthError::MissingCredentials),
    }
}

/// Extracts and validates the session from request headers
///
/// Both the bearer header and the cookie are tried, so a stale cookie does
/// not shadow a valid header (or the reverse). The first failure is
/// reported when neither validates.
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let bearer = bearer_token(headers);
    let cookie = cookie_value(headers, SESSION_COOKIE);

    let mut first_error = None;
    for candidate in bearer.into_iter().chain(cookie.map(Ok)) {
        let result = candidate.and_then(|token| {
            validate_token(&token, secret).map_err(AuthError::from)
        });
        match result {
            Ok(claims) => return Ok(AuthContext::from_claims(claims)),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }

    Err(first_error.unwrap_or(AuthError::MissingCredentials))
}

fn base_cookie(value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .max_age(max_age)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Builds the `Set-Cookie` value for a fresh session
///
/// Not `HttpOnly`: the client reads it to decide which navigation to show.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let max_age = Duration::seconds(session_duration().num_seconds());
    base_cookie(token.to_string(), max_age, secure).to_string()
}

/// Builds the `Set-Cookie` value that clears the session
pub fn expired_session_cookie(secure: bool) -> String {
    base_cookie(String::new(), Duration::ZERO, secure).to_string()
}

/// Session authentication middleware
///
/// Inserts [`AuthContext`] into the request extensions on success and
/// rejects the request with 401 otherwise.
pub async fn session_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_context = authenticate(req.headers(), &secret)?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
