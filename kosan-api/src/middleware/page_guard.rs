/// Route protection for client pages
///
/// Runs in front of every request but only acts on page paths:
///
/// | Path | Session cookie | Result |
/// |---|---|---|
/// | `/dashboard`, `/dashboard/*` | missing or invalid | redirect to `/login` |
/// | `/login` | valid | redirect to `/dashboard` |
/// | anything else | any | passed through |
///
/// Validity is a signature and expiry check on the `token` cookie; no
/// database lookup happens here. API routes do their own authentication.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use kosan_shared::auth::{
    jwt::validate_token,
    middleware::{cookie_value, SESSION_COOKIE},
};

use crate::app::AppState;

/// Login page path
pub const LOGIN_PATH: &str = "/login";

/// Dashboard root path
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Returns true for `/dashboard` and everything below it
pub fn is_dashboard_path(path: &str) -> bool {
    path == DASHBOARD_PATH
        || path
            .strip_prefix(DASHBOARD_PATH)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Page guard middleware
pub async fn page_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    let guards_dashboard = is_dashboard_path(path);
    let guards_login = path == LOGIN_PATH;

    if !guards_dashboard && !guards_login {
        return next.run(req).await;
    }

    let has_session = cookie_value(req.headers(), SESSION_COOKIE)
        .map(|token| validate_token(&token, state.jwt_secret()).is_ok())
        .unwrap_or(false);

    if guards_dashboard && !has_session {
        tracing::debug!(path = %path, "Redirecting anonymous dashboard request to login");
        return Redirect::temporary(LOGIN_PATH).into_response();
    }

    if guards_login && has_session {
        return Redirect::temporary(DASHBOARD_PATH).into_response();
    }

    next.run(req).await
}
