/// Middleware for the API server
///
/// - `security`: Security response headers
/// - `page_guard`: Redirects for the dashboard and login pages
///
/// Session authentication for API routes lives in
/// `kosan_shared::auth::middleware` and is wired up in `app`.

pub mod page_guard;
pub mod security;
