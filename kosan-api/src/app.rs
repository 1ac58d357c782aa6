/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use kosan_api::{app::{build_router, AppState}, config::Config, payment::midtrans::MidtransSnap};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let gateway = MidtransSnap::new(&config.midtrans)?;
/// let app = build_router(AppState::new(pool, config, Arc::new(gateway)));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{page_guard::page_guard, security::SecurityHeadersLayer},
    payment::{midtrans, PaymentGateway},
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use kosan_shared::auth::middleware::{session_auth_middleware, AuthError};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler; all fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Payment gateway used at registration
    pub payment: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, payment: Arc<dyn PaymentGateway>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            payment,
        }
    }

    /// Secret for session tokens
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Whether cookies get the `Secure` flag
    pub fn secure_cookies(&self) -> bool {
        self.config.api.production
    }
}

/// Builds the complete router
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /api
/// │   ├── POST /register                      public
/// │   ├── POST /webhook                       public, signature checked
/// │   ├── GET  /payment/config                public
/// │   ├── POST /auth/login, /auth/logout      public
/// │   ├── GET  /auth/me                       session
/// │   ├── PUT|PATCH /auth/update-whatsapp     session
/// │   ├── POST /kosan                         session
/// │   ├── GET  /kosan/user                    session
/// │   ├── GET|PATCH|DELETE /kosan/:id         session, owner only
/// │   ├── GET  /datakos                       public
/// │   └── GET  /datakos/:id                   public
/// └── everything else                         static client (if configured)
/// ```
///
/// The page guard wraps the whole router; security headers, CORS and
/// request tracing wrap everything.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_api = Router::new()
        .route("/register", post(routes::register::register))
        .route("/webhook", post(routes::webhook::webhook))
        .route("/payment/config", get(routes::payment::payment_config))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/datakos", get(routes::listings::list_listings))
        .route("/datakos/:id", get(routes::listings::get_listing));

    let session_api = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/auth/update-whatsapp",
            put(routes::auth::update_whatsapp).patch(routes::auth::update_whatsapp),
        )
        .route("/kosan", post(routes::kosan::create_kosan))
        .route("/kosan/user", get(routes::kosan::list_own_kosan))
        .route(
            "/kosan/:id",
            get(routes::kosan::get_kosan)
                .patch(routes::kosan::update_kosan)
                .delete(routes::kosan::delete_kosan),
        )
        .layer(from_fn_with_state(state.clone(), session_auth_layer));

    let mut router = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", public_api.merge(session_api));

    router = match &state.config.api.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(not_found),
    };

    let snap_origin = midtrans::base_url(state.config.midtrans.is_production);

    router
        .layer(from_fn_with_state(state.clone(), page_guard))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(
            state.config.api.production,
            snap_origin,
            state.config.api.storage_origin.as_deref(),
        ))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Session authentication for API routes
///
/// Accepts the `token` cookie or a bearer header and inserts
/// `AuthContext` into the request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    session_auth_middleware(state.config.jwt.secret.clone(), req, next).await
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
