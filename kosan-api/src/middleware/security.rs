/// Security headers middleware
///
/// Adds security headers to every response, including the static client
/// pages served behind the page guard.
///
/// # Headers Applied
///
/// - `X-Content-Type-Options: nosniff`
/// - `X-Frame-Options: DENY`
/// - `Referrer-Policy: strict-origin-when-cross-origin`
/// - `Permissions-Policy`: no geolocation, microphone, camera or usb
/// - `Content-Security-Policy`: same-origin, plus the Snap host for the
///   payment widget script and frame, `https:` images for listing photos,
///   and the object storage origin the client uploads photos to
/// - `Strict-Transport-Security` (production only)
///
/// # Example
///
/// ```no_run
/// use axum::Router;
/// use kosan_api::middleware::security::SecurityHeadersLayer;
///
/// let app: Router = Router::new()
///     .layer(SecurityHeadersLayer::new(
///         true,
///         "https://app.midtrans.com",
///         Some("https://kosan.s3.ap-southeast-1.amazonaws.com"),
///     ));
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Security headers middleware layer
#[derive(Clone)]
pub struct SecurityHeadersLayer {
    enable_hsts: bool,
    content_security_policy: HeaderValue,
}

impl SecurityHeadersLayer {
    /// Creates the layer
    ///
    /// * `enable_hsts` - send HSTS (production behind HTTPS)
    /// * `snap_origin` - payment widget host allowed by the CSP
    /// * `storage_origin` - upload target added to `connect-src`
    pub fn new(enable_hsts: bool, snap_origin: &str, storage_origin: Option<&str>) -> Self {
        Self {
            enable_hsts,
            content_security_policy: content_security_policy(snap_origin, storage_origin),
        }
    }
}

fn content_security_policy(snap_origin: &str, storage_origin: Option<&str>) -> HeaderValue {
    let mut connect_src = format!("'self' {}", snap_origin);
    if let Some(storage) = storage_origin {
        connect_src.push(' ');
        connect_src.push_str(storage);
    }

    let policy = format!(
        "default-src 'self'; script-src 'self' {origin}; frame-src {origin}; \
         style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; \
         connect-src {connect_src}; frame-ancestors 'none'",
        origin = snap_origin,
        connect_src = connect_src
    );

    HeaderValue::from_str(&policy).unwrap_or_else(|_| {
        HeaderValue::from_static("default-src 'self'; frame-ancestors 'none'")
    })
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersMiddleware {
            inner,
            enable_hsts: self.enable_hsts,
            content_security_policy: self.content_security_policy.clone(),
        }
    }
}

/// Security headers middleware service
#[derive(Clone)]
pub struct SecurityHeadersMiddleware<S> {
    inner: S,
    enable_hsts: bool,
    content_security_policy: HeaderValue,
}

impl<S> Service<Request> for SecurityHeadersMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let future = self.inner.call(request);
        let enable_hsts = self.enable_hsts;
        let csp = self.content_security_policy.clone();

        Box::pin(async move {
            let mut response = future.await?;
            let headers = response.headers_mut();

            headers.insert(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            );
            headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
            headers.insert(
                header::REFERRER_POLICY,
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            );
            headers.insert(
                "Permissions-Policy",
                HeaderValue::from_static("geolocation=(), microphone=(), camera=(), usb=()"),
            );
            headers.insert(header::CONTENT_SECURITY_POLICY, csp);

            if enable_hsts {
                headers.insert(
                    header::STRICT_TRANSPORT_SECURITY,
                    HeaderValue::from_static("max-age=31536000; includeSubDomains"),
                );
            }

            Ok(response)
        })
    }
}
