/// API route handlers
///
/// Organized by resource:
///
/// - `health`: liveness and database check
/// - `register`: paid owner registration
/// - `webhook`: payment notifications
/// - `payment`: client payment widget settings
/// - `auth`: login, logout, session profile, WhatsApp number
/// - `kosan`: owner listing management
/// - `listings`: public catalogue

pub mod auth;
pub mod health;
pub mod kosan;
pub mod listings;
pub mod payment;
pub mod register;
pub mod webhook;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

/// JSON body extractor that rejects with the API error format
///
/// `axum::Json` answers malformed bodies with plain text; this wrapper keeps
/// every error a JSON `{ error, code }` object.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// Decodes a JSON body that was read as raw bytes
///
/// Used where the body must only be interpreted after other checks passed.
pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// Trims a text field, mapping blank input to `None`
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        name: String,
    }

    #[test]
    fn test_parse_json() {
        let body: Body = parse_json(br#"{"name":"Kos Melati"}"#).unwrap();
        assert_eq!(body.name, "Kos Melati");

        let err = parse_json::<Body>(b"{not json").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Budi ".into())), Some("Budi".to_string()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }
}
