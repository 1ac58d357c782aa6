/// Owner listing management
///
/// All routes sit behind the session middleware and act on behalf of the
/// session user:
///
/// - `POST /api/kosan` - create a listing, 201 `{ "kosan": {...} }`
/// - `GET /api/kosan/user` - own listings, newest first
/// - `GET /api/kosan/:id` - one own listing
/// - `PATCH /api/kosan/:id` - replace the editable fields
/// - `DELETE /api/kosan/:id` - hard delete
///
/// Per-listing routes answer 404 for unknown ids and 403 for listings owned
/// by someone else. Ownership is settled before the body is even decoded.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use kosan_shared::{
    auth::{authorization::require_owner, middleware::AuthContext},
    models::kosan::{CreateKosan, Kecamatan, Kosan, UpdateKosan},
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{non_blank, parse_json, JsonBody};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};

/// Listing body for create and update
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct KosanRequest {
    #[validate(
        required(message = "nama is required"),
        length(max = 255, message = "nama must be at most 255 characters")
    )]
    pub nama: Option<String>,

    #[validate(required(message = "alamat is required"))]
    pub alamat: Option<String>,

    #[validate(required(message = "kecamatan is required"))]
    pub kecamatan: Option<String>,

    #[serde(deserialize_with = "integer_or_numeric_string")]
    #[validate(
        required(message = "hargaPerBulan is required"),
        range(min = 1, message = "hargaPerBulan must be greater than 0")
    )]
    pub harga_per_bulan: Option<i64>,

    #[validate(required(message = "deskripsi is required"))]
    pub deskripsi: Option<String>,

    pub foto_urls: Option<Vec<String>>,
    pub tersedia: Option<bool>,

    /// Only accepted when it names the session user
    pub pemilik_id: Option<Uuid>,
}

/// Form clients send the price as typed, so `"750000"` is accepted too
fn integer_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom("hargaPerBulan must be a whole number")),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom("hargaPerBulan must be a whole number")),
        Some(_) => Err(D::Error::custom("hargaPerBulan must be a whole number")),
    }
}

/// Validated listing fields
#[derive(Debug, Clone, PartialEq)]
struct KosanFields {
    nama: String,
    alamat: String,
    kecamatan: Kecamatan,
    harga_per_bulan: i64,
    deskripsi: String,
    foto_urls: Vec<String>,
    tersedia: Option<bool>,
    pemilik_id: Option<Uuid>,
}

impl KosanRequest {
    fn into_fields(self) -> ApiResult<KosanFields> {
        let req = KosanRequest {
            nama: non_blank(self.nama),
            alamat: non_blank(self.alamat),
            kecamatan: non_blank(self.kecamatan),
            deskripsi: non_blank(self.deskripsi),
            foto_urls: self.foto_urls.map(|urls| {
                urls.into_iter()
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty())
                    .collect()
            }),
            ..self
        };
        req.validate()?;

        let (Some(nama), Some(alamat), Some(kecamatan), Some(harga_per_bulan), Some(deskripsi)) = (
            req.nama,
            req.alamat,
            req.kecamatan,
            req.harga_per_bulan,
            req.deskripsi,
        ) else {
            return Err(ApiError::BadRequest("All fields are required".to_string()));
        };

        let kecamatan = kecamatan
            .parse::<Kecamatan>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        Ok(KosanFields {
            nama,
            alamat,
            kecamatan,
            harga_per_bulan,
            deskripsi,
            foto_urls: req.foto_urls.unwrap_or_default(),
            tersedia: req.tersedia,
            pemilik_id: req.pemilik_id,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct KosanResponse {
    pub kosan: Kosan,
}

#[derive(Debug, Serialize)]
pub struct KosanListResponse {
    pub kosan: Vec<Kosan>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Listing ids that are not UUIDs cannot exist
pub(crate) fn parse_listing_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| kosan_not_found())
}

fn kosan_not_found() -> ApiError {
    ApiError::NotFound("Kosan not found".to_string())
}

/// Loads a listing and checks it belongs to the session user
async fn load_owned(state: &AppState, auth: &AuthContext, raw_id: &str) -> ApiResult<Kosan> {
    let id = parse_listing_id(raw_id)?;
    let kosan = Kosan::find_by_id(&state.db, id)
        .await?
        .ok_or_else(kosan_not_found)?;

    require_owner(auth, kosan.pemilik_id)?;

    Ok(kosan)
}

/// Create a listing
///
/// # Errors
///
/// - `400 Bad Request`: missing fields, no photo, unknown kecamatan
/// - `403 Forbidden`: `pemilikId` names another user
pub async fn create_kosan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<KosanRequest>,
) -> ApiResult<(StatusCode, Json<KosanResponse>)> {
    let fields = req.into_fields()?;

    if fields.foto_urls.is_empty() {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "fotoUrls".to_string(),
            message: "At least one photo is required".to_string(),
        }]));
    }

    if let Some(pemilik_id) = fields.pemilik_id {
        require_owner(&auth, pemilik_id)?;
    }

    let kosan = Kosan::create(
        &state.db,
        CreateKosan {
            nama: fields.nama,
            alamat: fields.alamat,
            kecamatan: fields.kecamatan,
            harga_per_bulan: fields.harga_per_bulan,
            deskripsi: fields.deskripsi,
            foto_urls: fields.foto_urls,
            tersedia: fields.tersedia.unwrap_or(true),
            pemilik_id: auth.user_id,
        },
    )
    .await?;

    tracing::info!(kosan_id = %kosan.id, pemilik_id = %auth.user_id, "Listing created");

    Ok((StatusCode::CREATED, Json(KosanResponse { kosan })))
}

/// The session user's listings, including unavailable ones
pub async fn list_own_kosan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<KosanListResponse>> {
    let kosan = Kosan::list_by_owner(&state.db, auth.user_id).await?;

    Ok(Json(KosanListResponse { kosan }))
}

/// One own listing, returned bare for the edit form
pub async fn get_kosan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Kosan>> {
    let kosan = load_owned(&state, &auth, &id).await?;

    Ok(Json(kosan))
}

/// Replace a listing's editable fields
///
/// `fotoUrls` is replaced by the submitted list (empty when omitted);
/// `tersedia` keeps its value when omitted. The updated listing is returned
/// bare.
pub async fn update_kosan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Kosan>> {
    let existing = load_owned(&state, &auth, &id).await?;

    let fields = parse_json::<KosanRequest>(&body)?.into_fields()?;

    let kosan = Kosan::update(
        &state.db,
        existing.id,
        UpdateKosan {
            nama: fields.nama,
            alamat: fields.alamat,
            kecamatan: fields.kecamatan,
            harga_per_bulan: fields.harga_per_bulan,
            deskripsi: fields.deskripsi,
            foto_urls: fields.foto_urls,
            tersedia: fields.tersedia,
        },
    )
    .await?
    .ok_or_else(kosan_not_found)?;

    tracing::info!(kosan_id = %kosan.id, "Listing updated");

    Ok(Json(kosan))
}

/// Delete a listing
pub async fn delete_kosan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let existing = load_owned(&state, &auth, &id).await?;

    if !Kosan::delete(&state.db, existing.id).await? {
        return Err(kosan_not_found());
    }

    tracing::info!(kosan_id = %existing.id, "Listing deleted");

    Ok(Json(MessageResponse {
        message: "Kosan deleted".to_string(),
    }))
}
