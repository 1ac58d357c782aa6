/// Public catalogue
///
/// ```text
/// GET /api/datakos?search=melati&kecamatan=SAIL&kecamatan=sukajadi
///                 &minHarga=500000&maxHarga=1000000
///                 &sortBy=harga&sortOrder=asc&limit=20&offset=0
/// GET /api/datakos/:id
/// ```
///
/// Only available listings (`tersedia = true`) are searchable. `kecamatan`
/// may repeat or hold a comma-separated list; codes are case-insensitive.
///
/// ```json
/// {
///   "data": [{ "id": "...", "nama": "Kos Melati", "namaPemilik": "Budi",
///              "noWhatsapp": "6281234567890", "waLink": "https://wa.me/..." }],
///   "pagination": { "total": 42, "limit": 20, "offset": 0, "hasMore": true }
/// }
/// ```

use axum::{
    extract::{Path, RawQuery, State},
    Json,
};
use kosan_shared::{
    models::kosan::{
        clamp_limit, has_more, Kecamatan, Kosan, KosanWithOwner, ListingFilter, SortBy, SortOrder,
    },
    phone::normalize_whatsapp,
};
use serde::Serialize;
use uuid::Uuid;

use super::kosan::parse_listing_id;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Builds the `wa.me` deep link a visitor uses to contact the owner
///
/// Returns `None` when the stored number does not normalize.
pub fn whatsapp_link(no_whatsapp: &str, public_base_url: &str, kosan_id: Uuid) -> Option<String> {
    let number = normalize_whatsapp(no_whatsapp).ok()?;
    let text = format!(
        "Halo! Saya tertarik dengan kosan ini: {}/kosan/{}",
        public_base_url.trim_end_matches('/'),
        kosan_id
    );

    Some(format!(
        "https://wa.me/{}?text={}",
        number,
        urlencoding::encode(&text)
    ))
}

/// Catalogue entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingItem {
    #[serde(flatten)]
    pub kosan: Kosan,
    pub no_whatsapp: String,
    pub nama_pemilik: String,
    pub wa_link: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct ListingPage {
    pub data: Vec<ListingItem>,
    pub pagination: Pagination,
}

/// Owner contact block of the detail view
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pemilik {
    pub nama_lengkap: String,
    pub no_whatsapp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetail {
    #[serde(flatten)]
    pub kosan: Kosan,
    pub pemilik: Pemilik,
    pub wa_link: Option<String>,
}

fn parse_number(name: &str, value: &str) -> ApiResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("{} must be a whole number", name)))
}

/// Turns the raw query string into a listing filter
///
/// Unknown parameters are ignored and empty values count as absent.
pub fn parse_filter(query: Option<&str>) -> ApiResult<ListingFilter> {
    let mut filter = ListingFilter::default();
    let mut limit = None;
    let mut sort_by = None;
    let mut sort_order = None;

    let pairs = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes());
    for (key, value) in pairs {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match &*key {
            "search" => filter.search = Some(value.to_string()),
            "kecamatan" => {
                for code in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                    let kecamatan = code
                        .parse::<Kecamatan>()
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                    if !filter.kecamatan.contains(&kecamatan) {
                        filter.kecamatan.push(kecamatan);
                    }
                }
            }
            "minHarga" => filter.min_harga = Some(parse_number("minHarga", value)?),
            "maxHarga" => filter.max_harga = Some(parse_number("maxHarga", value)?),
            "sortBy" => sort_by = SortBy::parse(value),
            "sortOrder" => sort_order = Some(value.to_string()),
            "limit" => limit = Some(parse_number("limit", value)?),
            "offset" => {
                let offset = parse_number("offset", value)?;
                if offset < 0 {
                    return Err(ApiError::BadRequest(
                        "offset must not be negative".to_string(),
                    ));
                }
                filter.offset = offset;
            }
            _ => {}
        }
    }

    filter.limit = clamp_limit(limit);
    filter.sort = sort_by.map(|by| (by, SortOrder::parse(sort_order.as_deref())));

    Ok(filter)
}

impl ListingItem {
    fn new(row: KosanWithOwner, public_base_url: &str) -> Self {
        let wa_link = whatsapp_link(&row.no_whatsapp, public_base_url, row.kosan.id);
        Self {
            kosan: row.kosan,
            no_whatsapp: row.no_whatsapp,
            nama_pemilik: row.nama_pemilik,
            wa_link,
        }
    }
}

/// Search available listings
pub async fn list_listings(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<ListingPage>> {
    let filter = parse_filter(query.as_deref())?;

    let rows = Kosan::search(&state.db, &filter).await?;
    let total = Kosan::count_matching(&state.db, &filter).await?;

    let base_url = &state.config.api.public_base_url;
    let data = rows
        .into_iter()
        .map(|row| ListingItem::new(row, base_url))
        .collect();

    Ok(Json(ListingPage {
        data,
        pagination: Pagination {
            total,
            limit: filter.limit,
            offset: filter.offset,
            has_more: has_more(filter.offset, filter.limit, total),
        },
    }))
}

/// Public detail of one listing
///
/// Unavailable listings are still shown here; the `tersedia` flag tells the
/// client to mark them.
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ListingDetail>> {
    let id = parse_listing_id(&id)?;
    let row = Kosan::find_with_owner(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Kosan not found".to_string()))?;

    let wa_link = whatsapp_link(
        &row.no_whatsapp,
        &state.config.api.public_base_url,
        row.kosan.id,
    );

    Ok(Json(ListingDetail {
        kosan: row.kosan,
        pemilik: Pemilik {
            nama_lengkap: row.nama_pemilik,
            no_whatsapp: row.no_whatsapp,
        },
        wa_link,
    }))
}
