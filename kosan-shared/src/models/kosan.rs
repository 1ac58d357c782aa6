/// Boarding-house listing model
///
/// Every listing belongs to exactly one owner (`pemilik_id`). Owner-scoped
/// operations go through [`Kosan::find_by_id`] followed by an ownership check
/// in the API layer. The public catalogue goes through [`Kosan::search`] and
/// [`Kosan::count_matching`], which always restrict to available listings.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE kosan (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     nama VARCHAR(255) NOT NULL,
///     alamat TEXT NOT NULL,
///     kecamatan VARCHAR(32) NOT NULL,       -- one of the Kecamatan codes
///     harga_per_bulan BIGINT NOT NULL,      -- rupiah, >= 0
///     deskripsi TEXT NOT NULL,
///     foto_urls TEXT[] NOT NULL DEFAULT '{}',
///     tersedia BOOLEAN NOT NULL DEFAULT TRUE,
///     pemilik_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use kosan_shared::models::kosan::{Kecamatan, Kosan, ListingFilter, SortBy, SortOrder};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let filter = ListingFilter {
///     kecamatan: vec![Kecamatan::BukitRaya, Kecamatan::Sail],
///     max_harga: Some(1_000_000),
///     sort: Some((SortBy::Harga, SortOrder::Asc)),
///     ..ListingFilter::default()
/// };
///
/// let total = Kosan::count_matching(&pool, &filter).await?;
/// let page = Kosan::search(&pool, &filter).await?;
/// println!("showing {} of {}", page.len(), total);
/// # Ok(())
/// # }
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Page size when the client does not ask for one
pub const DEFAULT_LIMIT: i64 = 20;

/// Largest page size a client may request
pub const MAX_LIMIT: i64 = 100;

/// Pekanbaru district a listing is located in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Kecamatan {
    BukitRaya,
    LimaPuluh,
    MarpoyanDamai,
    PayungSekaki,
    PekanbaruKota,
    Sail,
    Senapelan,
    Sukajadi,
    TenayanRaya,
    Binawidya,
    Kulim,
    RumbaiBarat,
    Rumbai,
    RumbaiTimur,
    Tuahmadani,
}

impl Kecamatan {
    /// Every district, in the order the client presents them
    pub const ALL: [Kecamatan; 15] = [
        Kecamatan::BukitRaya,
        Kecamatan::LimaPuluh,
        Kecamatan::MarpoyanDamai,
        Kecamatan::PayungSekaki,
        Kecamatan::PekanbaruKota,
        Kecamatan::Sail,
        Kecamatan::Senapelan,
        Kecamatan::Sukajadi,
        Kecamatan::TenayanRaya,
        Kecamatan::Binawidya,
        Kecamatan::Kulim,
        Kecamatan::RumbaiBarat,
        Kecamatan::Rumbai,
        Kecamatan::RumbaiTimur,
        Kecamatan::Tuahmadani,
    ];

    /// Stored code, e.g. `BUKIT_RAYA`
    pub fn as_str(&self) -> &'static str {
        match self {
            Kecamatan::BukitRaya => "BUKIT_RAYA",
            Kecamatan::LimaPuluh => "LIMA_PULUH",
            Kecamatan::MarpoyanDamai => "MARPOYAN_DAMAI",
            Kecamatan::PayungSekaki => "PAYUNG_SEKAKI",
            Kecamatan::PekanbaruKota => "PEKANBARU_KOTA",
            Kecamatan::Sail => "SAIL",
            Kecamatan::Senapelan => "SENAPELAN",
            Kecamatan::Sukajadi => "SUKAJADI",
            Kecamatan::TenayanRaya => "TENAYAN_RAYA",
            Kecamatan::Binawidya => "BINAWIDYA",
            Kecamatan::Kulim => "KULIM",
            Kecamatan::RumbaiBarat => "RUMBAI_BARAT",
            Kecamatan::Rumbai => "RUMBAI",
            Kecamatan::RumbaiTimur => "RUMBAI_TIMUR",
            Kecamatan::Tuahmadani => "TUAHMADANI",
        }
    }
}

impl fmt::Display for Kecamatan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown district code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown kecamatan: {0}")]
pub struct UnknownKecamatan(pub String);

impl FromStr for Kecamatan {
    type Err = UnknownKecamatan;

    /// Parses a district code, ignoring case and surrounding whitespace
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Kecamatan::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == code)
            .ok_or_else(|| UnknownKecamatan(s.to_string()))
    }
}

impl TryFrom<String> for Kecamatan {
    type Error = UnknownKecamatan;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Listing row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Kosan {
    pub id: Uuid,
    pub nama: String,
    pub alamat: String,

    #[sqlx(try_from = "String")]
    pub kecamatan: Kecamatan,

    /// Monthly rent in rupiah
    pub harga_per_bulan: i64,

    pub deskripsi: String,

    /// Photo URLs in display order
    pub foto_urls: Vec<String>,

    pub tersedia: bool,
    pub pemilik_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing joined with its owner's public contact fields
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KosanWithOwner {
    #[sqlx(flatten)]
    pub kosan: Kosan,

    /// Owner's full name
    pub nama_pemilik: String,

    /// Owner's WhatsApp number as stored
    pub no_whatsapp: String,
}

/// Input for a new listing
#[derive(Debug, Clone)]
pub struct CreateKosan {
    pub nama: String,
    pub alamat: String,
    pub kecamatan: Kecamatan,
    pub harga_per_bulan: i64,
    pub deskripsi: String,
    pub foto_urls: Vec<String>,
    pub tersedia: bool,
    pub pemilik_id: Uuid,
}

/// Full replacement of a listing's editable fields
///
/// `tersedia: None` keeps the current availability.
#[derive(Debug, Clone)]
pub struct UpdateKosan {
    pub nama: String,
    pub alamat: String,
    pub kecamatan: Kecamatan,
    pub harga_per_bulan: i64,
    pub deskripsi: String,
    pub foto_urls: Vec<String>,
    pub tersedia: Option<bool>,
}

/// Sort key for the public catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Harga,
    CreatedAt,
}

impl SortBy {
    /// Parses the `sortBy` query value; unknown keys mean "unsorted"
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "harga" => Some(SortBy::Harga),
            "createdAt" => Some(SortBy::CreatedAt),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            SortBy::Harga => "k.harga_per_bulan",
            SortBy::CreatedAt => "k.created_at",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parses `sortOrder`; anything other than `asc` sorts descending
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("asc") => SortOrder::Asc,
            Some(_) => SortOrder::Desc,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Public catalogue query
///
/// Availability (`tersedia = true`) is always applied and cannot be turned
/// off through the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFilter {
    /// Case-insensitive substring of `nama`
    pub search: Option<String>,

    /// District membership; empty means any district
    pub kecamatan: Vec<Kecamatan>,

    /// Inclusive lower price bound
    pub min_harga: Option<i64>,

    /// Inclusive upper price bound
    pub max_harga: Option<i64>,

    /// `None` lists newest first
    pub sort: Option<(SortBy, SortOrder)>,

    pub limit: i64,
    pub offset: i64,
}

impl Default for ListingFilter {
    fn default() -> Self {
        Self {
            search: None,
            kecamatan: Vec::new(),
            min_harga: None,
            max_harga: None,
            sort: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Applies the default and bounds to a requested page size
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Returns true when rows remain after the current page
pub fn has_more(offset: i64, limit: i64, total: i64) -> bool {
    offset.saturating_add(limit) < total
}

/// Escapes `%`, `_` and `\` so user input matches literally inside ILIKE
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl ListingFilter {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE k.tersedia = TRUE");

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND k.nama ILIKE ")
                .push_bind(format!("%{}%", escape_like(search)));
        }

        if !self.kecamatan.is_empty() {
            let codes: Vec<String> = self.kecamatan.iter().map(|k| k.as_str().to_string()).collect();
            qb.push(" AND k.kecamatan = ANY(").push_bind(codes).push(")");
        }

        if let Some(min) = self.min_harga {
            qb.push(" AND k.harga_per_bulan >= ").push_bind(min);
        }

        if let Some(max) = self.max_harga {
            qb.push(" AND k.harga_per_bulan <= ").push_bind(max);
        }
    }

    fn push_order(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self.sort {
            Some((by, order)) => {
                qb.push(" ORDER BY ")
                    .push(by.column())
                    .push(" ")
                    .push(order.keyword())
                    .push(", k.id ASC");
            }
            None => {
                qb.push(" ORDER BY k.created_at DESC, k.id ASC");
            }
        }
    }
}

const KOSAN_COLUMNS: &str = "id, nama, alamat, kecamatan, harga_per_bulan, deskripsi, \
                             foto_urls, tersedia, pemilik_id, created_at, updated_at";

const KOSAN_WITH_OWNER_SELECT: &str = "SELECT k.id, k.nama, k.alamat, k.kecamatan, \
     k.harga_per_bulan, k.deskripsi, k.foto_urls, k.tersedia, k.pemilik_id, \
     k.created_at, k.updated_at, u.nama_lengkap AS nama_pemilik, u.no_whatsapp \
     FROM kosan k JOIN users u ON u.id = k.pemilik_id";

impl Kosan {
    /// Inserts a listing
    pub async fn create(pool: &PgPool, data: CreateKosan) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO kosan
                 (nama, alamat, kecamatan, harga_per_bulan, deskripsi, foto_urls, tersedia, pemilik_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            KOSAN_COLUMNS
        );

        sqlx::query_as::<_, Kosan>(&sql)
            .bind(data.nama)
            .bind(data.alamat)
            .bind(data.kecamatan.as_str())
            .bind(data.harga_per_bulan)
            .bind(data.deskripsi)
            .bind(data.foto_urls)
            .bind(data.tersedia)
            .bind(data.pemilik_id)
            .fetch_one(pool)
            .await
    }

    /// Finds a listing by ID regardless of availability
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM kosan WHERE id = $1", KOSAN_COLUMNS);

        sqlx::query_as::<_, Kosan>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a listing with its owner's contact fields
    pub async fn find_with_owner(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<KosanWithOwner>, sqlx::Error> {
        let sql = format!("{} WHERE k.id = $1", KOSAN_WITH_OWNER_SELECT);

        sqlx::query_as::<_, KosanWithOwner>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists an owner's listings, newest first, including unavailable ones
    pub async fn list_by_owner(pool: &PgPool, pemilik_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM kosan WHERE pemilik_id = $1 ORDER BY created_at DESC, id ASC",
            KOSAN_COLUMNS
        );

        sqlx::query_as::<_, Kosan>(&sql)
            .bind(pemilik_id)
            .fetch_all(pool)
            .await
    }

    /// Replaces the editable fields of a listing
    ///
    /// Returns `None` if the listing does not exist. Ownership must be
    /// checked by the caller before calling this.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateKosan,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE kosan SET
                 nama = $2,
                 alamat = $3,
                 kecamatan = $4,
                 harga_per_bulan = $5,
                 deskripsi = $6,
                 foto_urls = $7,
                 tersedia = COALESCE($8, tersedia),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            KOSAN_COLUMNS
        );

        sqlx::query_as::<_, Kosan>(&sql)
            .bind(id)
            .bind(data.nama)
            .bind(data.alamat)
            .bind(data.kecamatan.as_str())
            .bind(data.harga_per_bulan)
            .bind(data.deskripsi)
            .bind(data.foto_urls)
            .bind(data.tersedia)
            .fetch_optional(pool)
            .await
    }

    /// Hard-deletes a listing
    ///
    /// Returns true if a row was removed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM kosan WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetches one page of available listings matching the filter
    pub async fn search(
        pool: &PgPool,
        filter: &ListingFilter,
    ) -> Result<Vec<KosanWithOwner>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(KOSAN_WITH_OWNER_SELECT);
        filter.push_conditions(&mut qb);
        filter.push_order(&mut qb);
        qb.push(" LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        tracing::debug!(sql = qb.sql(), "Searching listings");

        qb.build_query_as::<KosanWithOwner>().fetch_all(pool).await
    }

    /// Counts all available listings matching the filter, ignoring paging
    pub async fn count_matching(pool: &PgPool, filter: &ListingFilter) -> Result<i64, sqlx::Error> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM kosan k JOIN users u ON u.id = k.pemilik_id");
        filter.push_conditions(&mut qb);

        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }
}
