use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::districts::models::{District, DistrictFields, DistrictStatus};
use crate::shared::types::Pagination;

const DISTRICT_COLUMNS: &str = r#"
    id, name, slug, formation_year, area, population, history_and_culture, status,
    lat, lng, major_rivers, hills, natural_spots, tourist_places, famous_personalities,
    header_image, created_at, updated_at
"#;

/// Optional filters for district listings
#[derive(Debug, Clone, Default)]
pub struct DistrictFilter {
    pub status: Option<DistrictStatus>,
    /// Case-insensitive partial match on the name
    pub search: Option<String>,
}

#[async_trait]
pub trait DistrictRepository: Send + Sync {
    /// Page of districts ordered by name, plus the total matching the filter
    async fn list(&self, filter: &DistrictFilter, page: Pagination) -> Result<(Vec<District>, i64)>;

    /// Active districts that have coordinates, ordered by name
    async fn list_mappable(&self) -> Result<Vec<District>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<District>>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<District>>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<District>>;

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool>;

    /// Case-insensitive name collision check
    async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> Result<bool>;

    async fn insert(&self, fields: &DistrictFields) -> Result<District>;

    async fn update(&self, id: Uuid, fields: &DistrictFields) -> Result<District>;

    /// Returns false when no row matched
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

pub struct PgDistrictRepository {
    pool: PgPool,
}

impl PgDistrictRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique index violation to 409, anything else to a database error.
pub(crate) fn map_write_error(e: sqlx::Error, entity: &str) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return AppError::Conflict(format!(
                "A {} with the same slug or name already exists",
                entity
            ));
        }
    }
    tracing::error!("Failed to write {}: {:?}", entity, e);
    AppError::Database(e)
}

#[async_trait]
impl DistrictRepository for PgDistrictRepository {
    async fn list(&self, filter: &DistrictFilter, page: Pagination) -> Result<(Vec<District>, i64)> {
        let where_clause = r#"
            WHERE ($1::district_status IS NULL OR status = $1)
              AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%')
        "#;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM districts {}", where_clause))
                .bind(filter.status)
                .bind(filter.search.as_deref())
                .fetch_one(&self.pool)
                .await?;

        let districts = sqlx::query_as::<_, District>(&format!(
            "SELECT {} FROM districts {} ORDER BY name ASC LIMIT $3 OFFSET $4",
            DISTRICT_COLUMNS, where_clause
        ))
        .bind(filter.status)
        .bind(filter.search.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((districts, total))
    }

    async fn list_mappable(&self) -> Result<Vec<District>> {
        let districts = sqlx::query_as::<_, District>(&format!(
            r#"
            SELECT {} FROM districts
            WHERE status = 'active' AND lat IS NOT NULL AND lng IS NOT NULL
            ORDER BY name ASC
            "#,
            DISTRICT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(districts)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<District>> {
        let district = sqlx::query_as::<_, District>(&format!(
            "SELECT {} FROM districts WHERE id = $1",
            DISTRICT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(district)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<District>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let districts = sqlx::query_as::<_, District>(&format!(
            "SELECT {} FROM districts WHERE id = ANY($1)",
            DISTRICT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(districts)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<District>> {
        let district = sqlx::query_as::<_, District>(&format!(
            "SELECT {} FROM districts WHERE slug = $1",
            DISTRICT_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(district)
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM districts
                WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM districts
                WHERE LOWER(name) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn insert(&self, fields: &DistrictFields) -> Result<District> {
        let district = sqlx::query_as::<_, District>(&format!(
            r#"
            INSERT INTO districts (
                id, name, slug, formation_year, area, population, history_and_culture, status,
                lat, lng, major_rivers, hills, natural_spots, tourist_places, famous_personalities,
                header_image
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {}
            "#,
            DISTRICT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&fields.name)
        .bind(&fields.slug)
        .bind(fields.formation_year)
        .bind(fields.area)
        .bind(fields.population)
        .bind(fields.history_and_culture.as_deref())
        .bind(fields.status)
        .bind(fields.coordinates.map(|c| c.lat))
        .bind(fields.coordinates.map(|c| c.lng))
        .bind(&fields.major_rivers)
        .bind(&fields.hills)
        .bind(&fields.natural_spots)
        .bind(Json(&fields.tourist_places))
        .bind(Json(&fields.famous_personalities))
        .bind(fields.header_image.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "district"))?;

        Ok(district)
    }

    async fn update(&self, id: Uuid, fields: &DistrictFields) -> Result<District> {
        let district = sqlx::query_as::<_, District>(&format!(
            r#"
            UPDATE districts SET
                name = $2, slug = $3, formation_year = $4, area = $5, population = $6,
                history_and_culture = $7, status = $8, lat = $9, lng = $10,
                major_rivers = $11, hills = $12, natural_spots = $13,
                tourist_places = $14, famous_personalities = $15, header_image = $16,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            DISTRICT_COLUMNS
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.slug)
        .bind(fields.formation_year)
        .bind(fields.area)
        .bind(fields.population)
        .bind(fields.history_and_culture.as_deref())
        .bind(fields.status)
        .bind(fields.coordinates.map(|c| c.lat))
        .bind(fields.coordinates.map(|c| c.lng))
        .bind(&fields.major_rivers)
        .bind(&fields.hills)
        .bind(&fields.natural_spots)
        .bind(Json(&fields.tourist_places))
        .bind(Json(&fields.famous_personalities))
        .bind(fields.header_image.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "district"))?;

        district.ok_or_else(|| AppError::NotFound(format!("District with id '{}' not found", id)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM districts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
