use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::districts::repositories::map_write_error;
use crate::features::gram_panchayats::models::{
    GramPanchayat, GramPanchayatFields, GramPanchayatStatus,
};
use crate::shared::types::Pagination;

const GRAM_PANCHAYAT_COLUMNS: &str = r#"
    id, name, slug, district_id, block, establishment_year, historical_background,
    local_art, local_cuisine, traditions, population, area, lat, lng, header_image,
    status, created_by, created_at, updated_at
"#;

#[derive(Debug, Clone, Default)]
pub struct GramPanchayatFilter {
    pub district_id: Option<Uuid>,
    pub status: Option<GramPanchayatStatus>,
    pub search: Option<String>,
}

#[async_trait]
pub trait GramPanchayatRepository: Send + Sync {
    async fn list(
        &self,
        filter: &GramPanchayatFilter,
        page: Pagination,
    ) -> Result<(Vec<GramPanchayat>, i64)>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<GramPanchayat>>;

    /// All panchayats of a district, ordered by name
    async fn list_by_district(&self, district_id: Uuid) -> Result<Vec<GramPanchayat>>;

    /// Panchayat count per district; districts without any are absent
    async fn count_by_districts(&self, district_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>>;

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool>;

    async fn insert(&self, fields: &GramPanchayatFields, created_by: &str) -> Result<GramPanchayat>;

    async fn update(&self, id: Uuid, fields: &GramPanchayatFields) -> Result<GramPanchayat>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Bulk delete, returns the number of rows removed
    async fn delete_by_district(&self, district_id: Uuid) -> Result<u64>;
}

pub struct PgGramPanchayatRepository {
    pool: PgPool,
}

impl PgGramPanchayatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GramPanchayatRepository for PgGramPanchayatRepository {
    async fn list(
        &self,
        filter: &GramPanchayatFilter,
        page: Pagination,
    ) -> Result<(Vec<GramPanchayat>, i64)> {
        let where_clause = r#"
            WHERE ($1::uuid IS NULL OR district_id = $1)
              AND ($2::gram_panchayat_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%')
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM gram_panchayats {}",
            where_clause
        ))
        .bind(filter.district_id)
        .bind(filter.status)
        .bind(filter.search.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, GramPanchayat>(&format!(
            "SELECT {} FROM gram_panchayats {} ORDER BY name ASC LIMIT $4 OFFSET $5",
            GRAM_PANCHAYAT_COLUMNS, where_clause
        ))
        .bind(filter.district_id)
        .bind(filter.status)
        .bind(filter.search.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<GramPanchayat>> {
        let row = sqlx::query_as::<_, GramPanchayat>(&format!(
            "SELECT {} FROM gram_panchayats WHERE id = $1",
            GRAM_PANCHAYAT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_by_district(&self, district_id: Uuid) -> Result<Vec<GramPanchayat>> {
        let rows = sqlx::query_as::<_, GramPanchayat>(&format!(
            "SELECT {} FROM gram_panchayats WHERE district_id = $1 ORDER BY name ASC",
            GRAM_PANCHAYAT_COLUMNS
        ))
        .bind(district_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_by_districts(&self, district_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        if district_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let counts: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT district_id, COUNT(*)
            FROM gram_panchayats
            WHERE district_id = ANY($1)
            GROUP BY district_id
            "#,
        )
        .bind(district_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts.into_iter().collect())
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM gram_panchayats
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

    async fn insert(&self, fields: &GramPanchayatFields, created_by: &str) -> Result<GramPanchayat> {
        let row = sqlx::query_as::<_, GramPanchayat>(&format!(
            r#"
            INSERT INTO gram_panchayats (
                id, name, slug, district_id, block, establishment_year, historical_background,
                local_art, local_cuisine, traditions, population, area, lat, lng, header_image,
                status, created_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {}
            "#,
            GRAM_PANCHAYAT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&fields.name)
        .bind(&fields.slug)
        .bind(fields.district_id)
        .bind(fields.block.as_deref())
        .bind(fields.establishment_year)
        .bind(fields.historical_background.as_deref())
        .bind(fields.local_art.as_deref())
        .bind(fields.local_cuisine.as_deref())
        .bind(fields.traditions.as_deref())
        .bind(fields.population)
        .bind(fields.area)
        .bind(fields.coordinates.map(|c| c.lat))
        .bind(fields.coordinates.map(|c| c.lng))
        .bind(fields.header_image.as_deref())
        .bind(fields.status)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "gram panchayat"))?;

        Ok(row)
    }

    async fn update(&self, id: Uuid, fields: &GramPanchayatFields) -> Result<GramPanchayat> {
        let row = sqlx::query_as::<_, GramPanchayat>(&format!(
            r#"
            UPDATE gram_panchayats SET
                name = $2, slug = $3, district_id = $4, block = $5, establishment_year = $6,
                historical_background = $7, local_art = $8, local_cuisine = $9, traditions = $10,
                population = $11, area = $12, lat = $13, lng = $14, header_image = $15,
                status = $16, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            GRAM_PANCHAYAT_COLUMNS
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.slug)
        .bind(fields.district_id)
        .bind(fields.block.as_deref())
        .bind(fields.establishment_year)
        .bind(fields.historical_background.as_deref())
        .bind(fields.local_art.as_deref())
        .bind(fields.local_cuisine.as_deref())
        .bind(fields.traditions.as_deref())
        .bind(fields.population)
        .bind(fields.area)
        .bind(fields.coordinates.map(|c| c.lat))
        .bind(fields.coordinates.map(|c| c.lng))
        .bind(fields.header_image.as_deref())
        .bind(fields.status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "gram panchayat"))?;

        row.ok_or_else(|| AppError::NotFound(format!("Gram panchayat with id '{}' not found", id)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM gram_panchayats WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_district(&self, district_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM gram_panchayats WHERE district_id = $1")
            .bind(district_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
