//! Content repository for persisted normalized documents
//!
//! Documents live in a JSONB column keyed by `(external_id, kind)`; the
//! database's upsert semantics guarantee at most one document per key.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use providers::{MediaKind, NormalizedItem};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// How long a persisted document stays authoritative, in hours
const DOCUMENT_TTL_HOURS: i64 = 24;

/// A persisted normalized document plus its bookkeeping columns
#[derive(Debug, Clone)]
pub struct StoredContent {
    pub item: NormalizedItem,
    pub view_count: i64,
    pub cache_expiry: DateTime<Utc>,
}

impl StoredContent {
    /// True while the document may be served without consulting upstream
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.cache_expiry
    }
}

/// Content repository for database operations
#[derive(Clone)]
pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    /// Create a new content repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a persisted document by its upstream identity
    pub async fn find(
        &self,
        kind: MediaKind,
        external_id: &str,
    ) -> Result<Option<StoredContent>> {
        let row = sqlx::query(
            r#"
            SELECT document, view_count, cache_expiry
            FROM content_items
            WHERE external_id = $1 AND kind = $2
            "#,
        )
        .bind(external_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let document: serde_json::Value = row.get("document");
                let item: NormalizedItem = serde_json::from_value(document)?;
                Ok(Some(StoredContent {
                    item,
                    view_count: row.get("view_count"),
                    cache_expiry: row.get("cache_expiry"),
                }))
            }
            None => Ok(None),
        }
    }

    /// Upsert a document keyed by `(external_id, kind)`, refreshing its expiry
    pub async fn upsert(&self, item: &NormalizedItem) -> Result<()> {
        let document = serde_json::to_value(item)?;
        let cache_expiry = Utc::now() + Duration::hours(DOCUMENT_TTL_HOURS);

        sqlx::query(
            r#"
            INSERT INTO content_items
                (id, external_id, kind, document, view_count, cache_expiry, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, $5, NOW(), NOW())
            ON CONFLICT (external_id, kind) DO UPDATE SET
            document = EXCLUDED.document,
            cache_expiry = EXCLUDED.cache_expiry,
            updated_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&item.external_id)
        .bind(item.kind.as_str())
        .bind(&document)
        .bind(cache_expiry)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Bump the view counter; called fire-and-forget relative to the response
    pub async fn increment_views(&self, kind: MediaKind, external_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE content_items
            SET view_count = view_count + 1
            WHERE external_id = $1 AND kind = $2
            "#,
        )
        .bind(external_id)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of persisted documents of one kind
    pub async fn count_by_kind(&self, kind: MediaKind) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM content_items WHERE kind = $1")
                .bind(kind.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
