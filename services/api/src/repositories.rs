//! Repositories for database operations

use anyhow::Result;
use providers::MediaKind;
use sqlx::PgPool;
use uuid::Uuid;

pub mod content;

/// User-profile repository
///
/// Narrow mutators called as side effects after a successful resolution or
/// from the personalization routes. Failures here never fail the main
/// response; call sites log and move on.
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a new profile repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a watch-history entry (append-only, no de-duplication)
    pub async fn add_watch_history(
        &self,
        user_id: Uuid,
        kind: MediaKind,
        external_id: &str,
        title: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO watch_history (id, user_id, kind, external_id, title, watched_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind.as_str())
        .bind(external_id)
        .bind(title)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add a favorites entry; returns false when it already existed
    pub async fn add_favorite(
        &self,
        user_id: Uuid,
        kind: MediaKind,
        external_id: &str,
        title: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (id, user_id, kind, external_id, title, added_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id, kind, external_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind.as_str())
        .bind(external_id)
        .bind(title)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Add a watchlist entry; returns false when it already existed
    pub async fn add_watchlist(
        &self,
        user_id: Uuid,
        kind: MediaKind,
        external_id: &str,
        title: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO watchlist (id, user_id, kind, external_id, title, added_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id, kind, external_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind.as_str())
        .bind(external_id)
        .bind(title)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a rating, overwriting any prior rating for the same item
    pub async fn add_rating(
        &self,
        user_id: Uuid,
        kind: MediaKind,
        external_id: &str,
        rating: f32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ratings (id, user_id, kind, external_id, rating, rated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id, kind, external_id) DO UPDATE SET
            rating = EXCLUDED.rating,
            rated_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind.as_str())
        .bind(external_id)
        .bind(rating)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
