use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::RatingStore,
    error::AppResult,
    models::{CompareScope, Rating, RecentReview, Recommendation, UserId},
};

/// Creates a PostgreSQL connection pool
///
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

const RATED_FILMS_SQL: &str = r#"
    SELECT "userId" AS user_id, "filmTMDbId" AS film_tmdb_id, rating, liked
    FROM "filmLogs"
    WHERE "userId" = $1 AND rating IS NOT NULL
    ORDER BY "filmTMDbId"
"#;

const CANDIDATE_POOL_ALL_SQL: &str = r#"
    SELECT "userId" AS user_id, "filmTMDbId" AS film_tmdb_id, rating, liked
    FROM "filmLogs"
    WHERE "userId" != $1
      AND "filmTMDbId" IN (SELECT "filmTMDbId" FROM "filmLogs" WHERE "userId" = $1 AND rating IS NOT NULL)
      AND rating IS NOT NULL
    ORDER BY "userId", "filmTMDbId"
"#;

const CANDIDATE_POOL_FOLLOWING_SQL: &str = r#"
    SELECT "userId" AS user_id, "filmTMDbId" AS film_tmdb_id, rating, liked
    FROM "filmLogs"
    WHERE "userId" != $1
      AND "filmTMDbId" IN (SELECT "filmTMDbId" FROM "filmLogs" WHERE "userId" = $1 AND rating IS NOT NULL)
      AND "userId" IN (SELECT "followedUserId" FROM "followLogs" WHERE "activeUserId" = $1)
      AND rating IS NOT NULL
    ORDER BY "userId", "filmTMDbId"
"#;

// "dateWatched" may be a DATE or a TIMESTAMPTZ column; the cast decodes either
const RECENT_REVIEWS_SQL: &str = r#"
    SELECT "filmTMDbId" AS film_tmdb_id, "filmPosterPath" AS film_poster_path,
           "dateWatched"::timestamptz AS date_watched, review
    FROM "filmLogs"
    WHERE "userId" = $1 AND review IS NOT NULL
    ORDER BY "dateWatched" DESC
    LIMIT $2
"#;

/// Postgres-backed rating store over the `filmLogs`, `followLogs` and `users` tables
#[derive(Clone)]
pub struct PgRatingStore {
    pool: PgPool,
}

impl PgRatingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RatingStore for PgRatingStore {
    async fn rated_films(&self, user_id: UserId) -> AppResult<Vec<Rating>> {
        let rows = sqlx::query_as::<_, Rating>(RATED_FILMS_SQL)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn candidate_pool(
        &self,
        active_user_id: UserId,
        scope: CompareScope,
    ) -> AppResult<Vec<Rating>> {
        let sql = match scope {
            CompareScope::All => CANDIDATE_POOL_ALL_SQL,
            CompareScope::Following => CANDIDATE_POOL_FOLLOWING_SQL,
        };

        let rows = sqlx::query_as::<_, Rating>(sql)
            .bind(active_user_id)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            active_user_id,
            scope = %scope,
            rows = rows.len(),
            "Loaded candidate pool"
        );

        Ok(rows)
    }

    async fn username(&self, user_id: UserId) -> AppResult<String> {
        let username = sqlx::query_scalar::<_, String>(
            r#"SELECT username FROM users WHERE "userId" = $1"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(username)
    }

    async fn film_count(&self, user_id: UserId) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(DISTINCT "filmTMDbId") FROM "filmLogs" WHERE "userId" = $1"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn follower_count(&self, user_id: UserId) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM "followLogs" WHERE "followedUserId" = $1"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn recommendations(
        &self,
        for_user_id: UserId,
        excluding_user_id: UserId,
        limit: i64,
    ) -> AppResult<Vec<Recommendation>> {
        let rows = sqlx::query_as::<_, Recommendation>(
            r#"
            SELECT "filmTMDbId" AS film_tmdb_id, "filmPosterPath" AS film_poster_path, rating, liked
            FROM "filmLogs"
            WHERE "userId" = $1
              AND "filmTMDbId" NOT IN (SELECT "filmTMDbId" FROM "filmLogs" WHERE "userId" = $2)
              AND rating IS NOT NULL
            ORDER BY rating DESC
            LIMIT $3
            "#,
        )
        .bind(for_user_id)
        .bind(excluding_user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn recent_reviews(&self, user_id: UserId, limit: i64) -> AppResult<Vec<RecentReview>> {
        let rows = sqlx::query_as::<_, RecentReview>(RECENT_REVIEWS_SQL)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn overlap_watched(&self, user_a: UserId, user_b: UserId) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT "filmTMDbId")
            FROM "filmLogs"
            WHERE "filmTMDbId" IN (SELECT "filmTMDbId" FROM "filmLogs" WHERE "userId" = $1)
              AND "filmTMDbId" IN (SELECT "filmTMDbId" FROM "filmLogs" WHERE "userId" = $2)
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn overlap_liked(&self, user_a: UserId, user_b: UserId) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT a."filmTMDbId")
            FROM "filmLogs" AS a
            JOIN "filmLogs" AS b ON a."filmTMDbId" = b."filmTMDbId"
            WHERE a."userId" = $1 AND b."userId" = $2
              AND a.liked = true AND b.liked = true
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn overlap_ratings(&self, user_a: UserId, user_b: UserId) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT a."filmTMDbId")
            FROM "filmLogs" AS a
            JOIN "filmLogs" AS b ON a."filmTMDbId" = b."filmTMDbId" AND a.rating = b.rating
            WHERE a."userId" = $1 AND b."userId" = $2
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
