/// Read-only access to users' film logs
///
/// The compatibility engine consumes this trait and never writes through it.
/// `PgRatingStore` is the production implementation; tests substitute mocks or
/// in-memory stores.
use crate::{
    error::AppResult,
    models::{CompareScope, Rating, RecentReview, Recommendation, UserId},
};

/// Trait for rating store backends
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    /// The user's rated logs (rating present), ordered by film id
    async fn rated_films(&self, user_id: UserId) -> AppResult<Vec<Rating>>;

    /// Other users' rated logs on films the active user has rated
    ///
    /// With `CompareScope::Following` only users the active user follows are
    /// included. Rows are ordered by user id, then film id.
    async fn candidate_pool(
        &self,
        active_user_id: UserId,
        scope: CompareScope,
    ) -> AppResult<Vec<Rating>>;

    async fn username(&self, user_id: UserId) -> AppResult<String>;

    /// Number of distinct films the user has logged
    async fn film_count(&self, user_id: UserId) -> AppResult<i64>;

    /// Number of users following this user
    async fn follower_count(&self, user_id: UserId) -> AppResult<i64>;

    /// Highest-rated films of `for_user_id` that `excluding_user_id` has not logged
    async fn recommendations(
        &self,
        for_user_id: UserId,
        excluding_user_id: UserId,
        limit: i64,
    ) -> AppResult<Vec<Recommendation>>;

    /// Most recently watched reviews written by the user
    async fn recent_reviews(&self, user_id: UserId, limit: i64) -> AppResult<Vec<RecentReview>>;

    /// Films both users have logged
    async fn overlap_watched(&self, user_a: UserId, user_b: UserId) -> AppResult<i64>;

    /// Films both users marked as liked
    async fn overlap_liked(&self, user_a: UserId, user_b: UserId) -> AppResult<i64>;

    /// Films both users rated with the same score
    async fn overlap_ratings(&self, user_a: UserId, user_b: UserId) -> AppResult<i64>;
}
