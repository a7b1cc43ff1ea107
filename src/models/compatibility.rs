use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::{FilmId, UserId};

/// Winning candidate picked by the compatibility engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    pub user_id: UserId,
    /// Pearson coefficient in [-1, 1]
    pub correlation: f64,
    /// Number of paired ratings the coefficient was computed from
    pub shared_ratings: usize,
}

/// A film the best match rated that the active user has not logged
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "filmTMDbId")]
    pub film_tmdb_id: FilmId,
    pub film_poster_path: String,
    pub rating: i32,
    pub liked: Option<bool>,
}

/// One of the best match's reviews
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentReview {
    #[serde(rename = "filmTMDbId")]
    pub film_tmdb_id: FilmId,
    pub film_poster_path: String,
    pub date_watched: DateTime<Utc>,
    pub review: String,
}

/// Aggregates describing the best match, relative to the active user
///
/// Counts are serialized as strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    pub correlation: f64,
    pub username: String,
    #[serde(rename = "films", serialize_with = "count_as_string")]
    pub film_count: i64,
    #[serde(rename = "followers", serialize_with = "count_as_string")]
    pub follower_count: i64,
    #[serde(serialize_with = "count_as_string")]
    pub overlapping_watched: i64,
    #[serde(serialize_with = "count_as_string")]
    pub overlapping_liked: i64,
    #[serde(serialize_with = "count_as_string")]
    pub overlapping_ratings: i64,
    pub recommendations: Vec<Recommendation>,
    pub recent_reviews: Vec<RecentReview>,
}

/// Outcome of a compatibility comparison
///
/// `best_match_user_id` is `None` when no candidate shared enough ratings;
/// in that case no aggregate fields are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityResult {
    pub best_match_user_id: Option<UserId>,
    #[serde(flatten)]
    pub details: Option<MatchDetails>,
}

impl CompatibilityResult {
    pub fn no_match() -> Self {
        Self {
            best_match_user_id: None,
            details: None,
        }
    }

    pub fn matched(user_id: UserId, details: MatchDetails) -> Self {
        Self {
            best_match_user_id: Some(user_id),
            details: Some(details),
        }
    }
}

fn count_as_string<S: Serializer>(count: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(count)
}
