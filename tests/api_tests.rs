use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use uuid::Uuid;

use cinematch_api::{
    api::{create_router, AppState},
    db::RatingStore,
    error::AppResult,
    models::{CompareScope, FilmId, Rating, RecentReview, Recommendation, UserId},
    services::CompatibilityEngine,
};

/// In-memory stand-in for the film log tables
#[derive(Default)]
struct MemoryStore {
    logs: Vec<Rating>,
    usernames: HashMap<UserId, String>,
    /// (follower, followed)
    follows: HashSet<(UserId, UserId)>,
    reviews: Vec<(UserId, RecentReview)>,
}

impl MemoryStore {
    fn user(mut self, user_id: UserId, name: &str, scores: &[(FilmId, i32)]) -> Self {
        self.usernames.insert(user_id, name.to_string());
        self.logs.extend(
            scores
                .iter()
                .map(|&(film, score)| Rating::rated(user_id, film, score)),
        );
        self
    }

    /// Logs a film without rating it
    fn watched(mut self, user_id: UserId, film: FilmId) -> Self {
        self.logs.push(Rating {
            user_id,
            film_tmdb_id: film,
            rating: None,
            liked: None,
        });
        self
    }

    /// Sets the liked flag on existing logs
    fn likes(mut self, user_id: UserId, films: &[(FilmId, bool)]) -> Self {
        for &(film, liked) in films {
            for log in self.logs.iter_mut() {
                if log.user_id == user_id && log.film_tmdb_id == film {
                    log.liked = Some(liked);
                }
            }
        }
        self
    }

    fn review(mut self, user_id: UserId, film: FilmId, watched: DateTime<Utc>, text: &str) -> Self {
        self.reviews.push((
            user_id,
            RecentReview {
                film_tmdb_id: film,
                film_poster_path: format!("/{}.jpg", film),
                date_watched: watched,
                review: text.to_string(),
            },
        ));
        self
    }

    fn follow(mut self, follower: UserId, followed: UserId) -> Self {
        self.follows.insert((follower, followed));
        self
    }

    fn logs_of(&self, user_id: UserId) -> impl Iterator<Item = &Rating> {
        self.logs.iter().filter(move |log| log.user_id == user_id)
    }

    fn films_of(&self, user_id: UserId) -> HashSet<FilmId> {
        self.logs_of(user_id).map(|log| log.film_tmdb_id).collect()
    }
}

#[async_trait::async_trait]
impl RatingStore for MemoryStore {
    async fn rated_films(&self, user_id: UserId) -> AppResult<Vec<Rating>> {
        let mut rows: Vec<Rating> = self
            .logs_of(user_id)
            .filter(|log| log.rating.is_some())
            .cloned()
            .collect();
        rows.sort_by_key(|log| log.film_tmdb_id);
        Ok(rows)
    }

    async fn candidate_pool(
        &self,
        active_user_id: UserId,
        scope: CompareScope,
    ) -> AppResult<Vec<Rating>> {
        let rated: HashSet<FilmId> = self
            .logs_of(active_user_id)
            .filter(|log| log.rating.is_some())
            .map(|log| log.film_tmdb_id)
            .collect();

        let mut rows: Vec<Rating> = self
            .logs
            .iter()
            .filter(|log| log.user_id != active_user_id && log.rating.is_some())
            .filter(|log| rated.contains(&log.film_tmdb_id))
            .filter(|log| {
                scope == CompareScope::All || self.follows.contains(&(active_user_id, log.user_id))
            })
            .cloned()
            .collect();
        rows.sort_by_key(|log| (log.user_id, log.film_tmdb_id));
        Ok(rows)
    }

    async fn username(&self, user_id: UserId) -> AppResult<String> {
        Ok(self.usernames.get(&user_id).cloned().unwrap_or_default())
    }

    async fn film_count(&self, user_id: UserId) -> AppResult<i64> {
        Ok(self.films_of(user_id).len() as i64)
    }

    async fn follower_count(&self, user_id: UserId) -> AppResult<i64> {
        Ok(self.follows.iter().filter(|(_, followed)| *followed == user_id).count() as i64)
    }

    async fn recommendations(
        &self,
        for_user_id: UserId,
        excluding_user_id: UserId,
        limit: i64,
    ) -> AppResult<Vec<Recommendation>> {
        let seen = self.films_of(excluding_user_id);
        let mut rows: Vec<Recommendation> = self
            .logs_of(for_user_id)
            .filter(|log| !seen.contains(&log.film_tmdb_id))
            .filter_map(|log| {
                log.rating.map(|rating| Recommendation {
                    film_tmdb_id: log.film_tmdb_id,
                    film_poster_path: format!("/{}.jpg", log.film_tmdb_id),
                    rating,
                    liked: log.liked,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.rating.cmp(&a.rating));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn recent_reviews(&self, user_id: UserId, limit: i64) -> AppResult<Vec<RecentReview>> {
        let mut rows: Vec<RecentReview> = self
            .reviews
            .iter()
            .filter(|(author, _)| *author == user_id)
            .map(|(_, review)| review.clone())
            .collect();
        rows.sort_by(|a, b| b.date_watched.cmp(&a.date_watched));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn overlap_watched(&self, user_a: UserId, user_b: UserId) -> AppResult<i64> {
        Ok(self.films_of(user_a).intersection(&self.films_of(user_b)).count() as i64)
    }

    async fn overlap_liked(&self, user_a: UserId, user_b: UserId) -> AppResult<i64> {
        let liked_by = |user_id: UserId| -> HashSet<FilmId> {
            self.logs_of(user_id)
                .filter(|log| log.liked == Some(true))
                .map(|log| log.film_tmdb_id)
                .collect()
        };
        Ok(liked_by(user_a).intersection(&liked_by(user_b)).count() as i64)
    }

    async fn overlap_ratings(&self, user_a: UserId, user_b: UserId) -> AppResult<i64> {
        let theirs: HashSet<(FilmId, Option<i32>)> = self
            .logs_of(user_b)
            .map(|log| (log.film_tmdb_id, log.rating))
            .collect();
        Ok(self
            .logs_of(user_a)
            .filter(|log| log.rating.is_some() && theirs.contains(&(log.film_tmdb_id, log.rating)))
            .count() as i64)
    }
}

const ACTIVE: UserId = 1;

fn ascending() -> Vec<(FilmId, i32)> {
    (1..=10).map(|f| (f, f)).collect()
}

fn create_test_server(store: MemoryStore) -> TestServer {
    let state = AppState::new(Arc::new(store), CompatibilityEngine::default());
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn user_header(user_id: UserId) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&user_id.to_string()).unwrap(),
    )
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(MemoryStore::default());
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_compare_requires_user_identity() {
    let server = create_test_server(MemoryStore::default());

    let response = server.get("/api/compare/all").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "userId is required.");
}

#[tokio::test]
async fn test_compare_with_too_few_reviews() {
    let store = MemoryStore::default()
        .user(ACTIVE, "newcomer", &ascending()[..9])
        .user(42, "twin", &ascending());
    let server = create_test_server(store);
    let (name, value) = user_header(ACTIVE);

    let response = server.get("/api/compare/all").add_header(name, value).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Too few reviews");
}

#[tokio::test]
async fn test_compare_all_finds_identical_taste() {
    let mut twin = ascending();
    twin.extend([(500, 9), (501, 6), (502, 10), (503, 2), (504, 8)]);
    let store = MemoryStore::default()
        .user(ACTIVE, "me", &ascending())
        .user(42, "twin", &twin)
        .follow(7, 42);
    let server = create_test_server(store);
    let (name, value) = user_header(ACTIVE);

    let response = server.get("/api/compare/all").add_header(name, value).await;

    response.assert_status_ok();
    let request_id = response.header("x-request-id");
    assert!(Uuid::parse_str(request_id.to_str().unwrap()).is_ok());
    let body: Value = response.json();
    assert_eq!(body["bestMatchUserId"], 42);
    assert!((body["correlation"].as_f64().unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(body["username"], "twin");
    assert_eq!(body["films"], "15");
    assert_eq!(body["followers"], "1");
    assert_eq!(body["overlappingWatched"], "10");
    assert_eq!(body["overlappingRatings"], "10");

    let recommendations = body["recommendations"].as_array().unwrap();
    let films: Vec<i64> = recommendations
        .iter()
        .map(|r| r["filmTMDbId"].as_i64().unwrap())
        .collect();
    assert_eq!(films, vec![502, 500, 504, 501]);
}

#[tokio::test]
async fn test_compare_without_qualifying_candidate() {
    let store = MemoryStore::default()
        .user(ACTIVE, "me", &ascending())
        .user(42, "casual", &ascending()[..8]);
    let server = create_test_server(store);
    let (name, value) = user_header(ACTIVE);

    let response = server.get("/api/compare/all").add_header(name, value).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["bestMatchUserId"].is_null());
    assert_eq!(body.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_compare_following_limits_pool_to_followed_users() {
    let loosely: Vec<(FilmId, i32)> = vec![
        (1, 2),
        (2, 1),
        (3, 4),
        (4, 3),
        (5, 6),
        (6, 5),
        (7, 8),
        (8, 7),
        (9, 10),
        (10, 9),
    ];
    let store = MemoryStore::default()
        .user(ACTIVE, "me", &ascending())
        .user(42, "twin", &ascending())
        .user(43, "friend", &loosely)
        .follow(ACTIVE, 43);
    let server = create_test_server(store);

    let (name, value) = user_header(ACTIVE);
    let all: Value = server
        .get("/api/compare/all")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(all["bestMatchUserId"], 42);

    let (name, value) = user_header(ACTIVE);
    let following: Value = server
        .get("/api/compare/following")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(following["bestMatchUserId"], 43);
    assert_eq!(following["username"], "friend");
    assert!(following["correlation"].as_f64().unwrap() < 1.0);
}

#[tokio::test]
async fn test_overlapping_liked_requires_both_users_to_like() {
    let store = MemoryStore::default()
        .user(ACTIVE, "me", &ascending())
        .user(42, "twin", &ascending())
        // Both liked 1 and 2; only one side liked 3, 4 and 5
        .likes(ACTIVE, &[(1, true), (2, true), (3, true), (4, false)])
        .likes(42, &[(1, true), (2, true), (3, false), (4, true), (5, true)]);
    let server = create_test_server(store);
    let (name, value) = user_header(ACTIVE);

    let body: Value = server
        .get("/api/compare/all")
        .add_header(name, value)
        .await
        .json();

    assert_eq!(body["bestMatchUserId"], 42);
    assert_eq!(body["overlappingLiked"], "2");
}

#[tokio::test]
async fn test_recent_reviews_are_latest_three_by_watch_date() {
    let day = |d: u32| Utc.with_ymd_and_hms(2024, 5, d, 0, 0, 0).unwrap();
    let store = MemoryStore::default()
        .user(ACTIVE, "me", &ascending())
        .user(42, "twin", &ascending())
        .review(42, 1, day(3), "third")
        .review(42, 2, day(20), "newest")
        .review(42, 3, day(1), "oldest")
        .review(42, 4, day(11), "second")
        .review(ACTIVE, 5, day(30), "not theirs");
    let server = create_test_server(store);
    let (name, value) = user_header(ACTIVE);

    let body: Value = server
        .get("/api/compare/all")
        .add_header(name, value)
        .await
        .json();

    let reviews: Vec<&str> = body["recentReviews"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["review"].as_str().unwrap())
        .collect();
    assert_eq!(reviews, vec!["newest", "second", "third"]);

    let dates: Vec<DateTime<Utc>> = body["recentReviews"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["dateWatched"].as_str().unwrap().parse().unwrap())
        .collect();
    assert!(dates.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn test_recommendations_skip_films_logged_without_rating() {
    let mut twin = ascending();
    twin.extend([(500, 10), (501, 9), (502, 8)]);
    let store = MemoryStore::default()
        .user(ACTIVE, "me", &ascending())
        .watched(ACTIVE, 500)
        .user(42, "twin", &twin);
    let server = create_test_server(store);
    let (name, value) = user_header(ACTIVE);

    let body: Value = server
        .get("/api/compare/all")
        .add_header(name, value)
        .await
        .json();

    assert_eq!(body["bestMatchUserId"], 42);
    let films: Vec<i64> = body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["filmTMDbId"].as_i64().unwrap())
        .collect();
    assert_eq!(films, vec![501, 502]);
}
