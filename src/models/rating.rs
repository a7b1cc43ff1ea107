/// Identifier of a user row
pub type UserId = i32;

/// TMDb identifier of a film
pub type FilmId = i32;

/// One user's logged reaction to one film, as the engine sees it
///
/// Scores are stored doubled (1-10 for 0.5-5.0 stars). The engine only
/// requires that both sides of a comparison use the same scale.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Rating {
    pub user_id: UserId,
    pub film_tmdb_id: FilmId,
    pub rating: Option<i32>,
    pub liked: Option<bool>,
}

impl Rating {
    /// Builds a rated entry with no like
    pub fn rated(user_id: UserId, film_tmdb_id: FilmId, rating: i32) -> Self {
        Self {
            user_id,
            film_tmdb_id,
            rating: Some(rating),
            liked: None,
        }
    }

    /// Numeric score, if the user rated the film
    pub fn score(&self) -> Option<f64> {
        self.rating.map(f64::from)
    }
}

/// Which users form the candidate pool for a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareScope {
    /// Every other user
    All,
    /// Only users the active user follows
    Following,
}

impl std::fmt::Display for CompareScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareScope::All => write!(f, "all"),
            CompareScope::Following => write!(f, "following"),
        }
    }
}
