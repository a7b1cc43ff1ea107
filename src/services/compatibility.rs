use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::{
    db::RatingStore,
    error::AppResult,
    models::{BestMatch, CompareScope, CompatibilityResult, FilmId, MatchDetails, Rating, UserId},
    services::correlation::pearson,
};

/// Minimum number of shared rated films for a meaningful correlation
pub const MIN_SHARED_RATINGS: usize = 10;

/// Films recommended from the best match's catalog
pub const RECOMMENDATION_LIMIT: i64 = 4;

/// Reviews shown from the best match
pub const RECENT_REVIEW_LIMIT: i64 = 3;

/// Error types for the compatibility engine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompatibilityError {
    /// The active user has not rated enough films to be compared
    #[error("Too few reviews")]
    InsufficientData { rated: usize, required: usize },
}

/// Outcome of scoring a candidate pool
#[derive(Debug, Clone, PartialEq)]
struct Selection {
    best: Option<BestMatch>,
    /// Distinct users in the pool
    candidates: usize,
    /// Users sharing enough rated films to be scored
    qualified: usize,
}

/// Finds the user whose ratings correlate best with the active user's
///
/// Selection is a pure function of the two rating sets. Aggregates about the
/// winner are read from a `RatingStore` afterwards.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityEngine {
    min_shared_ratings: usize,
}

impl Default for CompatibilityEngine {
    fn default() -> Self {
        Self::new(MIN_SHARED_RATINGS)
    }
}

impl CompatibilityEngine {
    pub fn new(min_shared_ratings: usize) -> Self {
        Self { min_shared_ratings }
    }

    /// Fails with `InsufficientData` if the active user rated too few films
    pub fn check_sample(&self, active_ratings: &[Rating]) -> Result<(), CompatibilityError> {
        let rated = scores_by_film(active_ratings.iter()).len();
        if rated < self.min_shared_ratings {
            return Err(CompatibilityError::InsufficientData {
                rated,
                required: self.min_shared_ratings,
            });
        }
        Ok(())
    }

    /// Picks the best-correlated candidate
    ///
    /// `candidate_ratings` is expected to hold other users' rated logs on films the
    /// active user rated. Candidates sharing fewer than the minimum number of
    /// rated films are skipped. Ties keep the candidate seen first.
    ///
    /// Returns `Ok(None)` when no candidate qualifies.
    pub fn best_match(
        &self,
        active_ratings: &[Rating],
        candidate_ratings: &[Rating],
    ) -> Result<Option<BestMatch>, CompatibilityError> {
        let selection = self.select(active_ratings, candidate_ratings)?;

        tracing::debug!(
            candidates = selection.candidates,
            qualified = selection.qualified,
            "Scored candidates"
        );

        Ok(selection.best)
    }

    /// Scores every candidate group and folds them into the best one
    fn select(
        &self,
        active_ratings: &[Rating],
        candidate_ratings: &[Rating],
    ) -> Result<Selection, CompatibilityError> {
        self.check_sample(active_ratings)?;

        let active_scores = scores_by_film(active_ratings.iter());
        let groups = group_by_user(candidate_ratings);
        let candidates = groups.len();

        // Strict comparison keeps the earlier candidate on ties
        let (best, qualified) = groups
            .into_iter()
            .filter_map(|(user_id, ratings)| self.score_candidate(&active_scores, user_id, &ratings))
            .fold((None, 0), |(best, qualified): (Option<BestMatch>, usize), candidate| {
                let best = match best {
                    Some(current) if candidate.correlation <= current.correlation => Some(current),
                    _ => Some(candidate),
                };
                (best, qualified + 1)
            });

        Ok(Selection {
            best,
            candidates,
            qualified,
        })
    }

    /// Correlates one candidate against the active user over their shared films
    fn score_candidate(
        &self,
        active_scores: &BTreeMap<FilmId, f64>,
        user_id: UserId,
        ratings: &[&Rating],
    ) -> Option<BestMatch> {
        // Vectors are index-aligned by ascending film id
        let (active, candidate): (Vec<f64>, Vec<f64>) = scores_by_film(ratings.iter().copied())
            .into_iter()
            .filter_map(|(film_id, score)| active_scores.get(&film_id).map(|own| (*own, score)))
            .unzip();

        if candidate.len() < self.min_shared_ratings {
            tracing::trace!(
                user_id,
                shared = candidate.len(),
                "Skipping candidate with too few shared ratings"
            );
            return None;
        }

        Some(BestMatch {
            user_id,
            correlation: pearson(&active, &candidate),
            shared_ratings: candidate.len(),
        })
    }

    /// Runs a full comparison for the active user
    ///
    /// Reads the active user's ratings and the candidate pool for `scope`, selects
    /// the best match and gathers its aggregates. The aggregate reads are
    /// independent and run concurrently; the first failure is returned.
    pub async fn compare(
        &self,
        store: &dyn RatingStore,
        active_user_id: UserId,
        scope: CompareScope,
    ) -> AppResult<CompatibilityResult> {
        // 1. Active user's ratings; bail out before touching the pool if too few
        let active_ratings = store.rated_films(active_user_id).await?;
        self.check_sample(&active_ratings)?;

        // 2. Other users' ratings on the same films
        let candidate_ratings = store.candidate_pool(active_user_id, scope).await?;

        tracing::debug!(
            active_user_id,
            scope = %scope,
            active_ratings = active_ratings.len(),
            candidate_ratings = candidate_ratings.len(),
            "Comparing ratings"
        );

        // 3. Pick the best-correlated candidate
        let Some(best) = self.best_match(&active_ratings, &candidate_ratings)? else {
            tracing::info!(active_user_id, scope = %scope, "No compatible user found");
            return Ok(CompatibilityResult::no_match());
        };

        tracing::info!(
            active_user_id,
            scope = %scope,
            best_match_user_id = best.user_id,
            correlation = best.correlation,
            shared_ratings = best.shared_ratings,
            "Best match selected"
        );

        // 4. Aggregates about the winner
        let details = describe_match(store, active_user_id, best).await?;

        Ok(CompatibilityResult::matched(best.user_id, details))
    }
}

/// Reads the aggregates shown alongside the best match
async fn describe_match(
    store: &dyn RatingStore,
    active_user_id: UserId,
    best: BestMatch,
) -> AppResult<MatchDetails> {
    let match_id = best.user_id;

    let (
        username,
        film_count,
        follower_count,
        recommendations,
        recent_reviews,
        overlapping_watched,
        overlapping_liked,
        overlapping_ratings,
    ) = tokio::try_join!(
        store.username(match_id),
        store.film_count(match_id),
        store.follower_count(match_id),
        store.recommendations(match_id, active_user_id, RECOMMENDATION_LIMIT),
        store.recent_reviews(match_id, RECENT_REVIEW_LIMIT),
        store.overlap_watched(active_user_id, match_id),
        store.overlap_liked(active_user_id, match_id),
        store.overlap_ratings(active_user_id, match_id),
    )?;

    Ok(MatchDetails {
        correlation: best.correlation,
        username,
        film_count,
        follower_count,
        overlapping_watched,
        overlapping_liked,
        overlapping_ratings,
        recommendations,
        recent_reviews,
    })
}

/// Rated films keyed by film id; the first log of a film wins
fn scores_by_film<'a>(ratings: impl Iterator<Item = &'a Rating>) -> BTreeMap<FilmId, f64> {
    let mut scores = BTreeMap::new();
    for rating in ratings {
        if let Some(score) = rating.score() {
            scores.entry(rating.film_tmdb_id).or_insert(score);
        }
    }
    scores
}

/// Groups ratings by user, keeping users in order of first appearance
fn group_by_user(ratings: &[Rating]) -> Vec<(UserId, Vec<&Rating>)> {
    let mut index: HashMap<UserId, usize> = HashMap::new();
    let mut groups: Vec<(UserId, Vec<&Rating>)> = Vec::new();

    for rating in ratings {
        let slot = *index.entry(rating.user_id).or_insert_with(|| {
            groups.push((rating.user_id, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(rating);
    }

    groups
}
