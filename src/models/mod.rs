mod compatibility;
mod rating;

pub use compatibility::{BestMatch, CompatibilityResult, MatchDetails, RecentReview, Recommendation};
pub use rating::{CompareScope, FilmId, Rating, UserId};
