use std::sync::Arc;

use crate::{db::RatingStore, services::CompatibilityEngine};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RatingStore>,
    pub engine: CompatibilityEngine,
}

impl AppState {
    /// Creates application state over the given rating store
    pub fn new(store: Arc<dyn RatingStore>, engine: CompatibilityEngine) -> Self {
        Self { store, engine }
    }
}
