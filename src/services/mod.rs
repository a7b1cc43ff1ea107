pub mod compatibility;
pub mod correlation;

pub use compatibility::{CompatibilityEngine, CompatibilityError};
