//! Cache-first nutrition resolution across the external food databases.
//!
//! Each food type has its own ordered fallback chain; branded items merge
//! label macros with generic micronutrients and homemade dishes are summed
//! from their ingredients.

mod batch;
pub mod chain;
pub mod services;

pub use chain::{FallbackChain, FallbackStep};
pub use services::{
    Resolver, Sources, CACHE_WRITE_MIN_CONFIDENCE, DECOMPOSITION_PENALTY, LAST_RESORT_MIN_CONFIDENCE,
    PRIMARY_MIN_CONFIDENCE,
};
