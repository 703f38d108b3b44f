mod insights;
pub mod services;

pub use insights::{InsightGenerator, RemoteInsightGenerator};
pub use services::{AnalyzedItem, MealAnalysis, Pipeline, INSIGHT_CONCURRENCY};
