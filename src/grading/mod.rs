//! Wellness grading: ten focus scores, an overall Nutri-Score style grade,
//! satiety and inflammatory index, with an optional GI adjustment.

mod focus;
pub mod scores;
pub mod services;
pub mod types;

pub use services::grade;
pub use types::{
    FocusScore, Grade, GradingResult, Inflammatory, InflammatoryLevel, OverallScore, Satiety,
    SatietyLevel, WellnessFocus,
};
