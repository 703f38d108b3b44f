pub mod app;
pub mod background;
pub mod cache;
pub mod config;
pub mod error;
pub mod glycemic;
pub mod grading;
pub mod meals;
pub mod nutrition;
pub mod pipeline;
pub mod resolver;
pub mod sources;
pub mod state;
