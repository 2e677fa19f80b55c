//! Feature adapters
//!
//! Each backend feature is a `JobApi` bound to its endpoint pair plus the
//! request/result models the backend speaks. Features with extra behavior
//! (chat reply extraction, PDF upload, synchronous side endpoints) wrap
//! their `JobApi` in a small struct.

pub mod analytics;
pub mod chat;
pub mod learning;
pub mod pdf;
pub mod quiz;
pub mod recommendations;
pub mod resource;
pub mod roadmap;

pub use analytics::AnalyticsApi;
pub use chat::ChatApi;
pub use learning::LearningData;
pub use pdf::PdfAnalysisApi;
pub use quiz::QuizApi;
pub use recommendations::RecommendationsApi;
pub use resource::ResourceApi;
pub use roadmap::RoadmapApi;
