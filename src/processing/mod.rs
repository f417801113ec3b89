// src/processing/mod.rs
pub mod analysis;
pub mod estimator;
pub mod indices;
pub mod parallel;
pub mod resolver;
pub mod source;

// Re-export main components
pub use analysis::{run_analysis, Analysis, AnalysisRequest};
pub use estimator::{assess, AssessmentResult, LakeChangeEstimator, RiskLevel, WaterMask};
pub use parallel::ParallelProcessor;
pub use resolver::MaskResolver;
pub use source::WaterSource;
