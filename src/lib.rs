// src/lib.rs
pub mod batch;
pub mod config;
pub mod error;
pub mod io;
pub mod processing;
pub mod report;
pub mod utils;

pub use error::{Error, Result};
pub use processing::{assess, AssessmentResult, RiskLevel, WaterMask};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
