//! Utilities - error mapping, extractors and logging

pub mod error;
pub mod extract;
pub mod logger;

pub use error::{AppError, AppResult};
pub use extract::{ApiJson, ApiQuery};
