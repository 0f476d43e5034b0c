//! LegalEase Core: error type, configuration, data directory management.

pub mod config;
pub mod error;

pub use config::{ChunkingConfig, DataPaths, LegalEaseConfig, ModelConfig, SummaryLength};
pub use error::{Error, Result};
