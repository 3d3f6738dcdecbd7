//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - Alloy-based Ethereum provider implementations
//! - Tokio runtime bridge for async operations

pub mod ethereum;
pub mod runtime;
