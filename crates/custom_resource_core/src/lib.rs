//! Shared custom-resource contracts.
//!
//! This crate owns the CloudFormation request/response shapes, resource
//! property parsing, and the pure asset rules (content types, key joining,
//! find/replace). It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod assets;
pub mod contract;
pub mod log_level;
pub mod metrics;
pub mod properties;
