//! AWS-oriented adapters and handlers for the CloudFormation custom resources.
//!
//! This crate owns runtime integration details (Lambda binaries, the HTTP
//! response callback, S3 and metrics adapters) and the lifecycle dispatcher that
//! guarantees one response per event. Contracts live in `custom_resource_core`.

pub mod adapters;
pub mod handlers;
pub mod logging;
pub mod settings;
