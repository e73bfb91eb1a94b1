pub mod blob_store;
pub mod metrics_sink;
pub mod response_transport;
pub mod s3_store;
