pub mod deploy_ui;
pub mod dispatcher;
pub mod identity;
pub mod metrics;
pub mod response;
