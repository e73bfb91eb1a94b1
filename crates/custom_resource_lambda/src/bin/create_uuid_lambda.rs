use custom_resource_core::contract::parse_event;
use custom_resource_lambda::adapters::response_transport::HttpResponseTransport;
use custom_resource_lambda::handlers::dispatcher::{DispatchReport, LifecycleDispatcher};
use custom_resource_lambda::handlers::identity::IdentityProvisioner;
use custom_resource_lambda::logging::Logger;
use custom_resource_lambda::settings::HandlerSettings;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(
    event: LambdaEvent<Value>,
    settings: HandlerSettings,
) -> Result<DispatchReport, Error> {
    let lifecycle_event = parse_event(event.payload).map_err(|error| Error::from(error.to_string()))?;

    tokio::task::spawn_blocking(move || -> Result<DispatchReport, Error> {
        let logger = Logger::new("create_uuid", settings.log_level);
        let transport = HttpResponseTransport::new()?;
        let provisioner = IdentityProvisioner::new(logger);
        let dispatcher = LifecycleDispatcher::new(
            &provisioner,
            &transport,
            logger,
            settings.delete_retry_delay,
        );
        Ok(dispatcher.dispatch(&lifecycle_event)?)
    })
    .await
    .map_err(|error| Error::from(format!("create_uuid handler task failed: {error}")))?
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = HandlerSettings::from_env();
    lambda_runtime::run(service_fn(move |event| {
        handle_request(event, settings.clone())
    }))
    .await
}
