use custom_resource_core::contract::parse_event;
use custom_resource_lambda::adapters::response_transport::HttpResponseTransport;
use custom_resource_lambda::adapters::s3_store::S3BlobStore;
use custom_resource_lambda::handlers::deploy_ui::{AssetDeployer, DeployUiProvisioner};
use custom_resource_lambda::handlers::dispatcher::{DispatchReport, LifecycleDispatcher};
use custom_resource_lambda::logging::Logger;
use custom_resource_lambda::settings::HandlerSettings;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

#[derive(Clone)]
struct RuntimeDependencies {
    settings: HandlerSettings,
    store: S3BlobStore,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: RuntimeDependencies,
) -> Result<DispatchReport, Error> {
    let lifecycle_event = parse_event(event.payload).map_err(|error| Error::from(error.to_string()))?;

    tokio::task::spawn_blocking(move || -> Result<DispatchReport, Error> {
        let logger = Logger::new("deploy_ui", deps.settings.log_level);
        let transport = HttpResponseTransport::new()?;
        let deployer = AssetDeployer::new(
            &deps.store,
            deps.settings.scratch_dir.clone(),
            logger.with_component("asset_deployer"),
        );
        let provisioner = DeployUiProvisioner::new(deployer, logger);
        let dispatcher = LifecycleDispatcher::new(
            &provisioner,
            &transport,
            logger,
            deps.settings.delete_retry_delay,
        );
        Ok(dispatcher.dispatch(&lifecycle_event)?)
    })
    .await
    .map_err(|error| Error::from(format!("deploy_ui handler task failed: {error}")))?
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        settings: HandlerSettings::from_env(),
        store: S3BlobStore::new(
            aws_sdk_s3::Client::new(&aws_config),
            tokio::runtime::Handle::current(),
        ),
    };
    lambda_runtime::run(service_fn(move |event| handle_request(event, deps.clone()))).await
}
