//! Runs one custom-resource handler against a lifecycle event file.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use custom_resource_core::contract::parse_event;
use custom_resource_lambda::adapters::metrics_sink::HttpMetricsSink;
use custom_resource_lambda::adapters::response_transport::{
    HttpResponseTransport, ResponseTransport, StdoutResponseTransport,
};
use custom_resource_lambda::adapters::s3_store::S3BlobStore;
use custom_resource_lambda::handlers::deploy_ui::{AssetDeployer, DeployUiProvisioner};
use custom_resource_lambda::handlers::dispatcher::{LifecycleDispatcher, ResourceProvisioner};
use custom_resource_lambda::handlers::identity::IdentityProvisioner;
use custom_resource_lambda::handlers::metrics::{MetricsProvisioner, MetricsReporter};
use custom_resource_lambda::logging::Logger;
use custom_resource_lambda::settings::HandlerSettings;
use lambda_runtime::Error;

#[derive(Clone, Copy, ValueEnum)]
enum HandlerKind {
    /// Deployment UUID resource
    CreateUuid,
    /// Static UI deployment resource
    DeployUi,
    /// Anonymous metrics resource
    LaunchMetrics,
}

#[derive(Parser)]
#[command(
    name = "invoke_local",
    about = "Invoke a custom-resource handler with a CloudFormation event file"
)]
struct Args {
    #[arg(value_enum)]
    handler: HandlerKind,
    /// Path to the lifecycle event JSON
    #[arg(long, default_value = "event.json")]
    event: PathBuf,
    /// Print the response instead of PUTting it to the ResponseURL
    #[arg(long)]
    print_response: bool,
    /// Physical id reported by the metrics resource on Create
    #[arg(long, env = "AWS_LAMBDA_LOG_STREAM_NAME", default_value = "local")]
    log_stream_name: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();
    let settings = HandlerSettings::from_env();
    let raw = fs::read_to_string(&args.event)
        .map_err(|error| format!("failed to read {}: {error}", args.event.display()))?;
    let payload = serde_json::from_str(&raw)
        .map_err(|error| format!("invalid event json in {}: {error}", args.event.display()))?;
    let lifecycle_event = parse_event(payload)?;

    let store = match args.handler {
        HandlerKind::DeployUi => {
            let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            Some(S3BlobStore::new(
                aws_sdk_s3::Client::new(&aws_config),
                tokio::runtime::Handle::current(),
            ))
        }
        _ => None,
    };

    let report = tokio::task::spawn_blocking(move || -> Result<_, Error> {
        let logger = Logger::new("invoke_local", settings.log_level);
        let transport: Box<dyn ResponseTransport> = if args.print_response {
            Box::new(StdoutResponseTransport)
        } else {
            Box::new(HttpResponseTransport::new()?)
        };
        let sink = HttpMetricsSink::new()?;

        let provisioner: Box<dyn ResourceProvisioner + '_> = match (args.handler, store.as_ref()) {
            (HandlerKind::CreateUuid, _) => Box::new(IdentityProvisioner::new(logger)),
            (HandlerKind::DeployUi, Some(store)) => Box::new(DeployUiProvisioner::new(
                AssetDeployer::new(store, settings.scratch_dir.clone(), logger),
                logger,
            )),
            (HandlerKind::DeployUi, None) => {
                return Err(Error::from("deploy-ui requires an S3 client"));
            }
            (HandlerKind::LaunchMetrics, _) => Box::new(MetricsProvisioner::new(
                MetricsReporter::new(&sink, settings.metrics_endpoint.clone(), logger),
                args.log_stream_name.clone(),
            )),
        };

        let dispatcher = LifecycleDispatcher::new(
            provisioner.as_ref(),
            transport.as_ref(),
            logger,
            settings.delete_retry_delay,
        );
        Ok(dispatcher.dispatch(&lifecycle_event)?)
    })
    .await
    .map_err(|error| format!("local invocation task failed: {error}"))??;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
