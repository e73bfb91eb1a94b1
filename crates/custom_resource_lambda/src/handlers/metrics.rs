use custom_resource_core::contract::LifecycleEvent;
use custom_resource_core::metrics::MetricsPayload;
use custom_resource_core::properties::parse_anonymous_data;
use serde_json::json;

use crate::adapters::metrics_sink::{MetricsSink, SinkResponse};
use crate::handlers::dispatcher::{ProvisionError, ProvisionOutcome, ResourceProvisioner};
use crate::logging::Logger;

pub const SEND_DATA_FAILURE_REASON: &str = "Failed to send data";

/// Posts the anonymous usage payload. The sink's status and body are logged
/// only; a transport error is the sole failure.
pub struct MetricsReporter<'a> {
    sink: &'a dyn MetricsSink,
    endpoint: String,
    logger: Logger,
}

impl<'a> MetricsReporter<'a> {
    pub fn new(sink: &'a dyn MetricsSink, endpoint: impl Into<String>, logger: Logger) -> Self {
        Self {
            sink,
            endpoint: endpoint.into(),
            logger,
        }
    }

    pub fn report(&self, event: &LifecycleEvent) -> Result<SinkResponse, String> {
        let properties =
            parse_anonymous_data(&event.resource_properties).map_err(|error| error.to_string())?;
        let time_stamp = chrono::Utc::now()
            .naive_utc()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string();
        let payload = MetricsPayload::build(properties, event.request_type, time_stamp);
        self.logger.info(
            "posting_metrics",
            json!({
                "data": payload.data.clone(),
                "time_stamp": payload.time_stamp.clone(),
                "solution": payload.solution.clone(),
            }),
        );

        let body = encode_form(&payload);
        let response = self.sink.post_form(&self.endpoint, &body)?;
        self.logger.info(
            "metrics_response",
            json!({ "status_code": response.status_code }),
        );
        self.logger
            .debug("metrics_response_body", json!({ "body": response.body.clone() }));
        Ok(response)
    }
}

fn encode_form(payload: &MetricsPayload) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(payload.form_fields())
        .finish()
}

/// `SendAnonymousData` custom resource.
///
/// Create reports and answers with the Lambda log stream as physical id;
/// Update answers without reporting; Delete reports and echoes the id.
pub struct MetricsProvisioner<'a> {
    reporter: MetricsReporter<'a>,
    log_stream_name: String,
}

impl<'a> MetricsProvisioner<'a> {
    pub fn new(reporter: MetricsReporter<'a>, log_stream_name: impl Into<String>) -> Self {
        Self {
            reporter,
            log_stream_name: log_stream_name.into(),
        }
    }
}

impl ResourceProvisioner for MetricsProvisioner<'_> {
    fn create_failure_reason(&self) -> &'static str {
        SEND_DATA_FAILURE_REASON
    }

    fn create(&self, event: &LifecycleEvent) -> Result<ProvisionOutcome, ProvisionError> {
        self.reporter
            .report(event)
            .map_err(|message| ProvisionError::new(self.log_stream_name.clone(), message))?;
        Ok(ProvisionOutcome::new(self.log_stream_name.clone()))
    }

    fn update(&self, event: &LifecycleEvent) -> Result<ProvisionOutcome, ProvisionError> {
        Ok(ProvisionOutcome::new(event.physical_id_or_empty()))
    }

    fn delete(&self, event: &LifecycleEvent) -> Result<ProvisionOutcome, ProvisionError> {
        let resource_id = event.physical_id_or_empty();
        self.reporter
            .report(event)
            .map_err(|message| ProvisionError::new(resource_id, message))?;
        Ok(ProvisionOutcome::new(resource_id))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use custom_resource_core::contract::ResponseStatus;
    use custom_resource_core::log_level::LogLevel;
    use custom_resource_core::metrics::METRICS_ENDPOINT;
    use serde_json::Value;

    use super::*;
    use crate::handlers::dispatcher::LifecycleDispatcher;
    use crate::handlers::response::test_support::{event, RecordingTransport};

    struct RecordingSink {
        posts: Mutex<Vec<(String, String)>>,
        status_code: u16,
        unreachable: bool,
    }

    impl RecordingSink {
        fn responding(status_code: u16) -> Self {
            Self {
                posts: Mutex::new(Vec::new()),
                status_code,
                unreachable: false,
            }
        }

        fn unreachable() -> Self {
            Self {
                unreachable: true,
                ..Self::responding(0)
            }
        }

        fn posts(&self) -> Vec<(String, String)> {
            self.posts.lock().expect("poisoned mutex").clone()
        }
    }

    impl MetricsSink for RecordingSink {
        fn post_form(&self, url: &str, form_body: &str) -> Result<SinkResponse, String> {
            if self.unreachable {
                return Err("dns error: metrics host unreachable".to_string());
            }
            self.posts
                .lock()
                .expect("poisoned mutex")
                .push((url.to_string(), form_body.to_string()));
            Ok(SinkResponse {
                status_code: self.status_code,
                body: "<html>not json</html>".to_string(),
            })
        }
    }

    fn logger() -> Logger {
        Logger::new("launch_metrics", LogLevel::Critical)
    }

    fn metrics_event(request_type: &str, physical_id: Option<&str>) -> LifecycleEvent {
        let mut event = event(request_type, physical_id);
        event.resource_properties.insert(
            "SendAnonymousData".to_string(),
            Value::from("{'Solution': 'SO0023', 'UUID': 'deploy-uuid', 'Data': {'Version': '3.0', 'Region': 'us-east-1'}}"),
        );
        event
    }

    fn decode(body: &str) -> HashMap<String, String> {
        form_urlencoded::parse(body.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    #[test]
    fn report_posts_url_encoded_payload_to_endpoint() {
        let sink = RecordingSink::responding(200);
        let reporter = MetricsReporter::new(&sink, METRICS_ENDPOINT, logger());

        reporter
            .report(&metrics_event("Create", None))
            .expect("report should succeed");

        let posts = sink.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, METRICS_ENDPOINT);

        let fields = decode(&posts[0].1);
        assert_eq!(fields["Solution"], "SO0023");
        assert_eq!(fields["UUID"], "deploy-uuid");
        assert!(!fields["TimeStamp"].is_empty());
        let data: Value = serde_json::from_str(&fields["Data"]).expect("data should be json");
        assert_eq!(data["CFTemplate"], "Create");
        assert_eq!(data["Company"], "AWS");
        assert_eq!(data["Name"], "AWS Serverless Image Handler");
        assert_eq!(data["Region"], "us-east-1");
    }

    #[test]
    fn non_success_status_is_not_a_failure() {
        let sink = RecordingSink::responding(503);
        let reporter = MetricsReporter::new(&sink, METRICS_ENDPOINT, logger());

        let response = reporter
            .report(&metrics_event("Delete", Some("stream")))
            .expect("status codes are not interpreted");
        assert_eq!(response.status_code, 503);
    }

    #[test]
    fn create_uses_log_stream_as_physical_id() {
        let sink = RecordingSink::responding(200);
        let provisioner = MetricsProvisioner::new(
            MetricsReporter::new(&sink, METRICS_ENDPOINT, logger()),
            "2026/10/19/[$LATEST]0123",
        );
        let transport = RecordingTransport::new();
        let dispatcher =
            LifecycleDispatcher::new(&provisioner, &transport, logger(), Duration::ZERO);

        dispatcher
            .dispatch(&metrics_event("Create", None))
            .expect("delivery should succeed");

        let delivered = transport.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].status, ResponseStatus::Success);
        assert_eq!(delivered[0].physical_resource_id, "2026/10/19/[$LATEST]0123");
    }

    #[test]
    fn unreachable_sink_fails_create_with_fixed_reason() {
        let sink = RecordingSink::unreachable();
        let provisioner = MetricsProvisioner::new(
            MetricsReporter::new(&sink, METRICS_ENDPOINT, logger()),
            "stream",
        );
        let transport = RecordingTransport::new();
        let dispatcher =
            LifecycleDispatcher::new(&provisioner, &transport, logger(), Duration::ZERO);

        dispatcher
            .dispatch(&metrics_event("Create", None))
            .expect("delivery should succeed");

        let delivered = transport.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].status, ResponseStatus::Failed);
        assert_eq!(delivered[0].reason.as_deref(), Some("Failed to send data"));
        assert_eq!(delivered[0].physical_resource_id, "stream");
    }

    #[test]
    fn update_does_not_report() {
        let sink = RecordingSink::responding(200);
        let provisioner = MetricsProvisioner::new(
            MetricsReporter::new(&sink, METRICS_ENDPOINT, logger()),
            "stream",
        );
        let transport = RecordingTransport::new();
        let dispatcher =
            LifecycleDispatcher::new(&provisioner, &transport, logger(), Duration::ZERO);

        dispatcher
            .dispatch(&metrics_event("Update", Some("stream-old")))
            .expect("delivery should succeed");

        assert!(sink.posts().is_empty());
        assert_eq!(transport.delivered()[0].physical_resource_id, "stream-old");
    }

    #[test]
    fn delete_reports_with_delete_template_type() {
        let sink = RecordingSink::responding(200);
        let provisioner = MetricsProvisioner::new(
            MetricsReporter::new(&sink, METRICS_ENDPOINT, logger()),
            "stream",
        );
        let transport = RecordingTransport::new();
        let dispatcher =
            LifecycleDispatcher::new(&provisioner, &transport, logger(), Duration::ZERO);

        dispatcher
            .dispatch(&metrics_event("Delete", Some("stream-old")))
            .expect("delivery should succeed");

        let posts = sink.posts();
        assert_eq!(posts.len(), 1);
        let data: Value =
            serde_json::from_str(&decode(&posts[0].1)["Data"]).expect("data should be json");
        assert_eq!(data["CFTemplate"], "Delete");
        assert_eq!(transport.delivered()[0].physical_resource_id, "stream-old");
    }
}
