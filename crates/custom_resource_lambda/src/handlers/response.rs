use custom_resource_core::contract::{LifecycleEvent, LifecycleResponse, ResponseData};
use serde_json::json;

use crate::adapters::response_transport::ResponseTransport;
use crate::logging::Logger;

/// The callback PUT could not be completed; the orchestrator was not notified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryError {
    pub message: String,
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DeliveryError {}

/// Builds lifecycle responses and delivers them to the event's `ResponseURL`.
#[derive(Clone, Copy)]
pub struct ResponseSender<'a> {
    transport: &'a dyn ResponseTransport,
    logger: Logger,
}

impl<'a> ResponseSender<'a> {
    pub fn new(transport: &'a dyn ResponseTransport, logger: Logger) -> Self {
        Self { transport, logger }
    }

    pub fn send_success(
        &self,
        event: &LifecycleEvent,
        physical_resource_id: &str,
        data: Option<ResponseData>,
    ) -> Result<(), DeliveryError> {
        self.deliver(
            event,
            &LifecycleResponse::success(event, physical_resource_id, data),
        )
    }

    pub fn send_failure(
        &self,
        event: &LifecycleEvent,
        physical_resource_id: &str,
        reason: &str,
    ) -> Result<(), DeliveryError> {
        self.deliver(
            event,
            &LifecycleResponse::failure(event, physical_resource_id, reason),
        )
    }

    fn deliver(
        &self,
        event: &LifecycleEvent,
        response: &LifecycleResponse,
    ) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(response).map_err(|error| DeliveryError {
            message: format!("failed to serialize lifecycle response: {error}"),
        })?;
        self.logger.info("response_body", json!(response));

        match self.transport.put_response(&event.response_url, &body) {
            Ok(status_code) => {
                self.logger.info(
                    "response_delivered",
                    json!({
                        "request_id": event.request_id.clone(),
                        "status_code": status_code,
                    }),
                );
                Ok(())
            }
            Err(message) => {
                self.logger.error(
                    "response_delivery_failed",
                    json!({
                        "request_id": event.request_id.clone(),
                        "error": message.clone(),
                    }),
                );
                Err(DeliveryError { message })
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use custom_resource_core::contract::ResponseStatus;
    use custom_resource_core::log_level::LogLevel;
    use serde_json::Value;

    use super::test_support::{event, RecordingTransport};
    use super::*;

    fn logger() -> Logger {
        Logger::new("response", LogLevel::Critical)
    }

    #[test]
    fn success_is_put_to_response_url() {
        let transport = RecordingTransport::new();
        let sender = ResponseSender::new(&transport, logger());
        let event = event("Update", Some("id-1"));

        let mut data = ResponseData::new();
        data.insert("UUID".to_string(), Value::from("id-1"));
        sender
            .send_success(&event, "id-1", Some(data))
            .expect("delivery should succeed");

        assert_eq!(transport.urls(), vec![event.response_url.clone()]);
        let delivered = transport.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].status, ResponseStatus::Success);
        assert_eq!(delivered[0].physical_resource_id, "id-1");
        assert_eq!(delivered[0].request_id, "request-1");
        assert!(delivered[0].reason.is_none());
    }

    #[test]
    fn failure_carries_reason() {
        let transport = RecordingTransport::new();
        let sender = ResponseSender::new(&transport, logger());
        let event = event("Delete", Some("id-1"));

        sender
            .send_failure(&event, "id-1", "Failed to delete id-1")
            .expect("delivery should succeed");

        let delivered = transport.delivered();
        assert_eq!(delivered[0].status, ResponseStatus::Failed);
        assert_eq!(delivered[0].reason.as_deref(), Some("Failed to delete id-1"));
        assert!(delivered[0].data.is_none());
    }

    #[test]
    fn delivery_errors_are_returned_not_swallowed() {
        let transport = RecordingTransport::with_failures(&[true]);
        let sender = ResponseSender::new(&transport, logger());

        let error = sender
            .send_success(&event("Create", None), "id-1", None)
            .expect_err("delivery should fail");
        assert_eq!(error.message, "connection reset by peer");
        assert_eq!(transport.attempts().len(), 1);
        assert!(transport.delivered().is_empty());
    }
}
