use std::time::Duration;

use custom_resource_core::contract::{LifecycleEvent, RequestType, ResponseData, ResponseStatus};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::adapters::response_transport::ResponseTransport;
use crate::handlers::response::{DeliveryError, ResponseSender};
use crate::logging::Logger;

/// Result of a successful create/update/delete operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionOutcome {
    pub physical_resource_id: String,
    pub data: Option<ResponseData>,
}

impl ProvisionOutcome {
    pub fn new(physical_resource_id: impl Into<String>) -> Self {
        Self {
            physical_resource_id: physical_resource_id.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: ResponseData) -> Self {
        self.data = Some(data);
        self
    }
}

/// Operation failure, carrying the physical id the FAILED response must report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionError {
    pub physical_resource_id: String,
    pub message: String,
}

impl ProvisionError {
    pub fn new(physical_resource_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            physical_resource_id: physical_resource_id.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProvisionError {}

/// One custom resource type. Implementations do the work only; the dispatcher
/// owns every response.
pub trait ResourceProvisioner {
    /// Reason reported when Create fails. Update and Delete reasons embed the
    /// physical id instead.
    fn create_failure_reason(&self) -> &'static str;

    fn create(&self, event: &LifecycleEvent) -> Result<ProvisionOutcome, ProvisionError>;

    fn update(&self, event: &LifecycleEvent) -> Result<ProvisionOutcome, ProvisionError>;

    fn delete(&self, event: &LifecycleEvent) -> Result<ProvisionOutcome, ProvisionError>;
}

/// What was delivered to the orchestrator for one event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchReport {
    pub request_type: RequestType,
    pub status: ResponseStatus,
    pub physical_resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub fn update_failure_reason(physical_resource_id: &str) -> String {
    format!("Failed to update {physical_resource_id}")
}

pub fn delete_failure_reason(physical_resource_id: &str) -> String {
    format!("Failed to delete {physical_resource_id}")
}

/// Routes lifecycle events to a provisioner and guarantees one delivered
/// response per event.
///
/// A failed SUCCESS delivery is followed by a single FAILED delivery. On
/// Delete, any failure waits `delete_retry_delay` before that FAILED attempt.
/// Only a failed FAILED delivery escapes as [`DeliveryError`].
pub struct LifecycleDispatcher<'a> {
    provisioner: &'a dyn ResourceProvisioner,
    sender: ResponseSender<'a>,
    logger: Logger,
    delete_retry_delay: Duration,
}

impl<'a> LifecycleDispatcher<'a> {
    pub fn new(
        provisioner: &'a dyn ResourceProvisioner,
        transport: &'a dyn ResponseTransport,
        logger: Logger,
        delete_retry_delay: Duration,
    ) -> Self {
        Self {
            provisioner,
            sender: ResponseSender::new(transport, logger.with_component("response_sender")),
            logger,
            delete_retry_delay,
        }
    }

    pub fn dispatch(&self, event: &LifecycleEvent) -> Result<DispatchReport, DeliveryError> {
        self.logger.debug(
            "lifecycle_event_received",
            json!({
                "request_type": event.request_type,
                "request_id": event.request_id.clone(),
                "logical_resource_id": event.logical_resource_id.clone(),
                "physical_resource_id": event.physical_resource_id.clone(),
            }),
        );
        match event.request_type {
            RequestType::Create => self.on_create(event),
            RequestType::Update => self.on_update(event),
            RequestType::Delete => self.on_delete(event),
        }
    }

    pub fn on_create(&self, event: &LifecycleEvent) -> Result<DispatchReport, DeliveryError> {
        let reason = self.provisioner.create_failure_reason();
        self.complete(
            event,
            self.provisioner.create(event),
            |_| reason.to_string(),
            Duration::ZERO,
        )
    }

    pub fn on_update(&self, event: &LifecycleEvent) -> Result<DispatchReport, DeliveryError> {
        self.complete(
            event,
            self.provisioner.update(event),
            update_failure_reason,
            Duration::ZERO,
        )
    }

    pub fn on_delete(&self, event: &LifecycleEvent) -> Result<DispatchReport, DeliveryError> {
        self.complete(
            event,
            self.provisioner.delete(event),
            delete_failure_reason,
            self.delete_retry_delay,
        )
    }

    fn complete(
        &self,
        event: &LifecycleEvent,
        result: Result<ProvisionOutcome, ProvisionError>,
        failure_reason: impl Fn(&str) -> String,
        failure_delay: Duration,
    ) -> Result<DispatchReport, DeliveryError> {
        let physical_resource_id = match result {
            Ok(outcome) => {
                match self.sender.send_success(
                    event,
                    &outcome.physical_resource_id,
                    outcome.data.clone(),
                ) {
                    Ok(()) => {
                        return Ok(DispatchReport {
                            request_type: event.request_type,
                            status: ResponseStatus::Success,
                            physical_resource_id: outcome.physical_resource_id,
                            reason: None,
                        });
                    }
                    Err(error) => {
                        self.logger.error(
                            "success_delivery_failed",
                            json!({
                                "request_type": event.request_type,
                                "physical_resource_id": outcome.physical_resource_id.clone(),
                                "error": error.message,
                            }),
                        );
                        outcome.physical_resource_id
                    }
                }
            }
            Err(error) => {
                self.logger.error(
                    "operation_failed",
                    json!({
                        "request_type": event.request_type,
                        "physical_resource_id": error.physical_resource_id.clone(),
                        "error": error.message,
                    }),
                );
                error.physical_resource_id
            }
        };

        if !failure_delay.is_zero() {
            self.logger.warning(
                "delaying_failure_response",
                json!({ "delay_seconds": failure_delay.as_secs_f64() }),
            );
            std::thread::sleep(failure_delay);
        }

        let reason = failure_reason(&physical_resource_id);
        self.sender
            .send_failure(event, &physical_resource_id, &reason)?;
        Ok(DispatchReport {
            request_type: event.request_type,
            status: ResponseStatus::Failed,
            physical_resource_id,
            reason: Some(reason),
        })
    }
}
