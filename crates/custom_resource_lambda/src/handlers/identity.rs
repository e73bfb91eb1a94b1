use custom_resource_core::contract::{LifecycleEvent, ResponseData};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::handlers::dispatcher::{ProvisionError, ProvisionOutcome, ResourceProvisioner};
use crate::logging::Logger;

pub const CREATE_UUID_FAILURE_REASON: &str = "Failed to create UUID";

/// Mints the deployment UUID on Create and echoes it back afterwards.
#[derive(Debug, Clone, Copy)]
pub struct IdentityProvisioner {
    logger: Logger,
}

impl IdentityProvisioner {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    fn outcome(physical_resource_id: String) -> ProvisionOutcome {
        let mut data = ResponseData::new();
        data.insert("UUID".to_string(), Value::from(physical_resource_id.clone()));
        ProvisionOutcome::new(physical_resource_id).with_data(data)
    }

    fn existing(&self, event: &LifecycleEvent) -> Result<ProvisionOutcome, ProvisionError> {
        match event.physical_resource_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(Self::outcome(id.to_string())),
            _ => Err(ProvisionError::new(
                "",
                format!("{} event is missing PhysicalResourceId", event.request_type),
            )),
        }
    }
}

impl ResourceProvisioner for IdentityProvisioner {
    fn create_failure_reason(&self) -> &'static str {
        CREATE_UUID_FAILURE_REASON
    }

    fn create(&self, _event: &LifecycleEvent) -> Result<ProvisionOutcome, ProvisionError> {
        let unique_id = Uuid::new_v4().to_string();
        self.logger
            .debug("unique_id_created", json!({ "uuid": unique_id.clone() }));
        Ok(Self::outcome(unique_id))
    }

    fn update(&self, event: &LifecycleEvent) -> Result<ProvisionOutcome, ProvisionError> {
        self.existing(event)
    }

    fn delete(&self, event: &LifecycleEvent) -> Result<ProvisionOutcome, ProvisionError> {
        self.existing(event)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use custom_resource_core::contract::ResponseStatus;
    use custom_resource_core::log_level::LogLevel;

    use super::*;
    use crate::handlers::dispatcher::LifecycleDispatcher;
    use crate::handlers::response::test_support::{event, RecordingTransport};

    fn provisioner() -> IdentityProvisioner {
        IdentityProvisioner::new(Logger::new("create_uuid", LogLevel::Critical))
    }

    #[test]
    fn create_returns_distinct_canonical_uuids() {
        let provisioner = provisioner();
        let event = event("Create", None);

        let first = provisioner.create(&event).expect("create should succeed");
        let second = provisioner.create(&event).expect("create should succeed");

        let parsed = Uuid::parse_str(&first.physical_resource_id).expect("valid uuid");
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(parsed.hyphenated().to_string(), first.physical_resource_id);
        assert_ne!(first.physical_resource_id, second.physical_resource_id);
        assert_eq!(
            first.data.expect("data should be set")["UUID"],
            first.physical_resource_id
        );
    }

    #[test]
    fn update_and_delete_echo_the_existing_id() {
        let provisioner = provisioner();
        let existing = "2f1c5d0e-0000-4000-8000-000000000000";

        let updated = provisioner
            .update(&event("Update", Some(existing)))
            .expect("update should succeed");
        assert_eq!(updated.physical_resource_id, existing);
        assert_eq!(updated.data.expect("data should be set")["UUID"], existing);

        let deleted = provisioner
            .delete(&event("Delete", Some(existing)))
            .expect("delete should succeed");
        assert_eq!(deleted.physical_resource_id, existing);
        assert_eq!(deleted.data.expect("data should be set")["UUID"], existing);
    }

    #[test]
    fn create_response_carries_uuid_data() {
        let provisioner = provisioner();
        let transport = RecordingTransport::new();
        let dispatcher = LifecycleDispatcher::new(
            &provisioner,
            &transport,
            Logger::new("create_uuid", LogLevel::Critical),
            Duration::ZERO,
        );

        dispatcher
            .dispatch(&event("Create", None))
            .expect("delivery should succeed");

        let delivered = transport.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].status, ResponseStatus::Success);
        let data = delivered[0].data.clone().expect("data should be present");
        assert_eq!(data["UUID"], delivered[0].physical_resource_id);
    }

    #[test]
    fn delete_delivery_failure_retries_with_failed_response() {
        let provisioner = provisioner();
        let transport = RecordingTransport::with_failures(&[true]);
        let dispatcher = LifecycleDispatcher::new(
            &provisioner,
            &transport,
            Logger::new("create_uuid", LogLevel::Critical),
            Duration::from_millis(1),
        );

        dispatcher
            .dispatch(&event("Delete", Some("abc")))
            .expect("failure delivery should succeed");

        let delivered = transport.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].status, ResponseStatus::Failed);
        assert_eq!(delivered[0].reason.as_deref(), Some("Failed to delete abc"));
    }
}
