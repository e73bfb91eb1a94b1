use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type ResourceProperties = Map<String, Value>;
pub type ResponseData = Map<String, Value>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound CloudFormation custom-resource request.
///
/// `PhysicalResourceId` is absent on Create and carries the id returned by the
/// previous response on Update and Delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: ResourceProperties,
}

impl LifecycleEvent {
    /// Physical id carried by the event, or an empty string when the
    /// orchestrator did not supply one.
    pub fn physical_id_or_empty(&self) -> &str {
        self.physical_resource_id.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Outbound body PUT to the event's `ResponseURL`.
///
/// The orchestrator validates the shape strictly: `Reason` is present only on
/// FAILED and `Data` only on SUCCESS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleResponse {
    pub status: ResponseStatus,
    pub physical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl LifecycleResponse {
    pub fn success(
        event: &LifecycleEvent,
        physical_resource_id: impl Into<String>,
        data: Option<ResponseData>,
    ) -> Self {
        Self {
            status: ResponseStatus::Success,
            physical_resource_id: physical_resource_id.into(),
            reason: None,
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            data: data.filter(|value| !value.is_empty()),
        }
    }

    pub fn failure(
        event: &LifecycleEvent,
        physical_resource_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status: ResponseStatus::Failed,
            physical_resource_id: physical_resource_id.into(),
            reason: Some(reason.into()),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            data: None,
        }
    }
}

pub fn parse_event(value: Value) -> Result<LifecycleEvent, PropertyError> {
    serde_json::from_value(value)
        .map_err(|error| PropertyError::new(format!("invalid lifecycle event: {error}")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyError {
    message: String,
}

impl PropertyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for PropertyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for PropertyError {}
