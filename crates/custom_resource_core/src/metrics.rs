use serde_json::{Map, Value};

use crate::contract::RequestType;
use crate::properties::AnonymousDataProperties;

pub const METRICS_ENDPOINT: &str = "https://metrics.awssolutionsbuilder.com/generic";
pub const SOLUTION_ID: &str = "SO0023";
pub const COMPANY: &str = "AWS";
pub const SOLUTION_NAME: &str = "AWS Serverless Image Handler";

/// Anonymous usage record posted once per reported lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsPayload {
    pub data: Map<String, Value>,
    pub time_stamp: String,
    pub solution: String,
    pub uuid: Option<String>,
    pub extra: Map<String, Value>,
}

impl MetricsPayload {
    /// Merges the template-supplied block with the fixed identification fields.
    pub fn build(
        properties: AnonymousDataProperties,
        request_type: RequestType,
        time_stamp: impl Into<String>,
    ) -> Self {
        let mut extra = properties.fields;
        let mut data = match extra.remove("Data") {
            Some(Value::Object(data)) => data,
            _ => Map::new(),
        };
        let uuid = match extra.remove("UUID") {
            Some(Value::String(uuid)) => Some(uuid),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };
        extra.remove("TimeStamp");
        extra.remove("Solution");

        data.insert("CFTemplate".to_string(), Value::from(request_type.as_str()));
        data.insert("Company".to_string(), Value::from(COMPANY));
        data.insert("Name".to_string(), Value::from(SOLUTION_NAME));

        Self {
            data,
            time_stamp: time_stamp.into(),
            solution: SOLUTION_ID.to_string(),
            uuid,
            extra,
        }
    }

    /// Top-level form fields; nested values are encoded as compact JSON.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("Data".to_string(), Value::Object(self.data.clone()).to_string()),
            ("TimeStamp".to_string(), self.time_stamp.clone()),
            ("Solution".to_string(), self.solution.clone()),
        ];
        if let Some(uuid) = &self.uuid {
            fields.push(("UUID".to_string(), uuid.clone()));
        }
        for (key, value) in &self.extra {
            let encoded = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            fields.push((key.clone(), encoded));
        }
        fields
    }
}
