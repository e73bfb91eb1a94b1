//! Parsing of the `ResourceProperties` blocks the handlers consume.
//!
//! CloudFormation templates for these resources pass `DeployUI` and
//! `SendAnonymousData` either as JSON objects or as strings holding a
//! Python-style dict literal (`{'UIBucket': 'b'}`); both forms are accepted.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::contract::{PropertyError, ResourceProperties};

pub const DEPLOY_UI_PROPERTY: &str = "DeployUI";
pub const SEND_ANONYMOUS_DATA_PROPERTY: &str = "SendAnonymousData";
pub const FIND_REPLACE_ENTRY_SEPARATOR: char = ',';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub bucket: String,
    pub key: String,
}

impl SourceLocation {
    /// Splits `bucket/key/...` on the first `/`.
    pub fn parse(source_url: &str) -> Result<Self, PropertyError> {
        let Some((bucket, key)) = source_url.split_once('/') else {
            return Err(PropertyError::new(format!(
                "UISourceURL '{source_url}' must be of the form <bucket>/<key>"
            )));
        };
        if bucket.is_empty() || key.is_empty() {
            return Err(PropertyError::new(format!(
                "UISourceURL '{source_url}' must name both a bucket and a key"
            )));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// Last path segment of the key, used as the local archive file name.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindReplacePair {
    pub find: String,
    pub replace: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub source_url: Option<String>,
    pub destination_bucket: String,
    pub destination_prefix: String,
    pub public_read: bool,
    pub find_replace: Vec<FindReplacePair>,
}

impl DeployConfig {
    /// Physical id reported for a deployed UI: `<bucket>/<prefix>`.
    pub fn resource_id(&self) -> String {
        format!("{}/{}", self.destination_bucket, self.destination_prefix)
    }

    pub fn source_location(&self) -> Result<SourceLocation, PropertyError> {
        match self.source_url.as_deref() {
            Some(url) if !url.trim().is_empty() => SourceLocation::parse(url.trim()),
            _ => Err(PropertyError::new("UISourceURL is required to deploy the UI")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDeployUi {
    #[serde(rename = "UISourceURL", default)]
    source_url: Option<String>,
    #[serde(rename = "UIBucket")]
    bucket: String,
    #[serde(rename = "UIPrefix")]
    prefix: String,
    #[serde(rename = "UIPublicRead", default)]
    public_read: Option<Value>,
    #[serde(rename = "FindReplace", default)]
    find_replace: Option<String>,
    #[serde(rename = "Deliminator", alias = "Delimiter", default)]
    delimiter: Option<String>,
}

pub fn parse_deploy_config(properties: &ResourceProperties) -> Result<DeployConfig, PropertyError> {
    let value = property_value(properties, DEPLOY_UI_PROPERTY)?;
    let raw: RawDeployUi = serde_json::from_value(value)
        .map_err(|error| PropertyError::new(format!("invalid DeployUI property: {error}")))?;

    let find_replace = match raw.find_replace.as_deref() {
        Some(entries) if !entries.trim().is_empty() => {
            let delimiter = raw.delimiter.as_deref().unwrap_or("");
            parse_find_replace(entries, delimiter)?
        }
        _ => Vec::new(),
    };

    Ok(DeployConfig {
        source_url: raw.source_url,
        destination_bucket: raw.bucket,
        destination_prefix: raw.prefix,
        public_read: raw.public_read.as_ref().is_some_and(is_truthy),
        find_replace,
    })
}

/// Parses `find<delim>replace` entries separated by commas, keeping their order.
pub fn parse_find_replace(
    entries: &str,
    delimiter: &str,
) -> Result<Vec<FindReplacePair>, PropertyError> {
    if delimiter.is_empty() {
        return Err(PropertyError::new(
            "Deliminator must be set when FindReplace is configured",
        ));
    }

    entries
        .split(FIND_REPLACE_ENTRY_SEPARATOR)
        .map(|entry| {
            let parts: Vec<&str> = entry.split(delimiter).collect();
            match parts.as_slice() {
                [find, replace] if !find.is_empty() => Ok(FindReplacePair {
                    find: (*find).to_string(),
                    replace: (*replace).to_string(),
                }),
                _ => Err(PropertyError::new(format!(
                    "FindReplace entry '{entry}' must be <find>{delimiter}<replace>"
                ))),
            }
        })
        .collect()
}

/// Anonymous usage block supplied by the template (`Data`, `UUID`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct AnonymousDataProperties {
    pub fields: Map<String, Value>,
}

pub fn parse_anonymous_data(
    properties: &ResourceProperties,
) -> Result<AnonymousDataProperties, PropertyError> {
    let value = property_value(properties, SEND_ANONYMOUS_DATA_PROPERTY)?;
    let Value::Object(fields) = value else {
        return Err(PropertyError::new(
            "SendAnonymousData property must be an object",
        ));
    };
    match fields.get("Data") {
        None | Some(Value::Object(_)) => Ok(AnonymousDataProperties { fields }),
        Some(_) => Err(PropertyError::new(
            "SendAnonymousData.Data must be an object",
        )),
    }
}

fn property_value(properties: &ResourceProperties, name: &str) -> Result<Value, PropertyError> {
    match properties.get(name) {
        None | Some(Value::Null) => Err(PropertyError::new(format!(
            "ResourceProperties.{name} is required"
        ))),
        Some(Value::String(text)) => parse_dict_literal(text)
            .map_err(|error| PropertyError::new(format!("invalid {name} property: {error}"))),
        Some(other) => Ok(other.clone()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Number(number) => number.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

/// Parses a JSON document or a Python-style literal (single-quoted strings,
/// `True`/`False`/`None`) into a JSON value.
pub fn parse_dict_literal(text: &str) -> Result<Value, serde_json::Error> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }
    serde_json::from_str(&python_literal_to_json(text))
}

fn python_literal_to_json(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;
    let mut bare_word = String::new();

    let flush_word = |word: &mut String, output: &mut String| {
        match word.as_str() {
            "True" => output.push_str("true"),
            "False" => output.push_str("false"),
            "None" => output.push_str("null"),
            _ => output.push_str(word),
        }
        word.clear();
    };

    while let Some(ch) = chars.next() {
        match quote {
            Some(open) => match ch {
                '\\' => match chars.next() {
                    Some('\'') => output.push('\''),
                    Some(escaped) => {
                        output.push('\\');
                        output.push(escaped);
                    }
                    None => output.push('\\'),
                },
                '"' if open == '\'' => output.push_str("\\\""),
                c if c == open => {
                    output.push('"');
                    quote = None;
                }
                c => output.push(c),
            },
            None => match ch {
                '\'' | '"' => {
                    flush_word(&mut bare_word, &mut output);
                    output.push('"');
                    quote = Some(ch);
                }
                c if c.is_ascii_alphanumeric() || c == '_' => bare_word.push(c),
                ',' if closes_container(chars.clone()) => {
                    flush_word(&mut bare_word, &mut output);
                }
                c => {
                    flush_word(&mut bare_word, &mut output);
                    output.push(c);
                }
            },
        }
    }
    flush_word(&mut bare_word, &mut output);
    output
}

/// True when the next significant character ends a dict or list, making the
/// preceding comma a trailing one.
fn closes_container(rest: impl Iterator<Item = char>) -> bool {
    matches!(
        rest.skip_while(|c| c.is_whitespace()).next(),
        Some('}') | Some(']')
    )
}
