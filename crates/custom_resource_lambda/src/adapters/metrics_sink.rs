use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkResponse {
    pub status_code: u16,
    pub body: String,
}

/// Fire-and-forget telemetry endpoint.
pub trait MetricsSink {
    fn post_form(&self, url: &str, form_body: &str) -> Result<SinkResponse, String>;
}

#[derive(Debug, Clone)]
pub struct HttpMetricsSink {
    client: Client,
}

impl HttpMetricsSink {
    pub fn new() -> Result<Self, String> {
        let client = Client::builder()
            .build()
            .map_err(|error| format!("failed to build metrics http client: {error}"))?;
        Ok(Self { client })
    }
}

impl MetricsSink for HttpMetricsSink {
    fn post_form(&self, url: &str, form_body: &str) -> Result<SinkResponse, String> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(form_body.to_string())
            .send()
            .map_err(|error| format!("failed to post anonymous metrics: {error}"))?;
        let status_code = response.status().as_u16();
        // The body is informational only; an unreadable body is not a failure.
        let body = response.text().unwrap_or_default();
        Ok(SinkResponse { status_code, body })
    }
}
