use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

/// Delivers a serialized lifecycle response to the orchestrator callback URL.
pub trait ResponseTransport {
    /// Returns the HTTP status on delivery; `Err` only when the request could
    /// not be completed at all.
    fn put_response(&self, url: &str, body: &[u8]) -> Result<u16, String>;
}

/// PUTs the response body to the pre-signed `ResponseURL`.
#[derive(Debug, Clone)]
pub struct HttpResponseTransport {
    client: Client,
}

impl HttpResponseTransport {
    pub fn new() -> Result<Self, String> {
        let client = Client::builder()
            .build()
            .map_err(|error| format!("failed to build response http client: {error}"))?;
        Ok(Self { client })
    }
}

impl ResponseTransport for HttpResponseTransport {
    fn put_response(&self, url: &str, body: &[u8]) -> Result<u16, String> {
        // The pre-signed URL is signed without a content type.
        self.client
            .put(url)
            .header(CONTENT_TYPE, "")
            .body(body.to_vec())
            .send()
            .map(|response| response.status().as_u16())
            .map_err(|error| format!("failed to PUT response to callback url: {error}"))
    }
}

/// Prints the response instead of delivering it; used by local invocations.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutResponseTransport;

impl ResponseTransport for StdoutResponseTransport {
    fn put_response(&self, url: &str, body: &[u8]) -> Result<u16, String> {
        println!("PUT {url}\n{}", String::from_utf8_lossy(body));
        Ok(200)
    }
}
