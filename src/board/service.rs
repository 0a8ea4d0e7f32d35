use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::board::error::EvaluateError;
use crate::board::wire::{parse_response, CalculateRequest, EvaluationItem};

pub const CALCULATE_PATH: &str = "/calculate/";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Recognises and evaluates the handwritten expressions in a snapshot.
pub trait EvaluationService: Send + Sync {
    fn calculate(&self, request: &CalculateRequest) -> Result<Vec<EvaluationItem>, EvaluateError>;
}

/// `EvaluationService` backed by the HTTP `/calculate/` endpoint.
pub struct HttpEvaluationService {
    client: Client,
    endpoint: String,
}

impl HttpEvaluationService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EvaluateError> {
        let client = Client::builder()
            .user_agent("math-board")
            .timeout(timeout)
            .build()
            .map_err(|err| EvaluateError::transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: calculate_url(base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EvaluationService for HttpEvaluationService {
    fn calculate(&self, request: &CalculateRequest) -> Result<Vec<EvaluationItem>, EvaluateError> {
        let body = serde_json::to_vec(request)
            .map_err(|err| EvaluateError::transport(format!("encode request: {err}")))?;
        tracing::info!(
            endpoint = %self.endpoint,
            vars = request.dict_of_vars.len(),
            bytes = body.len(),
            "sending calculate request"
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|err| EvaluateError::transport(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "calculate request rejected");
            return Err(EvaluateError::Status(status.as_u16()));
        }

        let text = resp
            .text()
            .map_err(|err| EvaluateError::transport(format!("read response body: {err}")))?;
        let items = parse_response(&text)?;
        tracing::info!(items = items.len(), "calculate request completed");
        Ok(items)
    }
}

/// `<base>/calculate/`, tolerating a trailing slash on the base.
pub fn calculate_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), CALCULATE_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculate_url_joins_without_double_slash() {
        assert_eq!(
            calculate_url("http://localhost:8900"),
            "http://localhost:8900/calculate/"
        );
        assert_eq!(
            calculate_url("http://localhost:8900/"),
            "http://localhost:8900/calculate/"
        );
        assert_eq!(
            calculate_url("https://api.example.com/v1"),
            "https://api.example.com/v1/calculate/"
        );
    }

    #[test]
    fn client_keeps_resolved_endpoint() {
        let service =
            HttpEvaluationService::new("http://127.0.0.1:9/", DEFAULT_REQUEST_TIMEOUT).unwrap();
        assert_eq!(service.endpoint(), "http://127.0.0.1:9/calculate/");
    }
}
