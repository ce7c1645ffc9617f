use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};

use super::types::{error_detail, HealthResponse, InferenceService, PredictResponse, ScanUpload};
use super::InferenceError;
use crate::models::AnalysisResult;

const PREDICT_PATH: &str = "/inference/predict-with-metadata";
const HEALTH_PATH: &str = "/health";
/// Hosted inference can cold-start; allow for it.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
const HEALTH_TIMEOUT_SECS: u64 = 10;

/// HTTP client for the DentiMap segmentation API.
pub struct DentimapClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl DentimapClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, InferenceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| InferenceError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    /// Client for [`crate::config::api_base_url`] with the default timeout.
    pub fn from_config() -> Result<Self, InferenceError> {
        Self::new(&crate::config::api_base_url(), DEFAULT_TIMEOUT_SECS)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_connect() {
            InferenceError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            InferenceError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
        } else {
            InferenceError::HttpClient(e.to_string())
        }
    }
}

impl InferenceService for DentimapClient {
    fn analyze_scan(&self, scan: &ScanUpload) -> Result<AnalysisResult, InferenceError> {
        let part = Part::bytes(scan.bytes.clone())
            .file_name(scan.file_name.clone())
            .mime_str(&scan.media_type)
            .map_err(|e| InferenceError::HttpClient(e.to_string()))?;
        let form = Form::new().part("file", part);

        tracing::info!(file = %scan.file_name, bytes = scan.bytes.len(), "Uploading scan for analysis");
        let response = self
            .client
            .post(self.endpoint(PREDICT_PATH))
            .multipart(form)
            .send()
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown error").to_string();
            let body = response.text().unwrap_or_default();
            return Err(InferenceError::Api {
                status: status.as_u16(),
                detail: error_detail(&reason, &body),
            });
        }

        let parsed: PredictResponse = response
            .json()
            .map_err(|e| InferenceError::ResponseParsing(e.to_string()))?;
        tracing::info!(
            seconds = parsed.inference_time,
            classes = parsed.class_distribution.len(),
            "Analysis received"
        );
        Ok(parsed.into())
    }

    fn is_healthy(&self) -> bool {
        let response = self
            .client
            .get(self.endpoint(HEALTH_PATH))
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send();

        match response {
            Ok(r) if r.status().is_success() => match r.json::<HealthResponse>() {
                Ok(health) => health.status == "healthy",
                Err(e) => {
                    tracing::warn!("Health response unreadable: {e}");
                    false
                }
            },
            Ok(r) => {
                tracing::warn!(status = r.status().as_u16(), "Health check failed");
                false
            }
            Err(e) => {
                tracing::warn!("Health check failed: {}", self.send_error(e));
                false
            }
        }
    }
}

/// Mock service for testing: returns a fixed result or error.
pub struct MockInferenceService {
    result: Result<AnalysisResult, String>,
    healthy: bool,
}

impl MockInferenceService {
    pub fn new(result: AnalysisResult) -> Self {
        Self {
            result: Ok(result),
            healthy: true,
        }
    }

    /// Every analysis fails with an `Api` error carrying `detail`.
    pub fn failing(detail: &str) -> Self {
        Self {
            result: Err(detail.to_string()),
            healthy: false,
        }
    }

    pub fn with_health(mut self, healthy: bool) -> Self {
        self.healthy = healthy;
        self
    }
}

impl InferenceService for MockInferenceService {
    fn analyze_scan(&self, _scan: &ScanUpload) -> Result<AnalysisResult, InferenceError> {
        match &self.result {
            Ok(result) => Ok(result.clone()),
            Err(detail) => Err(InferenceError::Api {
                status: 500,
                detail: detail.clone(),
            }),
        }
    }

    fn is_healthy(&self) -> bool {
        self.healthy
    }
}
