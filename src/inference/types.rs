use std::path::Path;

use serde::Deserialize;

use super::InferenceError;
use crate::models::{AnalysisResult, ClassDistribution, ImageData};

/// Segmentation backend. Implemented over HTTP and by a mock for tests.
pub trait InferenceService {
    fn analyze_scan(&self, scan: &ScanUpload) -> Result<AnalysisResult, InferenceError>;

    /// Never errors: any failed health request counts as unhealthy.
    fn is_healthy(&self) -> bool;
}

/// A validated image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanUpload {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ScanUpload {
    /// Rejects anything that is not an `image/*` type.
    pub fn new(file_name: &str, media_type: &str, bytes: Vec<u8>) -> Result<Self, InferenceError> {
        if !media_type.starts_with("image/") {
            return Err(InferenceError::UnsupportedMedia(media_type.to_string()));
        }
        Ok(Self {
            file_name: file_name.to_string(),
            media_type: media_type.to_string(),
            bytes,
        })
    }

    /// Reads a scan from disk, guessing its type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, InferenceError> {
        let media_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        if !media_type.starts_with("image/") {
            return Err(InferenceError::UnsupportedMedia(media_type));
        }
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scan".to_string());
        Self::new(&file_name, &media_type, bytes)
    }

    /// The upload as an embeddable image for the report.
    pub fn to_image_data(&self) -> ImageData {
        ImageData::from_bytes(&self.media_type, &self.bytes)
    }
}

/// Response body of `/inference/predict-with-metadata`.
#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    /// Base64 JPEG of the colour-coded segmentation.
    pub mask: String,
    pub inference_time: f64,
    pub class_distribution: ClassDistribution,
    #[serde(default)]
    pub image_shape: Vec<u32>,
}

impl From<PredictResponse> for AnalysisResult {
    fn from(response: PredictResponse) -> Self {
        AnalysisResult {
            segmented_image: mask_image(&response.mask),
            inference_time_seconds: response.inference_time,
            class_distribution: response.class_distribution,
            image_shape: response.image_shape,
        }
    }
}

/// The `mask` field: a bare base64 JPEG, or a `data:` URL carrying its own type.
fn mask_image(mask: &str) -> ImageData {
    if mask.trim_start().starts_with("data:") {
        ImageData::from_data_url(mask)
    } else {
        ImageData::jpeg_base64(mask)
    }
}

/// FastAPI-style error body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

/// Response body of `/health`.
#[derive(Debug, Deserialize)]
pub(crate) struct HealthResponse {
    pub status: String,
}

/// Human-readable reason for a failed request: the `detail` of a JSON error
/// body when present, otherwise `"Analysis failed: <reason>"`.
pub fn error_detail(reason: &str, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .map(|d| match d {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
    detail.unwrap_or_else(|| format!("Analysis failed: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_response_keeps_class_order() {
        let body = r#"{
            "mask": "aGVsbG8=",
            "inference_time": 0.42,
            "class_distribution": {
                "class_2": {"pixel_count": 10, "percentage": 1.5},
                "background": {"pixel_count": 900, "percentage": 90.0},
                "class_1": {"pixel_count": 90, "percentage": 8.5}
            },
            "image_shape": [512, 512, 3]
        }"#;
        let parsed: PredictResponse = serde_json::from_str(body).unwrap();
        let result = AnalysisResult::from(parsed);

        let keys: Vec<&str> = result.class_distribution.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["class_2", "background", "class_1"]);
        assert_eq!(result.segmented_image.media_type, "image/jpeg");
        assert_eq!(result.segmented_image.decode().unwrap(), b"hello");
        assert_eq!(result.image_dimensions(), "512 x 512 x 3");
    }

    #[test]
    fn data_url_mask_keeps_its_media_type() {
        let body = r#"{
            "mask": "data:image/png;base64,AQID",
            "inference_time": 0.1,
            "class_distribution": {"background": {"percentage": 100.0}}
        }"#;
        let result = AnalysisResult::from(serde_json::from_str::<PredictResponse>(body).unwrap());
        assert_eq!(result.segmented_image.media_type, "image/png");
        assert_eq!(result.segmented_image.decode().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn missing_shape_defaults_empty() {
        let body = r#"{"mask": "", "inference_time": 1.0, "class_distribution": {}}"#;
        let parsed: PredictResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.image_shape.is_empty());
        assert!(parsed.class_distribution.is_empty());
    }

    #[test]
    fn error_detail_prefers_body() {
        assert_eq!(
            error_detail("Unprocessable Entity", r#"{"detail": "Invalid image file"}"#),
            "Invalid image file"
        );
        assert_eq!(
            error_detail("Bad Gateway", "<html>oops</html>"),
            "Analysis failed: Bad Gateway"
        );
        assert_eq!(error_detail("Not Found", r#"{"other": 1}"#), "Analysis failed: Not Found");
        assert!(error_detail("x", r#"{"detail": [{"msg": "field required"}]}"#).contains("field required"));
    }

    #[test]
    fn upload_rejects_non_images() {
        let err = ScanUpload::new("notes.txt", "text/plain", vec![1]).unwrap_err();
        assert!(matches!(err, InferenceError::UnsupportedMedia(m) if m == "text/plain"));
        assert!(ScanUpload::new("scan.png", "image/png", vec![1]).is_ok());
    }

    #[test]
    fn upload_from_path_guesses_type() {
        let tmp = tempfile::tempdir().unwrap();
        let png = tmp.path().join("scan.png");
        std::fs::write(&png, b"\x89PNG").unwrap();
        let upload = ScanUpload::from_path(&png).unwrap();
        assert_eq!(upload.media_type, "image/png");
        assert_eq!(upload.file_name, "scan.png");
        assert_eq!(upload.to_image_data().decode().unwrap(), b"\x89PNG");

        let pdf = tmp.path().join("scan.pdf");
        std::fs::write(&pdf, b"%PDF").unwrap();
        assert!(matches!(
            ScanUpload::from_path(&pdf),
            Err(InferenceError::UnsupportedMedia(_))
        ));
    }

    #[test]
    fn upload_from_missing_path_is_io() {
        let err = ScanUpload::from_path(Path::new("/nonexistent/dir/scan.jpg")).unwrap_err();
        assert!(matches!(err, InferenceError::Io(_)));
    }
}
