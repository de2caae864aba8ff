//! Vision API face classifier
//!
//! Scores a jpeg image for face presence via the `images:annotate` endpoint.
//! The upstream service only supports one encoding, so the ingestion
//! pipeline calls this for `.jpeg` uploads exclusively.
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::VisionConfig;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("vision API request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("vision API error ({status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Clone)]
pub struct FaceClassifier {
    client: Client,
    endpoint: String,
    api_key: String,
}

// ============================================
// Request types
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageRequest {
    image: Image,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Image {
    /// Base64-encoded image bytes.
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    feature_type: String,
    max_results: i32,
}

// ============================================
// Response types
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResponse {
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct AnnotateImageResponse {
    face_annotations: Option<Vec<FaceAnnotation>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaceAnnotation {
    detection_confidence: f64,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i32,
    message: String,
}

impl FaceClassifier {
    pub fn new(config: &VisionConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Score the image for face presence, in `[0, 1]`. Zero when the API
    /// reports no faces.
    pub async fn annotate(&self, image: &[u8]) -> Result<f64, ClassifierError> {
        let request = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: Image {
                    content: BASE64.encode(image),
                },
                features: vec![Feature {
                    feature_type: "FACE_DETECTION".to_string(),
                    max_results: 1,
                }],
            }],
        };

        let url = format!("{}?key={}", self.endpoint, self.api_key);
        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(status = %status, %message, "vision API request failed");
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let annotate_response: AnnotateResponse = response.json().await?;

        let image_response = annotate_response
            .responses
            .into_iter()
            .next()
            .unwrap_or_default();

        if let Some(err) = image_response.error {
            error!(code = err.code, message = %err.message, "vision API returned error");
            return Err(ClassifierError::Api {
                status: err.code as u16,
                message: err.message,
            });
        }

        let score = face_score(&image_response);
        debug!(score, "image annotated");
        Ok(score)
    }
}

/// Highest detection confidence among the reported faces, clamped to [0, 1].
fn face_score(response: &AnnotateImageResponse) -> f64 {
    response
        .face_annotations
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|a| a.detection_confidence)
        .fold(0.0, f64::max)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_from_face_annotations() {
        let raw = serde_json::json!({
            "faceAnnotations": [
                { "detectionConfidence": 0.93 },
                { "detectionConfidence": 0.41 }
            ]
        });
        let response: AnnotateImageResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(face_score(&response), 0.93);
    }

    #[test]
    fn test_score_defaults_to_zero_without_faces() {
        let response: AnnotateImageResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(face_score(&response), 0.0);
    }

    #[test]
    fn test_score_clamped() {
        let raw = serde_json::json!({ "faceAnnotations": [ { "detectionConfidence": 1.7 } ] });
        let response: AnnotateImageResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(face_score(&response), 1.0);
    }

    #[test]
    fn test_error_payload_decodes() {
        let raw = serde_json::json!({
            "error": { "code": 400, "message": "bad image" }
        });
        let response: AnnotateImageResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.error.unwrap().code, 400);
    }
}
