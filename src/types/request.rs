//! Request and response definitions for the two document operations.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::{Document, DocumentMeta, ServiceConfig};
use crate::error::{ServiceError, ServiceResult};

/// Filename echoed back when a rectification request names none.
pub const DEFAULT_TEXT_FILENAME: &str = "document.md";

/// Filename echoed back when a conversion request names none.
pub const DEFAULT_PDF_FILENAME: &str = "document.pdf";

/// Request to rectify a text document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectifyRequest {
    /// Raw document text
    #[serde(default)]
    pub content: Option<String>,

    /// Name of the source file
    #[serde(default)]
    pub filename: Option<String>,

    /// Backing correction model
    #[serde(default)]
    pub model: Option<String>,

    /// Chunk size in characters; signed so that invalid values reach validation
    #[serde(default)]
    pub chunk_size: Option<i64>,

    /// Stream progress frames instead of returning a single response
    #[serde(default)]
    pub stream: bool,
}

/// A validated rectification request.
#[derive(Debug, Clone)]
pub struct RectifyJob {
    pub document: Document,
    pub model: String,
    pub chunk_size: usize,
    pub stream: bool,
}

impl RectifyRequest {
    /// Validate the request against the service defaults.
    ///
    /// Missing content is rejected before anything else is looked at.
    pub fn into_job(self, config: &ServiceConfig) -> ServiceResult<RectifyJob> {
        let content = match self.content {
            Some(content) if !content.is_empty() => content,
            _ => return Err(ServiceError::InputValidation("No content provided".into())),
        };

        let chunk_size = match self.chunk_size {
            None => config.default_chunk_size,
            Some(size) if size > 0 => usize::try_from(size).map_err(|_| {
                ServiceError::Configuration(format!("chunk size {size} is out of range"))
            })?,
            Some(size) => {
                return Err(ServiceError::Configuration(format!(
                    "chunk size must be greater than zero, got {size}"
                )))
            }
        };

        let model = match self.model {
            None => config.default_model.clone(),
            Some(model) if !model.trim().is_empty() => model.trim().to_string(),
            Some(_) => {
                return Err(ServiceError::Configuration(
                    "model must not be blank".into(),
                ))
            }
        };

        let filename = self
            .filename
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TEXT_FILENAME.to_string());

        let document = Document::new(content).with_meta(DocumentMeta {
            filename: Some(filename),
            model: Some(model.clone()),
            chunk_size: Some(chunk_size),
        });

        Ok(RectifyJob {
            document,
            model,
            chunk_size,
            stream: self.stream,
        })
    }
}

/// Request to convert a binary document (PDF) to markdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    /// Base64-encoded binary payload
    #[serde(default)]
    pub content: Option<String>,

    /// Name of the source file
    #[serde(default)]
    pub filename: Option<String>,

    /// Stream activity frames instead of returning a single response
    #[serde(default)]
    pub stream: bool,
}

/// A validated conversion request with its payload decoded.
#[derive(Debug, Clone)]
pub struct ConvertJob {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub stream: bool,
}

impl ConvertRequest {
    pub fn into_job(self) -> ServiceResult<ConvertJob> {
        let encoded = match self.content {
            Some(content) if !content.trim().is_empty() => content,
            _ => return Err(ServiceError::InputValidation("No content provided".into())),
        };

        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ServiceError::InputValidation(format!("Invalid base64 content: {e}")))?;

        let filename = self
            .filename
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PDF_FILENAME.to_string());

        Ok(ConvertJob {
            bytes,
            filename,
            stream: self.stream,
        })
    }
}

/// Structured (non-streaming) response for both operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResponse {
    /// Final assembled markdown
    pub markdown: String,

    /// Filename from the request
    pub filename: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(content: Option<&str>) -> RectifyRequest {
        RectifyRequest {
            content: content.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn missing_content_is_rejected() {
        let err = request(None).into_job(&ServiceConfig::default()).unwrap_err();
        assert_eq!(err, ServiceError::InputValidation("No content provided".into()));
    }

    #[test]
    fn empty_content_is_rejected() {
        let err = request(Some("")).into_job(&ServiceConfig::default()).unwrap_err();
        assert!(matches!(err, ServiceError::InputValidation(_)));
    }

    #[test]
    fn missing_content_wins_over_bad_chunk_size() {
        let req = RectifyRequest {
            chunk_size: Some(-1),
            ..Default::default()
        };
        let err = req.into_job(&ServiceConfig::default()).unwrap_err();
        assert!(matches!(err, ServiceError::InputValidation(_)));
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let job = request(Some("text")).into_job(&ServiceConfig::default()).unwrap();
        assert_eq!(job.chunk_size, 4000);
        assert_eq!(job.model, crate::DEFAULT_MODEL);
        assert_eq!(job.document.filename(), DEFAULT_TEXT_FILENAME);
        assert!(!job.stream);
    }

    #[test]
    fn non_positive_chunk_size_is_a_configuration_error() {
        for size in [0, -5] {
            let req = RectifyRequest {
                content: Some("text".into()),
                chunk_size: Some(size),
                ..Default::default()
            };
            let err = req.into_job(&ServiceConfig::default()).unwrap_err();
            assert!(matches!(err, ServiceError::Configuration(_)), "size {size}");
        }
    }

    #[test]
    fn blank_model_is_a_configuration_error() {
        let req = RectifyRequest {
            content: Some("text".into()),
            model: Some(" ".into()),
            ..Default::default()
        };
        let err = req.into_job(&ServiceConfig::default()).unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
    }

    #[test]
    fn camel_case_fields_deserialize() {
        let req: RectifyRequest = serde_json::from_str(
            r#"{"content":"a","filename":"f.txt","model":"m","chunkSize":12,"stream":true}"#,
        )
        .unwrap();
        let job = req.into_job(&ServiceConfig::default()).unwrap();
        assert_eq!(job.chunk_size, 12);
        assert_eq!(job.model, "m");
        assert_eq!(job.document.filename(), "f.txt");
        assert!(job.stream);
    }

    #[test]
    fn convert_decodes_base64() {
        let req = ConvertRequest {
            content: Some(STANDARD.encode(b"%PDF-1.7")),
            filename: Some("paper.pdf".into()),
            stream: false,
        };
        let job = req.into_job().unwrap();
        assert_eq!(job.bytes, b"%PDF-1.7".to_vec());
        assert_eq!(job.filename, "paper.pdf");
    }

    #[test]
    fn convert_rejects_invalid_base64() {
        let req = ConvertRequest {
            content: Some("not base64!!".into()),
            ..Default::default()
        };
        assert!(matches!(
            req.into_job(),
            Err(ServiceError::InputValidation(_))
        ));
    }

    #[test]
    fn convert_rejects_missing_content() {
        let err = ConvertRequest::default().into_job().unwrap_err();
        assert_eq!(err.to_string(), "No content provided");
    }
}
