//! `multipart/form-data` bodies (RFC 7578).
//!
//! The HTTP capability only moves bytes, so the core encodes the body itself
//! and sets the boundary on the `Content-Type` header.

use thiserror::Error;
use uuid::Uuid;

use crate::model::{CarForm, ImageFile};
use crate::{AppError, ErrorKind, CAR_DTO_PART, IMAGE_PART};

const CRLF: &[u8] = b"\r\n";

#[derive(Debug, Error)]
pub enum MultipartError {
    #[error("part name '{0}' contains characters not allowed in a header")]
    InvalidName(String),

    #[error("failed to serialize part '{part}': {source}")]
    Serialize {
        part: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        let kind = match e {
            MultipartError::Serialize { .. } => ErrorKind::Serialization,
            MultipartError::InvalidName(_) => ErrorKind::Internal,
        };
        AppError::new(kind, e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(format!("----CarEditorBoundary{}", Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `Content-Type` header value carrying the boundary.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn text(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, MultipartError> {
        let name = checked_name(name.into())?;
        self.parts.push(Part::Text {
            name,
            value: value.into(),
        });
        Ok(self)
    }

    pub fn file(mut self, name: impl Into<String>, file: &ImageFile) -> Result<Self, MultipartError> {
        let name = checked_name(name.into())?;
        self.parts.push(Part::File {
            name,
            file_name: escape_quoted(&file.file_name),
            content_type: file.resolved_content_type(),
            bytes: file.bytes.clone(),
        });
        Ok(self)
    }

    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        let mut body = Vec::new();
        for part in &self.parts {
            body.extend_from_slice(b"--");
            body.extend_from_slice(self.boundary.as_bytes());
            body.extend_from_slice(CRLF);
            match part {
                Part::Text { name, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"").as_bytes(),
                    );
                    body.extend_from_slice(CRLF);
                    body.extend_from_slice(CRLF);
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    name,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\""
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(CRLF);
                    body.extend_from_slice(format!("Content-Type: {content_type}").as_bytes());
                    body.extend_from_slice(CRLF);
                    body.extend_from_slice(CRLF);
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(CRLF);
        }
        body.extend_from_slice(b"--");
        body.extend_from_slice(self.boundary.as_bytes());
        body.extend_from_slice(b"--");
        body.extend_from_slice(CRLF);
        body
    }
}

fn checked_name(name: String) -> Result<String, MultipartError> {
    if name.is_empty() || name.chars().any(|c| c == '"' || c.is_control()) {
        return Err(MultipartError::InvalidName(name));
    }
    Ok(name)
}

// Browsers percent-encode these in filenames rather than backslash-escaping.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Body of `PUT /cars/{id}`: the selected image (if any) followed by the
/// `carDto` JSON with the image nulled.
pub fn car_update_form(form: &CarForm) -> Result<MultipartForm, MultipartError> {
    let dto = serde_json::to_string(&form.to_dto()).map_err(|source| MultipartError::Serialize {
        part: CAR_DTO_PART,
        source,
    })?;

    let mut multipart = MultipartForm::new();
    if let Some(image) = &form.image {
        multipart = multipart.file(IMAGE_PART, image)?;
    }
    multipart.text(CAR_DTO_PART, dto)
}
