//! Request body decoding for material writes.
//!
//! Clients send either `multipart/form-data` (text fields plus an optional
//! `image` file) or a JSON object. Both end up as a loose field map so the
//! handlers apply one set of casting and merge rules.

use crate::error::{ServerError, ServerResult};
use crate::uploads::IMAGE_FIELD;
use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use bytes::Bytes;
use serde_json::{Map, Value};

/// File part received under the `image` field.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Where a request's image reference comes from. An upload always wins over
/// an `imageUrl` field.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Uploaded(UploadedFile),
    Provided(Value),
    Absent,
}

/// Decoded body of a create or update request.
#[derive(Debug, Clone, Default)]
pub struct MaterialPayload {
    pub fields: Map<String, Value>,
    pub upload: Option<UploadedFile>,
}

impl MaterialPayload {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Resolve the image source once, removing it from the payload.
    pub fn take_image(&mut self) -> ImageSource {
        if let Some(file) = self.upload.take() {
            return ImageSource::Uploaded(file);
        }
        match self.fields.remove("imageUrl") {
            None | Some(Value::Null) => ImageSource::Absent,
            Some(value) => ImageSource::Provided(value),
        }
    }

    pub fn from_json(body: &[u8]) -> ServerResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        match serde_json::from_slice::<Value>(body)? {
            Value::Object(fields) => Ok(Self {
                fields,
                upload: None,
            }),
            Value::Array(_) => Ok(Self::default()),
            other => Err(ServerError::Uncaught(format!(
                "Unexpected JSON body: expected an object, found {other}"
            ))),
        }
    }

    async fn from_multipart(mut multipart: Multipart) -> ServerResult<Self> {
        let mut payload = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            let Some(file_name) = field.file_name().map(str::to_owned) else {
                let text = field.text().await.map_err(multipart_error)?;
                payload.push_text(name, text);
                continue;
            };

            if name != IMAGE_FIELD || payload.upload.is_some() {
                return Err(ServerError::Uncaught("Unexpected field".to_string()));
            }
            let bytes = field.bytes().await.map_err(multipart_error)?;

            // An empty file input still posts a part with no name and no content.
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }
            payload.upload = Some(UploadedFile {
                file_name,
                bytes,
            });
        }

        Ok(payload)
    }

    /// Repeated names and `name[]` fields collect into arrays.
    fn push_text(&mut self, name: String, text: String) {
        let (key, as_array) = match name.strip_suffix("[]") {
            Some(key) => (key.to_string(), true),
            None => (name, false),
        };

        match self.fields.get_mut(&key) {
            Some(Value::Array(items)) => items.push(Value::String(text)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(text)]);
            }
            None if as_array => {
                self.fields
                    .insert(key, Value::Array(vec![Value::String(text)]));
            }
            None => {
                self.fields.insert(key, Value::String(text));
            }
        }
    }
}

impl<S> FromRequest<S> for MaterialPayload
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ServerError::Uncaught(e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        if is_json(&content_type) {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| ServerError::Uncaught(e.body_text()))?;
            return Self::from_json(&body);
        }

        Ok(Self::default())
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence == "application/json" || essence.ends_with("+json")
}

fn multipart_error(err: MultipartError) -> ServerError {
    ServerError::Uncaught(err.body_text())
}
