//! Multipart body collection.

use std::collections::HashMap;

use axum::extract::Multipart;
use serde_json::{Map, Value};
use tracing::debug;

use super::response::AppError;
use crate::validate::{UploadBatch, UploadedFile};

/// Files and text fields of a multipart request.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub files: UploadBatch,
    pub fields: Map<String, Value>,
}

impl MultipartForm {
    /// Text fields overlaid with query parameters; the query wins on conflicts.
    pub fn payload(&self, query: &HashMap<String, String>) -> Value {
        let mut payload = self.fields.clone();
        for (key, value) in query {
            payload.insert(key.clone(), Value::String(value.clone()));
        }
        Value::Object(payload)
    }
}

/// Read every part of `multipart` into memory.
///
/// Parts with a file name become [`UploadedFile`]s grouped by field name in
/// arrival order. A file input left empty by the browser (no name, no bytes)
/// is ignored. Everything else is a text field; a repeated text field keeps
/// its last value.
pub async fn collect_multipart(mut multipart: Multipart) -> Result<MultipartForm, AppError> {
    let mut form = MultipartForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let mimetype = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read {}: {}", name, e)))?;

                if file_name.is_empty() && data.is_empty() {
                    continue;
                }

                debug!(field = %name, file = %file_name, mimetype = %mimetype, size = data.len(), "Received file");
                form.files.push(name, UploadedFile::new(file_name, mimetype, data));
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read {}: {}", name, e)))?;
                form.fields.insert(name, Value::String(text));
            }
        }
    }

    Ok(form)
}
