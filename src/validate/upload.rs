//! Uploaded-file constraints.
//!
//! Each route declares the multipart fields it accepts as a list of
//! [`UploadSpec`]s. [`validate_upload`] walks the declarations in order and
//! reports, per field:
//!
//! - `"<field> is required"` when a required field has no file,
//! - a mime-type message naming the allowed types when a file's declared
//!   mimetype matches none of them,
//! - a size message when an allowed file is larger than the limit.
//!
//! The size check only runs for files whose mime type passed, so a rejected
//! type is reported the same way regardless of its size. Identical messages
//! are reported once.

use std::collections::BTreeMap;
use std::str::FromStr;

use bytes::Bytes;
use thiserror::Error;

use super::Violation;

/// Maximum size of a single uploaded file (5 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Mime alternatives accepted by image upload routes.
pub const IMAGE_MIME_TYPES: &[&str] = &["jpeg", "jpg", "png", "heic"];

// =============================================================================
// Uploaded Files
// =============================================================================

/// A file received in a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Raw file content
    pub data: Bytes,

    /// Declared mimetype (e.g. "image/png")
    pub mimetype: String,

    /// Declared size in bytes
    pub size: u64,

    /// Original filename
    pub name: String,
}

impl UploadedFile {
    /// Create a file whose declared size is the length of `data`.
    pub fn new(name: impl Into<String>, mimetype: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            size: data.len() as u64,
            data,
            mimetype: mimetype.into(),
            name: name.into(),
        }
    }

    /// Extension implied by the mimetype: its last `/` segment, lowercased.
    ///
    /// Parameters such as `; charset=...` are ignored.
    pub fn extension(&self) -> String {
        let essence = self.mimetype.split(';').next().unwrap_or("").trim();
        essence
            .rsplit('/')
            .next()
            .unwrap_or(essence)
            .to_ascii_lowercase()
    }
}

/// Files of one request grouped by multipart field name.
///
/// Several parts sharing a field name are kept in arrival order; a single
/// part is a list of one.
#[derive(Debug, Clone, Default)]
pub struct UploadBatch {
    fields: BTreeMap<String, Vec<UploadedFile>>,
}

impl UploadBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file under `field`.
    pub fn push(&mut self, field: impl Into<String>, file: UploadedFile) {
        self.fields.entry(field.into()).or_default().push(file);
    }

    /// Builder-style [`push`](Self::push).
    pub fn with_file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.push(field, file);
        self
    }

    /// Files received under `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[UploadedFile]> {
        self.fields
            .get(field)
            .map(Vec::as_slice)
            .filter(|files| !files.is_empty())
    }

    /// Whether any file was received under `field`.
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// True when the request carried no file at all.
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Vec::is_empty)
    }

    /// Total number of files across all fields.
    pub fn file_count(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }
}

// =============================================================================
// Upload Declarations
// =============================================================================

/// Set of substrings a mimetype must contain one of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimePattern {
    alternatives: Vec<String>,
}

impl MimePattern {
    /// Create a pattern from its alternatives.
    pub fn new<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            alternatives: alternatives.into_iter().map(Into::into).collect(),
        }
    }

    /// The image pattern used by upload routes (`jpeg|jpg|png|heic`).
    pub fn images() -> Self {
        Self::new(IMAGE_MIME_TYPES.iter().copied())
    }

    /// Check a declared mimetype against the pattern.
    pub fn matches(&self, mimetype: &str) -> bool {
        let mimetype = mimetype.to_ascii_lowercase();
        self.alternatives
            .iter()
            .any(|alt| mimetype.contains(alt.as_str()))
    }

    /// Comma separated list of alternatives, for error messages.
    pub fn describe(&self) -> String {
        self.alternatives.join(", ")
    }
}

/// Error parsing a compact upload declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecParseError {
    #[error("Upload declaration '{0}' must look like '<field>-R' or '<field>-O'")]
    Malformed(String),

    #[error("Unknown presence flag '{flag}' in upload declaration '{declaration}'")]
    UnknownFlag { declaration: String, flag: String },
}

/// Constraints on one multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSpec {
    /// Multipart field name
    pub field: String,

    /// Whether at least one file must be present
    pub required: bool,

    /// Allowed mime types
    pub allowed: MimePattern,

    /// Maximum size of each file in bytes
    pub max_size: u64,
}

impl UploadSpec {
    /// Declare a required field.
    pub fn required(field: impl Into<String>, allowed: MimePattern) -> Self {
        Self {
            field: field.into(),
            required: true,
            allowed,
            max_size: MAX_UPLOAD_BYTES,
        }
    }

    /// Declare an optional field.
    pub fn optional(field: impl Into<String>, allowed: MimePattern) -> Self {
        Self {
            required: false,
            ..Self::required(field, allowed)
        }
    }

    /// Override the per-file size limit.
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Parse the compact `<field>-R` / `<field>-O` form with a given pattern.
    pub fn parse(declaration: &str, allowed: MimePattern) -> Result<Self, SpecParseError> {
        let (field, flag) = declaration
            .rsplit_once('-')
            .filter(|(field, _)| !field.is_empty())
            .ok_or_else(|| SpecParseError::Malformed(declaration.to_string()))?;

        match flag {
            "R" => Ok(Self::required(field, allowed)),
            "O" => Ok(Self::optional(field, allowed)),
            other => Err(SpecParseError::UnknownFlag {
                declaration: declaration.to_string(),
                flag: other.to_string(),
            }),
        }
    }
}

impl FromStr for UploadSpec {
    type Err = SpecParseError;

    /// Parse a compact declaration with the image pattern.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, MimePattern::images())
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Check the files of a request against the route's declarations.
///
/// Returns every distinct violation, in declaration order. An empty list
/// means the upload is acceptable.
pub fn validate_upload(batch: &UploadBatch, specs: &[UploadSpec]) -> Vec<Violation> {
    let mut messages: Vec<String> = Vec::new();

    for spec in specs {
        match batch.get(&spec.field) {
            None => {
                if spec.required {
                    messages.push(format!("{} is required", spec.field));
                }
            }
            Some(files) => {
                for file in files {
                    if let Some(message) = check_file(file, spec) {
                        messages.push(message);
                    }
                }
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    messages
        .into_iter()
        .filter(|message| seen.insert(message.clone()))
        .map(Violation::new)
        .collect()
}

/// Check one file, returning the first constraint it breaks.
fn check_file(file: &UploadedFile, spec: &UploadSpec) -> Option<String> {
    if !spec.allowed.matches(&file.mimetype) {
        return Some(format!(
            "{} allowed only {} mime type",
            spec.field,
            spec.allowed.describe()
        ));
    }

    if file.size > spec.max_size {
        return Some(format!(
            "{} file size should not be greater than {}MB for {}",
            spec.field,
            spec.max_size / (1024 * 1024),
            file.name
        ));
    }

    None
}

// =============================================================================
// Tests
// =============================================================================
