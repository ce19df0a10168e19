//! Object key layout.
//!
//! ```text
//! {owner_kind}/{owner_id}/{doc_type}/_{doc_type}-{unix_millis}-{suffix}.{ext}
//! {owner_kind}/{owner_id}/{doc_type}-thumbnail/_{doc_type}-thumbnail-{unix_millis}-{suffix}.{ext}
//! ```
//!
//! The suffix is 10 characters drawn from `[A-Za-z0-9]`. Together with the
//! millisecond timestamp this makes collisions negligible; nothing checks for
//! an existing object before writing.

use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;

/// Length of the random key suffix.
pub const SUFFIX_LEN: usize = 10;

/// Entity an object belongs to. Used for key namespacing only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    /// e.g. a user type such as "provider" or "admin"
    pub kind: String,
    pub id: String,
}

impl Owner {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Which object of an upload a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyVariant {
    Original,
    Thumbnail,
}

impl KeyVariant {
    /// Doc type segment for this variant.
    fn segment(self, doc_type: &str) -> String {
        match self {
            KeyVariant::Original => doc_type.to_string(),
            KeyVariant::Thumbnail => format!("{}-thumbnail", doc_type),
        }
    }
}

/// Build a key from all of its parts.
pub fn build_key(
    owner: &Owner,
    doc_type: &str,
    variant: KeyVariant,
    timestamp_millis: i64,
    suffix: &str,
    extension: &str,
) -> String {
    let segment = variant.segment(doc_type);
    format!(
        "{}/{}/{}/_{}-{}-{}.{}",
        owner.kind, owner.id, segment, segment, timestamp_millis, suffix, extension
    )
}

/// Build a fresh key using the current time and a random suffix.
pub fn generate_key(owner: &Owner, doc_type: &str, variant: KeyVariant, extension: &str) -> String {
    build_key(
        owner,
        doc_type,
        variant,
        Utc::now().timestamp_millis(),
        &random_suffix(SUFFIX_LEN),
        extension,
    )
}

/// Random string over the 62-symbol alphanumeric alphabet.
pub fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
