//! Object-storage naming for property media.
//!
//! Uploading bytes is out of scope here; this module only derives the object
//! path a file is stored under and the public URL clients read it from.

use crate::model::UserId;
use uuid::Uuid;

pub const PHOTO_BUCKET: &str = "property-photos";
const PUBLIC_OBJECT_PREFIX: &str = "storage/v1/object/public";
const NONCE_LEN: usize = 7;

/// Last dot-separated segment of `file_name`, or the whole name without dots.
pub fn file_extension(file_name: &str) -> &str {
    file_name.rsplit('.').next().unwrap_or(file_name)
}

/// `{user_id}/{epoch_ms}-{nonce}.{ext}`
pub fn object_path(user_id: UserId, file_name: &str, now_ms: i64) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!(
        "{user_id}/{now_ms}-{}.{}",
        &nonce[..NONCE_LEN],
        file_extension(file_name)
    )
}

/// Public URL of an object in [`PHOTO_BUCKET`].
pub fn public_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{PUBLIC_OBJECT_PREFIX}/{PHOTO_BUCKET}/{path}",
        base_url.trim_end_matches('/')
    )
}

/// Recovers the object path from a public URL, needed to remove the object.
///
/// Returns `None` unless the bucket segment occurs exactly once.
pub fn object_path_from_public_url(url: &str) -> Option<&str> {
    let marker = format!("/{PHOTO_BUCKET}/");
    let mut parts = url.split(marker.as_str());
    let _head = parts.next()?;
    let path = parts.next()?;
    if parts.next().is_some() || path.is_empty() {
        return None;
    }
    Some(path)
}
