//! Profile types.
//!
//! - [`UserPayload`]: the upstream's raw `data.user` object
//! - [`ProfileRecord`]: the minimal, stable shape served to clients

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ═══════════════════════════════════════════════════════════════════════════════
// RAW PAYLOAD
// ═══════════════════════════════════════════════════════════════════════════════

/// The upstream user object, as found under `data.user`.
///
/// Only [`UserPayload::from_document`] builds one, and it refuses documents
/// without a usable user object. Holding a `UserPayload` therefore means the
/// mandatory object is present.
#[derive(Clone, Debug, PartialEq)]
pub struct UserPayload {
    user: Value,
}

impl UserPayload {
    /// Extracts the user object from a full upstream document.
    ///
    /// Returns `None` when `data.user` is missing, null, not an object, or
    /// an empty object.
    pub fn from_document(mut document: Value) -> Option<Self> {
        let user = document.get_mut("data")?.get_mut("user")?.take();
        match user.as_object() {
            Some(fields) if !fields.is_empty() => Some(Self { user }),
            _ => None,
        }
    }

    /// Looks up a value by JSON pointer relative to the user object
    /// (e.g. `/edge_follow/count`).
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        self.user.pointer(path)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NORMALIZED RECORD
// ═══════════════════════════════════════════════════════════════════════════════

/// A normalized profile.
///
/// Every field is optional because the upstream may omit any of them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Account handle
    #[serde(rename = "username")]
    pub handle: Option<String>,
    /// Display name
    #[serde(rename = "real_name")]
    pub display_name: Option<String>,
    /// High resolution avatar URL
    #[serde(rename = "profile_pic")]
    pub avatar_url: Option<String>,
    /// Number of followers
    #[serde(rename = "followers")]
    pub follower_count: Option<u64>,
    /// Number of accounts followed
    #[serde(rename = "following")]
    pub following_count: Option<u64>,
    /// Number of published posts
    pub post_count: Option<u64>,
    /// Biography text
    #[serde(rename = "bio")]
    pub biography: Option<String>,
}
