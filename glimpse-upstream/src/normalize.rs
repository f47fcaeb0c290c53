//! Upstream user object → [`ProfileRecord`].

use serde_json::Value;

use glimpse_core::types::{ProfileRecord, UserPayload};

/// Extracts the stable record shape from a user object.
///
/// Pure: the same payload always yields the same record. Missing or
/// mistyped fields become `None`; this never fails.
pub fn normalize(payload: &UserPayload) -> ProfileRecord {
    let text = |path: &str| payload.pointer(path).and_then(Value::as_str).map(str::to_owned);
    let count = |path: &str| payload.pointer(path).and_then(Value::as_u64);

    ProfileRecord {
        handle: text("/username"),
        display_name: text("/full_name"),
        avatar_url: text("/profile_pic_url_hd"),
        follower_count: count("/edge_followed_by/count"),
        following_count: count("/edge_follow/count"),
        post_count: count("/edge_owner_to_timeline_media/count"),
        biography: text("/biography"),
    }
}
