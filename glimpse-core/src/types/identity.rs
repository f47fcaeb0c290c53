//! Outbound request identities.

use serde::{Deserialize, Serialize};

/// An immutable set of outbound request headers.
///
/// Each profile mimics one client (browser or mobile app) so consecutive
/// upstream calls do not all carry the same fingerprint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProfile {
    label: String,
    headers: Vec<(String, String)>,
}

impl IdentityProfile {
    /// Creates a profile from a label and its `(name, value)` header pairs.
    pub fn new<I, K, V>(label: impl Into<String>, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            label: label.into(),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Short human-readable name, used in logs only.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Header pairs in insertion order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
