//! Structured pagination tokens and result pages.
//!
//! Continuation tokens are opaque to callers but explicitly serialized:
//! a JSON-encoded last-evaluated key wrapped in URL-safe base64. They
//! are decoded with a plain deserializer and are never evaluated as
//! code or trusted beyond "resume after this key".

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An opaque continuation token for a paged query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

/// The decoded contents of a [`PageToken`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenKey {
    /// Primary key of the last item returned by the previous page.
    last_id: String,
}

impl PageToken {
    /// Encodes a token that resumes after the item with `last_id`.
    #[must_use]
    pub fn after(last_id: impl Into<String>) -> Self {
        let key = TokenKey {
            last_id: last_id.into(),
        };
        // Serializing a plain string key to JSON cannot fail.
        let json = serde_json::to_vec(&key).unwrap_or_default();
        Self(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decodes the token, returning the ID to resume after.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPageToken`] when the token is not valid
    /// base64 or does not decode to a last-key structure.
    pub fn last_id(&self) -> Result<String> {
        let raw = URL_SAFE_NO_PAD
            .decode(&self.0)
            .map_err(|e| Error::InvalidPageToken {
                message: format!("not base64: {e}"),
            })?;
        let key: TokenKey =
            serde_json::from_slice(&raw).map_err(|e| Error::InvalidPageToken {
                message: format!("malformed key: {e}"),
            })?;
        Ok(key.last_id)
    }

    /// Returns the encoded token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PageToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One page of query results plus an optional continuation token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in this page, in stable key order.
    pub items: Vec<T>,
    /// Token for the next page, absent when the query is exhausted.
    pub next_token: Option<PageToken>,
}

impl<T> Page<T> {
    /// A page with no items and no continuation.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip() {
        let token = PageToken::after("data-abc123");
        assert_eq!(token.last_id().unwrap(), "data-abc123");
    }

    #[test]
    fn garbage_token_is_rejected() {
        let token = PageToken::from("!!not base64!!".to_string());
        assert!(token.last_id().is_err());
    }

    #[test]
    fn code_like_token_is_rejected_not_evaluated() {
        // A token containing an expression must fail decoding cleanly.
        let hostile = PageToken::from(
            URL_SAFE_NO_PAD.encode(b"__import__('os').system('true')"),
        );
        assert!(hostile.last_id().is_err());
    }
}
