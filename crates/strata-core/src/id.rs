//! Strongly-typed identifiers for Strata entities.
//!
//! All identifiers are:
//! - **Strongly typed**: mixing up entity kinds is a compile error
//! - **Prefix-tagged**: the rendered form is `{kind}-{token}`, so an ID
//!   is self-describing in logs and in the backing store
//! - **Globally unique**: the token is a random 128-bit UUID, so no
//!   coordination is required for generation
//!
//! # Example
//!
//! ```rust
//! use strata_core::id::{ComponentId, WorkspaceId};
//!
//! let ws = WorkspaceId::generate();
//! assert!(ws.to_string().starts_with("ws-"));
//!
//! let comp = ComponentId::generate();
//! // IDs are different types - this won't compile:
//! // let wrong: WorkspaceId = comp;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

fn validate_token(kind: &'static str, prefix: &'static str, s: &str) -> Result<String> {
    let token = s.strip_prefix(prefix).and_then(|rest| rest.strip_prefix('-'));
    match token {
        Some(t)
            if !t.is_empty()
                && t.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-') =>
        {
            Ok(s.to_string())
        }
        _ => Err(Error::InvalidId {
            message: format!("invalid {kind} ID '{s}': expected '{prefix}-<token>'"),
        }),
    }
}

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident, $kind:literal, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// The kind prefix carried by every ID of this type.
            pub const PREFIX: &'static str = $prefix;

            /// Generates a new unique ID with a random 128-bit token.
            #[must_use]
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::new_v4().simple()))
            }

            /// Returns the ID as a string slice, including the prefix.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                validate_token($kind, $prefix, s).map(Self)
            }
        }
    };
}

entity_id!(
    /// Identifier for a [`User`](crate::entity::User).
    UserId,
    "user",
    "user"
);

entity_id!(
    /// Identifier for an [`Account`](crate::entity::Account) linking a
    /// user to a workspace.
    AccountId,
    "account",
    "acc"
);

entity_id!(
    /// Identifier for a [`Workspace`](crate::entity::Workspace), the
    /// top-level tenant container.
    WorkspaceId,
    "workspace",
    "ws"
);

entity_id!(
    /// Identifier for a [`Path`](crate::entity::Path) grouping inside a
    /// workspace.
    PathId,
    "path",
    "path"
);

entity_id!(
    /// Identifier for a [`Component`](crate::entity::Component) inside a
    /// path.
    ComponentId,
    "component",
    "comp"
);

entity_id!(
    /// Identifier for a [`DataEntry`](crate::entity::DataEntry) owned by
    /// a component.
    DataId,
    "data",
    "data"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_kind_prefix() {
        assert!(UserId::generate().as_str().starts_with("user-"));
        assert!(AccountId::generate().as_str().starts_with("acc-"));
        assert!(WorkspaceId::generate().as_str().starts_with("ws-"));
        assert!(PathId::generate().as_str().starts_with("path-"));
        assert!(ComponentId::generate().as_str().starts_with("comp-"));
        assert!(DataId::generate().as_str().starts_with("data-"));
    }

    #[test]
    fn id_roundtrip() {
        let id = WorkspaceId::generate();
        let parsed: WorkspaceId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(DataId::generate(), DataId::generate());
    }

    #[test]
    fn wrong_prefix_is_rejected() {
        let result: Result<WorkspaceId> = "comp-abc123".parse();
        assert!(result.is_err());
    }

    #[test]
    fn empty_token_is_rejected() {
        let result: Result<UserId> = "user-".parse();
        assert!(result.is_err());
    }

    #[test]
    fn legacy_timestamp_tokens_parse() {
        // Rows created by earlier tooling used timestamp tokens.
        let parsed: WorkspaceId = "ws-20241212083321".parse().unwrap();
        assert_eq!(parsed.as_str(), "ws-20241212083321");
    }
}
