//! Newtype identifiers.
//!
//! Every Cycle entity that has an identity is represented as a distinct newtype
//! wrapping a `String`. This prevents accidentally passing, for example, a
//! [`CompanyId`] where a [`CustomerId`] is expected even though both are
//! opaque base64 node ids under the hood.
//!
//! [`Cursor`] is deliberately *not* generated by the identifier macro: it may
//! be empty (the initial cursor) and carries no structural meaning.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&$name> for serde_json::Value {
            fn from(id: &$name) -> Self {
                serde_json::Value::String(id.0.clone())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Cycle node ids
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a Cycle workspace (a `Product` node in the GraphQL schema).
    WorkspaceId
}

string_id! {
    /// The human-readable workspace slug used in Cycle URLs.
    ///
    /// Resolved to a [`WorkspaceId`] once per run.
    WorkspaceSlug
}

string_id! {
    /// Identifies a company within a workspace.
    CompanyId
}

string_id! {
    /// Identifies a customer (a person attached to a company).
    CustomerId
}

string_id! {
    /// Identifies a release.
    ReleaseId
}

string_id! {
    /// Identifies a single note within a release.
    ReleaseNoteId
}

string_id! {
    /// Identifies a document (feedback, insight, etc.).
    DocId
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Opaque pagination token returned by the remote API.
///
/// The value is passed back verbatim to fetch the next page. Nothing in the
/// workspace parses, trims, or normalises it. The initial cursor is the empty
/// string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wraps a raw token.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The cursor used for the first page.
    pub fn initial() -> Self {
        Self(String::new())
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty token.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the cursor, returning the raw token.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&Cursor> for serde_json::Value {
    fn from(cursor: &Cursor) -> Self {
        serde_json::Value::String(cursor.0.clone())
    }
}

// ---------------------------------------------------------------------------
// UUID-backed, generated locally
// ---------------------------------------------------------------------------

/// Identifies a single CLI invocation.
///
/// Generated fresh for every run and recorded on the root tracing span so all
/// requests issued by one export can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncRunId(Uuid);

impl SyncRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SyncRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_ids_reject_empty_values() {
        assert!(CompanyId::new("").is_none());
        assert_eq!(
            CompanyId::new("Q29tcGFueV8x").map(|id| id.to_string()),
            Some("Q29tcGFueV8x".to_string())
        );
    }

    #[test]
    fn cursor_allows_empty_initial_value() {
        let cursor = Cursor::initial();
        assert!(cursor.is_empty());
        assert_eq!(cursor, Cursor::default());
    }

    #[test]
    fn cursor_serialises_as_a_bare_string() {
        let cursor = Cursor::new("YXJyYXljb25uZWN0aW9uOjA=");
        let value = serde_json::to_value(&cursor).unwrap();
        assert_eq!(value, serde_json::json!("YXJyYXljb25uZWN0aW9uOjA="));
        let back: Cursor = serde_json::from_value(value).unwrap();
        assert_eq!(back, cursor);
    }

    #[test]
    fn ids_deserialise_transparently() {
        let id: WorkspaceId = serde_json::from_str("\"UHJvZHVjdF8x\"").unwrap();
        assert_eq!(id.as_str(), "UHJvZHVjdF8x");
    }
}
