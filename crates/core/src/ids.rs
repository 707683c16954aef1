//! Identifiers used throughout the action executor.
//!
//! `ExecutionId` is a random UUID minted per invocation, modeled with
//! [`domain-key`](https://crates.io/crates/domain-key)'s `Uuid<D>` wrapper
//! for the same reasons `nebula-core` uses it: a `Copy`, 16-byte, strongly
//! typed identifier that cannot be confused with any other domain's UUID.
//!
//! Action identifiers, by contrast, are caller-assigned strings (`"a1"`,
//! `"fetch-user"`, ...) that appear in reference expressions
//! (`${a1.output.id}`) and in workflow definitions authored outside this
//! crate. A UUID wrapper would not fit that shape, so `ActionDefinitionId`
//! and `ActionId` are thin `String` newtypes instead.

use std::fmt;

use domain_key::define_uuid;
use serde::{Deserialize, Serialize};

define_uuid!(pub ExecutionIdDomain => ExecutionId);

/// Identifier of a registered, immutable [`ActionDefinition`](crate::ActionDefinition).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionDefinitionId(String);

/// Identifier of a planned action within one DAG, used in reference
/// expressions and as the dependency-set element type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(String);

macro_rules! string_id {
    ($ty:ident) => {
        impl $ty {
            /// Wrap a raw identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(ActionDefinitionId);
string_id!(ActionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_id_v4_is_not_nil() {
        let id = ExecutionId::v4();
        assert!(!id.is_nil());
    }

    #[test]
    fn execution_id_serde_roundtrip() {
        let id = ExecutionId::v4();
        let json = serde_json::to_string(&id).unwrap();
        let back: ExecutionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn action_id_display_and_eq() {
        let a = ActionId::new("a1");
        let b: ActionId = "a1".into();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "a1");
        assert_eq!(a.as_str(), "a1");
    }

    #[test]
    fn action_ids_are_ordered_for_canonical_sorting() {
        let mut ids = vec![ActionId::new("b"), ActionId::new("a"), ActionId::new("c")];
        ids.sort();
        assert_eq!(
            ids,
            vec![ActionId::new("a"), ActionId::new("b"), ActionId::new("c")]
        );
    }
}
