// ============================================================================
// Marketplace Types - Core Data Types
// ============================================================================
//
// Plain data structures shared by the routing core, the storage adapters and
// the HTTP layer. This crate has NO dependencies on business logic, databases
// or external services.
//
// Contents:
// - Members, roles and lifecycle status
// - Listings and their ownership pointer
// - Conversations and the conversation-ownership log
// - Company message handler designations
// - Member audit entries
//
// Dependencies:
// - serde (serialization only)
// - uuid (identifiers)
// - chrono (timestamps)
//
// ============================================================================

/// Error returned when a stored enum value is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum whose
/// database representation is a snake_case string.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::ParseEnumError::new($kind, other)),
                }
            }
        }
    };
}

pub(crate) use string_enum;

pub mod audit;
pub mod conversation;
pub mod handler;
pub mod listing;
pub mod member;

// Re-exports for convenience
pub use audit::*;
pub use conversation::*;
pub use handler::*;
pub use listing::*;
pub use member::*;
