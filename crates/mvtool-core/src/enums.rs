//! Enum types for compliance, completion and verification state.
//!
//! Each enum has:
//! - Custom Serialize (as its wire string)
//! - Custom Deserialize (known variants + catch-all `Custom(String)`)
//! - `as_str()`, `is_builtin()`, `Display` impl
//!
//! Unknown values survive deserialization so that validation can reject them
//! with a message naming the field instead of a generic parse error.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Common surface of the string enums, used by validation.
pub trait KnownValue {
    /// Returns the wire string.
    fn as_str(&self) -> &str;

    /// Returns `true` if this is one of the declared variants.
    fn is_builtin(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Known wire strings plus a `Custom(String)` variant for anything else.
// ---------------------------------------------------------------------------
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident,
        variants: [
            $( ($variant:ident, $str:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            Custom(String),
        }

        impl $name {
            /// All declared wire strings, in declaration order.
            pub const VALUES: &'static [&'static str] = &[$( $str, )+];

            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $str, )+
                    Self::Custom(s) => s.as_str(),
                }
            }

            /// `false` for values outside [`Self::VALUES`].
            pub fn is_builtin(&self) -> bool {
                !matches!(self, Self::Custom(_))
            }
        }

        impl KnownValue for $name {
            fn as_str(&self) -> &str {
                $name::as_str(self)
            }

            fn is_builtin(&self) -> bool {
                $name::is_builtin(self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $str => Self::$variant, )+
                    other => Self::Custom(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $( $str => Self::$variant, )+
                    _ => Self::Custom(s),
                }
            }
        }
    };
}

// ===========================================================================
// ComplianceStatus
// ===========================================================================

define_enum! {
    /// Whether a requirement or measure is met.
    ComplianceStatus,
    variants: [
        (Compliant, "C"),
        (PartiallyCompliant, "PC"),
        (NonCompliant, "NC"),
        (NotApplicable, "N/A"),
    ]
}

// ===========================================================================
// CompletionStatus
// ===========================================================================

define_enum! {
    /// Implementation progress of a measure.
    CompletionStatus,
    variants: [
        (Open, "open"),
        (InProgress, "in progress"),
        (Completed, "completed"),
    ]
}

// ===========================================================================
// VerificationMethod
// ===========================================================================

define_enum! {
    /// How a measure is verified: inspection, test or review.
    VerificationMethod,
    variants: [
        (Inspection, "I"),
        (Test, "T"),
        (Review, "R"),
    ]
}

// ===========================================================================
// VerificationStatus
// ===========================================================================

define_enum! {
    /// Outcome of verifying a measure.
    VerificationStatus,
    variants: [
        (Verified, "verified"),
        (PartiallyVerified, "partially verified"),
        (NotVerified, "not verified"),
    ]
}

// ===========================================================================
// GsAbsicherung
// ===========================================================================

define_enum! {
    /// IT-Grundschutz protection level of a catalog requirement
    /// (Basis, Standard, Hoch).
    GsAbsicherung,
    variants: [
        (Basis, "B"),
        (Standard, "S"),
        (Hoch, "H"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_values_parse_to_variants() {
        assert_eq!(ComplianceStatus::from("N/A"), ComplianceStatus::NotApplicable);
        assert_eq!(CompletionStatus::from("in progress"), CompletionStatus::InProgress);
        assert_eq!(VerificationMethod::from("R"), VerificationMethod::Review);
        assert_eq!(GsAbsicherung::from("H"), GsAbsicherung::Hoch);
    }

    #[test]
    fn unknown_values_are_kept_as_custom() {
        let status = ComplianceStatus::from("maybe");
        assert_eq!(status, ComplianceStatus::Custom("maybe".into()));
        assert!(!status.is_builtin());
        assert_eq!(status.as_str(), "maybe");
    }

    #[test]
    fn serde_uses_wire_strings() {
        let json = serde_json::to_string(&VerificationStatus::PartiallyVerified).unwrap();
        assert_eq!(json, "\"partially verified\"");

        let parsed: VerificationStatus = serde_json::from_str("\"not verified\"").unwrap();
        assert_eq!(parsed, VerificationStatus::NotVerified);
    }

    #[test]
    fn values_lists_declared_strings() {
        assert_eq!(ComplianceStatus::VALUES, &["C", "PC", "NC", "N/A"]);
    }
}
