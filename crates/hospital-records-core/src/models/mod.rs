//! Domain models for the hospital records system.

mod admission;
mod appointment;
mod billing;
mod clinical;
mod patient;
mod pharmacy;
mod specialty;
mod staff;

pub use admission::*;
pub use appointment::*;
pub use billing::*;
pub use clinical::*;
pub use patient::*;
pub use pharmacy::*;
pub use specialty::*;
pub use staff::*;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Error returned when a string is not a member of a closed enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{value}' is not a valid {kind} (expected one of: {expected})")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Declares a closed enumeration that round-trips through its database spelling.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// All members in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Database/wire spelling.
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
            type Err = $crate::models::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::models::ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                        expected: $name::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    }),
                }
            }
        }
    };
}

pub(crate) use text_enum;

/// Format a timestamp the way every table stores it.
///
/// Fixed microsecond precision keeps lexical and chronological order identical.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time in storage format.
pub fn now_timestamp() -> String {
    timestamp(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_fixed_width() {
        let a = timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let b = timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 1).unwrap());
        assert_eq!(a, "2024-03-01T09:00:00.000000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }

    #[test]
    fn test_parse_enum_error_lists_members() {
        let err = "unknown".parse::<Sex>().unwrap_err();
        assert_eq!(err.kind, "sex");
        assert!(err.to_string().contains("Male"));
    }
}
