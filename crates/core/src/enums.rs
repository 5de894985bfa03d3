//! String-backed domain enums.
//!
//! Every enum serializes to the lower-case wire string listed in its
//! `define_string_enum!` block. Strict parsing (`from_str`) rejects unknown
//! values with [`CoreError::Validation`]; the optional-context enums
//! additionally offer lenient parsing for scanner output normalization,
//! where an out-of-domain value must coerce rather than crash.

use crate::error::CoreError;

macro_rules! define_string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// All valid wire strings for this enum.
            pub const VALID_STRINGS: &'static [&'static str] = &[$($val),+];

            /// Return the wire string for this variant.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $val ),+
                }
            }

            /// Parse a wire string, rejecting unknown values.
            pub fn from_str(s: &str) -> Result<Self, CoreError> {
                match s {
                    $( $val => Ok(Self::$variant), )+
                    _ => Err(CoreError::Validation(format!(
                        concat!("Invalid ", stringify!($name), " '{}'. Must be one of: {}"),
                        s,
                        Self::VALID_STRINGS.join(", ")
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_str(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

define_string_enum! {
    /// Which external scanning tool a scan is configured to run.
    ScannerKind {
        Trivy = "trivy",
        OpenVas = "openvas",
        DependencyCheck = "dependency-check",
        /// User-supplied command producing canonical JSON findings.
        Custom = "custom",
    }
}

define_string_enum! {
    /// What kind of target a scan points at.
    TargetType {
        Container = "container",
        Host = "host",
        Application = "application",
        Repository = "repository",
    }
}

define_string_enum! {
    /// How thorough a scan should be. Adapters translate this into
    /// tool-specific flags.
    ScanDepth {
        Quick = "quick",
        Normal = "normal",
        Deep = "deep",
    }
}

define_string_enum! {
    /// Scan lifecycle status. Transition rules live in [`crate::lifecycle`].
    ScanStatus {
        Pending = "pending",
        Running = "running",
        Completed = "completed",
        Failed = "failed",
        Stopped = "stopped",
    }
}

define_string_enum! {
    /// Trained model lifecycle status.
    ModelStatus {
        Created = "created",
        Training = "training",
        Trained = "trained",
        Error = "error",
    }
}

define_string_enum! {
    /// Normalized finding severity.
    Severity {
        Critical = "critical",
        High = "high",
        Medium = "medium",
        Low = "low",
    }
}

define_string_enum! {
    /// How mature known exploits for a vulnerability are. Absence of any
    /// exploit intelligence is modelled as `Option::None`, not a variant.
    ExploitMaturity {
        Unproven = "unproven",
        Poc = "poc",
        Functional = "functional",
        High = "high",
    }
}

define_string_enum! {
    /// Business impact of the affected system.
    BusinessImpact {
        Critical = "critical",
        High = "high",
        Medium = "medium",
        Low = "low",
    }
}

define_string_enum! {
    /// Classification of the data the affected system handles.
    DataClassification {
        Restricted = "restricted",
        Confidential = "confidential",
        Internal = "internal",
        Public = "public",
    }
}

define_string_enum! {
    /// Network exposure of the affected system.
    SystemExposure {
        Internet = "internet",
        Intranet = "intranet",
        Internal = "internal",
        Isolated = "isolated",
    }
}

define_string_enum! {
    /// Remediation workflow status of a vulnerability.
    RemediationStatus {
        Open = "open",
        InProgress = "in_progress",
        Resolved = "resolved",
        Closed = "closed",
        /// Risk formally accepted; no remediation planned.
        Accepted = "accepted",
    }
}

// ---------------------------------------------------------------------------
// Lenient parsing for normalization
// ---------------------------------------------------------------------------

impl Severity {
    /// Parse scanner output leniently: case-insensitive, and any value
    /// outside the enumerated domain coerces to [`Severity::Low`].
    pub fn parse_or_low(s: &str) -> Self {
        Self::from_str(&s.to_lowercase()).unwrap_or(Self::Low)
    }
}

/// Parse an optional-context enum leniently.
///
/// Empty strings and out-of-domain values both map to `None` — scanner
/// output must never be able to crash normalization.
pub fn parse_optional<T>(s: &str, parse: impl Fn(&str) -> Result<T, CoreError>) -> Option<T> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }
    parse(&s).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
