//! The closed error taxonomy for generation

use thiserror::Error;

use crate::geometry::Point;

/// A structural fault found by the invariant validator.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub location: Option<Point>,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, location: Option<Point>, message: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Border,
    Connectivity,
    MissingEntrance,
    MissingExit,
    RoomCenter,
    Crossing,
    Spawn,
    Checksum,
}

/// Errors produced by the generator. Each variant has a stable code
/// (see [`Error::code`]); the payload carries context, never raw
/// internal state.
#[derive(Debug, Error)]
pub enum Error {
    /// Config failed schema validation.
    #[error("invalid config: {}", .errors.join("; "))]
    ConfigInvalid { errors: Vec<String> },

    /// Requested grid exceeds the total cell limit.
    #[error("grid {width}x{height} exceeds the maximum cell count")]
    ConfigDimensionTooLarge { width: usize, height: usize },

    /// A pass or the invariant validator reported a structural fault.
    #[error("generation failed in `{pass}`: {message}")]
    GenerationFailed {
        pass: String,
        message: String,
        violations: Vec<Violation>,
    },

    /// Wall-clock budget exceeded, or a non-positive budget supplied.
    #[error("generation exceeded its {budget_ms} ms budget")]
    GenerationTimeout { budget_ms: i64 },

    /// Abort signaled by the caller.
    #[error("generation cancelled: {reason}")]
    Cancelled { reason: String },

    /// Share code malformed or of an unsupported version.
    #[error("share code `{code}` rejected: {reason}")]
    SeedDecodeError { code: String, reason: String },
}

impl Error {
    /// Stable machine-readable code for each variant.
    pub fn code(&self) -> &'static str {
        match self {
            Error::ConfigInvalid { .. } => "ConfigInvalid",
            Error::ConfigDimensionTooLarge { .. } => "ConfigDimensionTooLarge",
            Error::GenerationFailed { .. } => "GenerationFailed",
            Error::GenerationTimeout { .. } => "GenerationTimeout",
            Error::Cancelled { .. } => "Cancelled",
            Error::SeedDecodeError { .. } => "SeedDecodeError",
        }
    }

    pub(crate) fn failed(pass: &str, message: impl Into<String>) -> Self {
        Error::GenerationFailed {
            pass: pass.to_string(),
            message: message.into(),
            violations: Vec::new(),
        }
    }
}

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            Error::ConfigInvalid { errors: vec![] }.code(),
            "ConfigInvalid"
        );
        assert_eq!(
            Error::Cancelled {
                reason: "abort".into()
            }
            .code(),
            "Cancelled"
        );
        assert_eq!(
            Error::GenerationTimeout { budget_ms: 0 }.code(),
            "GenerationTimeout"
        );
    }

    #[test]
    fn display_carries_context() {
        let err = Error::failed("carve-corridors", "no route");
        assert!(err.to_string().contains("carve-corridors"));
        assert!(err.to_string().contains("no route"));
    }
}
