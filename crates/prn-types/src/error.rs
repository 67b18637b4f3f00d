//! # Error Taxonomy
//!
//! Categorised, coded errors shared by every layer of the network.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

// =============================================================================
// WELL-KNOWN ERROR CODES
// =============================================================================

/// Named error codes. Each lives inside its category's range.
pub mod codes {
    /// Network: requested node is not known to the registry.
    pub const NODE_NOT_FOUND: u16 = 1001;
    /// Network: entanglement between two nodes could not be formed.
    pub const ENTANGLEMENT_FAILED: u16 = 1002;
    /// Network: link coherence below the usable floor.
    pub const LOW_COHERENCE: u16 = 1003;

    /// Protocol: operation exceeded its deadline.
    pub const TIMEOUT: u16 = 2001;
    /// Protocol: message failed structural validation.
    pub const INVALID_MESSAGE: u16 = 2002;
    /// Protocol: signature check failed.
    pub const SIGNATURE_INVALID: u16 = 2003;
    /// Protocol: no route to the requested endpoint.
    pub const ROUTE_NOT_FOUND: u16 = 2004;

    /// Crypto: key material has the wrong size.
    pub const INVALID_KEY_SIZE: u16 = 3001;
    /// Crypto: key derivation failed.
    pub const KEY_DERIVATION_FAILED: u16 = 3002;
    /// Crypto: digest request was malformed (empty output, zero rounds).
    pub const INVALID_DIGEST_REQUEST: u16 = 3003;

    /// Math: value admitted as a prime is not prime.
    pub const INVALID_PRIME: u16 = 4001;
    /// Math: no modular inverse exists for the given pair.
    pub const NO_MODULAR_INVERSE: u16 = 4002;
    /// Math: arithmetic overflow.
    pub const OVERFLOW: u16 = 4003;

    /// Config: configuration value out of range.
    pub const INVALID_CONFIG: u16 = 5001;

    /// State: operation applied in the wrong lifecycle state.
    pub const INVALID_STATE: u16 = 6001;
    /// State: referenced session does not exist.
    pub const SESSION_NOT_FOUND: u16 = 6002;

    /// Validation: input rejected.
    pub const VALIDATION_FAILED: u16 = 7001;
    /// Validation: referenced user is not registered.
    pub const UNKNOWN_USER: u16 = 7002;

    /// Resource: a bounded stack or buffer is exhausted.
    pub const RESOURCE_EXHAUSTED: u16 = 8001;
}

// =============================================================================
// CATEGORY & SEVERITY
// =============================================================================

/// Error category. Determines the code range and default severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Peer/node level failures (1000s).
    Network,
    /// Message exchange failures (2000s).
    Protocol,
    /// Key and digest failures (3000s).
    Crypto,
    /// Numeric failures (4000s).
    Math,
    /// Configuration failures (5000s).
    Config,
    /// Lifecycle failures (6000s).
    State,
    /// Input validation failures (7000s).
    Validation,
    /// Exhausted stacks, buffers, budgets (8000s).
    Resource,
}

impl ErrorCategory {
    /// First code of this category's range.
    #[must_use]
    pub const fn code_base(self) -> u16 {
        match self {
            Self::Network => 1000,
            Self::Protocol => 2000,
            Self::Crypto => 3000,
            Self::Math => 4000,
            Self::Config => 5000,
            Self::State => 6000,
            Self::Validation => 7000,
            Self::Resource => 8000,
        }
    }

    /// Category owning a given code, if the code falls in a known range.
    #[must_use]
    pub fn of_code(code: u16) -> Option<Self> {
        match code / 1000 {
            1 => Some(Self::Network),
            2 => Some(Self::Protocol),
            3 => Some(Self::Crypto),
            4 => Some(Self::Math),
            5 => Some(Self::Config),
            6 => Some(Self::State),
            7 => Some(Self::Validation),
            8 => Some(Self::Resource),
            _ => None,
        }
    }

    /// Default severity bucket for telemetry aggregation.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Network | Self::Protocol | Self::Validation => Severity::Warning,
            Self::Math | Self::Config | Self::State => Severity::Error,
            Self::Crypto | Self::Resource => Severity::Critical,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Protocol => "protocol",
            Self::Crypto => "crypto",
            Self::Math => "math",
            Self::Config => "config",
            Self::State => "state",
            Self::Validation => "validation",
            Self::Resource => "resource",
        };
        f.write_str(name)
    }
}

/// Severity bucket used by the telemetry collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Expected, recoverable.
    Warning,
    /// Unexpected, operation failed.
    Error,
    /// Integrity or resource failure.
    Critical,
}

// =============================================================================
// PRN ERROR
// =============================================================================

/// A categorised error with code, message, timestamp and context map.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("[{category}:{code}] {message}")]
pub struct PrnError {
    /// Numeric code inside the category's range.
    pub code: u16,
    /// Owning category.
    pub category: ErrorCategory,
    /// Human-readable message.
    pub message: String,
    /// Capture time, milliseconds since the Unix epoch. Cosmetic.
    pub timestamp_ms: u64,
    /// Free-form key/value context.
    pub context: BTreeMap<String, String>,
}

impl PrnError {
    /// Creates an error with an explicit category and code.
    ///
    /// Codes outside the category's range are accepted but logged, so a
    /// miscoded call site shows up in traces rather than panicking.
    #[must_use]
    pub fn new(category: ErrorCategory, code: u16, message: impl Into<String>) -> Self {
        if ErrorCategory::of_code(code) != Some(category) {
            tracing::warn!(code, %category, "error code outside category range");
        }
        Self {
            code,
            category,
            message: message.into(),
            timestamp_ms: now_ms(),
            context: BTreeMap::new(),
        }
    }

    /// Creates an error from a bare code, inferring the category.
    /// Falls back to `Validation` for codes outside every known range.
    #[must_use]
    pub fn from_code(code: u16, message: impl Into<String>) -> Self {
        let category = ErrorCategory::of_code(code).unwrap_or(ErrorCategory::Validation);
        Self::new(category, code, message)
    }

    /// Attaches a context entry, builder style.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Severity bucket of this error.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.category.severity()
    }

    /// Shorthand constructors for the common categories.
    #[must_use]
    pub fn network(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Network, code, message)
    }

    #[must_use]
    pub fn protocol(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Protocol, code, message)
    }

    #[must_use]
    pub fn crypto(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Crypto, code, message)
    }

    #[must_use]
    pub fn math(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Math, code, message)
    }

    #[must_use]
    pub fn state(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::State, code, message)
    }

    #[must_use]
    pub fn validation(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Validation, code, message)
    }

    #[must_use]
    pub fn resource(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Resource, code, message)
    }
}

/// Milliseconds since the Unix epoch. Saturates at zero on clock skew.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =============================================================================
// TESTS
// =============================================================================
