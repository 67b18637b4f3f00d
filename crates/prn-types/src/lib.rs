//! # PRN Shared Types
//!
//! Cross-cutting types for the Prime Resonance Network: the categorised
//! error taxonomy, an in-memory error telemetry collector, and the
//! driver-side recovery primitives (retry policy, circuit breaker).
//!
//! ## Error model
//!
//! Every error carries a numeric code in a per-category range, a human
//! message, a capture timestamp, and a string-to-string context map.
//! Lower layers signal "no solution" by sentinel (e.g. `mod_inverse`
//! returning 0); the layers above wrap sentinels into [`PrnError`]s.
//!
//! | Category | Code range |
//! |----------|------------|
//! | Network | 1001-1099 |
//! | Protocol | 2001-2099 |
//! | Crypto | 3001-3099 |
//! | Math | 4001-4099 |
//! | Config | 5001-5099 |
//! | State | 6001-6099 |
//! | Validation | 7001-7099 |
//! | Resource | 8001-8099 |

pub mod error;
pub mod recovery;
pub mod telemetry;

pub use error::{codes, ErrorCategory, PrnError, Severity};
pub use recovery::{BreakerState, CircuitBreaker, RetryPolicy};
pub use telemetry::{ErrorStats, ErrorTelemetry};
