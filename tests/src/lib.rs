//! # PRN Test Suite
//!
//! Unified cross-crate test crate.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Cross-crate scenarios
//!     ├── codec_vectors.rs     # Published hash/KDF vectors end to end
//!     ├── keytriplet_flows.rs  # Identity generation and evolution
//!     ├── session_roundtrip.rs # Two-party PR-UTC exchange
//!     └── vm_programs.rs       # Whole-program VM scenarios
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p prn-tests
//!
//! # By category
//! cargo test -p prn-tests integration::session_roundtrip
//!
//! # Benchmarks
//! cargo bench -p prn-tests
//! ```

#[cfg(test)]
mod integration;
