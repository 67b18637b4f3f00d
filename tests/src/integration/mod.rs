//! Cross-crate integration scenarios.

mod codec_vectors;
mod keytriplet_flows;
mod session_roundtrip;
mod vm_programs;
