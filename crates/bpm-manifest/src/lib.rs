//! Manifester, Lock Synchronizer, and Linker/Import Validator: the
//! orchestrator that mutates a working bundle's declaration file, rebuilds
//! its lock file against the fetched transitive closure, and persists both
//! manifests through the Encoder.

mod linker;
mod manifester;

pub use linker::Linker;
pub use manifester::Manifester;
