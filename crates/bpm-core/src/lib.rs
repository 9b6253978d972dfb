//! Core data model for `bpm`.
//!
//! This crate provides the foundational types shared across every stage of
//! the policy-bundle pipeline: version parsing and ordering, the bundle
//! data model with its checksums, the two external-collaborator traits
//! (`ModuleParser`, `RemoteFetcher`), error types, and process configuration.
//!
//! Everything here is a pure data transform or parse; no crate below this
//! one performs filesystem or network I/O.

pub mod config;
pub mod constant;
pub mod error;
pub mod model;
pub mod traits;
pub mod version;

pub use config::Config;
pub use error::{BpmError, Result};
pub use model::{
    Bundle, DeclarationFile, Direction, ImportRef, LockFile, LockRequirementDecl, ModuleDecl,
    PackageDecl, ParsedModule, RawModule, RequirementDecl,
};
pub use traits::{ModuleParser, RemoteCommit, RemoteFetcher};
pub use version::Version;
