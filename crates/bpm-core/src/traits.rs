//! External-collaborator interfaces: the policy-language parser and the
//! Git transport. Concrete implementations live in `bpm-assemble` and
//! `bpm-fetch` respectively; this crate only names the contract so that
//! the core data model can refer to them without depending on either.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::ParsedModule;
use crate::version::Version;

/// Turns raw policy-module bytes into the flattened shape the rest of the
/// pipeline needs (package path, import list, canonical text for hashing).
pub trait ModuleParser: Send + Sync {
    fn parse(&self, path: &str, raw: &[u8]) -> Result<ParsedModule>;
}

/// A single commit resolved from a remote: its rendered version and the
/// full file set found in that commit's tree.
pub struct RemoteCommit {
    pub version: Version,
    pub files: HashMap<String, Vec<u8>>,
}

/// The Git transport boundary. `source` is the opaque repository identifier
/// (typically a Git URL). An empty `version_spec` means "resolve the
/// remote's default ref".
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(&self, source: &str, version_spec: &str) -> Result<RemoteCommit>;
}
