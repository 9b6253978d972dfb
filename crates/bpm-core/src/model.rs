//! The bundle data model: declaration file, lock file, and the in-memory
//! `Bundle` that ties a file set together with its checksums.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::version::Version;

/// One import reference found inside a policy module, with its source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    pub path: String,
    pub row: u32,
}

/// Flattened output of the (external) policy-language parser: just enough
/// of the AST for the Bundle Assembler and Linker to work with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedModule {
    pub package_path: String,
    pub imports: Vec<ImportRef>,
    /// Normalized text of the AST, used for the per-module checksum so that
    /// formatting-only edits do not change module identity.
    pub canonical_text: String,
}

/// A single policy-language source file plus its parsed shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModule {
    pub path: String,
    pub raw_bytes: Vec<u8>,
    pub parsed: ParsedModule,
}

impl RawModule {
    pub fn package_path(&self) -> &str {
        &self.parsed.package_path
    }

    pub fn imports(&self) -> &[ImportRef] {
        &self.parsed.imports
    }

    /// `MD5(canonical_text(parsed_ast))`, hex-encoded.
    pub fn checksum(&self) -> String {
        let digest = md5::Md5::digest(self.parsed.canonical_text.as_bytes());
        hex::encode(digest)
    }
}

/// `{ name, repository }` identifying the bundle that owns a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDecl {
    pub name: String,
    pub repository: String,
}

/// One entry in the declaration file's `require.list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementDecl {
    pub repository: String,
    pub name: String,
    pub version: String,
}

/// The human-edited `bundle.hcl` contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationFile {
    pub package: PackageDecl,
    #[serde(default)]
    pub requirements: Vec<RequirementDecl>,
}

impl DeclarationFile {
    pub fn new(name: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            package: PackageDecl {
                name: name.into(),
                repository: repository.into(),
            },
            requirements: Vec::new(),
        }
    }

    /// Finds the index and entry of a requirement matching `source`, if any.
    pub fn find_requirement(&self, source: &str) -> Option<(usize, &RequirementDecl)> {
        self.requirements
            .iter()
            .enumerate()
            .find(|(_, r)| r.repository == source)
    }

    pub fn has_requirement(&self, repository: &str, version: &str) -> bool {
        self.requirements
            .iter()
            .any(|r| r.repository == repository && r.version == version)
    }

    /// SHA-256 over the declaration's own field values, independent of the
    /// aggregate bundle checksum. This is `h1` on a lock requirement.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.package.name.as_bytes());
        hasher.update(self.package.repository.as_bytes());
        for r in &self.requirements {
            hasher.update(r.repository.as_bytes());
            hasher.update(r.name.as_bytes());
            hasher.update(r.version.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// `direct` if a requirement appears literally in the declaration file,
/// `indirect` if it was only reached transitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Direct,
    Indirect,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Direct => write!(f, "direct"),
            Direction::Indirect => write!(f, "indirect"),
        }
    }
}

/// One entry in the lock file's `require.list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRequirementDecl {
    pub repository: String,
    pub direction: Direction,
    pub name: String,
    pub version: String,
    pub h1: String,
    pub h2: String,
}

/// One entry in the lock file's `modules.list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub package: String,
    pub source: String,
    pub sum: String,
    #[serde(default)]
    pub requires: Vec<String>,
}

/// The auto-generated `bundle.lock` contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    pub schema_version: u32,
    pub sum: String,
    #[serde(default)]
    pub requirements: Vec<LockRequirementDecl>,
    #[serde(default)]
    pub modules: Vec<ModuleDecl>,
}

impl LockFile {
    pub fn empty() -> Self {
        Self {
            schema_version: crate::constant::LOCK_SCHEMA_VERSION,
            sum: String::new(),
            requirements: Vec::new(),
            modules: Vec::new(),
        }
    }

    pub fn has_requirement(&self, repository: &str, version: &str) -> bool {
        self.requirements
            .iter()
            .any(|r| r.repository == repository && r.version == version)
    }

    pub fn has_module(&self, package: &str) -> bool {
        self.modules.iter().any(|m| m.package == package)
    }
}

/// A materialized bundle: a version, its two manifests, its ignore set, and
/// the classified file contents.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub version: Version,
    pub declaration_file: DeclarationFile,
    pub lock_file: LockFile,
    pub ignore_file: Vec<String>,
    pub policy_modules: BTreeMap<String, RawModule>,
    pub companion_files: BTreeMap<String, Vec<u8>>,
}

impl Bundle {
    pub fn name(&self) -> &str {
        &self.declaration_file.package.name
    }

    pub fn repository(&self) -> &str {
        &self.declaration_file.package.repository
    }

    /// SHA-256 over sorted module checksums then sorted companion bytes.
    /// `policy_modules`/`companion_files` are `BTreeMap`s, so iteration is
    /// already path-ordered; this keeps the hash independent of how the
    /// file set was originally discovered.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        for module in self.policy_modules.values() {
            hasher.update(module.checksum().as_bytes());
        }
        for bytes in self.companion_files.values() {
            hasher.update(bytes);
        }
        hex::encode(hasher.finalize())
    }
}
