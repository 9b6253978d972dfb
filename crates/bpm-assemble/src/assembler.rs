//! The Bundle Assembler: classifies a bag of `(path, bytes)` into policy
//! modules, companion files, and the three reserved manifest files.

use std::collections::{BTreeMap, HashMap};

use bpm_core::constant::{DECLARATION_FILE_NAME, IGNORE_FILE_NAME, LOCK_FILE_NAME, MODULE_FILE_EXT};
use bpm_core::error::BpmError;
use bpm_core::model::{Bundle, LockFile, RawModule};
use bpm_core::{ModuleParser, Result, Version};

/// Stateless; holds only a reference to the (external) policy-language
/// parser used to turn raw module bytes into `ParsedModule`s.
pub struct Assembler<'p> {
    parser: &'p dyn ModuleParser,
}

impl<'p> Assembler<'p> {
    pub fn new(parser: &'p dyn ModuleParser) -> Self {
        Self { parser }
    }

    /// Classifies `files` and builds a `Bundle` at `version`. The output
    /// never depends on the iteration order of `files`: every collection
    /// that later feeds a checksum or a serialized list is a `BTreeMap`.
    pub fn assemble(&self, files: &HashMap<String, Vec<u8>>, version: Version) -> Result<Bundle> {
        let mut policy_modules = BTreeMap::new();
        let mut companion_files = BTreeMap::new();
        let mut declaration_bytes = None;
        let mut lock_bytes = None;
        let mut ignore_bytes = None;

        for (path, bytes) in files {
            if path == DECLARATION_FILE_NAME {
                declaration_bytes = Some(bytes);
            } else if path == LOCK_FILE_NAME {
                lock_bytes = Some(bytes);
            } else if path == IGNORE_FILE_NAME {
                ignore_bytes = Some(bytes);
            } else if is_module_path(path) {
                let parsed = self.parser.parse(path, bytes)?;
                policy_modules.insert(
                    path.clone(),
                    RawModule {
                        path: path.clone(),
                        raw_bytes: bytes.clone(),
                        parsed,
                    },
                );
            } else {
                companion_files.insert(path.clone(), bytes.clone());
            }
        }

        let declaration_file = match declaration_bytes {
            Some(bytes) => decode_declaration(bytes)?,
            None => {
                return Err(BpmError::DecodeManifest {
                    path: DECLARATION_FILE_NAME.to_string(),
                    source: Box::new(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "declaration file is missing from the file set",
                    )),
                });
            }
        };

        let lock_file = match lock_bytes {
            Some(bytes) => decode_lock(bytes)?,
            None => LockFile::empty(),
        };

        let ignore_file = match ignore_bytes {
            Some(bytes) => decode_ignore(bytes)?,
            None => Vec::new(),
        };

        tracing::debug!(
            modules = policy_modules.len(),
            companions = companion_files.len(),
            "assembled bundle {}",
            declaration_file.package.name
        );

        Ok(Bundle {
            version,
            declaration_file,
            lock_file,
            ignore_file,
            policy_modules,
            companion_files,
        })
    }
}

fn is_module_path(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == MODULE_FILE_EXT)
}

fn decode_declaration(bytes: &[u8]) -> Result<bpm_core::model::DeclarationFile> {
    let text = std::str::from_utf8(bytes).map_err(|e| BpmError::DecodeManifest {
        path: DECLARATION_FILE_NAME.to_string(),
        source: Box::new(e),
    })?;
    bpm_encode::decode_declaration_file(text)
}

fn decode_lock(bytes: &[u8]) -> Result<LockFile> {
    let text = std::str::from_utf8(bytes).map_err(|e| BpmError::DecodeManifest {
        path: LOCK_FILE_NAME.to_string(),
        source: Box::new(e),
    })?;
    bpm_encode::decode_lock_file(text)
}

fn decode_ignore(bytes: &[u8]) -> Result<Vec<String>> {
    let text = std::str::from_utf8(bytes).map_err(|e| BpmError::DecodeManifest {
        path: IGNORE_FILE_NAME.to_string(),
        source: Box::new(e),
    })?;
    Ok(bpm_encode::decode_ignore_file(text))
}
