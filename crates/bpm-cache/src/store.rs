//! Content-addressed on-disk Cache Store: `<root>/<source-path>/<version>/...`.

use std::fs;
use std::path::{Path, PathBuf};

use bpm_assemble::Assembler;
use bpm_core::constant::{DECLARATION_FILE_NAME, IGNORE_FILE_NAME, LOCK_FILE_NAME};
use bpm_core::error::BpmError;
use bpm_core::model::Bundle;
use bpm_core::{ModuleParser, Result, Version};
use tracing::{debug, info};

use crate::dirwalk::load_dir;
use crate::path::repository_to_path;

/// Content-addressed store keyed by `(repository, rendered version)`.
pub struct CacheStore {
    root: PathBuf,
    parser: Box<dyn ModuleParser>,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>, parser: impl ModuleParser + 'static) -> Self {
        Self {
            root: root.into(),
            parser: Box::new(parser),
        }
    }

    fn version_dir(&self, repository: &str, version: &str) -> PathBuf {
        self.root.join(repository_to_path(repository)).join(version)
    }

    /// Existence check; does not validate contents.
    pub fn some(&self, repository: &str, version: &str) -> bool {
        let dir = self.version_dir(repository, version);
        dir.is_dir() && fs::read_dir(&dir).is_ok_and(|mut entries| entries.next().is_some())
    }

    /// Writes all of `bundle`'s files. Fails if the version directory
    /// already exists and is non-empty.
    pub fn store(&self, bundle: &Bundle) -> Result<()> {
        if self.some(bundle.repository(), &bundle.version.to_string()) {
            return Err(BpmError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!(
                    "cache entry {}@{} already exists",
                    bundle.repository(),
                    bundle.version
                ),
            )));
        }
        self.write_bundle(bundle)
    }

    /// Idempotent store: a no-op when the entry already exists.
    pub fn store_some(&self, bundle: &Bundle) -> Result<()> {
        if self.some(bundle.repository(), &bundle.version.to_string()) {
            debug!(repository = bundle.repository(), version = %bundle.version, "cache hit, skipping store");
            return Ok(());
        }
        self.write_bundle(bundle)
    }

    fn write_bundle(&self, bundle: &Bundle) -> Result<()> {
        let final_dir = self.version_dir(bundle.repository(), &bundle.version.to_string());
        let parent = final_dir
            .parent()
            .expect("version dir always has a parent")
            .to_path_buf();
        fs::create_dir_all(&parent)?;

        let staging = tempfile::Builder::new()
            .prefix(".bpm-stage-")
            .tempdir_in(&parent)?;

        let declaration_bytes = bpm_encode::encode_declaration_file(&bundle.declaration_file)?;
        let lock_bytes = bpm_encode::encode_lock_file(&bundle.lock_file)?;
        let ignore_bytes = bpm_encode::encode_ignore_file(&bundle.ignore_file);

        write_file(staging.path(), DECLARATION_FILE_NAME, declaration_bytes.as_bytes())?;
        write_file(staging.path(), LOCK_FILE_NAME, lock_bytes.as_bytes())?;
        write_file(staging.path(), IGNORE_FILE_NAME, ignore_bytes.as_bytes())?;

        for module in bundle.policy_modules.values() {
            write_file(staging.path(), &module.path, &module.raw_bytes)?;
        }
        for (path, bytes) in &bundle.companion_files {
            write_file(staging.path(), path, bytes)?;
        }

        // Atomic from the point of `some()`'s perspective: `final_dir` only
        // ever comes into existence fully populated.
        fs::rename(staging.keep(), &final_dir)?;

        info!(repository = bundle.repository(), version = %bundle.version, "stored bundle in cache");
        Ok(())
    }

    /// Re-materializes a bundle by reading every file under its version
    /// directory (respecting the ignore file) and running it back through
    /// the Bundle Assembler. Validates the bundle checksum against the lock
    /// file's recorded sum.
    pub fn load(&self, source: &str, version: &str) -> Result<Bundle> {
        let dir = self.version_dir(source, version);
        if !self.some(source, version) {
            return Err(BpmError::NotExist {
                repository: source.to_string(),
                version: version.to_string(),
            });
        }

        let files = load_dir(&dir)?;
        let assembler = Assembler::new(self.parser.as_ref());
        let parsed_version = Version::parse(version)?;
        let bundle = assembler.assemble(&files, parsed_version)?;

        let actual = bundle.checksum();
        if actual != bundle.lock_file.sum {
            return Err(BpmError::CorruptCache {
                repository: source.to_string(),
                version: version.to_string(),
                expected: bundle.lock_file.sum.clone(),
                actual,
            });
        }

        Ok(bundle)
    }
}

fn write_file(base: &Path, relative: &str, bytes: &[u8]) -> Result<()> {
    let target = base.join(relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, bytes)?;
    Ok(())
}
