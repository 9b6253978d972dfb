//! The orchestrator: mutates a working bundle's declaration file, rebuilds
//! its lock file, and persists both through the Encoder.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use bpm_core::constant::{DECLARATION_FILE_NAME, LOCK_FILE_NAME};
use bpm_core::error::BpmError;
use bpm_core::model::{Bundle, Direction, LockRequirementDecl, ModuleDecl, RequirementDecl};
use bpm_core::Result;
use bpm_fetch::Fetcher;
use tracing::info;

use crate::linker::Linker;

pub struct Manifester {
    fetcher: Fetcher,
}

impl Manifester {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Adds or upgrades a single requirement on `parent`, then rebuilds the
    /// lock file. Returns a human-readable status line for the CLI to print.
    pub async fn insert_requirement(&self, parent: &mut Bundle, source: &str, version: &str) -> Result<String> {
        if source == parent.repository() {
            return Err(BpmError::SelfInstall(source.to_string()));
        }

        let fetched = self.fetcher.fetch(source, version).await?;
        let fetched_version = fetched.target.version.clone();

        let existing_index = parent
            .declaration_file
            .find_requirement(source)
            .map(|(idx, decl)| (idx, decl.version.clone()));

        let message = match existing_index {
            None => {
                parent.declaration_file.requirements.push(RequirementDecl {
                    repository: source.to_string(),
                    name: fetched.target.name().to_string(),
                    version: fetched_version.to_string(),
                });
                format!("added {source}@{fetched_version}")
            }
            Some((idx, existing_raw)) => {
                let existing_version = bpm_core::Version::parse(&existing_raw)?;
                if existing_version == fetched_version {
                    format!("{source}@{existing_version} is already installed")
                } else if fetched_version.greater_than(&existing_version) {
                    let msg = format!("{source} {existing_version} => {fetched_version}");
                    parent.declaration_file.requirements[idx].version = fetched_version.to_string();
                    msg
                } else {
                    let msg =
                        format!("warning: installing an older bundle {source} {existing_version} <= {fetched_version}");
                    parent.declaration_file.requirements[idx].version = fetched_version.to_string();
                    msg
                }
            }
        };

        self.sync_lockfile(parent).await?;
        info!(%message, "insert_requirement complete");
        Ok(message)
    }

    /// Rebuilds `parent.lock_file` from scratch off the current declaration
    /// file: fetches every declared requirement's transitive closure,
    /// classifies direct/indirect, relinks every policy module's imports,
    /// and refreshes the bundle checksum.
    pub async fn sync_lockfile(&self, parent: &mut Bundle) -> Result<()> {
        let mut require_list: HashMap<String, Bundle> = HashMap::new();
        let mut targets = Vec::new();
        let mut transitive = Vec::new();

        for requirement in &parent.declaration_file.requirements {
            let fetched = self.fetcher.fetch(&requirement.repository, &requirement.version).await?;
            require_list.insert(fetched.target.name().to_string(), fetched.target.clone());
            targets.push(fetched.target.clone());
            transitive.extend(fetched.transitive);
        }

        let direct_keys: HashSet<(String, String)> = targets.iter().map(key_of).collect();

        let mut seen = HashSet::new();
        let mut requirements = Vec::new();
        for bundle in &targets {
            if seen.insert(key_of(bundle)) {
                requirements.push(make_requirement(bundle, Direction::Direct));
            }
        }
        for bundle in &transitive {
            let key = key_of(bundle);
            if direct_keys.contains(&key) {
                continue;
            }
            if seen.insert(key) {
                requirements.push(make_requirement(bundle, Direction::Indirect));
            }
        }

        let mut modules = Vec::new();
        for module in parent.policy_modules.values() {
            let requires = Linker::link_module(&require_list, module)?;
            modules.push(ModuleDecl {
                package: format!("{}.{}", parent.name(), module.package_path()),
                source: module.path.clone(),
                sum: module.checksum(),
                requires,
            });
        }
        modules.sort_by(|a, b| a.package.cmp(&b.package));

        parent.lock_file.requirements = requirements;
        parent.lock_file.modules = modules;
        parent.lock_file.sum = parent.checksum();

        Ok(())
    }

    /// Serializes both manifest files and overwrites them in `work_dir` with
    /// mode `0644`.
    pub fn upgrade(&self, work_dir: &Path, parent: &Bundle) -> Result<()> {
        let decl_bytes = bpm_encode::encode_declaration_file(&parent.declaration_file)?;
        let lock_bytes = bpm_encode::encode_lock_file(&parent.lock_file)?;

        write_manifest(&work_dir.join(DECLARATION_FILE_NAME), decl_bytes.as_bytes())?;
        write_manifest(&work_dir.join(LOCK_FILE_NAME), lock_bytes.as_bytes())?;
        Ok(())
    }
}

fn key_of(bundle: &Bundle) -> (String, String) {
    (bundle.repository().to_string(), bundle.version.to_string())
}

fn make_requirement(bundle: &Bundle, direction: Direction) -> LockRequirementDecl {
    LockRequirementDecl {
        repository: bundle.repository().to_string(),
        direction,
        name: bundle.name().to_string(),
        version: bundle.version.to_string(),
        h1: bundle.declaration_file.checksum(),
        h2: bundle.checksum(),
    }
}

#[cfg(unix)]
fn write_manifest(path: &Path, bytes: &[u8]) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, bytes)?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn write_manifest(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes)?;
    Ok(())
}
