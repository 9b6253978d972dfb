//! Import Validator: resolves each policy module's imports to a concrete
//! required bundle and module, and renders the lock file's `requires` edges.

use std::collections::{HashMap, HashSet};

use bpm_core::constant::IMPORT_PATH_PREFIX;
use bpm_core::error::BpmError;
use bpm_core::model::{Bundle, RawModule};
use bpm_core::Result;
use tracing::warn;

pub struct Linker;

impl Linker {
    /// `require_list` maps a required bundle's package name to the fetched
    /// bundle itself. Returns one `"<row>:<repository>@<version>:<import>"`
    /// string per unique import in `module`, in source order.
    pub fn link_module(require_list: &HashMap<String, Bundle>, module: &RawModule) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut requires = Vec::new();

        for import in module.imports() {
            if !seen.insert(import.path.clone()) {
                warn!(module = %module.path, import = %import.path, "duplicate import");
                continue;
            }

            let trimmed = import.path.strip_prefix(IMPORT_PATH_PREFIX).unwrap_or(&import.path);
            let bundle_name = trimmed.split('.').next().unwrap_or(trimmed);

            let bundle = require_list.get(bundle_name).ok_or_else(|| BpmError::UndefinedImport {
                path: module.path.clone(),
                import: import.path.clone(),
            })?;

            if !bundle.lock_file.has_module(trimmed) {
                return Err(BpmError::UndefinedImport {
                    path: module.path.clone(),
                    import: import.path.clone(),
                });
            }

            requires.push(format!(
                "{}:{}@{}:{}",
                import.row,
                bundle.repository(),
                bundle.version,
                import.path
            ));
        }

        Ok(requires)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpm_core::model::{DeclarationFile, ImportRef, LockFile, ModuleDecl, ParsedModule};
    use bpm_core::Version;
    use std::collections::BTreeMap;

    fn module_with_imports(imports: Vec<ImportRef>) -> RawModule {
        RawModule {
            path: "policy.rego".to_string(),
            raw_bytes: Vec::new(),
            parsed: ParsedModule {
                package_path: "app".to_string(),
                imports,
                canonical_text: String::new(),
            },
        }
    }

    fn required_bundle(name: &str, module_package: &str) -> Bundle {
        let mut lock = LockFile::empty();
        lock.modules.push(ModuleDecl {
            package: module_package.to_string(),
            source: "policy.rego".to_string(),
            sum: "deadbeef".to_string(),
            requires: Vec::new(),
        });
        Bundle {
            version: Version::parse("v1.0.0").unwrap(),
            declaration_file: DeclarationFile::new(name, format!("git://example/{name}")),
            lock_file: lock,
            ignore_file: Vec::new(),
            policy_modules: BTreeMap::new(),
            companion_files: BTreeMap::new(),
        }
    }

    #[test]
    fn resolves_import_to_required_bundle() {
        let mut require_list = HashMap::new();
        require_list.insert("auth".to_string(), required_bundle("auth", "auth.rules"));

        let module = module_with_imports(vec![ImportRef { path: "data.auth.rules".to_string(), row: 3 }]);
        let requires = Linker::link_module(&require_list, &module).unwrap();

        assert_eq!(requires.len(), 1);
        assert_eq!(requires[0], "3:git://example/auth@v1.0.0:data.auth.rules");
    }

    #[test]
    fn undefined_bundle_is_an_error() {
        let require_list = HashMap::new();
        let module = module_with_imports(vec![ImportRef { path: "data.ghost.x".to_string(), row: 1 }]);
        let err = Linker::link_module(&require_list, &module).unwrap_err();
        assert!(matches!(err, BpmError::UndefinedImport { .. }));
    }

    #[test]
    fn undefined_module_within_known_bundle_is_an_error() {
        let mut require_list = HashMap::new();
        require_list.insert("auth".to_string(), required_bundle("auth", "auth.rules"));

        let module = module_with_imports(vec![ImportRef { path: "data.auth.missing".to_string(), row: 1 }]);
        let err = Linker::link_module(&require_list, &module).unwrap_err();
        assert!(matches!(err, BpmError::UndefinedImport { .. }));
    }

    #[test]
    fn duplicate_imports_collapse_to_one_entry() {
        let mut require_list = HashMap::new();
        require_list.insert("auth".to_string(), required_bundle("auth", "auth.rules"));

        let module = module_with_imports(vec![
            ImportRef { path: "data.auth.rules".to_string(), row: 1 },
            ImportRef { path: "data.auth.rules".to_string(), row: 5 },
        ]);
        let requires = Linker::link_module(&require_list, &module).unwrap();
        assert_eq!(requires.len(), 1);
        assert!(requires[0].starts_with("1:"));
    }
}
