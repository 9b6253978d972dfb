//! Wire-format shapes for the HCL schema. These mirror the external
//! manifest block layout exactly; the domain types in `bpm_core::model`
//! are reused as the element types so there is only one place that knows
//! the field names of a requirement or a module.

use serde::{Deserialize, Serialize};

use bpm_core::constant::LOCK_SCHEMA_VERSION;
use bpm_core::{DeclarationFile, LockFile, LockRequirementDecl, ModuleDecl, PackageDecl, RequirementDecl};

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct DeclRequireBlock {
    #[serde(default)]
    pub list: Vec<RequirementDecl>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DeclarationSchema {
    pub package: PackageDecl,
    #[serde(default)]
    pub require: DeclRequireBlock,
}

impl From<&DeclarationFile> for DeclarationSchema {
    fn from(d: &DeclarationFile) -> Self {
        Self {
            package: d.package.clone(),
            require: DeclRequireBlock {
                list: d.requirements.clone(),
            },
        }
    }
}

impl From<DeclarationSchema> for DeclarationFile {
    fn from(s: DeclarationSchema) -> Self {
        Self {
            package: s.package,
            requirements: s.require.list,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct LockRequireBlock {
    #[serde(default)]
    pub list: Vec<LockRequirementDecl>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct LockModulesBlock {
    #[serde(default)]
    pub list: Vec<ModuleDecl>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LockSchema {
    pub schema_version: u32,
    pub sum: String,
    #[serde(default)]
    pub require: LockRequireBlock,
    #[serde(default)]
    pub modules: LockModulesBlock,
}

impl From<&LockFile> for LockSchema {
    fn from(l: &LockFile) -> Self {
        Self {
            schema_version: if l.schema_version == 0 {
                LOCK_SCHEMA_VERSION
            } else {
                l.schema_version
            },
            sum: l.sum.clone(),
            require: LockRequireBlock {
                list: l.requirements.clone(),
            },
            modules: LockModulesBlock {
                list: l.modules.clone(),
            },
        }
    }
}

impl From<LockSchema> for LockFile {
    fn from(s: LockSchema) -> Self {
        Self {
            schema_version: s.schema_version,
            sum: s.sum,
            requirements: s.require.list,
            modules: s.modules.list,
        }
    }
}
