//! Well-known file names and conventions shared by every crate in the workspace.

/// Name of the human-edited declaration file.
pub const DECLARATION_FILE_NAME: &str = "bundle.hcl";

/// Name of the auto-generated lock file.
pub const LOCK_FILE_NAME: &str = "bundle.lock";

/// Name of the newline-delimited ignore file.
pub const IGNORE_FILE_NAME: &str = ".bpmignore";

/// Extension recognized for policy modules.
pub const MODULE_FILE_EXT: &str = "rego";

/// Import path prefix stripped before resolving a bundle name.
pub const IMPORT_PATH_PREFIX: &str = "data.";

/// Current lock file schema version emitted by this implementation.
pub const LOCK_SCHEMA_VERSION: u32 = 1;

/// Banner comment written at the top of every generated lock file.
pub const LOCK_FILE_BANNER: &str =
    "// This file has been auto-generated by `bpm`.\n// It is not meant to be edited manually.";

/// Environment variable selecting the cache root directory.
pub const CACHE_ROOT_ENV: &str = "BPM_PATH";
