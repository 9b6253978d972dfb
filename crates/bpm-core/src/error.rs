use thiserror::Error;

/// Error type shared by every stage of the bundle pipeline.
///
/// Every variant carries the path, repository, or version that triggered it so
/// that a caller several layers up (ultimately the CLI) can report a useful
/// message without re-deriving context that was already on hand when the
/// error was raised.
#[derive(Error, Debug)]
pub enum BpmError {
    #[error("malformed version string '{0}'")]
    BadVersion(String),

    #[error("failed to parse policy module '{path}': {source}")]
    ParseModule {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to decode manifest '{path}': {source}")]
    DecodeManifest {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("bundle {repository}@{version} does not exist in the cache")]
    NotExist { repository: String, version: String },

    #[error("cache entry {repository}@{version} is corrupt: bundle checksum {actual} does not match lock sum {expected}")]
    CorruptCache {
        repository: String,
        version: String,
        expected: String,
        actual: String,
    },

    #[error("remote fetch of {repository} failed: {source}")]
    Remote {
        repository: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("dependency cycle detected: {0}")]
    Cycle(String),

    #[error("installing a bundle into itself is not allowed: {0}")]
    SelfInstall(String),

    #[error("undefined import '{import}' in {path}")]
    UndefinedImport { path: String, import: String },

    #[error("cache root could not be resolved: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, BpmError>;
