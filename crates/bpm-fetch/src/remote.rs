//! Concrete `RemoteFetcher` backed by `git2`.

use std::collections::HashMap;

use async_trait::async_trait;
use bpm_core::error::BpmError;
use bpm_core::{RemoteCommit, RemoteFetcher, Result, Version};
use tracing::{debug, instrument};

/// Clones the requested ref into a throwaway temp directory, reads its tree,
/// and discards the clone. No persistent checkout is kept across calls; the
/// Cache Store is the only thing that survives a fetch.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitRemoteFetcher;

impl GitRemoteFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RemoteFetcher for GitRemoteFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, source: &str, version_spec: &str) -> Result<RemoteCommit> {
        let source_owned = source.to_string();
        let version_owned = version_spec.to_string();
        let repository = source_owned.clone();

        tokio::task::spawn_blocking(move || fetch_blocking(&source_owned, &version_owned))
            .await
            .map_err(|e| remote_err(&repository, e))?
    }
}

fn fetch_blocking(source: &str, version_spec: &str) -> Result<RemoteCommit> {
    let workdir = tempfile::tempdir()?;

    debug!(source, version_spec, "cloning remote");
    let repo = git2::build::RepoBuilder::new()
        .clone(source, workdir.path())
        .map_err(|e| remote_err(source, e))?;

    let commit = resolve_commit(&repo, version_spec).map_err(|e| remote_err(source, e))?;
    let version = resolve_version(source, &commit, version_spec)?;
    let files = collect_files(&repo, &commit).map_err(|e| remote_err(source, e))?;

    Ok(RemoteCommit { version, files })
}

/// An empty `version_spec` resolves to the remote's `HEAD`; a non-empty one
/// must name an existing tag (`v1.2.3` or `1.2.3`) — a missing explicit tag
/// is an error rather than a silent fallback.
fn resolve_commit<'r>(
    repo: &'r git2::Repository,
    version_spec: &str,
) -> std::result::Result<git2::Commit<'r>, git2::Error> {
    if version_spec.is_empty() {
        return repo.head()?.peel_to_commit();
    }

    let candidates = if let Some(stripped) = version_spec.strip_prefix('v') {
        vec![version_spec.to_string(), stripped.to_string()]
    } else {
        vec![version_spec.to_string(), format!("v{version_spec}")]
    };

    for candidate in &candidates {
        let refname = format!("refs/tags/{candidate}");
        if let Ok(reference) = repo.find_reference(&refname) {
            return reference.peel_to_commit();
        }
    }

    Err(git2::Error::from_str(&format!(
        "no tag matching '{version_spec}' found"
    )))
}

fn resolve_version(source: &str, commit: &git2::Commit, version_spec: &str) -> Result<Version> {
    if version_spec.is_empty() {
        let short_hash = commit.id().to_string()[..7].to_string();
        let seconds = commit.time().seconds();
        let timestamp =
            time::OffsetDateTime::from_unix_timestamp(seconds).map_err(|e| remote_err(source, e))?;
        Ok(Version::from_commit(&short_hash, timestamp))
    } else {
        Version::parse(version_spec)
    }
}

fn collect_files(
    repo: &git2::Repository,
    commit: &git2::Commit,
) -> std::result::Result<HashMap<String, Vec<u8>>, git2::Error> {
    let tree = commit.tree()?;
    let mut files = HashMap::new();

    tree.walk(git2::TreeWalkMode::PreOrder, |dir, entry| {
        if entry.kind() == Some(git2::ObjectType::Blob) {
            if let Some(name) = entry.name() {
                let path = format!("{dir}{name}");
                if let Ok(object) = entry.to_object(repo) {
                    if let Some(blob) = object.as_blob() {
                        files.insert(path, blob.content().to_vec());
                    }
                }
            }
        }
        git2::TreeWalkResult::Ok
    })?;

    Ok(files)
}

fn remote_err(source: &str, err: impl std::error::Error + Send + Sync + 'static) -> BpmError {
    BpmError::Remote {
        repository: source.to_string(),
        source: Box::new(err),
    }
}
