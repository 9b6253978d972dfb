//! Resolves a `(source, version_spec)` to a bundle and its transitive
//! closure, using the Cache Store as a memoizing layer in front of a
//! `RemoteFetcher`.

use std::collections::HashSet;
use std::sync::Arc;

use bpm_assemble::{Assembler, SimplePolicyParser};
use bpm_cache::CacheStore;
use bpm_core::error::BpmError;
use bpm_core::model::Bundle;
use bpm_core::{RemoteFetcher, Result};
use futures::future::{BoxFuture, try_join_all};
use tracing::debug;

/// The target bundle plus its transitive dependency closure, in the
/// deterministic depth-first order `merge()` describes.
pub struct FetchResult {
    pub target: Bundle,
    pub transitive: Vec<Bundle>,
}

impl FetchResult {
    /// Target followed by its transitive closure, depth-first, children
    /// sorted by repository at every level.
    pub fn merge(&self) -> Vec<&Bundle> {
        let mut out = Vec::with_capacity(1 + self.transitive.len());
        out.push(&self.target);
        out.extend(self.transitive.iter());
        out
    }
}

pub struct Fetcher {
    cache: Arc<CacheStore>,
    remote: Arc<dyn RemoteFetcher>,
}

impl Fetcher {
    pub fn new(cache: Arc<CacheStore>, remote: Arc<dyn RemoteFetcher>) -> Self {
        Self { cache, remote }
    }

    pub async fn fetch(&self, source: &str, version_spec: &str) -> Result<FetchResult> {
        self.fetch_inner(source.to_string(), version_spec.to_string(), HashSet::new())
            .await
    }

    /// `visiting` holds only the requested source's current ancestors, not a
    /// workspace-wide set: siblings in a diamond dependency graph each carry
    /// their own copy, so fetching the same `(repository, version)` twice
    /// from two different parents is not mistaken for a cycle.
    fn fetch_inner(
        &self,
        source: String,
        version_spec: String,
        visiting: HashSet<(String, String)>,
    ) -> BoxFuture<'_, Result<FetchResult>> {
        Box::pin(async move {
            let key = (source.clone(), version_spec.clone());
            if visiting.contains(&key) {
                return Err(BpmError::Cycle(format!("{}@{}", key.0, key.1)));
            }
            let mut next_visiting = visiting;
            next_visiting.insert(key);

            let bundle = self.resolve_bundle(&source, &version_spec).await?;

            let mut requirements = bundle.declaration_file.requirements.clone();
            requirements.sort_by(|a, b| a.repository.cmp(&b.repository));

            let children: Vec<_> = requirements
                .into_iter()
                .map(|r| self.fetch_inner(r.repository, r.version, next_visiting.clone()))
                .collect();
            let child_results = try_join_all(children).await?;

            let mut transitive = Vec::new();
            for result in child_results {
                transitive.push(result.target);
                transitive.extend(result.transitive);
            }

            Ok(FetchResult { target: bundle, transitive })
        })
    }

    async fn resolve_bundle(&self, source: &str, version_spec: &str) -> Result<Bundle> {
        if !version_spec.is_empty() && self.cache.some(source, version_spec) {
            debug!(source, version_spec, "cache hit");
            return self.cache.load(source, version_spec);
        }

        debug!(source, version_spec, "cache miss, fetching from remote");
        let commit = self.remote.fetch(source, version_spec).await?;

        let parser = SimplePolicyParser;
        let assembler = Assembler::new(&parser);
        let bundle = assembler.assemble(&commit.files, commit.version)?;

        self.cache.store_some(&bundle)?;
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bpm_core::model::{DeclarationFile, LockFile, RequirementDecl};
    use bpm_core::{RemoteCommit, Version};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StubRemote {
        commits: Mutex<HashMap<String, RemoteCommit>>,
    }

    fn bundle_files(name: &str, repository: &str, requires: &[(&str, &str)]) -> HashMap<String, Vec<u8>> {
        let mut decl = DeclarationFile::new(name, repository);
        for (repo, version) in requires {
            decl.requirements.push(RequirementDecl {
                repository: (*repo).to_string(),
                name: (*repo).to_string(),
                version: (*version).to_string(),
            });
        }
        let mut files = HashMap::new();
        files.insert(
            "bundle.hcl".to_string(),
            bpm_encode::encode_declaration_file(&decl).unwrap().into_bytes(),
        );
        files.insert(format!("{name}.rego").to_string(), format!("package {name}\n").into_bytes());

        // Compute the real checksum from just declaration + module content (the
        // lock file isn't present yet, so the assembler defaults it to empty)
        // and embed it, so a later cache-hit reload's checksum validation passes
        // the way a genuinely published bundle's own lock file would.
        let parser = SimplePolicyParser;
        let provisional = Assembler::new(&parser)
            .assemble(&files, Version::parse("v0.0.0").unwrap())
            .unwrap();
        let mut lock = LockFile::empty();
        lock.sum = provisional.checksum();
        files.insert(
            "bundle.lock".to_string(),
            bpm_encode::encode_lock_file(&lock).unwrap().into_bytes(),
        );
        files
    }

    #[async_trait]
    impl RemoteFetcher for StubRemote {
        async fn fetch(&self, source: &str, version_spec: &str) -> Result<RemoteCommit> {
            let key = format!("{source}@{version_spec}");
            self.commits
                .lock()
                .unwrap()
                .get(&key)
                .map(|c| RemoteCommit {
                    version: c.version.clone(),
                    files: c.files.clone(),
                })
                .ok_or_else(|| BpmError::Remote {
                    repository: source.to_string(),
                    source: Box::new(std::io::Error::new(std::io::ErrorKind::NotFound, "no stub")),
                })
        }
    }

    fn version(v: &str) -> Version {
        Version::parse(v).unwrap()
    }

    #[tokio::test]
    async fn fetch_resolves_transitive_closure_in_repository_order() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Arc::new(CacheStore::new(tmp.path(), SimplePolicyParser));

        let mut commits = std::collections::HashMap::new();
        commits.insert(
            "foo@v1.0.0".to_string(),
            RemoteCommit { version: version("v1.0.0"), files: bundle_files("foo", "foo", &[("bar", "v0.5.0"), ("baz", "v0.3.0")]) },
        );
        commits.insert(
            "bar@v0.5.0".to_string(),
            RemoteCommit { version: version("v0.5.0"), files: bundle_files("bar", "bar", &[]) },
        );
        commits.insert(
            "baz@v0.3.0".to_string(),
            RemoteCommit { version: version("v0.3.0"), files: bundle_files("baz", "baz", &[]) },
        );
        let remote = Arc::new(StubRemote { commits: Mutex::new(commits) });

        let fetcher = Fetcher::new(cache, remote);
        let result = fetcher.fetch("foo", "v1.0.0").await.unwrap();

        assert_eq!(result.target.repository(), "foo");
        let merged: Vec<&str> = result.merge().iter().map(|b| b.repository()).collect();
        assert_eq!(merged, vec!["foo", "bar", "baz"]);
    }

    #[tokio::test]
    async fn fetch_detects_self_cycle() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Arc::new(CacheStore::new(tmp.path(), SimplePolicyParser));

        let mut commits = std::collections::HashMap::new();
        commits.insert(
            "foo@v1.0.0".to_string(),
            RemoteCommit { version: version("v1.0.0"), files: bundle_files("foo", "foo", &[("foo", "v1.0.0")]) },
        );
        let remote = Arc::new(StubRemote { commits: Mutex::new(commits) });

        let fetcher = Fetcher::new(cache, remote);
        let err = fetcher.fetch("foo", "v1.0.0").await.unwrap_err();
        assert!(matches!(err, BpmError::Cycle(_)));
    }

    #[tokio::test]
    async fn repeated_fetch_hits_the_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Arc::new(CacheStore::new(tmp.path(), SimplePolicyParser));

        let mut commits = std::collections::HashMap::new();
        commits.insert(
            "foo@v1.0.0".to_string(),
            RemoteCommit { version: version("v1.0.0"), files: bundle_files("foo", "foo", &[]) },
        );
        let remote = Arc::new(StubRemote { commits: Mutex::new(commits) });

        let fetcher = Fetcher::new(cache.clone(), remote.clone());
        fetcher.fetch("foo", "v1.0.0").await.unwrap();

        // Drop the stub's commit so a second remote call would fail; the
        // fetch must be served entirely from the cache this time.
        remote.commits.lock().unwrap().clear();
        let result = fetcher.fetch("foo", "v1.0.0").await.unwrap();
        assert_eq!(result.target.repository(), "foo");
    }
}
