//! Maps a repository identifier to a filesystem-safe, collision-free path.

/// Strips a leading URL scheme (`git://`, `https://`, `ssh://`, ...) and
/// percent-encodes each path segment individually, so path separators in
/// the repository identifier keep producing the nested directory layout a
/// human expects (`github.com/foo/bar`) while any character unsafe for a
/// path component is escaped rather than silently dropped or truncated to
/// a short name.
pub fn repository_to_path(repository: &str) -> String {
    let without_scheme = match repository.split_once("://") {
        Some((_, rest)) => rest,
        None => repository,
    };

    without_scheme
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
