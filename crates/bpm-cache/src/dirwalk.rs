//! Shared directory-to-file-set reader, used both to re-materialize a
//! cached bundle and to load the working bundle rooted at the CLI's
//! current directory. Respects a `.bpmignore` file when present: the
//! ignore file is consulted only when reading from disk, never for a
//! remotely-fetched file set.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use bpm_core::constant::IGNORE_FILE_NAME;
use bpm_core::error::BpmError;
use bpm_core::Result;

/// Reads every file under `dir`, skipping paths matched by `.bpmignore`.
pub fn load_dir(dir: &Path) -> Result<HashMap<String, Vec<u8>>> {
    let ignore_path = dir.join(IGNORE_FILE_NAME);
    let ignore_entries = if ignore_path.is_file() {
        bpm_encode::decode_ignore_file(&fs::read_to_string(&ignore_path)?)
    } else {
        Vec::new()
    };

    let mut files = HashMap::new();
    let mut walker = walkdir::WalkDir::new(dir).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| BpmError::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(dir)
            .expect("walkdir yields paths under dir")
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/");

        if relative.is_empty() {
            continue;
        }

        if is_ignored(&relative, &ignore_entries) {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }

        if entry.file_type().is_file() {
            let bytes = fs::read(entry.path())?;
            files.insert(relative, bytes);
        }
    }

    Ok(files)
}

fn is_ignored(relative: &str, ignore_entries: &[String]) -> bool {
    ignore_entries.iter().any(|pattern| {
        let pattern = pattern.trim_end_matches('/');
        relative == pattern || relative.starts_with(&format!("{pattern}/"))
    })
}
