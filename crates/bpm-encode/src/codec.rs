//! Encode/decode for the declaration file, the lock file, and the ignore
//! file. `decode(encode(x)) == x` for all three.

use bpm_core::constant::{DECLARATION_FILE_NAME, LOCK_FILE_BANNER, LOCK_FILE_NAME};
use bpm_core::{BpmError, DeclarationFile, LockFile, Result};

use crate::schema::{DeclarationSchema, LockSchema};

fn decode_err(path: &str, source: impl std::error::Error + Send + Sync + 'static) -> BpmError {
    BpmError::DecodeManifest {
        path: path.to_string(),
        source: Box::new(source),
    }
}

/// Collapses the blank line hcl-rs otherwise leaves after an opening brace.
/// Purely textual; changes no semantic content.
fn collapse_blank_lines(s: &str) -> String {
    s.replace("{\n\n", "{\n")
}

pub fn encode_declaration_file(decl: &DeclarationFile) -> Result<String> {
    let schema = DeclarationSchema::from(decl);
    let raw = hcl::to_string(&schema).map_err(|e| decode_err(DECLARATION_FILE_NAME, e))?;
    Ok(collapse_blank_lines(raw.trim()) + "\n")
}

pub fn decode_declaration_file(content: &str) -> Result<DeclarationFile> {
    let schema: DeclarationSchema =
        hcl::from_str(content).map_err(|e| decode_err(DECLARATION_FILE_NAME, e))?;
    Ok(schema.into())
}

/// `direction` is modeled as a quoted string at the serde layer (so it
/// round-trips through `hcl::from_str`/`to_string` like any other field) and
/// unquoted only in the bytes actually written to disk, matching the
/// external manifest format. `decode_lock_file` reverses the substitution
/// before parsing.
fn unquote_direction(s: &str) -> String {
    s.replace("\"direct\"", "direct")
        .replace("\"indirect\"", "indirect")
}

fn requote_direction(s: &str) -> String {
    s.replace("direction = direct", "direction = \"direct\"")
        .replace("direction = indirect", "direction = \"indirect\"")
}

pub fn encode_lock_file(lock: &LockFile) -> Result<String> {
    let schema = LockSchema::from(lock);
    let raw = hcl::to_string(&schema).map_err(|e| decode_err(LOCK_FILE_NAME, e))?;
    let body = collapse_blank_lines(&unquote_direction(raw.trim()));
    Ok(format!("{LOCK_FILE_BANNER}\n\n{body}\n"))
}

pub fn decode_lock_file(content: &str) -> Result<LockFile> {
    let restored = requote_direction(content);
    let schema: LockSchema =
        hcl::from_str(&restored).map_err(|e| decode_err(LOCK_FILE_NAME, e))?;
    Ok(schema.into())
}

/// Sorted, newline-delimited, duplicate-collapsed ignore patterns.
pub fn encode_ignore_file(entries: &[String]) -> String {
    let mut sorted: Vec<&str> = entries.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut out = String::new();
    for entry in sorted {
        out.push_str(entry);
        out.push('\n');
    }
    out
}

pub fn decode_ignore_file(content: &str) -> Vec<String> {
    let mut keys: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpm_core::model::{Direction, LockRequirementDecl, PackageDecl, RequirementDecl};

    fn sample_declaration() -> DeclarationFile {
        DeclarationFile {
            package: PackageDecl {
                name: "parent".into(),
                repository: "git://example/parent".into(),
            },
            requirements: vec![RequirementDecl {
                repository: "git://example/foo".into(),
                name: "foo".into(),
                version: "v1.2.3".into(),
            }],
        }
    }

    #[test]
    fn declaration_file_roundtrips() {
        let decl = sample_declaration();
        let encoded = encode_declaration_file(&decl).unwrap();
        let decoded = decode_declaration_file(&encoded).unwrap();
        assert_eq!(decl, decoded);
    }

    #[test]
    fn lock_file_roundtrips_and_unquotes_direction() {
        let lock = LockFile {
            schema_version: 1,
            sum: "deadbeef".into(),
            requirements: vec![LockRequirementDecl {
                repository: "git://example/foo".into(),
                direction: Direction::Direct,
                name: "foo".into(),
                version: "v1.2.3".into(),
                h1: "aaa".into(),
                h2: "bbb".into(),
            }],
            modules: Vec::new(),
        };

        let encoded = encode_lock_file(&lock).unwrap();
        assert!(encoded.starts_with(LOCK_FILE_BANNER));
        assert!(encoded.contains("direction = direct"));
        assert!(!encoded.contains("\"direct\""));

        let decoded = decode_lock_file(&encoded).unwrap();
        assert_eq!(lock, decoded);
    }

    #[test]
    fn ignore_file_sorts_and_dedups() {
        let entries = vec!["b/".to_string(), "a/".to_string(), "a/".to_string()];
        let encoded = encode_ignore_file(&entries);
        assert_eq!(encoded, "a/\nb/\n");

        let decoded = decode_ignore_file("b/\n\na/\na/\n");
        assert_eq!(decoded, vec!["a/".to_string(), "b/".to_string()]);
    }
}
