//! A minimal concrete `ModuleParser`.
//!
//! A full policy-language parser is an external collaborator; this
//! implementation recognizes just enough of a Rego-shaped module — a
//! `package <path>` declaration and `import <path>` statements — to drive
//! the Bundle Assembler and the Linker in tests and in the reference
//! binary. Swap in a real parser by implementing `bpm_core::ModuleParser`
//! against it.

use bpm_core::error::BpmError;
use bpm_core::model::{ImportRef, ParsedModule};
use bpm_core::{ModuleParser, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct SimplePolicyParser;

impl ModuleParser for SimplePolicyParser {
    fn parse(&self, path: &str, raw: &[u8]) -> Result<ParsedModule> {
        let text = std::str::from_utf8(raw).map_err(|e| BpmError::ParseModule {
            path: path.to_string(),
            source: Box::new(e),
        })?;

        let mut package_path = None;
        let mut imports = Vec::new();

        for (row, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if let Some(rest) = trimmed.strip_prefix("package ") {
                if package_path.is_none() {
                    package_path = Some(rest.trim().to_string());
                }
            } else if let Some(rest) = trimmed.strip_prefix("import ") {
                let import_path = rest.trim().trim_end_matches(';').to_string();
                imports.push(ImportRef {
                    path: import_path,
                    row: (row + 1) as u32,
                });
            }
        }

        let package_path = package_path.ok_or_else(|| BpmError::ParseModule {
            path: path.to_string(),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "missing package declaration",
            )),
        })?;

        Ok(ParsedModule {
            package_path,
            imports,
            canonical_text: canonicalize(text),
        })
    }
}

/// Strips comments and trailing whitespace and collapses runs of blank
/// lines, so that formatting-only edits do not change a module's checksum.
fn canonicalize(text: &str) -> String {
    let mut out = String::new();
    let mut prev_blank = false;

    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed.trim_start().starts_with('#') {
            continue;
        }
        if trimmed.is_empty() {
            if prev_blank {
                continue;
            }
            prev_blank = true;
        } else {
            prev_blank = false;
        }
        out.push_str(trimmed);
        out.push('\n');
    }

    out.trim().to_string()
}
