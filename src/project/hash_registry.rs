//! Frozen interface hashes (`current.txt`).
//!
//! One line per released file: `<sha256 hex> <pkg@M.m::Name>`. Blank lines
//! and `#` comments are ignored. A name may appear several times when a
//! released file was later fixed up in a compatible way.

use std::path::Path;

use indexmap::IndexMap;

use crate::base::FqName;
use crate::error::{CompileError, Result};

#[derive(Debug, Clone, Default)]
pub struct HashRegistry {
    entries: IndexMap<FqName, Vec<String>>,
}

impl HashRegistry {
    /// Read a registry file; a missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut registry = Self::default();
        for (number, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let error = |message: &str| CompileError::HashRegistry {
                path: path.to_path_buf(),
                line: number + 1,
                message: message.to_string(),
            };

            let mut parts = line.split_whitespace();
            let (Some(hash), Some(name), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(error("expected '<hash> <fqname>'"));
            };
            if hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(error("hash must be 64 hex digits"));
            }
            let fq_name = FqName::parse(name).map_err(|e| error(&e.to_string()))?;
            if !fq_name.is_fully_qualified() {
                return Err(error("name must be fully qualified"));
            }
            registry
                .entries
                .entry(fq_name)
                .or_default()
                .push(hash.to_ascii_lowercase());
        }
        Ok(registry)
    }

    /// Recorded hashes for `fq_name`, oldest first.
    pub fn hashes(&self, fq_name: &FqName) -> &[String] {
        self.entries.get(fq_name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    #[test]
    fn test_parse_with_comments_and_repeats() {
        let text = format!("# released\n\n{A} test@1.0::IFoo\n{B} test@1.0::IFoo # fixup\n");
        let registry = HashRegistry::parse(Path::new("current.txt"), &text).unwrap();
        let name = FqName::parse("test@1.0::IFoo").unwrap();
        assert_eq!(registry.hashes(&name), &[A.to_string(), B.to_string()]);
        assert!(registry.hashes(&FqName::parse("test@1.0::IBar").unwrap()).is_empty());
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let text = format!("{A} test@1.0::IFoo\nnothex test@1.0::IBar\n");
        let err = HashRegistry::parse(Path::new("current.txt"), &text).unwrap_err();
        assert!(matches!(err, CompileError::HashRegistry { line: 2, .. }));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let registry = HashRegistry::load(Path::new("/definitely/not/here/current.txt")).unwrap();
        assert!(registry.is_empty());
    }
}
