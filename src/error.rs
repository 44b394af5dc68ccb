//! Error types for compilation.

use std::path::PathBuf;

use thiserror::Error;

use crate::base::{FqName, FqNameError};

pub type Result<T, E = CompileError> = std::result::Result<T, E>;

/// Every way a compilation can fail.
///
/// All variants are fatal for the target being processed; nothing is
/// retried.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Bad command-line combination.
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    InvalidFqName(#[from] FqNameError),

    /// No registered package prefix covers the package.
    #[error("no package root known for {0}")]
    UnknownPackageRoot(FqName),

    /// The same prefix was registered twice.
    #[error("package root for '{prefix}' given more than once")]
    PackageRootConflict { prefix: String },

    #[error("could not find {fq_name} at {}", path.display())]
    SourceNotFound { fq_name: FqName, path: PathBuf },

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file had syntax errors and was rejected as a whole.
    #[error("{} has {count} syntax error(s); first: {first}", path.display())]
    ParseSyntax {
        path: PathBuf,
        count: usize,
        first: String,
    },

    /// The file does not declare what its name promises.
    #[error("{} {reason}", path.display())]
    DeclarationMismatch { path: PathBuf, reason: String },

    #[error("redefinition of '{name}' in {scope}")]
    DuplicateDeclaration { name: String, scope: String },

    #[error("failed to look up {name} in {context}")]
    UnresolvedType { name: String, context: String },

    #[error("'{name}' is ambiguous in {context}; candidates: {}", candidates.join(", "))]
    AmbiguousType {
        name: String,
        context: String,
        candidates: Vec<String>,
    },

    #[error("enum value '{name}' not found in {context}")]
    UnresolvedEnumValue { name: String, context: String },

    #[error("'{name}' is not an enum type ({context})")]
    NotAnEnum { name: String, context: String },

    #[error("'{name}' cannot be extended by {interface}: not an interface")]
    InvalidSuperInterface { name: String, interface: String },

    #[error("interface inheritance cycle through {0}")]
    InheritanceCycle(String),

    #[error("import cycle: {importer} imports {imported}, whose package depends back on it")]
    ImportCycle { importer: FqName, imported: FqName },

    #[error("constant value of {0} depends on itself")]
    ConstantCycle(String),

    #[error("value {value} of {name} does not fit its storage type {storage}")]
    ConstantOutOfRange {
        name: String,
        value: i128,
        storage: String,
    },

    #[error(
        "{fq_name} has hash {actual} which does not match hash on record ({}); \
         this interface has been frozen, do not change it",
        recorded.join(", ")
    )]
    FrozenInterfaceViolation {
        fq_name: FqName,
        recorded: Vec<String>,
        actual: String,
    },

    #[error("{}:{line}: {message}", path.display())]
    HashRegistry {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A previous request for the same file already failed.
    #[error("{0} previously failed to parse")]
    PreviouslyFailed(FqName),

    #[error("unrecognized output format '{0}'")]
    UnknownFormat(String),

    /// A target does not have the shape the format requires.
    #[error("{target} is not valid for format '{format}': {reason}")]
    Validation {
        target: FqName,
        format: String,
        reason: String,
    },

    #[error("could not write {}: {source}", path.display())]
    GenerationIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn unresolved(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnresolvedType {
            name: name.into(),
            context: context.into(),
        }
    }

    pub fn validation(target: &FqName, format: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            target: target.clone(),
            format: format.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn generation_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::GenerationIo {
            path: path.into(),
            source,
        }
    }

    /// Errors that come from how the tool was invoked rather than from the
    /// sources being compiled.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::Usage(_)
                | Self::UnknownFormat(_)
                | Self::PackageRootConflict { .. }
                | Self::InvalidFqName(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frozen_message_names_both_hashes() {
        let err = CompileError::FrozenInterfaceViolation {
            fq_name: FqName::parse("a@1.0::IFoo").unwrap(),
            recorded: vec!["aa".into(), "bb".into()],
            actual: "cc".into(),
        };
        let message = err.to_string();
        assert!(message.contains("a@1.0::IFoo"));
        assert!(message.contains("aa, bb"));
        assert!(message.contains("cc"));
    }

    #[test]
    fn test_usage_classification() {
        assert!(CompileError::usage("bad").is_usage());
        assert!(CompileError::UnknownFormat("x".into()).is_usage());
        assert!(!CompileError::unresolved("Bar", "IFoo").is_usage());
    }
}
