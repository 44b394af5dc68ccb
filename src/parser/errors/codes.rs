//! Error codes for parser diagnostics
//!
//! `E{category}{number}`:
//! - E01xx: lexical
//! - E02xx: delimiters and terminators
//! - E03xx: declarations
//! - E04xx: constant expressions
//! - E05xx: package and imports
//! - E09xx: anything else

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Character no token starts with
    E0101,
    /// Integer literal that does not parse or is out of range
    E0104,

    /// Missing `;`
    E0201,
    /// `{` never closed
    E0202,
    /// `(` never closed
    E0203,
    /// `[` or `<` never closed
    E0204,

    /// Missing name
    E0301,
    /// Missing type
    E0305,
    /// `interface` below the top level
    E0306,

    /// Enumerator value that is neither a literal nor a reference
    E0401,

    /// Import that is not `pkg@M.m` or `pkg@M.m::Name`
    E0501,
    /// File without a `package` statement
    E0502,

    /// Token that does not fit where it appears
    E0901,
    /// A specific token was required
    E0902,
}

impl ErrorCode {
    /// Message used when an error is built without one.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::E0101 => "invalid character",
            Self::E0104 => "invalid numeric literal",
            Self::E0201 => "missing semicolon",
            Self::E0202 => "unclosed brace",
            Self::E0203 => "unclosed parenthesis",
            Self::E0204 => "unclosed bracket",
            Self::E0301 => "missing identifier",
            Self::E0305 => "missing type",
            Self::E0306 => "interface must be declared at top level",
            Self::E0401 => "invalid constant expression",
            Self::E0501 => "invalid import path",
            Self::E0502 => "missing package statement",
            Self::E0901 => "unexpected token",
            Self::E0902 => "expected token",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Variant names are the codes.
        write!(f, "{self:?}")
    }
}
