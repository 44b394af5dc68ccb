//! Parser for `.hal` interface definition files
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with TokenKind
//!     ↓
//! Parser (recursive descent) → syntax::ast::SourceFile + SyntaxErrors
//! ```
//!
//! The parser never stops at the first error: it recovers at statement and
//! block boundaries and reports everything it found. Callers treat a file
//! with any error as rejected.

pub mod errors;
mod lexer;
#[allow(clippy::module_inception)]
mod parser;

pub use errors::{ErrorCode, ParseContext, SyntaxError};
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use parser::{Parse, parse};
