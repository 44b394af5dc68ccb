//! Syntax error values
//!
//! The parser collects these and keeps going, so one file can report
//! several. Any error at all rejects the file.

use text_size::{TextRange, TextSize};

use super::codes::ErrorCode;
use super::context::ParseContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
    pub code: ErrorCode,
    /// How to fix it, when there is an obvious fix.
    pub hint: Option<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            range,
            code,
            hint: None,
        }
    }

    pub fn builder(code: ErrorCode) -> SyntaxErrorBuilder {
        SyntaxErrorBuilder {
            code,
            message: None,
            range: None,
            hint: None,
        }
    }

    /// `E0201: missing semicolon`, followed by the hint on its own line.
    pub fn format(&self) -> String {
        match &self.hint {
            Some(hint) => format!("{}: {}\n  hint: {hint}", self.code, self.message),
            None => format!("{}: {}", self.code, self.message),
        }
    }
}

pub struct SyntaxErrorBuilder {
    code: ErrorCode,
    message: Option<String>,
    range: Option<TextRange>,
    hint: Option<String>,
}

impl SyntaxErrorBuilder {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn range(mut self, range: TextRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn build(self) -> SyntaxError {
        let message = self
            .message
            .unwrap_or_else(|| self.code.default_message().to_string());
        let range = self.range.unwrap_or(TextRange::empty(TextSize::new(0)));
        SyntaxError {
            hint: self.hint,
            ..SyntaxError::new(message, range, self.code)
        }
    }
}

/// A token that does not belong in `context`.
pub fn unexpected_in_context(found: &str, context: ParseContext, range: TextRange) -> SyntaxError {
    SyntaxError::new(
        format!(
            "unexpected '{found}' {}, expected {}",
            context.description(),
            context.expected_description()
        ),
        range,
        ErrorCode::E0901,
    )
}
