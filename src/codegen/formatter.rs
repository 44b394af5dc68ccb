//! Indenting text writer shared by the backends.

use std::path::Path;

use crate::error::{CompileError, Result};

/// Indentation settings for generated text.
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Number of spaces per indentation level (or tab width if using tabs)
    pub tab_size: usize,
    /// Use spaces for indentation (false = use tabs)
    pub insert_spaces: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            tab_size: 4,
            insert_spaces: true,
        }
    }
}

impl FormatOptions {
    /// Generate indentation string for the given level
    pub fn indent(&self, level: usize) -> String {
        if self.insert_spaces {
            " ".repeat(self.tab_size * level)
        } else {
            "\t".repeat(level)
        }
    }
}

/// Line-oriented writer that prefixes every non-empty line with the current
/// indentation.
#[derive(Debug, Default)]
pub struct Formatter {
    out: String,
    level: usize,
    options: FormatOptions,
}

impl Formatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: FormatOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Write `text` followed by a newline. Embedded newlines start new,
    /// equally indented lines.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        for line in text.as_ref().split('\n') {
            if !line.is_empty() {
                self.out.push_str(&self.options.indent(self.level));
                self.out.push_str(line);
            }
            self.out.push('\n');
        }
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.level += 1;
        self
    }

    pub fn unindent(&mut self) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self
    }

    /// `open`, then `body` one level deeper, then `close`.
    pub fn block(
        &mut self,
        open: impl AsRef<str>,
        close: impl AsRef<str>,
        body: impl FnOnce(&mut Self),
    ) -> &mut Self {
        self.line(open);
        self.indent();
        body(self);
        self.unindent();
        self.line(close)
    }

    /// Run `body` one level deeper.
    pub fn indented(&mut self, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.indent();
        body(self);
        self.unindent()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Write a generated file, creating its parent directories.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CompileError::generation_io(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| CompileError::generation_io(path, e))?;
    tracing::info!(path = %path.display(), "wrote");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_indents_body() {
        let mut out = Formatter::new();
        out.block("struct Foo {", "};", |out| {
            out.line("int32_t a;");
            out.blank();
            out.line("int32_t b;");
        });
        assert_eq!(out.finish(), "struct Foo {\n    int32_t a;\n\n    int32_t b;\n};\n");
    }

    #[test]
    fn test_multiline_text_keeps_indentation() {
        let mut out = Formatter::with_options(FormatOptions {
            tab_size: 2,
            insert_spaces: true,
        });
        out.indented(|out| {
            out.line("a\n\nb");
        });
        assert_eq!(out.as_str(), "  a\n\n  b\n");
    }

    #[test]
    fn test_tabs() {
        let options = FormatOptions {
            tab_size: 4,
            insert_spaces: false,
        };
        assert_eq!(options.indent(2), "\t\t");
    }

    #[test]
    fn test_write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");
        write_file(&path, "hello").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }
}
