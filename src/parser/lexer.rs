//! Logos-based lexer for `.hal` files
//!
//! Whitespace and comments are skipped; every other byte sequence becomes a
//! token, with unknown characters reported as `TokenKind::Error`.

use logos::Logos;
use text_size::{TextRange, TextSize};

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub range: TextRange,
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(input),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.inner.next()?;
        let span = self.inner.span();
        let range = TextRange::new(
            TextSize::new(span.start as u32),
            TextSize::new(span.end as u32),
        );
        Some(Token {
            kind: result.unwrap_or(TokenKind::Error),
            text: self.inner.slice(),
            range,
        })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum TokenKind {
    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("package")]
    PackageKw,
    #[token("import")]
    ImportKw,
    #[token("interface")]
    InterfaceKw,
    #[token("extends")]
    ExtendsKw,
    #[token("struct")]
    StructKw,
    #[token("union")]
    UnionKw,
    #[token("enum")]
    EnumKw,
    #[token("typedef")]
    TypedefKw,
    #[token("oneway")]
    OnewayKw,
    #[token("generates")]
    GeneratesKw,
    #[token("vec")]
    VecKw,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+\.[0-9]+")]
    Version,

    #[regex(r"-?(0[xX][0-9a-fA-F]+|[0-9]+)")]
    Integer,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("::")]
    ColonColon,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("@")]
    At,
    #[token("=")]
    Eq,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,

    /// Anything the lexer does not recognise.
    Error,
}

impl TokenKind {
    /// Keywords that may also appear as name components (`types`, package
    /// segments) are not reserved; only these are.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::PackageKw
                | Self::ImportKw
                | Self::InterfaceKw
                | Self::ExtendsKw
                | Self::StructKw
                | Self::UnionKw
                | Self::EnumKw
                | Self::TypedefKw
                | Self::OnewayKw
                | Self::GeneratesKw
                | Self::VecKw
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_qualified_name_tokens() {
        assert_eq!(
            kinds("android.hardware@1.0::IFoo"),
            vec![
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::At,
                TokenKind::Version,
                TokenKind::ColonColon,
                TokenKind::Ident,
            ]
        );
    }

    #[test]
    fn test_keywords_and_prefix_identifiers() {
        assert_eq!(
            kinds("interface interfaces vec vector"),
            vec![
                TokenKind::InterfaceKw,
                TokenKind::Ident,
                TokenKind::VecKw,
                TokenKind::Ident,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("// line\n/* block ** comment */ oneway"),
            vec![TokenKind::OnewayKw]
        );
    }

    #[test]
    fn test_integer_literals() {
        let tokens = tokenize("-1 0x1F 42");
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Integer));
        assert_eq!(tokens[1].text, "0x1F");
    }

    #[test]
    fn test_ranges_are_byte_offsets() {
        let tokens = tokenize("  enum");
        assert_eq!(tokens[0].range, TextRange::new(2.into(), 6.into()));
    }

    #[test]
    fn test_unknown_character_is_error() {
        assert_eq!(kinds("$"), vec![TokenKind::Error]);
    }
}
