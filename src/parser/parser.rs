//! Recursive descent parser for `.hal` files
//!
//! Produces a raw [`SourceFile`] plus every syntax error found. The parser
//! recovers at `;` and `}` boundaries so one run reports as many errors as
//! possible; any error rejects the file as a whole.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::errors::{ErrorCode, ParseContext, SyntaxError, unexpected_in_context};
use super::lexer::{Lexer, Token, TokenKind};
use crate::syntax::ast::{
    Annotation, CompoundBody, ConstExpr, Declaration, DeclarationKind, EnumBody, EnumValueDecl,
    FieldDecl, InterfaceBody, MethodDecl, NameRef, SourceFile, TypeExpr,
};

/// Parse result: the tree and all errors.
#[derive(Debug, Clone)]
pub struct Parse {
    pub file: SourceFile,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse `.hal` source text.
pub fn parse(input: &str) -> Parse {
    let mut errors = Vec::new();
    let tokens: Vec<Token<'_>> = Lexer::new(input)
        .filter(|token| {
            if token.kind == TokenKind::Error {
                errors.push(SyntaxError::new(
                    format!("invalid character '{}'", token.text),
                    token.range,
                    ErrorCode::E0101,
                ));
                false
            } else {
                true
            }
        })
        .collect();

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        errors,
        eof: TextSize::of(input),
    };
    let file = parser.parse_source_file();
    Parse {
        file,
        errors: parser.errors,
    }
}

struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    errors: Vec<SyntaxError>,
    eof: TextSize,
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.nth(0) == Some(kind)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current_range(&self) -> TextRange {
        self.current()
            .map(|t| t.range)
            .unwrap_or_else(|| TextRange::empty(self.eof))
    }

    fn current_text(&self) -> &str {
        self.current().map(|t| t.text).unwrap_or("end of file")
    }

    /// End offset of the most recently consumed token.
    fn last_end(&self) -> TextSize {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .map(|t| t.range.end())
            .unwrap_or_default()
    }

    fn bump(&mut self) -> Option<&Token<'a>> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str, code: ErrorCode) -> bool {
        if self.eat(kind) {
            return true;
        }
        let message = format!("expected {}, found '{}'", what, self.current_text());
        self.errors
            .push(SyntaxError::new(message, self.current_range(), code));
        false
    }

    fn expect_ident(&mut self, what: &str) -> Option<(SmolStr, TextRange)> {
        if self.at(TokenKind::Ident) {
            let token = self.bump()?;
            return Some((SmolStr::new(token.text), token.range));
        }
        let message = format!("expected {}, found '{}'", what, self.current_text());
        self.errors
            .push(SyntaxError::new(message, self.current_range(), ErrorCode::E0301));
        None
    }

    fn error_unexpected(&mut self, context: ParseContext) {
        let err = unexpected_in_context(self.current_text(), context, self.current_range());
        self.errors.push(err);
    }

    /// Skip to the end of the current statement: past the next `;` at depth
    /// zero, or up to (not past) an unmatched `}`.
    fn recover(&mut self) {
        let mut depth = 0usize;
        while let Some(kind) = self.nth(0) {
            match kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                TokenKind::Semicolon if depth == 0 => {
                    self.pos += 1;
                    return;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    // =========================================================================
    // File structure
    // =========================================================================

    fn parse_source_file(&mut self) -> SourceFile {
        let mut file = SourceFile::default();

        if self.eat(TokenKind::PackageKw) {
            file.package = self.parse_name(false);
            if file.package.is_none() || !self.expect(TokenKind::Semicolon, "';'", ErrorCode::E0201)
            {
                self.recover();
            }
        } else {
            self.errors.push(
                SyntaxError::builder(ErrorCode::E0502)
                    .range(self.current_range())
                    .hint("start the file with 'package name@major.minor;'")
                    .build(),
            );
        }

        while self.eat(TokenKind::ImportKw) {
            match self.parse_name(false) {
                Some(name) => {
                    file.imports.push(name);
                    if !self.expect(TokenKind::Semicolon, "';'", ErrorCode::E0201) {
                        self.recover();
                    }
                }
                None => {
                    self.errors.push(SyntaxError::new(
                        "invalid import path",
                        self.current_range(),
                        ErrorCode::E0501,
                    ));
                    self.recover();
                }
            }
        }

        while !self.at_eof() {
            if self.at(TokenKind::RBrace) {
                self.error_unexpected(ParseContext::TopLevel);
                self.pos += 1;
                continue;
            }
            let annotations = self.parse_annotations();
            if let Some(decl) = self.parse_declaration(annotations, ParseContext::TopLevel) {
                file.declarations.push(decl);
            }
        }

        file
    }

    fn at_declaration_keyword(&self) -> bool {
        matches!(
            self.nth(0),
            Some(
                TokenKind::InterfaceKw
                    | TokenKind::StructKw
                    | TokenKind::UnionKw
                    | TokenKind::EnumKw
                    | TokenKind::TypedefKw
            )
        )
    }

    fn parse_declaration(
        &mut self,
        annotations: Vec<Annotation>,
        context: ParseContext,
    ) -> Option<Declaration> {
        let start = self.current_range().start();
        let keyword = self.nth(0);
        if keyword.is_some() {
            self.pos += 1;
        }

        let kind_and_name = match keyword {
            Some(TokenKind::InterfaceKw) => {
                if context != ParseContext::TopLevel {
                    self.errors.push(SyntaxError::new(
                        ErrorCode::E0306.default_message(),
                        self.current_range(),
                        ErrorCode::E0306,
                    ));
                }
                self.parse_interface()
            }
            Some(TokenKind::StructKw) => self
                .parse_compound()
                .map(|(name, body)| (name, DeclarationKind::Struct(body))),
            Some(TokenKind::UnionKw) => self
                .parse_compound()
                .map(|(name, body)| (name, DeclarationKind::Union(body))),
            Some(TokenKind::EnumKw) => self.parse_enum(),
            Some(TokenKind::TypedefKw) => self.parse_typedef(),
            _ => {
                if keyword.is_some() {
                    self.pos -= 1;
                }
                self.error_unexpected(context);
                if self.at_eof() {
                    return None;
                }
                self.pos += 1;
                self.recover();
                return None;
            }
        };

        let Some((name, kind)) = kind_and_name else {
            self.recover();
            return None;
        };

        if !self.expect(TokenKind::Semicolon, "';' after declaration", ErrorCode::E0201) {
            self.recover();
        }

        Some(Declaration {
            name,
            range: TextRange::new(start, self.last_end().max(start)),
            annotations,
            kind,
        })
    }

    fn parse_interface(&mut self) -> Option<(SmolStr, DeclarationKind)> {
        let (name, _) = self.expect_ident("interface name")?;
        let mut body = InterfaceBody::default();
        if self.eat(TokenKind::ExtendsKw) {
            body.extends = Some(self.parse_name(false)?);
        }
        let open = self.current_range();
        if !self.expect(TokenKind::LBrace, "'{'", ErrorCode::E0902) {
            return None;
        }

        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let annotations = self.parse_annotations();
            if self.at_declaration_keyword() {
                if let Some(decl) = self.parse_declaration(annotations, ParseContext::InterfaceBody)
                {
                    body.members.push(decl);
                }
            } else if self.at(TokenKind::OnewayKw)
                || (self.at(TokenKind::Ident) && self.nth(1) == Some(TokenKind::LParen))
            {
                match self.parse_method(annotations) {
                    Some(method) => body.methods.push(method),
                    None => self.recover(),
                }
            } else {
                self.error_unexpected(ParseContext::InterfaceBody);
                if !self.at(TokenKind::RBrace) {
                    self.pos += 1;
                    self.recover();
                }
            }
        }

        self.close_brace(open)?;
        Some((name, DeclarationKind::Interface(body)))
    }

    fn parse_compound(&mut self) -> Option<(SmolStr, CompoundBody)> {
        let (name, _) = self.expect_ident("type name")?;
        let open = self.current_range();
        if !self.expect(TokenKind::LBrace, "'{'", ErrorCode::E0902) {
            return None;
        }

        let mut body = CompoundBody::default();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let annotations = self.parse_annotations();
            if self.at_declaration_keyword() {
                if let Some(decl) = self.parse_declaration(annotations, ParseContext::CompoundBody) {
                    body.members.push(decl);
                }
                continue;
            }
            match self.parse_field() {
                Some(field) => {
                    body.fields.push(field);
                    if !self.expect(TokenKind::Semicolon, "';' after field", ErrorCode::E0201) {
                        self.recover();
                    }
                }
                None => self.recover(),
            }
        }

        self.close_brace(open)?;
        Some((name, body))
    }

    fn parse_enum(&mut self) -> Option<(SmolStr, DeclarationKind)> {
        let (name, _) = self.expect_ident("enum name")?;
        let storage = if self.eat(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let open = self.current_range();
        if !self.expect(TokenKind::LBrace, "'{'", ErrorCode::E0902) {
            return None;
        }

        let mut values = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let Some((value_name, range)) = self.expect_ident("enumerator") else {
                if !self.at(TokenKind::RBrace) {
                    self.pos += 1;
                }
                continue;
            };
            let value = if self.eat(TokenKind::Eq) {
                self.parse_const_expr()
            } else {
                None
            };
            values.push(EnumValueDecl {
                name: value_name,
                range,
                value,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        self.close_brace(open)?;
        Some((name, DeclarationKind::Enum(EnumBody { storage, values })))
    }

    fn parse_typedef(&mut self) -> Option<(SmolStr, DeclarationKind)> {
        let target = self.parse_type()?;
        let (name, _) = self.expect_ident("typedef name")?;
        Some((name, DeclarationKind::TypeDef(target)))
    }

    fn close_brace(&mut self, open: TextRange) -> Option<()> {
        if self.eat(TokenKind::RBrace) {
            return Some(());
        }
        self.errors.push(
            SyntaxError::builder(ErrorCode::E0202)
                .message("unclosed '{'")
                .range(TextRange::new(open.start(), self.current_range().end()))
                .hint("add '}' to close the body")
                .build(),
        );
        None
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn parse_method(&mut self, annotations: Vec<Annotation>) -> Option<MethodDecl> {
        let oneway = self.eat(TokenKind::OnewayKw);
        let (name, range) = self.expect_ident("method name")?;
        let args = self.parse_parameter_list()?;
        let results = if self.eat(TokenKind::GeneratesKw) {
            self.parse_parameter_list()?
        } else {
            Vec::new()
        };
        if !self.expect(TokenKind::Semicolon, "';' after method", ErrorCode::E0201) {
            self.recover();
        }
        Some(MethodDecl {
            name,
            range,
            annotations,
            oneway,
            args,
            results,
        })
    }

    fn parse_parameter_list(&mut self) -> Option<Vec<FieldDecl>> {
        if !self.expect(TokenKind::LParen, "'('", ErrorCode::E0902) {
            return None;
        }
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                params.push(self.parse_field()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        if !self.expect(TokenKind::RParen, "')'", ErrorCode::E0203) {
            return None;
        }
        Some(params)
    }

    fn parse_field(&mut self) -> Option<FieldDecl> {
        let ty = self.parse_type()?;
        let (name, range) = self.expect_ident("field name")?;
        Some(FieldDecl { name, range, ty })
    }

    fn parse_type(&mut self) -> Option<TypeExpr> {
        let start = self.current_range().start();
        let base = if self.eat(TokenKind::VecKw) {
            if !self.expect(TokenKind::LAngle, "'<'", ErrorCode::E0902) {
                return None;
            }
            let element = self.parse_type()?;
            if !self.expect(TokenKind::RAngle, "'>'", ErrorCode::E0204) {
                return None;
            }
            TypeExpr::Vector {
                element: Box::new(element),
                range: TextRange::new(start, self.last_end()),
            }
        } else if self.at(TokenKind::Ident) || self.at(TokenKind::At) {
            TypeExpr::Named(self.parse_name(false)?)
        } else {
            self.errors.push(SyntaxError::new(
                format!("expected type, found '{}'", self.current_text()),
                self.current_range(),
                ErrorCode::E0305,
            ));
            return None;
        };

        let mut dims = Vec::new();
        while self.eat(TokenKind::LBracket) {
            dims.push(self.parse_array_length()?);
            if !self.expect(TokenKind::RBracket, "']'", ErrorCode::E0204) {
                return None;
            }
        }

        // `T[2][3]` is two arrays of three elements: innermost dimension last.
        let range = TextRange::new(start, self.last_end());
        Some(dims.into_iter().rev().fold(base, |element, len| TypeExpr::Array {
            element: Box::new(element),
            len,
            range,
        }))
    }

    fn parse_array_length(&mut self) -> Option<u32> {
        let range = self.current_range();
        let len = self
            .current()
            .filter(|t| t.kind == TokenKind::Integer)
            .and_then(|t| parse_integer(t.text))
            .and_then(|v| u32::try_from(v).ok())
            .filter(|&v| v > 0);
        match len {
            Some(len) => {
                self.pos += 1;
                Some(len)
            }
            None => {
                self.errors.push(SyntaxError::new(
                    "array length must be a positive integer",
                    range,
                    ErrorCode::E0104,
                ));
                None
            }
        }
    }

    fn parse_const_expr(&mut self) -> Option<ConstExpr> {
        if let Some(token) = self.current().filter(|t| t.kind == TokenKind::Integer) {
            let range = token.range;
            let Some(value) = parse_integer(token.text) else {
                self.errors.push(SyntaxError::new(
                    format!("integer literal '{}' out of range", token.text),
                    range,
                    ErrorCode::E0104,
                ));
                self.pos += 1;
                return None;
            };
            self.pos += 1;
            return Some(ConstExpr::Literal { value, range });
        }
        if self.at(TokenKind::Ident) || self.at(TokenKind::At) {
            return self.parse_name(true).map(ConstExpr::Reference);
        }
        self.errors.push(SyntaxError::new(
            format!("expected constant, found '{}'", self.current_text()),
            self.current_range(),
            ErrorCode::E0401,
        ));
        None
    }

    // =========================================================================
    // Names and annotations
    // =========================================================================

    /// `a.b@1.0::Name.Nested`, any prefix optional; with `allow_value`, a
    /// trailing `:VALUE`.
    fn parse_name(&mut self, allow_value: bool) -> Option<NameRef> {
        let start = self.current_range().start();
        let mut text = String::new();

        if self.at(TokenKind::Ident) {
            self.push_dotted(&mut text);
        }

        if self.at(TokenKind::At) && self.nth(1) == Some(TokenKind::Version) {
            self.pos += 1;
            let version = self.bump().map(|t| t.text).unwrap_or_default();
            text.push('@');
            text.push_str(version);
            if self.eat(TokenKind::ColonColon) {
                text.push_str("::");
                if !self.at(TokenKind::Ident) {
                    self.expect_ident("name after '::'")?;
                }
                self.push_dotted(&mut text);
            }
        }

        if text.is_empty() {
            self.expect_ident("name")?;
            return None;
        }

        if allow_value && self.at(TokenKind::Colon) && self.nth(1) == Some(TokenKind::Ident) {
            self.pos += 1;
            let value = self.bump().map(|t| t.text).unwrap_or_default();
            text.push(':');
            text.push_str(value);
        }

        Some(NameRef {
            text: SmolStr::new(text),
            range: TextRange::new(start, self.last_end()),
        })
    }

    fn push_dotted(&mut self, text: &mut String) {
        if let Some(token) = self.bump() {
            text.push_str(token.text);
        }
        while self.at(TokenKind::Dot) && self.nth(1) == Some(TokenKind::Ident) {
            self.pos += 1;
            if let Some(token) = self.bump() {
                text.push('.');
                text.push_str(token.text);
            }
        }
    }

    fn parse_annotations(&mut self) -> Vec<Annotation> {
        let mut annotations = Vec::new();
        while self.at(TokenKind::At) && self.nth(1) == Some(TokenKind::Ident) {
            let start = self.current_range().start();
            self.pos += 1;
            let name = self.bump().map(|t| SmolStr::new(t.text)).unwrap_or_default();
            let mut params = Vec::new();
            if self.eat(TokenKind::LParen) {
                while !self.at(TokenKind::RParen) && !self.at_eof() {
                    let Some((key, _)) = self.expect_ident("annotation parameter") else {
                        self.pos += 1;
                        continue;
                    };
                    if !self.expect(TokenKind::Eq, "'='", ErrorCode::E0902) {
                        break;
                    }
                    match self.current().map(|t| (t.kind, t.text)) {
                        Some((TokenKind::String, text)) => {
                            let unquoted = &text[1..text.len() - 1];
                            params.push((key, SmolStr::new(unquoted)));
                            self.pos += 1;
                        }
                        Some((TokenKind::Integer | TokenKind::Ident, text)) => {
                            params.push((key, SmolStr::new(text)));
                            self.pos += 1;
                        }
                        _ => {
                            self.error_unexpected(ParseContext::Annotation);
                            break;
                        }
                    }
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen, "')'", ErrorCode::E0203);
            }
            annotations.push(Annotation {
                name,
                params,
                range: TextRange::new(start, self.last_end()),
            });
        }
        annotations
    }
}

/// Decimal or `0x` hex, optionally negative.
fn parse_integer(text: &str) -> Option<i128> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i128::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i128>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> SourceFile {
        let result = parse(source);
        assert!(result.ok(), "unexpected errors: {:?}", result.errors);
        result.file
    }

    #[test]
    fn test_parse_interface_with_methods() {
        let file = parse_ok(
            r#"
            package test@1.0;
            import other@2.0::IBar;
            interface IFoo extends IBase {
                oneway doThing();
                get(int32_t id) generates (string name, vec<uint8_t> data);
            };
            "#,
        );

        assert_eq!(file.package.as_ref().unwrap().text, "test@1.0");
        assert_eq!(file.imports[0].text, "other@2.0::IBar");
        let iface = file.interface().unwrap();
        assert_eq!(iface.name, "IFoo");
        let DeclarationKind::Interface(body) = &iface.kind else {
            panic!("expected interface");
        };
        assert_eq!(body.extends.as_ref().unwrap().text, "IBase");
        assert_eq!(body.methods.len(), 2);
        assert!(body.methods[0].oneway);
        assert_eq!(body.methods[1].args[0].name, "id");
        assert_eq!(body.methods[1].results.len(), 2);
    }

    #[test]
    fn test_parse_types_file() {
        let file = parse_ok(
            r#"
            package test@1.0;
            @export
            enum Color : uint8_t { RED, GREEN = 3, BLUE = Color:RED, };
            struct Point { int32_t x; int32_t[2][3] grid; struct Inner { bool b; }; };
            union Blob { int32_t i; float f; };
            typedef vec<Point> Points;
            "#,
        );

        assert_eq!(file.declarations.len(), 4);
        assert_eq!(file.declarations[0].annotations[0].name, "export");
        let DeclarationKind::Enum(body) = &file.declarations[0].kind else {
            panic!("expected enum");
        };
        assert_eq!(body.values.len(), 3);
        assert!(matches!(body.values[1].value, Some(ConstExpr::Literal { value: 3, .. })));
        assert!(matches!(&body.values[2].value, Some(ConstExpr::Reference(n)) if n.text == "Color:RED"));

        let DeclarationKind::Struct(point) = &file.declarations[1].kind else {
            panic!("expected struct");
        };
        assert_eq!(point.members.len(), 1);
        let TypeExpr::Array { len, element, .. } = &point.fields[1].ty else {
            panic!("expected array");
        };
        assert_eq!(*len, 2);
        assert!(matches!(element.as_ref(), TypeExpr::Array { len: 3, .. }));
    }

    #[test]
    fn test_parse_annotation_params() {
        let file = parse_ok(
            r#"
            package test@1.0;
            @export(name="color_t", value_prefix="COLOR_")
            enum Color : int32_t { RED };
            "#,
        );
        let params = &file.declarations[0].annotations[0].params;
        assert_eq!(params[0], (SmolStr::new("name"), SmolStr::new("color_t")));
        assert_eq!(params[1].1, "COLOR_");
    }

    #[test]
    fn test_missing_semicolon_is_reported_and_recovered() {
        let result = parse(
            r#"
            package test@1.0;
            struct A { int32_t x }
            struct B { int32_t y; };
            "#,
        );
        assert!(!result.ok());
        assert!(result.errors.iter().any(|e| e.code == ErrorCode::E0201));
        assert!(result.file.declarations.iter().any(|d| d.name == "B"));
    }

    #[test]
    fn test_missing_package_is_reported() {
        let result = parse("struct A { int32_t x; };");
        assert_eq!(result.errors[0].code, ErrorCode::E0502);
    }

    #[test]
    fn test_nested_interface_is_rejected() {
        let result = parse("package p@1.0; struct S { interface IBad {}; };");
        assert!(result.errors.iter().any(|e| e.code == ErrorCode::E0306));
    }

    #[test]
    fn test_unclosed_brace_terminates() {
        let result = parse("package p@1.0; interface IFoo { ping();");
        assert!(result.errors.iter().any(|e| e.code == ErrorCode::E0202));
    }

    #[test]
    fn test_parse_integer_forms() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("-7"), Some(-7));
        assert_eq!(parse_integer("0xff"), Some(255));
        assert_eq!(parse_integer("0x"), None);
    }
}
