//! Declaration-level parser
//!
//! The parser walks the token stream once, splitting it into external
//! declarations by bracket depth. Global variable declarations are broken down
//! into qualifiers, type and declarators; anything that does not fit that shape
//! (structs, interface blocks, precision statements, prototypes) is kept as a
//! token run. Function bodies are split into top-level statements.
//!
//! Directives are accepted wherever a declaration may start. `#version` is only
//! accepted before the first declaration.

use crate::error::PatchError;
use crate::glsl::ast::{
    Declaration, Declarator, Directive, ExternalDeclaration, FunctionDefinition, Profile,
    Qualifier, Statement, TranslationUnit, TypeSpecifier, VariableDeclaration, VersionStatement,
};
use crate::glsl::lexing::{tokenize, TokenStream};
use crate::glsl::token::{DirectiveKind, Token};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s*version\s+(\d+)(?:\s+([A-Za-z]+))?\s*$").unwrap());

/// Parse a complete shader without any token filtering
pub fn parse(source: &str) -> Result<TranslationUnit, PatchError> {
    parse_tokens(tokenize(source)?)
}

/// Parse an already tokenized (and possibly filtered) stream
pub fn parse_tokens(stream: TokenStream) -> Result<TranslationUnit, PatchError> {
    let (tokens, spans): (Vec<Token>, Vec<Range<usize>>) = stream.into_iter().unzip();
    let parser = DeclarationParser {
        tokens: &tokens,
        spans: &spans,
    };
    parser.translation_unit()
}

/// Parse a snippet of global declarations, e.g. `uniform mat4 m; out vec4 c;`
pub fn parse_snippet_declarations(source: &str) -> Result<Vec<ExternalDeclaration>, PatchError> {
    Ok(parse(source)?.declarations)
}

/// Parse a snippet of function-body statements
pub fn parse_statements(source: &str) -> Result<Vec<Statement>, PatchError> {
    let tokens: Vec<Token> = tokenize(source)?.into_iter().map(|(t, _)| t).collect();
    split_statements(&tokens, 0)
}

/// Tokenize an expression snippet
pub fn parse_expression(source: &str) -> Result<Vec<Token>, PatchError> {
    Ok(tokenize(source)?.into_iter().map(|(t, _)| t).collect())
}

struct DeclarationParser<'a> {
    tokens: &'a [Token],
    spans: &'a [Range<usize>],
}

impl<'a> DeclarationParser<'a> {
    fn offset(&self, index: usize) -> usize {
        self.spans
            .get(index)
            .map(|span| span.start)
            .or_else(|| self.spans.last().map(|span| span.end))
            .unwrap_or(0)
    }

    fn error(&self, index: usize, message: impl Into<String>) -> PatchError {
        PatchError::syntax(self.offset(index), message)
    }

    fn translation_unit(&self) -> Result<TranslationUnit, PatchError> {
        let mut unit = TranslationUnit::default();
        let mut index = 0;

        while index < self.tokens.len() {
            match &self.tokens[index] {
                Token::Directive(text) => {
                    if DirectiveKind::of(text) == DirectiveKind::Version {
                        if unit.version.is_some() || !unit.declarations.is_empty() {
                            return Err(self.error(index, "#version must be the first statement"));
                        }
                        unit.version = Some(self.version(index, text)?);
                    } else {
                        unit.declarations
                            .push(ExternalDeclaration::Directive(Directive { text: text.clone() }));
                    }
                    index += 1;
                }
                Token::Semicolon => index += 1,
                _ => {
                    let (declaration, next) = self.external_declaration(index)?;
                    unit.declarations.push(declaration);
                    index = next;
                }
            }
        }

        Ok(unit)
    }

    fn version(&self, index: usize, text: &str) -> Result<VersionStatement, PatchError> {
        let caps = VERSION
            .captures(text)
            .ok_or_else(|| self.error(index, format!("malformed version directive `{}`", text)))?;
        let number = caps[1]
            .parse::<u32>()
            .map_err(|_| self.error(index, format!("version number out of range in `{}`", text)))?;
        let profile = match caps.get(2) {
            Some(word) => Some(Profile::parse(word.as_str()).ok_or_else(|| {
                self.error(index, format!("unknown profile `{}`", word.as_str()))
            })?),
            None => None,
        };
        Ok(VersionStatement { number, profile })
    }

    /// Parse one declaration or function definition starting at `start`.
    /// Returns the declaration and the index after it.
    fn external_declaration(
        &self,
        start: usize,
    ) -> Result<(ExternalDeclaration, usize), PatchError> {
        let mut depth = 0usize;

        for index in start..self.tokens.len() {
            let token = &self.tokens[index];
            match token {
                Token::Directive(_) => {
                    return Err(
                        self.error(index, "directives are only allowed between declarations")
                    );
                }
                Token::LeftBrace
                    if depth == 0 && index > start && self.tokens[index - 1] == Token::RightParen =>
                {
                    let close = self.matching(index)?;
                    let function = self.function_definition(start, index, close)?;
                    return Ok((ExternalDeclaration::Function(function), close + 1));
                }
                Token::Semicolon if depth == 0 => {
                    let tokens = &self.tokens[start..index];
                    let declaration = match variable_declaration(tokens) {
                        Some(variable) => Declaration::Variable(variable),
                        None => Declaration::Other(tokens.to_vec()),
                    };
                    return Ok((ExternalDeclaration::Declaration(declaration), index + 1));
                }
                t if t.opens() => depth += 1,
                t if t.closes() => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| self.error(index, format!("unbalanced `{}`", t)))?;
                }
                _ => {}
            }
        }

        Err(self.error(self.tokens.len(), "unexpected end of input, expected `;`"))
    }

    fn matching(&self, open: usize) -> Result<usize, PatchError> {
        matching_close(self.tokens, open)
            .ok_or_else(|| self.error(open, format!("unclosed `{}`", self.tokens[open])))
    }

    fn function_definition(
        &self,
        start: usize,
        open_brace: usize,
        close_brace: usize,
    ) -> Result<FunctionDefinition, PatchError> {
        let header = &self.tokens[start..open_brace];
        let close_paren = header.len() - 1;
        let open_paren = matching_open(header, close_paren)
            .ok_or_else(|| self.error(start, "malformed function header"))?;

        let name = match open_paren.checked_sub(1).map(|i| &header[i]) {
            Some(Token::Identifier(name)) if open_paren > 1 => name.clone(),
            _ => return Err(self.error(start, "expected a function name before `(`")),
        };

        let body = split_statements(
            &self.tokens[open_brace + 1..close_brace],
            self.offset(open_brace),
        )?;

        Ok(FunctionDefinition {
            return_type: header[..open_paren - 1].to_vec(),
            name,
            parameters: header[open_paren + 1..close_paren].to_vec(),
            body,
        })
    }
}

/// Index of the bracket closing the one at `open`
pub(crate) fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        if token.opens() {
            depth += 1;
        } else if token.closes() {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
    }
    None
}

fn matching_open(tokens: &[Token], close: usize) -> Option<usize> {
    let mut depth = 0usize;
    for index in (0..=close).rev() {
        let token = &tokens[index];
        if token.closes() {
            depth += 1;
        } else if token.opens() {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
    }
    None
}

/// Statement kinds whose closing brace ends the statement
const BLOCK_STARTERS: &[&str] = &["if", "else", "for", "while", "do", "switch"];

/// Split a function body into top-level statements
pub(crate) fn split_statements(
    tokens: &[Token],
    offset: usize,
) -> Result<Vec<Statement>, PatchError> {
    let mut statements = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut depth = 0usize;

    for (index, token) in tokens.iter().enumerate() {
        if let Token::Directive(text) = token {
            return Err(PatchError::syntax(
                offset,
                format!("directive `{}` inside a function body", text),
            ));
        }
        if token.opens() {
            depth += 1;
        } else if token.closes() {
            depth = depth
                .checked_sub(1)
                .ok_or_else(|| PatchError::syntax(offset, format!("unbalanced `{}`", token)))?;
        }
        current.push(token.clone());

        if depth > 0 {
            continue;
        }
        let ends = match token {
            Token::Semicolon => true,
            Token::RightBrace => match current.first() {
                Some(Token::LeftBrace) => true,
                Some(Token::Identifier(word)) => BLOCK_STARTERS.contains(&word.as_str()),
                _ => false,
            },
            _ => false,
        };
        if !ends {
            continue;
        }

        let next = tokens.get(index + 1);
        let continues = next.is_some_and(|t| t.is_identifier("else"))
            || (next.is_some_and(|t| t.is_identifier("while"))
                && current.first().is_some_and(|t| t.is_identifier("do"))
                && *token == Token::RightBrace);
        if !continues {
            statements.push(Statement {
                tokens: std::mem::take(&mut current),
            });
        }
    }

    if depth > 0 || !current.is_empty() {
        return Err(PatchError::syntax(offset, "incomplete statement at end of block"));
    }

    Ok(statements)
}

/// Try to read a plain variable declaration (without the trailing `;`)
fn variable_declaration(tokens: &[Token]) -> Option<VariableDeclaration> {
    let mut index = 0;

    let layout = match tokens {
        [Token::Identifier(word), Token::LeftParen, ..] if word == "layout" => {
            let close = matching_close(tokens, 1)?;
            index = close + 1;
            Some(tokens[..index].to_vec())
        }
        _ => None,
    };

    let mut qualifiers = Vec::new();
    while let Some(qualifier) = tokens
        .get(index)
        .and_then(Token::as_identifier)
        .and_then(Qualifier::parse)
    {
        qualifiers.push(qualifier);
        index += 1;
    }

    let name = tokens.get(index)?.as_identifier()?;
    if matches!(name, "struct" | "precision" | "layout") {
        return None;
    }
    index += 1;
    let ty = TypeSpecifier {
        name: name.to_string(),
        array: array_suffix(tokens, &mut index)?,
    };

    let mut declarators = Vec::new();
    loop {
        let name = tokens.get(index)?.as_identifier()?.to_string();
        index += 1;
        let array = array_suffix(tokens, &mut index)?;
        let initializer = if tokens.get(index) == Some(&Token::Assign) {
            let begin = index + 1;
            let end = top_level_comma(tokens, begin).unwrap_or(tokens.len());
            if end == begin {
                return None;
            }
            index = end;
            Some(tokens[begin..end].to_vec())
        } else {
            None
        };
        declarators.push(Declarator {
            name,
            array,
            initializer,
        });

        match tokens.get(index) {
            None => break,
            Some(Token::Comma) => index += 1,
            Some(_) => return None,
        }
    }

    Some(VariableDeclaration {
        layout,
        qualifiers,
        ty,
        declarators,
    })
}

/// Reads an optional `[...]` at `index`. `None` means malformed, `Some(None)`
/// means no suffix.
fn array_suffix(tokens: &[Token], index: &mut usize) -> Option<Option<Vec<Token>>> {
    if tokens.get(*index) != Some(&Token::LeftBracket) {
        return Some(None);
    }
    let close = matching_close(tokens, *index)?;
    let suffix = tokens[*index..=close].to_vec();
    *index = close + 1;
    Some(Some(suffix))
}

fn top_level_comma(tokens: &[Token], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(start) {
        if token.opens() {
            depth += 1;
        } else if token.closes() {
            depth = depth.saturating_sub(1);
        } else if *token == Token::Comma && depth == 0 {
            return Some(index);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glsl::ast::StorageQualifier;

    fn variable(unit: &TranslationUnit, position: usize) -> &VariableDeclaration {
        match &unit.declarations[position] {
            ExternalDeclaration::Declaration(Declaration::Variable(var)) => var,
            other => panic!("expected a variable declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_version_and_profile() {
        let unit = parse("#version 150 compatibility\nvoid main(){}").unwrap();
        assert_eq!(
            unit.version,
            Some(VersionStatement {
                number: 150,
                profile: Some(Profile::Compatibility)
            })
        );
        assert_eq!(unit.declarations.len(), 1);
    }

    #[test]
    fn test_version_with_trailing_comment() {
        let unit = parse("#version 120 // legacy pack\nvoid main(){}").unwrap();
        assert_eq!(
            unit.version,
            Some(VersionStatement {
                number: 120,
                profile: None
            })
        );

        let unit = parse("#version 330 core /* x */\nvoid main(){}").unwrap();
        assert_eq!(
            unit.version,
            Some(VersionStatement {
                number: 330,
                profile: Some(Profile::Core)
            })
        );
        assert_eq!(unit.declarations.len(), 1);
    }

    #[test]
    fn test_version_after_declaration_is_rejected() {
        let err = parse("float x;\n#version 330\n").unwrap_err();
        assert!(matches!(err, PatchError::Syntax { .. }));
    }

    #[test]
    fn test_variable_declaration_parts() {
        let unit = parse("layout(location = 0) flat out vec4 a[2], b = vec4(1.0, 2.0, 3.0, 4.0);").unwrap();
        let var = variable(&unit, 0);
        assert!(var.layout.is_some());
        assert_eq!(var.storage(), Some(StorageQualifier::Out));
        assert_eq!(var.qualifiers.len(), 2);
        assert_eq!(var.ty.name, "vec4");
        assert_eq!(var.declarators.len(), 2);
        assert_eq!(var.declarators[0].name, "a");
        assert!(var.declarators[0].array.is_some());
        assert_eq!(var.declarators[1].name, "b");
        // the commas inside the constructor call do not split declarators
        assert_eq!(var.declarators[1].initializer.as_ref().unwrap().len(), 10);
    }

    #[test]
    fn test_non_variable_declarations_are_kept_as_tokens() {
        let unit = parse(
            "precision highp float;\nstruct S { float a; };\nuniform Block { mat4 m; } blk;\nvoid f(int x);\nlayout(triangles) in;",
        )
        .unwrap();
        assert_eq!(unit.declarations.len(), 5);
        for declaration in &unit.declarations {
            assert!(matches!(
                declaration,
                ExternalDeclaration::Declaration(Declaration::Other(_))
            ));
        }
    }

    #[test]
    fn test_function_definition() {
        let unit = parse("vec4 shade(in vec2 uv, float k) { return vec4(uv, k, 1.0); }").unwrap();
        let function = unit.function("shade").unwrap();
        assert_eq!(function.return_type, vec![Token::identifier("vec4")]);
        assert_eq!(function.parameters.len(), 6);
        assert_eq!(function.body.len(), 1);
    }

    #[test]
    fn test_statement_splitting() {
        let unit = parse(
            "void main() { float a = 1.0; if (a > 0.0) { a = 2.0; } else a = 3.0; for (int i = 0; i < 2; i++) { a += 1.0; } do { a -= 1.0; } while (a > 0.0); { a = 0.0; } }",
        )
        .unwrap();
        let body = &unit.function("main").unwrap().body;
        assert_eq!(body.len(), 5);
        assert!(body[1].tokens.last() == Some(&Token::Semicolon));
        assert!(body[3].tokens.first().unwrap().is_identifier("do"));
    }

    #[test]
    fn test_directives_between_declarations() {
        let unit = parse("#version 120\n#extension GL_EXT_gpu_shader4 : enable\nfloat x;\n#pragma optimize(on)\n").unwrap();
        assert_eq!(unit.declarations.len(), 3);
        assert!(matches!(unit.declarations[2], ExternalDeclaration::Directive(_)));
    }

    #[test]
    fn test_unterminated_declaration() {
        let err = parse("uniform float x").unwrap_err();
        assert!(matches!(err, PatchError::Syntax { offset: 15, .. }));
    }

    #[test]
    fn test_unbalanced_braces() {
        assert!(parse("void main() { ").is_err());
        assert!(parse("float x = ));").is_err());
    }

    #[test]
    fn test_snippet_helpers() {
        let declarations = parse_snippet_declarations("uniform mat4 m; out vec4 c;").unwrap();
        assert_eq!(declarations.len(), 2);
        let statements = parse_statements("a = 1; b(); { c = 2; }").unwrap();
        assert_eq!(statements.len(), 3);
        assert_eq!(parse_expression("vec4(0.0)").unwrap().len(), 4);
    }
}
