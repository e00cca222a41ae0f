//! Token definitions for GLSL source
//!
//! Tokens are produced by the logos derive macro. Whitespace and comments are
//! skipped by the lexer; everything else becomes a token that the printer can
//! write back verbatim.
//!
//! Directive lines (`#...`) are kept whole. `#version`, `#extension` and
//! `#pragma` are understood by the parser and live on the default channel; any
//! other directive is routed to the preprocessor channel, where token filters
//! decide its fate.

use logos::Logos;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

static DIRECTIVE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\s*([A-Za-z_]\w*)").unwrap());

/// All possible tokens in GLSL source text
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    // A whole directive line, including the leading '#', with comments removed
    #[regex(r"#[^\n]*", directive)]
    Directive(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"([0-9]+\.[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?([fF]|lf|LF)?", |lex| lex.slice().to_string())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+([fF]|lf|LF)?", |lex| lex.slice().to_string())]
    FloatConstant(String),

    #[regex(r"(0[xX][0-9a-fA-F]+|[0-9]+)[uU]?", |lex| lex.slice().to_string())]
    IntConstant(String),

    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("=")]
    Assign,

    #[regex(
        r"<<=|>>=|\+\+|--|<<|>>|<=|>=|==|!=|&&|\|\||\^\^|\+=|-=|\*=|/=|%=|&=|\|=|\^=|[-+*/%<>!~&|^?:]",
        |lex| lex.slice().to_string()
    )]
    Operator(String),
}

/// Lexer callback for directive lines
///
/// A block comment left open at the end of the line swallows the following
/// lines up to its terminator.
fn directive(lex: &mut logos::Lexer<Token>) -> String {
    let (text, open_comment) = strip_comments(lex.slice());
    if open_comment {
        let remainder = lex.remainder();
        let skip = remainder.find("*/").map_or(remainder.len(), |end| end + 2);
        lex.bump(skip);
    }
    text
}

/// Remove `//` and `/* */` comments from one directive line. The flag is set
/// when a block comment is still open at the end of the line.
fn strip_comments(line: &str) -> (String, bool) {
    let mut text = String::with_capacity(line.len());
    let mut rest = line;
    loop {
        let line_comment = rest.find("//");
        let block_comment = rest.find("/*");
        match (line_comment, block_comment) {
            (Some(start), block) if block.map_or(true, |block| start < block) => {
                text.push_str(&rest[..start]);
                return (text.trim_end().to_string(), false);
            }
            (_, Some(start)) => {
                text.push_str(&rest[..start]);
                match rest[start + 2..].find("*/") {
                    Some(end) => {
                        text.push(' ');
                        rest = &rest[start + 2 + end + 2..];
                    }
                    None => return (text.trim_end().to_string(), true),
                }
            }
            (None, None) => {
                text.push_str(rest);
                return (text.trim_end().to_string(), false);
            }
            (Some(_), None) => unreachable!("handled by the line-comment arm"),
        }
    }
}

/// Channel a token is delivered on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Default,
    Preprocessor,
}

/// Directive kinds the parser understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    Version,
    Extension,
    Pragma,
    /// Any other directive, by name (empty for the null directive)
    Other(String),
}

impl DirectiveKind {
    /// Classify a directive line such as `#  extension GL_foo : enable`
    pub fn of(text: &str) -> Self {
        let name = DIRECTIVE_NAME
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or("");
        match name {
            "version" => DirectiveKind::Version,
            "extension" => DirectiveKind::Extension,
            "pragma" => DirectiveKind::Pragma,
            other => DirectiveKind::Other(other.to_string()),
        }
    }

    /// Whether the parser consumes this directive itself
    pub fn is_parsed(&self) -> bool {
        !matches!(self, DirectiveKind::Other(_))
    }
}

impl Token {
    pub fn identifier(name: &str) -> Self {
        Token::Identifier(name.to_string())
    }

    pub fn channel(&self) -> Channel {
        match self {
            Token::Directive(text) if !DirectiveKind::of(text).is_parsed() => Channel::Preprocessor,
            _ => Channel::Default,
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Token::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.as_identifier() == Some(name)
    }

    /// Identifiers and numeric literals need separating whitespace between them
    pub fn is_word(&self) -> bool {
        matches!(
            self,
            Token::Identifier(_) | Token::FloatConstant(_) | Token::IntConstant(_)
        )
    }

    /// Operators that could fuse with a following operator when printed adjacently
    pub fn is_operator_like(&self) -> bool {
        matches!(self, Token::Operator(_) | Token::Assign)
    }

    /// Tokens that open a nesting level
    pub fn opens(&self) -> bool {
        matches!(self, Token::LeftParen | Token::LeftBracket | Token::LeftBrace)
    }

    /// Tokens that close a nesting level
    pub fn closes(&self) -> bool {
        matches!(
            self,
            Token::RightParen | Token::RightBracket | Token::RightBrace
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Directive(text)
            | Token::Identifier(text)
            | Token::FloatConstant(text)
            | Token::IntConstant(text)
            | Token::Operator(text) => f.write_str(text),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::LeftBracket => f.write_str("["),
            Token::RightBracket => f.write_str("]"),
            Token::LeftBrace => f.write_str("{"),
            Token::RightBrace => f.write_str("}"),
            Token::Semicolon => f.write_str(";"),
            Token::Comma => f.write_str(","),
            Token::Dot => f.write_str("."),
            Token::Assign => f.write_str("="),
        }
    }
}

/// Reserved words of the language. These are never indexed as identifiers.
pub static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // qualifiers
        "attribute", "const", "uniform", "varying", "buffer", "shared", "coherent", "volatile",
        "restrict", "readonly", "writeonly", "layout", "centroid", "flat", "smooth",
        "noperspective", "patch", "sample", "invariant", "precise", "in", "out", "inout",
        "lowp", "mediump", "highp", "precision", "subroutine",
        // control flow
        "break", "continue", "do", "for", "while", "switch", "case", "default", "if", "else",
        "discard", "return", "struct", "true", "false",
        // types
        "void", "bool", "int", "uint", "float", "double", "vec2", "vec3", "vec4", "dvec2",
        "dvec3", "dvec4", "bvec2", "bvec3", "bvec4", "ivec2", "ivec3", "ivec4", "uvec2",
        "uvec3", "uvec4", "mat2", "mat3", "mat4", "mat2x2", "mat2x3", "mat2x4", "mat3x2",
        "mat3x3", "mat3x4", "mat4x2", "mat4x3", "mat4x4", "dmat2", "dmat3", "dmat4",
        "sampler1D", "sampler2D", "sampler3D", "samplerCube", "sampler1DShadow",
        "sampler2DShadow", "samplerCubeShadow", "sampler1DArray", "sampler2DArray",
        "sampler1DArrayShadow", "sampler2DArrayShadow", "isampler1D", "isampler2D",
        "isampler3D", "isamplerCube", "isampler1DArray", "isampler2DArray", "usampler1D",
        "usampler2D", "usampler3D", "usamplerCube", "usampler1DArray", "usampler2DArray",
        "sampler2DRect", "sampler2DRectShadow", "isampler2DRect", "usampler2DRect",
        "samplerBuffer", "isamplerBuffer", "usamplerBuffer", "sampler2DMS", "isampler2DMS",
        "usampler2DMS", "sampler2DMSArray", "isampler2DMSArray", "usampler2DMSArray",
        "samplerCubeArray", "samplerCubeArrayShadow", "isamplerCubeArray",
        "usamplerCubeArray", "image1D", "image2D", "image3D", "imageCube", "image2DArray",
        "iimage2D", "uimage2D", "atomic_uint",
    ]
    .into_iter()
    .collect()
});

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(word)
}
