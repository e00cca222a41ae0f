//! Lexer
//!
//!     Source text becomes a flat stream of `(Token, byte range)` pairs. The ranges
//!     are only used for error reporting; the parser works on the tokens alone.
//!
//! Token Filters
//!
//!     Between tokenization and parsing, every token is offered to a [TokenFilter].
//!     Filters see the token together with its channel and either keep it, drop it
//!     or fail the whole run. This is where policy about preprocessor directives
//!     lives: the parser itself accepts any directive, so whatever the filter lets
//!     through ends up in the tree.

use crate::error::PatchError;
use crate::glsl::token::{Channel, Token};
use logos::Logos;
use std::ops::Range;

/// Flat token stream with source byte ranges
pub type TokenStream = Vec<(Token, Range<usize>)>;

/// Tokenize source code with location information
///
/// Unlike a permissive lexer, characters that cannot start any GLSL token are
/// reported as a syntax error rather than skipped.
pub fn tokenize(source: &str) -> Result<TokenStream, PatchError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                return Err(PatchError::syntax(
                    lexer.span().start,
                    format!("unexpected input `{}`", lexer.slice()),
                ))
            }
        }
    }

    Ok(tokens)
}

/// Decides which tokens reach the parser
///
/// `Ok(true)` keeps the token, `Ok(false)` silently drops it and an error
/// aborts tokenization.
pub trait TokenFilter: Send + Sync {
    fn check(&self, token: &Token) -> Result<bool, PatchError>;
}

/// Keeps every token
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl TokenFilter for AcceptAll {
    fn check(&self, _token: &Token) -> Result<bool, PatchError> {
        Ok(true)
    }
}

/// Denies every token delivered on one channel
#[derive(Debug, Clone, Copy)]
pub struct ChannelFilter {
    channel: Channel,
}

impl ChannelFilter {
    pub fn new(channel: Channel) -> Self {
        ChannelFilter { channel }
    }
}

impl TokenFilter for ChannelFilter {
    fn check(&self, token: &Token) -> Result<bool, PatchError> {
        Ok(token.channel() != self.channel)
    }
}

/// Run a token stream through a filter
pub fn filter_tokens(
    tokens: TokenStream,
    filter: &dyn TokenFilter,
) -> Result<TokenStream, PatchError> {
    let mut kept = Vec::with_capacity(tokens.len());
    for (token, span) in tokens {
        if filter.check(&token)? {
            kept.push((token, span));
        }
    }
    Ok(kept)
}
