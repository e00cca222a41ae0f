//! Front-end stages
//!
//! [Tokenization] turns source text into a filtered token stream; [Parsing]
//! turns that stream into a tree.

use crate::error::PatchError;
use crate::glsl::ast::TranslationUnit;
use crate::glsl::lexing::{filter_tokens, tokenize, AcceptAll, TokenFilter, TokenStream};
use crate::glsl::parsing::parse_tokens;
use crate::transforms::Runnable;

/// Tokenization stage
///
/// # Input
/// - `String` - shader source
///
/// # Output
/// - `TokenStream` - tokens that passed the filter, with byte ranges
pub struct Tokenization {
    filter: Box<dyn TokenFilter>,
}

impl Tokenization {
    pub fn new() -> Self {
        Tokenization {
            filter: Box::new(AcceptAll),
        }
    }

    /// Tokenize and then run every token through `filter`
    pub fn with_filter(filter: Box<dyn TokenFilter>) -> Self {
        Tokenization { filter }
    }
}

impl Default for Tokenization {
    fn default() -> Self {
        Self::new()
    }
}

impl Runnable<String, TokenStream> for Tokenization {
    fn run(&self, input: String) -> Result<TokenStream, PatchError> {
        filter_tokens(tokenize(&input)?, self.filter.as_ref())
    }
}

/// Parsing stage: token stream to tree
pub struct Parsing;

impl Parsing {
    pub fn new() -> Self {
        Parsing
    }
}

impl Default for Parsing {
    fn default() -> Self {
        Self::new()
    }
}

impl Runnable<TokenStream, TranslationUnit> for Parsing {
    fn run(&self, input: TokenStream) -> Result<TranslationUnit, PatchError> {
        parse_tokens(input)
    }
}
