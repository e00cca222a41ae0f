//! Checks that run before any rewrite
//!
//! [PreprocessorGuard] sits in the tokenization stage and rejects directives the
//! parser does not consume. [check_reserved] runs on the identifier index of a
//! freshly parsed tree and rejects names the strategies reserve for themselves.

use crate::error::PatchError;
use crate::glsl::index::IdentifierIndex;
use crate::glsl::lexing::{ChannelFilter, TokenFilter};
use crate::glsl::token::{Channel, Token};

/// Name prefixes only injected code may use, in query order
pub const RESERVED_PREFIXES: [&str; 3] = ["iris_", "irisMain", "moj_import"];

/// Token filter that fails on any preprocessor-channel token
#[derive(Debug, Clone, Copy)]
pub struct PreprocessorGuard {
    channel: ChannelFilter,
}

impl PreprocessorGuard {
    pub fn new() -> Self {
        PreprocessorGuard {
            channel: ChannelFilter::new(Channel::Preprocessor),
        }
    }
}

impl Default for PreprocessorGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenFilter for PreprocessorGuard {
    fn check(&self, token: &Token) -> Result<bool, PatchError> {
        if self.channel.check(token)? {
            return Ok(true);
        }
        Err(PatchError::LexicalPolicy {
            directive: token.to_string(),
        })
    }
}

/// Fail on the first identifier inside the reserved namespace
pub fn check_reserved(index: &IdentifierIndex) -> Result<(), PatchError> {
    let violation = RESERVED_PREFIXES
        .iter()
        .find_map(|prefix| index.prefix_query(prefix).next());

    match violation {
        Some(name) => Err(PatchError::ReservedIdentifier {
            name: name.to_string(),
        }),
        None => Ok(()),
    }
}
