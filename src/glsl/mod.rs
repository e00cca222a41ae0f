//! GLSL front end
//!
//! Text goes in through [lexing] and [parsing], comes out through [printing].
//! In between, the patch strategies work on a [ast::TranslationUnit] through a
//! [root::Root] session, which keeps the [index::IdentifierIndex] in sync with
//! every mutation.

pub mod ast;
pub mod index;
pub mod lexing;
pub mod parsing;
pub mod printing;
pub mod root;
pub mod token;

pub use ast::TranslationUnit;
pub use index::IdentifierIndex;
pub use parsing::parse;
pub use printing::print_compact;
pub use root::{InjectionPoint, Root, Subscript};
