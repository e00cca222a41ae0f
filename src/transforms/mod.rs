//! Transform pipeline infrastructure
//!
//! A small composable system for chaining processing stages. Any transform can
//! be chained with another if their types are compatible.
//!
//! # Architecture Overview
//!
//! ## 1. The `Runnable` Trait
//!
//! The interface for all stages. Any type implementing `Runnable<I, O>` turns
//! an `I` into an `O`:
//!
//! ```rust,ignore
//! pub trait Runnable<I, O> {
//!     fn run(&self, input: I) -> Result<O, PatchError>;
//! }
//! ```
//!
//! ## 2. The `Transform<I, O>` Type
//!
//! A wrapper that enables composition. `.then()` appends a stage, and the
//! compiler checks that each stage's input matches the previous output:
//!
//! ```rust,ignore
//! let front_end = Transform::from_fn(Ok)
//!     // String → TokenStream
//!     .then(Tokenization::with_filter(Box::new(PreprocessorGuard::new())))
//!     // TokenStream → TranslationUnit
//!     .then(Parsing::new());
//! ```
//!
//! Transforms are `Send + Sync`, so a pipeline built once can be shared by
//! every thread that patches shaders.
//!
//! # Module Organization
//!
//! - [`stages`]: the tokenization and parsing stages

pub mod stages;

use crate::error::PatchError;

/// Trait for anything that can transform an input to an output
pub trait Runnable<I, O> {
    fn run(&self, input: I) -> Result<O, PatchError>;
}

/// A composable transformation pipeline from `I` to `O`
pub struct Transform<I, O> {
    run_fn: Box<dyn Fn(I) -> Result<O, PatchError> + Send + Sync>,
}

impl<I, O> Transform<I, O> {
    /// Create a transform from a function
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(I) -> Result<O, PatchError> + Send + Sync + 'static,
    {
        Transform {
            run_fn: Box::new(f),
        }
    }

    /// Chain this transform's output into the next stage's input
    pub fn then<O2, S>(self, stage: S) -> Transform<I, O2>
    where
        S: Runnable<O, O2> + Send + Sync + 'static,
        I: 'static,
        O: 'static,
        O2: 'static,
    {
        let prev_run = self.run_fn;
        Transform {
            run_fn: Box::new(move |input| {
                let intermediate = prev_run(input)?;
                stage.run(intermediate)
            }),
        }
    }

    /// Execute this transform on the given input
    pub fn run(&self, input: I) -> Result<O, PatchError> {
        (self.run_fn)(input)
    }
}

impl<I, O> Runnable<I, O> for Transform<I, O>
where
    I: 'static,
    O: 'static,
{
    fn run(&self, input: I) -> Result<O, PatchError> {
        Transform::run(self, input)
    }
}
