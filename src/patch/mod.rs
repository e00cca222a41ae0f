//! Shader patching
//!
//! [TransformPatcher] is the single entry point. It is built once, holds the
//! front-end pipeline and the strategy table, and is shared by reference
//! between callers. A call runs:
//!
//!     source → guarded tokenization → parse → identifier index
//!            → reserved-name check → index build session → one strategy
//!            → compact print
//!
//! The token guard rejects preprocessor directives other than `#extension` and
//! `#pragma`, so a tree never holds an unexpanded directive. The reserved-name
//! check rejects anything in the namespace strategies inject into. Both fail
//! before any mutation.

pub mod inspect;
pub mod parameters;
pub mod strategies;
pub mod validation;

use crate::error::PatchError;
use crate::glsl::ast::TranslationUnit;
use crate::glsl::index::IdentifierIndex;
use crate::glsl::printing::print_compact;
use crate::glsl::root::Root;
use crate::transforms::stages::{Parsing, Tokenization};
use crate::transforms::Transform;

pub use inspect::{inspect_patch, PatcherOptions};
pub use parameters::{
    AlphaTest, AttributeParameters, CompareFunction, CompositeParameters, InputAvailability,
    Parameters, Patch, ShaderAttributeInputs, ShaderType, SodiumParameters, VanillaParameters,
};
pub use strategies::{StandardStrategies, Strategies};
pub use validation::{check_reserved, PreprocessorGuard, RESERVED_PREFIXES};

pub struct TransformPatcher<S: Strategies = StandardStrategies> {
    front_end: Transform<String, TranslationUnit>,
    strategies: S,
    options: PatcherOptions,
}

impl TransformPatcher<StandardStrategies> {
    pub fn new(options: PatcherOptions) -> Self {
        Self::with_strategies(options, StandardStrategies)
    }
}

impl Default for TransformPatcher<StandardStrategies> {
    fn default() -> Self {
        Self::new(PatcherOptions::default())
    }
}

impl<S: Strategies> TransformPatcher<S> {
    pub fn with_strategies(options: PatcherOptions, strategies: S) -> Self {
        let front_end = Transform::from_fn(Ok)
            .then(Tokenization::with_filter(Box::new(PreprocessorGuard::new())))
            .then(Parsing::new());
        TransformPatcher {
            front_end,
            strategies,
            options,
        }
    }

    pub fn options(&self) -> &PatcherOptions {
        &self.options
    }

    pub fn strategies(&self) -> &S {
        &self.strategies
    }

    /// Parse, validate, patch and print one shader
    pub fn transform(&self, source: &str, parameters: &Parameters) -> Result<String, PatchError> {
        let mut tree = self.front_end.run(source.to_string())?;
        check_reserved(&IdentifierIndex::build(&tree))?;

        Root::index_build_session(&mut tree, |root| match parameters {
            Parameters::Attributes(p) => self.strategies.attributes(root, p),
            Parameters::Vanilla(p) => self.strategies.vanilla(root, p),
            Parameters::Sodium(p) => self.strategies.sodium(root, p),
            Parameters::Composite(p) => self.strategies.composite(root, p),
        })?;

        Ok(print_compact(&tree))
    }

    fn inspect(
        &self,
        source: Option<&str>,
        parameters: Parameters,
    ) -> Result<Option<String>, PatchError> {
        inspect_patch(
            &self.options,
            source,
            || parameters.describe(),
            |source| self.transform(source, &parameters),
        )
    }

    pub fn patch_attributes(
        &self,
        source: Option<&str>,
        stage: ShaderType,
        has_geometry: bool,
        inputs: InputAvailability,
    ) -> Result<Option<String>, PatchError> {
        self.inspect(
            source,
            Parameters::Attributes(AttributeParameters {
                stage,
                has_geometry,
                inputs,
            }),
        )
    }

    pub fn patch_vanilla(
        &self,
        source: Option<&str>,
        stage: ShaderType,
        alpha: AlphaTest,
        has_chunk_offset: bool,
        inputs: ShaderAttributeInputs,
        has_geometry: bool,
    ) -> Result<Option<String>, PatchError> {
        self.inspect(
            source,
            Parameters::Vanilla(VanillaParameters {
                stage,
                alpha,
                has_chunk_offset,
                inputs,
                has_geometry,
            }),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn patch_sodium(
        &self,
        source: Option<&str>,
        stage: ShaderType,
        alpha: AlphaTest,
        inputs: ShaderAttributeInputs,
        position_scale: f32,
        position_offset: f32,
        texture_scale: f32,
    ) -> Result<Option<String>, PatchError> {
        self.inspect(
            source,
            Parameters::Sodium(SodiumParameters {
                stage,
                alpha,
                inputs,
                position_scale,
                position_offset,
                texture_scale,
            }),
        )
    }

    pub fn patch_composite(
        &self,
        source: Option<&str>,
        stage: ShaderType,
    ) -> Result<Option<String>, PatchError> {
        self.inspect(source, Parameters::Composite(CompositeParameters { stage }))
    }
}
