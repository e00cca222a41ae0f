//! # shaderpatch
//!
//! Source-to-source patching of GLSL shader-pack programs so they run inside a
//! host renderer's pipeline.
//!
//! A shader is tokenized, parsed into a [glsl::TranslationUnit], checked
//! against the lexical and naming rules, rewritten by one strategy selected
//! from its [patch::Parameters] and printed back in compact form. See
//! [patch::TransformPatcher] for the entry point.

pub mod error;
pub mod glsl;
pub mod patch;
pub mod transforms;

pub use error::{PatchError, StructuralError};
pub use patch::{
    AlphaTest, AttributeParameters, CompareFunction, CompositeParameters, InputAvailability,
    Parameters, Patch, PatcherOptions, ShaderAttributeInputs, ShaderType, SodiumParameters,
    TransformPatcher, VanillaParameters,
};
