//! Rewrite strategies, one per patch mode
//!
//! Each strategy gets the session for one tree and its own parameter payload,
//! mutates the tree in place and returns nothing but success or failure.

pub mod attribute;
pub mod common;
pub mod composite;
pub mod sodium;
pub mod vanilla;

use crate::error::PatchError;
use crate::glsl::root::Root;
use crate::patch::parameters::{
    AttributeParameters, CompositeParameters, SodiumParameters, VanillaParameters,
};

/// Dispatch table of a patcher, fixed at construction
pub trait Strategies: Send + Sync {
    fn attributes(
        &self,
        root: &mut Root<'_>,
        parameters: &AttributeParameters,
    ) -> Result<(), PatchError>;
    fn vanilla(
        &self,
        root: &mut Root<'_>,
        parameters: &VanillaParameters,
    ) -> Result<(), PatchError>;
    fn sodium(&self, root: &mut Root<'_>, parameters: &SodiumParameters) -> Result<(), PatchError>;
    fn composite(
        &self,
        root: &mut Root<'_>,
        parameters: &CompositeParameters,
    ) -> Result<(), PatchError>;
}

/// The built-in strategies
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardStrategies;

impl Strategies for StandardStrategies {
    fn attributes(
        &self,
        root: &mut Root<'_>,
        parameters: &AttributeParameters,
    ) -> Result<(), PatchError> {
        attribute::transform(root, parameters)
    }

    fn vanilla(
        &self,
        root: &mut Root<'_>,
        parameters: &VanillaParameters,
    ) -> Result<(), PatchError> {
        vanilla::transform(root, parameters)
    }

    fn sodium(&self, root: &mut Root<'_>, parameters: &SodiumParameters) -> Result<(), PatchError> {
        sodium::transform(root, parameters)
    }

    fn composite(
        &self,
        root: &mut Root<'_>,
        parameters: &CompositeParameters,
    ) -> Result<(), PatchError> {
        composite::transform(root, parameters)
    }
}
