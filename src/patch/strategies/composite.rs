//! Composite and final pass patching
//!
//! Fullscreen passes keep their own interface; only legacy sampling calls are
//! modernized, which needs at least GLSL 1.30.

use crate::error::PatchError;
use crate::glsl::root::Root;
use crate::patch::parameters::CompositeParameters;
use crate::patch::strategies::common;

pub fn transform(root: &mut Root<'_>, parameters: &CompositeParameters) -> Result<(), PatchError> {
    root.require_function("main")?;

    if common::normalize_legacy_sampling(root)? {
        log::trace!("legacy sampling rewritten in {} pass", parameters.stage);
        common::raise_version(root, 130);
    }
    Ok(())
}
