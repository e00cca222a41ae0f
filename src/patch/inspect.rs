//! Timing and debug logging around a patch call

use crate::error::PatchError;
use std::time::Instant;

/// Options fixed when a patcher is built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatcherOptions {
    /// Log input, descriptor, timing and output of every call at debug level
    pub log_transforms: bool,
}

/// Run `patcher` on `source`, logging around it when enabled
///
/// Absent source short-circuits to `Ok(None)` without calling `patcher` or
/// logging anything.
pub fn inspect_patch<F>(
    options: &PatcherOptions,
    source: Option<&str>,
    describe: impl FnOnce() -> String,
    patcher: F,
) -> Result<Option<String>, PatchError>
where
    F: FnOnce(&str) -> Result<String, PatchError>,
{
    let Some(source) = source else {
        return Ok(None);
    };

    if options.log_transforms {
        log::debug!("INPUT: {} END INPUT", source);
    }

    let start = Instant::now();
    let patched = patcher(source)?;

    if options.log_transforms {
        log::debug!("INFO: {}", describe());
        log::debug!("TIME: patching took {:?}", start.elapsed());
        log::debug!("PATCHED: {} END PATCHED", patched);
    }

    Ok(Some(patched))
}
