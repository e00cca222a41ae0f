//! Maps command-line requests onto the patcher entry points

use shaderpatch::{
    AlphaTest, Patch, PatchError, ShaderAttributeInputs, ShaderType, TransformPatcher,
};
use shaderpatch_config::ShaderPatchConfig;

/// Everything the command line says about one patch call
#[derive(Debug, Clone)]
pub struct Request {
    pub mode: Patch,
    pub stage: ShaderType,
    pub has_geometry: bool,
    pub inputs: ShaderAttributeInputs,
    pub has_chunk_offset: bool,
    pub alpha: AlphaTest,
    pub position_scale: f32,
    pub position_offset: f32,
    pub texture_scale: f32,
}

/// Patch `source` as described by `request`
pub fn execute(
    config: &ShaderPatchConfig,
    request: &Request,
    source: &str,
) -> Result<Option<String>, PatchError> {
    let patcher = TransformPatcher::new(config.patcher_options());
    log::info!("patching {} {} shader", request.mode, request.stage);

    let source = Some(source);
    match request.mode {
        Patch::Attributes => patcher.patch_attributes(
            source,
            request.stage,
            request.has_geometry,
            request.inputs.into(),
        ),
        Patch::Vanilla => patcher.patch_vanilla(
            source,
            request.stage,
            request.alpha,
            request.has_chunk_offset,
            request.inputs,
            request.has_geometry,
        ),
        Patch::Sodium => patcher.patch_sodium(
            source,
            request.stage,
            request.alpha,
            request.inputs,
            request.position_scale,
            request.position_offset,
            request.texture_scale,
        ),
        Patch::Composite => patcher.patch_composite(source, request.stage),
    }
}
