//! Sodium terrain-shader patching
//!
//! Sodium feeds compressed vertex attributes. The vertex stage first decodes
//! them into `iris_vert*` globals inside `iris_initVertex()`, which `main` calls
//! before anything else; every later rewrite reads the decoded values.

use crate::error::{PatchError, StructuralError};
use crate::glsl::root::{InjectionPoint, Root};
use crate::patch::parameters::{glsl_float, ShaderType, SodiumParameters};
use crate::patch::strategies::common::{self, MatrixNames, LIGHTMAP_FALLBACK, TEXTURE_FALLBACK};

pub const MATRICES: MatrixNames = MatrixNames {
    model_view: "iris_ModelViewMatrix",
    projection: "iris_ProjectionMatrix",
    normal: "iris_NormalMatrix",
    model_view_inverse: Some("iris_ModelViewMatrixInverse"),
    projection_inverse: Some("iris_ProjectionMatrixInverse"),
    texture: None,
    lightmap: "iris_LightmapTextureMatrix",
};

pub fn transform(root: &mut Root<'_>, parameters: &SodiumParameters) -> Result<(), PatchError> {
    root.require_function("main")?;
    check_factors(parameters)?;

    if parameters.stage == ShaderType::Vertex {
        inject_decoding(root, parameters)?;
    }

    common::transform(root, parameters.stage, &parameters.alpha)?;

    if parameters.stage == ShaderType::Vertex {
        common::define_ftransform(root)?;
        wire_vertex_inputs(root, parameters)?;
    }

    common::wire_matrices(root, &MATRICES)?;
    common::declare_uniforms(root, &[("vec3", "iris_RegionOffset")])
}

fn check_factors(parameters: &SodiumParameters) -> Result<(), PatchError> {
    let factors = [
        ("position_scale", parameters.position_scale),
        ("position_offset", parameters.position_offset),
        ("texture_scale", parameters.texture_scale),
    ];
    match factors.into_iter().find(|(_, value)| !value.is_finite()) {
        Some((name, value)) => Err(StructuralError::NonFiniteParameter { name, value }.into()),
        None => Ok(()),
    }
}

fn inject_decoding(root: &mut Root<'_>, parameters: &SodiumParameters) -> Result<(), PatchError> {
    root.inject(
        InjectionPoint::BeforeDeclarations,
        "in vec3 iris_Pos; in vec4 iris_Color; in vec2 iris_TexCoord; \
         in ivec2 iris_LightCoord; vec3 iris_vertPosition; vec2 iris_vertTexCoord; \
         ivec2 iris_vertLightCoord; vec4 iris_vertColor;",
    )?;
    root.inject(
        InjectionPoint::BeforeFunctions,
        &format!(
            "void iris_initVertex() {{ \
             iris_vertPosition = iris_Pos * {} + {}; \
             iris_vertTexCoord = iris_TexCoord * {}; \
             iris_vertLightCoord = iris_LightCoord; \
             iris_vertColor = iris_Color; }}",
            glsl_float(parameters.position_scale),
            glsl_float(parameters.position_offset),
            glsl_float(parameters.texture_scale),
        ),
    )?;
    root.prepend_main("iris_initVertex();")
}

fn wire_vertex_inputs(
    root: &mut Root<'_>,
    parameters: &SodiumParameters,
) -> Result<(), PatchError> {
    let inputs = &parameters.inputs;

    common::replace_input(
        root,
        "gl_MultiTexCoord0",
        inputs.tex,
        "vec4(iris_vertTexCoord, 0.0, 1.0)",
        None,
        TEXTURE_FALLBACK,
    )?;
    for builtin in ["gl_MultiTexCoord1", "gl_MultiTexCoord2"] {
        common::replace_input(
            root,
            builtin,
            inputs.light,
            "vec4(iris_vertLightCoord, 0.0, 1.0)",
            None,
            LIGHTMAP_FALLBACK,
        )?;
    }
    common::replace_input(root, "gl_Color", inputs.color, "iris_vertColor", None, "vec4(1.0)")?;
    common::replace_input(
        root,
        "gl_Normal",
        inputs.normal,
        "iris_Normal",
        Some("in vec3 iris_Normal;"),
        "vec3(0.0, 0.0, 1.0)",
    )?;

    let position = "vec4(iris_vertPosition + iris_RegionOffset, 1.0)";
    common::replace_input(root, "gl_Vertex", true, position, None, position)
}
