//! Attribute patching for compatibility-profile shader packs
//!
//! Texture coordinates the draw does not provide are replaced by constants, and
//! the overlay ("entity color") interface is threaded through every stage under
//! the same names and types so the stages still link.

use crate::error::{PatchError, StructuralError};
use crate::glsl::root::{InjectionPoint, Root};
use crate::patch::parameters::{AttributeParameters, InputAvailability, ShaderType};
use crate::patch::strategies::common::{self, LIGHTMAP_FALLBACK, TEXTURE_FALLBACK};

pub fn transform(root: &mut Root<'_>, parameters: &AttributeParameters) -> Result<(), PatchError> {
    root.require_function("main")?;

    if root.version().is_some_and(|v| v.is_core()) {
        if parameters.stage == ShaderType::Vertex {
            return Err(StructuralError::CoreProfileVertex.into());
        }
        return Ok(());
    }
    common::raise_version(root, 130);

    if parameters.stage == ShaderType::Vertex {
        patch_texture_coordinates(root, &parameters.inputs)?;
    }
    if parameters.inputs.overlay {
        patch_overlay(root, parameters.stage, parameters.has_geometry)?;
    }
    Ok(())
}

fn patch_texture_coordinates(
    root: &mut Root<'_>,
    inputs: &InputAvailability,
) -> Result<(), PatchError> {
    if inputs.lightmap {
        root.rename("gl_MultiTexCoord1", "gl_MultiTexCoord2")?;
    } else {
        root.replace_references("gl_MultiTexCoord1", LIGHTMAP_FALLBACK)?;
        root.replace_references("gl_MultiTexCoord2", LIGHTMAP_FALLBACK)?;
    }
    if !inputs.texture {
        root.replace_references("gl_MultiTexCoord0", TEXTURE_FALLBACK)?;
    }
    common::zero_unbound_texcoords(root)
}

/// Pass the overlay color and the vertex color down the pipeline
pub fn patch_overlay(
    root: &mut Root<'_>,
    stage: ShaderType,
    has_geometry: bool,
) -> Result<(), PatchError> {
    match stage {
        ShaderType::Vertex => {
            root.inject(
                InjectionPoint::BeforeDeclarations,
                "uniform sampler2D iris_overlay; out vec4 entityColor; \
                 out vec4 iris_vertexColor; in ivec2 iris_UV1;",
            )?;
            root.prepend_main(
                "vec4 iris_overlayColor = texelFetch(iris_overlay, iris_UV1, 0); \
                 entityColor = vec4(iris_overlayColor.rgb, 1.0 - iris_overlayColor.a); \
                 iris_vertexColor = gl_Color;",
            )
        }
        ShaderType::Geometry => {
            root.replace_bare_references("entityColor", "entityColor[0]")?;
            root.inject(
                InjectionPoint::BeforeDeclarations,
                "out vec4 entityColorGS; in vec4 entityColor[]; \
                 out vec4 iris_vertexColorGS; in vec4 iris_vertexColor[];",
            )?;
            root.surround_call_statements(
                "EmitVertex",
                "entityColorGS = entityColor[0]; iris_vertexColorGS = iris_vertexColor[0];",
            )?;
            Ok(())
        }
        ShaderType::Fragment => {
            root.inject(
                InjectionPoint::BeforeDeclarations,
                "in vec4 entityColor; in vec4 iris_vertexColor;",
            )?;
            if has_geometry {
                root.rename("entityColor", "entityColorGS")?;
                root.rename("iris_vertexColor", "iris_vertexColorGS")?;
            }
            Ok(())
        }
        ShaderType::Compute => Ok(()),
    }
}
