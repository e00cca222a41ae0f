//! Vanilla core-shader patching
//!
//! Builtin vertex inputs are wired to the vertex format's attributes
//! (`Position`, `UV0`, `UV2`, `Color`, `Normal`) and builtin matrices to the
//! renderer's uniforms. Inputs the format lacks become constants.

use crate::error::PatchError;
use crate::glsl::root::Root;
use crate::patch::parameters::{ShaderType, VanillaParameters};
use crate::patch::strategies::attribute;
use crate::patch::strategies::common::{self, MatrixNames, LIGHTMAP_FALLBACK, TEXTURE_FALLBACK};

pub const MATRICES: MatrixNames = MatrixNames {
    model_view: "iris_ModelViewMat",
    projection: "iris_ProjMat",
    normal: "iris_NormalMat",
    model_view_inverse: None,
    projection_inverse: None,
    texture: Some("iris_TextureMat"),
    lightmap: "iris_LightmapTextureMatrix",
};

pub fn transform(root: &mut Root<'_>, parameters: &VanillaParameters) -> Result<(), PatchError> {
    root.require_function("main")?;

    if parameters.inputs.overlay {
        attribute::patch_overlay(root, parameters.stage, parameters.has_geometry)?;
    }

    common::transform(root, parameters.stage, &parameters.alpha)?;

    if parameters.stage == ShaderType::Vertex {
        common::define_ftransform(root)?;
        wire_vertex_inputs(root, parameters)?;
    }

    common::wire_matrices(root, &MATRICES)?;
    common::declare_uniforms(
        root,
        &[("vec4", "iris_ColorModulator"), ("vec3", "iris_ChunkOffset")],
    )
}

fn wire_vertex_inputs(
    root: &mut Root<'_>,
    parameters: &VanillaParameters,
) -> Result<(), PatchError> {
    let inputs = &parameters.inputs;

    common::replace_input(
        root,
        "gl_MultiTexCoord0",
        inputs.tex,
        "vec4(UV0, 0.0, 1.0)",
        Some("in vec2 UV0;"),
        TEXTURE_FALLBACK,
    )?;
    for builtin in ["gl_MultiTexCoord1", "gl_MultiTexCoord2"] {
        common::replace_input(
            root,
            builtin,
            inputs.light,
            "vec4(UV2, 0.0, 1.0)",
            Some("in ivec2 UV2;"),
            LIGHTMAP_FALLBACK,
        )?;
    }
    common::replace_input(
        root,
        "gl_Color",
        inputs.color,
        "(Color * iris_ColorModulator)",
        Some("in vec4 Color;"),
        "iris_ColorModulator",
    )?;
    common::replace_input(
        root,
        "gl_Normal",
        inputs.normal,
        "Normal",
        Some("in vec3 Normal;"),
        "vec3(0.0, 0.0, 1.0)",
    )?;

    let position = if parameters.has_chunk_offset {
        "vec4(Position + iris_ChunkOffset, 1.0)"
    } else {
        "vec4(Position, 1.0)"
    };
    common::replace_input(root, "gl_Vertex", true, position, Some("in vec3 Position;"), position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StructuralError;
    use crate::glsl::parsing::parse;
    use crate::glsl::printing::print_compact;
    use crate::patch::parameters::{AlphaTest, CompareFunction, ShaderAttributeInputs};

    fn patch(source: &str, parameters: VanillaParameters) -> Result<String, PatchError> {
        let mut tree = parse(source)?;
        Root::index_build_session(&mut tree, |root| transform(root, &parameters))?;
        Ok(print_compact(&tree))
    }

    fn vertex(inputs: ShaderAttributeInputs, has_chunk_offset: bool) -> VanillaParameters {
        VanillaParameters {
            stage: ShaderType::Vertex,
            alpha: AlphaTest::ALWAYS,
            has_chunk_offset,
            inputs,
            has_geometry: false,
        }
    }

    const ALL: ShaderAttributeInputs = ShaderAttributeInputs {
        color: true,
        tex: true,
        light: true,
        overlay: false,
        normal: true,
    };

    #[test]
    fn test_vertex_wiring() {
        let out = patch(
            "#version 120\nvarying vec2 uv;\nvoid main(){ gl_Position = gl_ModelViewProjectionMatrix * gl_Vertex; uv = gl_MultiTexCoord0.xy; c = gl_Color; n = gl_NormalMatrix * gl_Normal; }",
            vertex(ALL, true),
        )
        .unwrap();
        assert!(out.starts_with("#version 330 core\n"));
        for declaration in [
            "in vec2 UV0;",
            "in vec4 Color;",
            "in vec3 Normal;",
            "in vec3 Position;",
            "uniform mat4 iris_ModelViewMat;",
            "uniform mat4 iris_ProjMat;",
            "uniform mat3 iris_NormalMat;",
            "uniform vec4 iris_ColorModulator;",
            "uniform vec3 iris_ChunkOffset;",
            "out vec2 uv;",
        ] {
            assert!(out.contains(declaration), "missing `{}` in\n{}", declaration, out);
        }
        assert!(out.contains(
            "gl_Position=(iris_ProjMat*iris_ModelViewMat)*vec4(Position+iris_ChunkOffset,1.0);"
        ));
        assert!(out.contains("uv=vec4(UV0,0.0,1.0).xy;"));
        assert!(out.contains("c=(Color*iris_ColorModulator);"));
        assert!(out.contains("n=iris_NormalMat*Normal;"));
    }

    #[test]
    fn test_unrequested_inputs_are_constants() {
        let out = patch(
            "void main(){ c = gl_Color; n = gl_Normal; l = gl_MultiTexCoord2; gl_Position = gl_Vertex; }",
            vertex(ShaderAttributeInputs::default(), false),
        )
        .unwrap();
        assert!(out.contains("c=iris_ColorModulator;"));
        assert!(out.contains("n=vec3(0.0,0.0,1.0);"));
        assert!(out.contains("l=vec4(240.0,240.0,0.0,1.0);"));
        assert!(out.contains("gl_Position=vec4(Position,1.0);"));
        assert!(!out.contains("in vec4 Color;"));
        assert!(!out.contains("iris_ChunkOffset"));
    }

    #[test]
    fn test_user_uniform_clashing_with_attribute() {
        let err = patch(
            "uniform vec3 Normal;\nvoid main(){ gl_Position = vec4(Normal + gl_Normal, 1.0); }",
            vertex(ALL, false),
        )
        .unwrap_err();
        assert_eq!(
            err,
            PatchError::from(StructuralError::IncompatibleRedeclaration {
                name: "Normal".into(),
                existing: "uniform vec3".into(),
                requested: "in vec3".into(),
            })
        );
    }

    #[test]
    fn test_ftransform_is_defined() {
        let out = patch("void main(){ gl_Position = ftransform(); }", vertex(ALL, false)).unwrap();
        assert!(out.contains(
            "vec4 ftransform(){return(iris_ProjMat*iris_ModelViewMat)*vec4(Position,1.0);}"
        ));
    }

    #[test]
    fn test_fragment_alpha_test() {
        let out = patch(
            "uniform sampler2D tex;\nvarying vec2 uv;\nvoid main(){ gl_FragColor = texture2D(tex, uv) * gl_Color; }",
            VanillaParameters {
                stage: ShaderType::Fragment,
                alpha: AlphaTest::new(CompareFunction::Greater, 0.1),
                has_chunk_offset: false,
                inputs: ALL,
                has_geometry: false,
            },
        )
        .unwrap();
        assert!(out.contains("layout(location=0)out vec4 iris_FragData0;"));
        assert!(out.contains("in vec4 iris_FrontColor;"));
        assert!(out.contains("in vec2 uv;"));
        assert!(out.contains("void irisMain(){iris_FragData0=texture(tex,uv)*iris_FrontColor;}"));
        assert!(out.contains("void main(){irisMain();if(!(iris_FragData0.a>0.1)){discard;}}"));
    }

    #[test]
    fn test_overlay_runs_first() {
        let out = patch(
            "void main(){ gl_Position = gl_Vertex; }",
            vertex(
                ShaderAttributeInputs {
                    overlay: true,
                    ..ALL
                },
                false,
            ),
        )
        .unwrap();
        // the vertex color copy added for the overlay is wired like any other use
        assert!(out.contains("iris_vertexColor=(Color*iris_ColorModulator);"));
        assert!(out.contains("out vec4 entityColor;"));
    }
}
