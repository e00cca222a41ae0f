//! End-to-end patching, one case per mode and stage
//!
//! Every case goes through `TransformPatcher::transform`, so the token guard,
//! the reserved-name check and the printer all take part.

use rstest::rstest;
use shaderpatch::{
    AlphaTest, AttributeParameters, CompareFunction, CompositeParameters, InputAvailability,
    Parameters, PatchError, ShaderAttributeInputs, ShaderType, SodiumParameters, StructuralError,
    TransformPatcher, VanillaParameters,
};

const ALL_INPUTS: ShaderAttributeInputs = ShaderAttributeInputs {
    color: true,
    tex: true,
    light: true,
    overlay: false,
    normal: true,
};

fn attributes(stage: ShaderType, inputs: InputAvailability) -> Parameters {
    Parameters::Attributes(AttributeParameters {
        stage,
        has_geometry: false,
        inputs,
    })
}

fn vanilla(stage: ShaderType, alpha: AlphaTest) -> Parameters {
    Parameters::Vanilla(VanillaParameters {
        stage,
        alpha,
        has_chunk_offset: true,
        inputs: ALL_INPUTS,
        has_geometry: false,
    })
}

fn sodium(stage: ShaderType) -> Parameters {
    Parameters::Sodium(SodiumParameters {
        stage,
        alpha: AlphaTest::ALWAYS,
        inputs: ALL_INPUTS,
        position_scale: 1.0,
        position_offset: 0.0,
        texture_scale: 1.0,
    })
}

fn composite(stage: ShaderType) -> Parameters {
    Parameters::Composite(CompositeParameters { stage })
}

fn overlay_only() -> InputAvailability {
    InputAvailability {
        texture: false,
        lightmap: false,
        overlay: true,
    }
}

#[rstest]
#[case::attributes_fragment_overlay(
    attributes(ShaderType::Fragment, overlay_only()),
    "void main(){}",
    &["in vec4 entityColor;", "in vec4 iris_vertexColor;", "void main(){}"]
)]
#[case::attributes_vertex_constants(
    attributes(ShaderType::Vertex, InputAvailability::default()),
    "void main(){ gl_Position = ftransform(); t = gl_MultiTexCoord0; }",
    &["#version 130\n", "t=vec4(0.5,0.5,0.0,1.0);", "gl_Position=ftransform();"]
)]
#[case::vanilla_vertex(
    vanilla(ShaderType::Vertex, AlphaTest::ALWAYS),
    "attribute vec4 extra;\nvoid main(){ gl_Position = gl_ProjectionMatrix * gl_ModelViewMatrix * gl_Vertex; }",
    &[
        "#version 330 core\n",
        "in vec4 extra;",
        "gl_Position=iris_ProjMat*iris_ModelViewMat*vec4(Position+iris_ChunkOffset,1.0);",
        "uniform vec3 iris_ChunkOffset;",
    ]
)]
#[case::sodium_vertex(
    sodium(ShaderType::Vertex),
    "void main(){ gl_Position = gl_ModelViewProjectionMatrix * gl_Vertex; }",
    &[
        "iris_vertPosition=iris_Pos*1.0+0.0;",
        "iris_vertTexCoord=iris_TexCoord*1.0;",
        "void main(){iris_initVertex();gl_Position=",
    ]
)]
#[case::sodium_fragment(
    sodium(ShaderType::Fragment),
    "void main(){ gl_FragData[1] = gl_Color; }",
    &["layout(location=1)out vec4 iris_FragData1;", "iris_FragData1=iris_FrontColor;"]
)]
#[case::composite_fragment(
    composite(ShaderType::Fragment),
    "uniform sampler2D colortex0;\nvoid main(){ gl_FragColor = texture2D(colortex0, gl_TexCoord[0].st); }",
    &["#version 130\n", "gl_FragColor=texture(colortex0,gl_TexCoord[0].st);"]
)]
fn test_mode_output(
    #[case] parameters: Parameters,
    #[case] source: &str,
    #[case] expected: &[&str],
) {
    let patcher = TransformPatcher::default();
    let out = patcher.transform(source, &parameters).unwrap();

    for fragment in expected {
        assert!(
            out.contains(fragment),
            "{} output is missing `{}`:\n{}",
            parameters.patch(),
            fragment,
            out
        );
    }
}

#[rstest]
fn test_missing_main_in_every_mode(
    #[values(
        attributes(ShaderType::Fragment, overlay_only()),
        vanilla(ShaderType::Vertex, AlphaTest::ALWAYS),
        sodium(ShaderType::Vertex),
        composite(ShaderType::Fragment)
    )]
    parameters: Parameters,
) {
    let patcher = TransformPatcher::default();
    let err = patcher.transform("uniform float x;", &parameters).unwrap_err();
    assert_eq!(err, PatchError::from(StructuralError::MissingAnchor("main".into())));
}

#[rstest]
fn test_unparsable_source_in_every_mode(
    #[values(
        attributes(ShaderType::Vertex, InputAvailability::default()),
        vanilla(ShaderType::Fragment, AlphaTest::ALWAYS),
        sodium(ShaderType::Fragment),
        composite(ShaderType::Vertex)
    )]
    parameters: Parameters,
) {
    let patcher = TransformPatcher::default();
    let err = patcher.transform("void main() { x = 1.0;", &parameters).unwrap_err();
    assert!(matches!(err, PatchError::Syntax { .. }), "got {:?}", err);
}

#[test]
fn test_vanilla_fragment_snapshot() {
    let patcher = TransformPatcher::default();
    let out = patcher
        .transform(
            "#version 150\nuniform sampler2D tex;\nin vec2 uv;\nvoid main() { gl_FragColor = texture(tex, uv) * gl_Color; }",
            &vanilla(ShaderType::Fragment, AlphaTest::new(CompareFunction::Greater, 0.1)),
        )
        .unwrap();

    insta::assert_snapshot!(out.trim_end(), @r###"
    #version 330 core
    layout(location=0)out vec4 iris_FragData0;
    in vec4 iris_FrontColor;
    uniform sampler2D tex;
    in vec2 uv;
    void irisMain(){iris_FragData0=texture(tex,uv)*iris_FrontColor;}
    void main(){irisMain();if(!(iris_FragData0.a>0.1)){discard;}}
    "###);
}

#[test]
fn test_patched_output_is_stable_under_reparse() {
    let patcher = TransformPatcher::default();
    let once = patcher
        .transform(
            "#version 120\nuniform sampler2D s;\nvoid main(){ gl_FragColor = texture2D(s, vec2(0.5)); }",
            &composite(ShaderType::Fragment),
        )
        .unwrap();
    let twice = patcher.transform(&once, &composite(ShaderType::Fragment)).unwrap();
    assert_eq!(once, twice);
}
