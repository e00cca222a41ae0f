//! Rewrites shared by several strategies
//!
//! Most of these are small building blocks (replace a builtin, declare what is
//! now referenced). [transform] chains the ones the core-profile strategies
//! (vanilla and sodium) always run.

use std::collections::BTreeSet;

use crate::error::{PatchError, StructuralError};
use crate::glsl::ast::{Profile, StorageQualifier, VersionStatement};
use crate::glsl::root::{InjectionPoint, Root, Subscript};
use crate::patch::parameters::{AlphaTest, ShaderType};

pub const TEXTURE_FALLBACK: &str = "vec4(0.5, 0.5, 0.0, 1.0)";
pub const LIGHTMAP_FALLBACK: &str = "vec4(240.0, 240.0, 0.0, 1.0)";
pub const UNBOUND_TEXCOORD: &str = "vec4(0.0, 0.0, 0.0, 1.0)";

/// Legacy sampling functions and their replacements
const LEGACY_SAMPLERS: &[(&str, &str)] = &[
    ("texture1D", "texture"),
    ("texture2D", "texture"),
    ("texture3D", "texture"),
    ("textureCube", "texture"),
    ("texture2DRect", "texture"),
    ("texture1DLod", "textureLod"),
    ("texture2DLod", "textureLod"),
    ("texture3DLod", "textureLod"),
    ("textureCubeLod", "textureLod"),
    ("texture1DProj", "textureProj"),
    ("texture2DProj", "textureProj"),
    ("texture3DProj", "textureProj"),
    ("texture2DRectProj", "textureProj"),
    ("texture1DProjLod", "textureProjLod"),
    ("texture2DProjLod", "textureProjLod"),
    ("texture3DProjLod", "textureProjLod"),
    ("texture1DGrad", "textureGrad"),
    ("texture2DGrad", "textureGrad"),
    ("texture3DGrad", "textureGrad"),
    ("textureCubeGrad", "textureGrad"),
    ("texture2DGradARB", "textureGrad"),
];

/// Shadow lookups return a float in modern GLSL, so the result is widened back
const SHADOW_SAMPLERS: &[(&str, &str)] = &[
    ("shadow1D", "texture"),
    ("shadow2D", "texture"),
    ("shadow1DLod", "textureLod"),
    ("shadow2DLod", "textureLod"),
    ("shadow1DProj", "textureProj"),
    ("shadow2DProj", "textureProj"),
];

/// Uniform names a strategy maps the builtin matrices to
#[derive(Debug, Clone, Copy)]
pub struct MatrixNames {
    pub model_view: &'static str,
    pub projection: &'static str,
    pub normal: &'static str,
    /// Dedicated inverse uniforms; `inverse(...)` is used when absent
    pub model_view_inverse: Option<&'static str>,
    pub projection_inverse: Option<&'static str>,
    /// Texture matrix 0; identity when absent
    pub texture: Option<&'static str>,
    pub lightmap: &'static str,
}

/// The rewrites every vanilla and sodium shader goes through
pub fn transform(
    root: &mut Root<'_>,
    stage: ShaderType,
    alpha: &AlphaTest,
) -> Result<(), PatchError> {
    normalize_legacy_sampling(root)?;
    upgrade_core(root, stage);
    fog_coordinate(root, stage)?;
    front_color(root, stage)?;
    match stage {
        ShaderType::Vertex => zero_unbound_texcoords(root)?,
        ShaderType::Fragment => {
            fragment_outputs(root)?;
            alpha_test(root, alpha)?;
        }
        ShaderType::Geometry | ShaderType::Compute => {}
    }
    Ok(())
}

/// Rename legacy texture calls. Returns whether any call was rewritten.
pub fn normalize_legacy_sampling(root: &mut Root<'_>) -> Result<bool, PatchError> {
    if root.index().is_declared("texture") {
        if root.has("gtexture") {
            let existing = root
                .tree()
                .global_variable("gtexture")
                .map(|(_, var, declarator)| var.type_of(declarator))
                .unwrap_or_else(|| "identifier".to_string());
            return Err(StructuralError::IncompatibleRedeclaration {
                name: "gtexture".to_string(),
                existing,
                requested: "sampler renamed from `texture`".to_string(),
            }
            .into());
        }
        root.rename("texture", "gtexture")?;
    }

    let mut changed = false;
    for (legacy, modern) in LEGACY_SAMPLERS {
        changed |= root.rename(legacy, modern)?;
    }
    for (legacy, modern) in SHADOW_SAMPLERS {
        changed |= root.wrap_calls(legacy, modern, "vec4")?;
    }
    Ok(changed)
}

/// Raise the version to at least `minimum`, keeping the profile
pub fn raise_version(root: &mut Root<'_>, minimum: u32) {
    let version = match root.version() {
        Some(version) => VersionStatement {
            number: version.number.max(minimum),
            ..version
        },
        None => VersionStatement {
            number: minimum,
            profile: None,
        },
    };
    root.set_version(version);
}

/// Move to `#version 330 core` and retire `attribute`/`varying`
pub fn upgrade_core(root: &mut Root<'_>, stage: ShaderType) {
    let number = root.version().map_or(330, |v| v.number.max(330));
    root.set_version(VersionStatement {
        number,
        profile: Some(Profile::Core),
    });
    match stage {
        ShaderType::Vertex => {
            root.retarget_storage(StorageQualifier::Attribute, StorageQualifier::In);
            root.retarget_storage(StorageQualifier::Varying, StorageQualifier::Out);
        }
        ShaderType::Fragment => {
            root.retarget_storage(StorageQualifier::Varying, StorageQualifier::In);
        }
        ShaderType::Geometry | ShaderType::Compute => {}
    }
}

fn stage_interface(stage: ShaderType) -> Option<&'static str> {
    match stage {
        ShaderType::Vertex => Some("out"),
        ShaderType::Fragment => Some("in"),
        ShaderType::Geometry | ShaderType::Compute => None,
    }
}

pub fn fog_coordinate(root: &mut Root<'_>, stage: ShaderType) -> Result<(), PatchError> {
    if !root.rename("gl_FogFragCoord", "iris_FogFragCoord")? {
        return Ok(());
    }
    if let Some(storage) = stage_interface(stage) {
        root.inject(
            InjectionPoint::BeforeDeclarations,
            &format!("{} float iris_FogFragCoord;", storage),
        )?;
    }
    Ok(())
}

pub fn front_color(root: &mut Root<'_>, stage: ShaderType) -> Result<(), PatchError> {
    let builtin = match stage {
        ShaderType::Vertex => "gl_FrontColor",
        ShaderType::Fragment => "gl_Color",
        ShaderType::Geometry | ShaderType::Compute => return Ok(()),
    };
    if root.rename(builtin, "iris_FrontColor")? {
        if let Some(storage) = stage_interface(stage) {
            root.inject(
                InjectionPoint::BeforeDeclarations,
                &format!("{} vec4 iris_FrontColor;", storage),
            )?;
        }
    }
    Ok(())
}

/// Replace `gl_FragColor`/`gl_FragData[N]` with located outputs
pub fn fragment_outputs(root: &mut Root<'_>) -> Result<(), PatchError> {
    if root.has("gl_FragColor") {
        log::warn!("gl_FragColor is deprecated, rewriting it to gl_FragData[0]");
        root.replace_references("gl_FragColor", "gl_FragData[0]")?;
    }

    let mut locations = BTreeSet::new();
    root.replace_subscripts("gl_FragData", |subscript| match subscript {
        Subscript::Constant(location) => {
            locations.insert(location);
            Ok(format!("iris_FragData{}", location))
        }
        Subscript::Dynamic | Subscript::Absent => {
            Err(StructuralError::DynamicIndex("gl_FragData".to_string()).into())
        }
    })?;

    for location in locations.into_iter().rev() {
        root.inject(
            InjectionPoint::BeforeDeclarations,
            &format!("layout(location = {0}) out vec4 iris_FragData{0};", location),
        )?;
    }
    Ok(())
}

/// Discard fragments failing `alpha`, checked after the original `main` ran
pub fn alpha_test(root: &mut Root<'_>, alpha: &AlphaTest) -> Result<(), PatchError> {
    if !alpha.reference.is_finite() {
        return Err(StructuralError::NonFiniteParameter {
            name: "alpha_reference",
            value: alpha.reference,
        }
        .into());
    }
    let Some(statement) = alpha.discard_statement("iris_FragData0.a") else {
        return Ok(());
    };
    if !root.has("iris_FragData0") {
        return Ok(());
    }
    root.wrap_main(&statement)
}

pub fn zero_unbound_texcoords(root: &mut Root<'_>) -> Result<(), PatchError> {
    for unit in 3..=7 {
        root.replace_references(&format!("gl_MultiTexCoord{}", unit), UNBOUND_TEXCOORD)?;
    }
    Ok(())
}

/// Replace a builtin input with `expression` (declaring `declaration`) when
/// available, with `fallback` otherwise
pub fn replace_input(
    root: &mut Root<'_>,
    builtin: &str,
    available: bool,
    expression: &str,
    declaration: Option<&str>,
    fallback: &str,
) -> Result<(), PatchError> {
    if !root.has(builtin) {
        return Ok(());
    }
    if !available {
        root.replace_references(builtin, fallback)?;
        return Ok(());
    }
    root.replace_references(builtin, expression)?;
    if let Some(declaration) = declaration {
        root.inject(InjectionPoint::BeforeDeclarations, declaration)?;
    }
    Ok(())
}

/// Declare each `(type, name)` as a uniform if it is used but not declared
pub fn declare_uniforms(root: &mut Root<'_>, uniforms: &[(&str, &str)]) -> Result<(), PatchError> {
    for (ty, name) in uniforms {
        if root.has(name) && !root.index().is_declared(name) {
            root.inject(
                InjectionPoint::BeforeDeclarations,
                &format!("uniform {} {};", ty, name),
            )?;
        }
    }
    Ok(())
}

/// Define `ftransform()` in terms of the builtins it stands for
pub fn define_ftransform(root: &mut Root<'_>) -> Result<(), PatchError> {
    if !root.has("ftransform") || root.tree().function("ftransform").is_some() {
        return Ok(());
    }
    root.inject(
        InjectionPoint::BeforeFunctions,
        "vec4 ftransform() { return gl_ModelViewProjectionMatrix * gl_Vertex; }",
    )
}

pub fn wire_matrices(root: &mut Root<'_>, names: &MatrixNames) -> Result<(), PatchError> {
    root.replace_references(
        "gl_ModelViewProjectionMatrix",
        &format!("({} * {})", names.projection, names.model_view),
    )?;
    root.replace_references("gl_ModelViewMatrix", names.model_view)?;
    root.replace_references("gl_ProjectionMatrix", names.projection)?;
    root.replace_references("gl_NormalMatrix", names.normal)?;

    let model_view_inverse = names
        .model_view_inverse
        .map(str::to_string)
        .unwrap_or_else(|| format!("inverse({})", names.model_view));
    root.replace_references("gl_ModelViewMatrixInverse", &model_view_inverse)?;
    let projection_inverse = names
        .projection_inverse
        .map(str::to_string)
        .unwrap_or_else(|| format!("inverse({})", names.projection));
    root.replace_references("gl_ProjectionMatrixInverse", &projection_inverse)?;

    root.replace_subscripts("gl_TextureMatrix", |subscript| match subscript {
        Subscript::Constant(0) => Ok(names.texture.unwrap_or("mat4(1.0)").to_string()),
        Subscript::Constant(1) | Subscript::Constant(2) => Ok(names.lightmap.to_string()),
        Subscript::Constant(_) => Ok("mat4(1.0)".to_string()),
        Subscript::Dynamic | Subscript::Absent => {
            Err(StructuralError::DynamicIndex("gl_TextureMatrix".to_string()).into())
        }
    })?;

    let mut uniforms = vec![
        ("mat4", names.model_view),
        ("mat4", names.projection),
        ("mat3", names.normal),
        ("mat4", names.lightmap),
    ];
    uniforms.extend(names.model_view_inverse.map(|name| ("mat4", name)));
    uniforms.extend(names.projection_inverse.map(|name| ("mat4", name)));
    uniforms.extend(names.texture.map(|name| ("mat4", name)));
    declare_uniforms(root, &uniforms)
}
