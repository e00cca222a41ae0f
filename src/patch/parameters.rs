//! Per-call patch parameters
//!
//! One payload type per patch mode, gathered in the [Parameters] enum. All of
//! them are plain values: built by the caller, read by exactly one strategy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A command-line or config value that names no known variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} `{value}`")]
pub struct ParseParameterError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseParameterError {
    fn new(kind: &'static str, value: &str) -> Self {
        ParseParameterError {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderType {
    Vertex,
    Geometry,
    Fragment,
    Compute,
}

impl fmt::Display for ShaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderType::Vertex => "VERTEX",
            ShaderType::Geometry => "GEOMETRY",
            ShaderType::Fragment => "FRAGMENT",
            ShaderType::Compute => "COMPUTE",
        };
        f.write_str(name)
    }
}

impl FromStr for ShaderType {
    type Err = ParseParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vertex" | "vsh" => Ok(ShaderType::Vertex),
            "geometry" | "gsh" => Ok(ShaderType::Geometry),
            "fragment" | "fsh" => Ok(ShaderType::Fragment),
            "compute" | "csh" => Ok(ShaderType::Compute),
            _ => Err(ParseParameterError::new("shader type", s)),
        }
    }
}

/// The integration contract a shader is patched for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Patch {
    Attributes,
    Composite,
    Sodium,
    Vanilla,
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Patch::Attributes => "attributes",
            Patch::Composite => "composite",
            Patch::Sodium => "sodium",
            Patch::Vanilla => "vanilla",
        };
        f.write_str(name)
    }
}

impl FromStr for Patch {
    type Err = ParseParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "attributes" => Ok(Patch::Attributes),
            "composite" => Ok(Patch::Composite),
            "sodium" => Ok(Patch::Sodium),
            "vanilla" => Ok(Patch::Vanilla),
            _ => Err(ParseParameterError::new("patch mode", s)),
        }
    }
}

/// Which optional inputs the attribute pipeline can feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAvailability {
    pub texture: bool,
    pub lightmap: bool,
    pub overlay: bool,
}

/// Which vertex attributes a vanilla or sodium draw provides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderAttributeInputs {
    pub color: bool,
    pub tex: bool,
    pub light: bool,
    pub overlay: bool,
    pub normal: bool,
}

impl ShaderAttributeInputs {
    /// Build from names such as `["color", "tex"]`
    pub fn from_names<'a>(
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ParseParameterError> {
        let mut inputs = ShaderAttributeInputs::default();
        for name in names {
            match name.trim() {
                "color" => inputs.color = true,
                "tex" => inputs.tex = true,
                "light" => inputs.light = true,
                "overlay" => inputs.overlay = true,
                "normal" => inputs.normal = true,
                "" => {}
                other => return Err(ParseParameterError::new("input", other)),
            }
        }
        Ok(inputs)
    }
}

impl From<ShaderAttributeInputs> for InputAvailability {
    fn from(inputs: ShaderAttributeInputs) -> Self {
        InputAvailability {
            texture: inputs.tex,
            lightmap: inputs.light,
            overlay: inputs.overlay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl CompareFunction {
    /// GLSL operator, `None` for the two constant functions
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            CompareFunction::Never | CompareFunction::Always => None,
            CompareFunction::Less => Some("<"),
            CompareFunction::Equal => Some("=="),
            CompareFunction::LessEqual => Some("<="),
            CompareFunction::Greater => Some(">"),
            CompareFunction::NotEqual => Some("!="),
            CompareFunction::GreaterEqual => Some(">="),
        }
    }
}

impl FromStr for CompareFunction {
    type Err = ParseParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "never" => CompareFunction::Never,
            "less" => CompareFunction::Less,
            "equal" => CompareFunction::Equal,
            "less_equal" | "lequal" => CompareFunction::LessEqual,
            "greater" => CompareFunction::Greater,
            "not_equal" | "notequal" => CompareFunction::NotEqual,
            "greater_equal" | "gequal" => CompareFunction::GreaterEqual,
            "always" => CompareFunction::Always,
            _ => return Err(ParseParameterError::new("compare function", s)),
        })
    }
}

/// Fragment alpha test: keep a fragment when `alpha <function> reference`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaTest {
    pub function: CompareFunction,
    pub reference: f32,
}

impl AlphaTest {
    pub const ALWAYS: AlphaTest = AlphaTest {
        function: CompareFunction::Always,
        reference: 0.0,
    };

    pub fn new(function: CompareFunction, reference: f32) -> Self {
        AlphaTest {
            function,
            reference,
        }
    }

    /// Statement discarding fragments whose `alpha` fails the test
    pub fn discard_statement(&self, alpha: &str) -> Option<String> {
        match self.function {
            CompareFunction::Always => None,
            CompareFunction::Never => Some("discard;".to_string()),
            function => function.operator().map(|op| {
                format!(
                    "if (!({} {} {})) {{ discard; }}",
                    alpha,
                    op,
                    glsl_float(self.reference)
                )
            }),
        }
    }
}

impl Default for AlphaTest {
    fn default() -> Self {
        AlphaTest::ALWAYS
    }
}

/// Parses `greater:0.1`; the reference may be left out for `always` and `never`
impl FromStr for AlphaTest {
    type Err = ParseParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (function, reference) = match s.split_once(':') {
            Some((function, reference)) => (
                function.parse::<CompareFunction>()?,
                reference
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| ParseParameterError::new("alpha reference", reference))?,
            ),
            None => {
                let function = s.parse::<CompareFunction>()?;
                if function.operator().is_some() {
                    return Err(ParseParameterError::new("alpha test", s));
                }
                (function, 0.0)
            }
        };
        Ok(AlphaTest::new(function, reference))
    }
}

/// Format a float as a GLSL literal (`1` becomes `1.0`)
pub fn glsl_float(value: f32) -> String {
    format!("{:?}", value)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeParameters {
    pub stage: ShaderType,
    pub has_geometry: bool,
    pub inputs: InputAvailability,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VanillaParameters {
    pub stage: ShaderType,
    pub alpha: AlphaTest,
    pub has_chunk_offset: bool,
    pub inputs: ShaderAttributeInputs,
    pub has_geometry: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SodiumParameters {
    pub stage: ShaderType,
    pub alpha: AlphaTest,
    pub inputs: ShaderAttributeInputs,
    pub position_scale: f32,
    pub position_offset: f32,
    pub texture_scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeParameters {
    pub stage: ShaderType,
}

/// Parameters for one patch call, tagged by mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "patch", rename_all = "snake_case")]
pub enum Parameters {
    Attributes(AttributeParameters),
    Vanilla(VanillaParameters),
    Sodium(SodiumParameters),
    Composite(CompositeParameters),
}

impl Parameters {
    pub fn patch(&self) -> Patch {
        match self {
            Parameters::Attributes(_) => Patch::Attributes,
            Parameters::Vanilla(_) => Patch::Vanilla,
            Parameters::Sodium(_) => Patch::Sodium,
            Parameters::Composite(_) => Patch::Composite,
        }
    }

    pub fn stage(&self) -> ShaderType {
        match self {
            Parameters::Attributes(p) => p.stage,
            Parameters::Vanilla(p) => p.stage,
            Parameters::Sodium(p) => p.stage,
            Parameters::Composite(p) => p.stage,
        }
    }

    /// Short descriptor for debug logging
    pub fn describe(&self) -> String {
        match self {
            Parameters::Attributes(p) => {
                format!("TYPE: {} HAS_GEOMETRY: {}", p.stage, p.has_geometry)
            }
            Parameters::Vanilla(p) => format!("TYPE: {} HAS_GEOMETRY: {}", p.stage, p.has_geometry),
            Parameters::Sodium(p) => format!("TYPE: {}", p.stage),
            Parameters::Composite(p) => format!("TYPE: {}", p.stage),
        }
    }
}

impl From<AttributeParameters> for Parameters {
    fn from(p: AttributeParameters) -> Self {
        Parameters::Attributes(p)
    }
}

impl From<VanillaParameters> for Parameters {
    fn from(p: VanillaParameters) -> Self {
        Parameters::Vanilla(p)
    }
}

impl From<SodiumParameters> for Parameters {
    fn from(p: SodiumParameters) -> Self {
        Parameters::Sodium(p)
    }
}

impl From<CompositeParameters> for Parameters {
    fn from(p: CompositeParameters) -> Self {
        Parameters::Composite(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_test_parsing() {
        assert_eq!(
            "greater:0.1".parse::<AlphaTest>().unwrap(),
            AlphaTest::new(CompareFunction::Greater, 0.1)
        );
        assert_eq!("always".parse::<AlphaTest>().unwrap(), AlphaTest::ALWAYS);
        assert_eq!(
            "never".parse::<AlphaTest>().unwrap().function,
            CompareFunction::Never
        );
        assert!("greater".parse::<AlphaTest>().is_err());
        assert!("greater:abc".parse::<AlphaTest>().is_err());
        assert!("sometimes:0.5".parse::<AlphaTest>().is_err());
    }

    #[test]
    fn test_discard_statements() {
        assert_eq!(AlphaTest::ALWAYS.discard_statement("a"), None);
        assert_eq!(
            AlphaTest::new(CompareFunction::Never, 0.5).discard_statement("a"),
            Some("discard;".to_string())
        );
        assert_eq!(
            AlphaTest::new(CompareFunction::GreaterEqual, 1.0).discard_statement("c.a"),
            Some("if (!(c.a >= 1.0)) { discard; }".to_string())
        );
    }

    #[test]
    fn test_glsl_float_literals() {
        assert_eq!(glsl_float(1.0), "1.0");
        assert_eq!(glsl_float(0.1), "0.1");
        assert_eq!(glsl_float(-2.5), "-2.5");
    }

    #[test]
    fn test_input_names() {
        let inputs = ShaderAttributeInputs::from_names("color, tex,normal".split(',')).unwrap();
        assert!(inputs.color && inputs.tex && inputs.normal);
        assert!(!inputs.light && !inputs.overlay);
        assert!(ShaderAttributeInputs::from_names(["bogus"]).is_err());

        let availability = InputAvailability::from(inputs);
        assert!(availability.texture && !availability.lightmap);
    }

    #[test]
    fn test_parameters_accessors() {
        let params = Parameters::from(AttributeParameters {
            stage: ShaderType::Fragment,
            has_geometry: true,
            inputs: InputAvailability::default(),
        });
        assert_eq!(params.patch(), Patch::Attributes);
        assert_eq!(params.stage(), ShaderType::Fragment);
        assert_eq!(params.describe(), "TYPE: FRAGMENT HAS_GEOMETRY: true");

        let params = Parameters::from(CompositeParameters {
            stage: ShaderType::Compute,
        });
        assert_eq!(params.describe(), "TYPE: COMPUTE");
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("Fragment".parse::<ShaderType>().unwrap(), ShaderType::Fragment);
        assert_eq!("gsh".parse::<ShaderType>().unwrap(), ShaderType::Geometry);
        assert_eq!("sodium".parse::<Patch>().unwrap(), Patch::Sodium);
        assert!("tessellation".parse::<ShaderType>().is_err());
    }
}
