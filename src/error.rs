//! Error types shared by the front end and the patch pipeline
//!
//! Every failure is terminal for the shader being processed: callers must reject
//! the whole program, never a single declaration.

use thiserror::Error;

/// Errors that abort a patch call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatchError {
    /// The source could not be tokenized or parsed.
    #[error("syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// An unparsed preprocessor directive reached the parser.
    #[error(
        "unparsed preprocessor directives such as '{directive}' may not be present at this stage of shader processing"
    )]
    LexicalPolicy { directive: String },

    /// The shader references a name inside the reserved namespace.
    #[error(
        "detected a reference to internal shader interfaces (iris_, irisMain and moj_import), which is not supported. Violation: {name}"
    )]
    ReservedIdentifier { name: String },

    /// A strategy could not apply its rewrites.
    #[error(transparent)]
    Structural(#[from] StructuralError),
}

/// Failures raised by the rewrite strategies
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructuralError {
    #[error("required anchor `{0}` was not found in the shader")]
    MissingAnchor(String),

    #[error("`{name}` is already declared as `{existing}` and cannot be redeclared as `{requested}`")]
    IncompatibleRedeclaration {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("`{0}` is indexed with a non-constant expression")]
    DynamicIndex(String),

    #[error("vertex shaders must use the compatibility profile for attribute patching")]
    CoreProfileVertex,

    #[error("parameter `{name}` must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f32 },
}

impl PatchError {
    pub fn syntax(offset: usize, message: impl Into<String>) -> Self {
        PatchError::Syntax {
            offset,
            message: message.into(),
        }
    }

    pub fn missing_anchor(name: &str) -> Self {
        StructuralError::MissingAnchor(name.to_string()).into()
    }
}
