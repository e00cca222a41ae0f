//! Shader syntax tree
//!
//! The tree is typed down to the level the patch strategies need: the version
//! statement, parsed directives, global variable declarations (qualifiers, type,
//! declarators) and function definitions. Expressions, initializers and
//! statement bodies are kept as token runs, which is enough for renaming,
//! reference replacement and statement injection.

use crate::error::PatchError;
use crate::glsl::token::Token;
use std::fmt;

/// A complete shader program
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationUnit {
    pub version: Option<VersionStatement>,
    pub declarations: Vec<ExternalDeclaration>,
}

/// `#version <number> [profile]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionStatement {
    pub number: u32,
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Core,
    Compatibility,
    Es,
}

impl Profile {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "core" => Some(Profile::Core),
            "compatibility" => Some(Profile::Compatibility),
            "es" => Some(Profile::Es),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Core => "core",
            Profile::Compatibility => "compatibility",
            Profile::Es => "es",
        }
    }
}

impl VersionStatement {
    /// Whether the shader targets the core profile
    ///
    /// Versions above 140 default to core when no profile is named.
    pub fn is_core(&self) -> bool {
        match self.profile {
            Some(Profile::Core) => true,
            Some(_) => false,
            None => self.number > 140,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExternalDeclaration {
    Directive(Directive),
    Declaration(Declaration),
    Function(FunctionDefinition),
}

/// A directive kept in the tree (`#extension`, `#pragma`, or anything a
/// permissive filter let through)
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Variable(VariableDeclaration),
    /// Precision statements, structs, interface blocks, prototypes. The tokens
    /// exclude the terminating semicolon.
    Other(Vec<Token>),
}

/// `[layout(...)] qualifiers type name[array] [= init], ...;`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    /// The full `layout(...)` token run, if present
    pub layout: Option<Vec<Token>>,
    pub qualifiers: Vec<Qualifier>,
    pub ty: TypeSpecifier,
    pub declarators: Vec<Declarator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualifier {
    Storage(StorageQualifier),
    /// Interpolation, precision, invariance and memory qualifiers
    Auxiliary(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageQualifier {
    Const,
    In,
    Out,
    InOut,
    Uniform,
    Attribute,
    Varying,
    Buffer,
    Shared,
}

impl StorageQualifier {
    pub fn parse(word: &str) -> Option<Self> {
        Some(match word {
            "const" => StorageQualifier::Const,
            "in" => StorageQualifier::In,
            "out" => StorageQualifier::Out,
            "inout" => StorageQualifier::InOut,
            "uniform" => StorageQualifier::Uniform,
            "attribute" => StorageQualifier::Attribute,
            "varying" => StorageQualifier::Varying,
            "buffer" => StorageQualifier::Buffer,
            "shared" => StorageQualifier::Shared,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageQualifier::Const => "const",
            StorageQualifier::In => "in",
            StorageQualifier::Out => "out",
            StorageQualifier::InOut => "inout",
            StorageQualifier::Uniform => "uniform",
            StorageQualifier::Attribute => "attribute",
            StorageQualifier::Varying => "varying",
            StorageQualifier::Buffer => "buffer",
            StorageQualifier::Shared => "shared",
        }
    }
}

impl StorageQualifier {
    /// Whether a global declared with `existing` storage can be merged into one
    /// declared with `requested`. The legacy `attribute` and `varying` forms
    /// match their `in`/`out` replacements.
    pub fn merges_with(existing: Option<Self>, requested: Option<Self>) -> bool {
        use StorageQualifier::*;
        match (existing, requested) {
            (a, b) if a == b => true,
            (Some(Attribute), Some(In)) | (Some(In), Some(Attribute)) => true,
            (Some(Varying), Some(In | Out)) | (Some(In | Out), Some(Varying)) => true,
            _ => false,
        }
    }
}

impl Qualifier {
    pub fn parse(word: &str) -> Option<Self> {
        if let Some(storage) = StorageQualifier::parse(word) {
            return Some(Qualifier::Storage(storage));
        }
        match word {
            "centroid" | "flat" | "smooth" | "noperspective" | "patch" | "sample" | "invariant"
            | "precise" | "lowp" | "mediump" | "highp" | "coherent" | "volatile" | "restrict"
            | "readonly" | "writeonly" => Some(Qualifier::Auxiliary(word.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Qualifier::Storage(storage) => storage.as_str(),
            Qualifier::Auxiliary(word) => word,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpecifier {
    pub name: String,
    /// `[...]` suffix on the type itself, brackets included
    pub array: Option<Vec<Token>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: String,
    /// `[...]` suffix on the name, brackets included
    pub array: Option<Vec<Token>>,
    /// Initializer tokens after `=`
    pub initializer: Option<Vec<Token>>,
}

impl VariableDeclaration {
    pub fn storage(&self) -> Option<StorageQualifier> {
        self.qualifiers.iter().find_map(|q| match q {
            Qualifier::Storage(storage) => Some(*storage),
            Qualifier::Auxiliary(_) => None,
        })
    }

    pub fn declarator(&self, name: &str) -> Option<&Declarator> {
        self.declarators.iter().find(|d| d.name == name)
    }

    /// Human-readable type of one declarator, e.g. `vec4[]`
    pub fn type_of(&self, declarator: &Declarator) -> String {
        let is_array = self.ty.array.is_some() || declarator.array.is_some();
        if is_array {
            format!("{}[]", self.ty.name)
        } else {
            self.ty.name.clone()
        }
    }

    /// Storage qualifier and type of one declarator, e.g. `uniform vec4[]`
    pub fn signature_of(&self, declarator: &Declarator) -> String {
        match self.storage() {
            Some(storage) => format!("{} {}", storage.as_str(), self.type_of(declarator)),
            None => self.type_of(declarator),
        }
    }
}

/// `return_type name(parameters) { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    /// Qualifiers and type tokens before the name
    pub return_type: Vec<Token>,
    pub name: String,
    /// Tokens between the parentheses
    pub parameters: Vec<Token>,
    pub body: Vec<Statement>,
}

/// One top-level statement of a function body
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub tokens: Vec<Token>,
}

/// What an identifier occurrence is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierRole {
    /// Name introduced by a global variable declarator
    Declarator,
    /// Name of a function definition
    Function,
    /// User type name used as a type specifier
    Type,
    /// Field selection after `.`
    Member,
    /// Any other use inside a token run
    Reference,
}

impl TranslationUnit {
    pub fn function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.declarations.iter().find_map(|d| match d {
            ExternalDeclaration::Function(f) if f.name == name => Some(f),
            _ => None,
        })
    }

    pub fn function_mut(&mut self, name: &str) -> Option<&mut FunctionDefinition> {
        self.declarations.iter_mut().find_map(|d| match d {
            ExternalDeclaration::Function(f) if f.name == name => Some(f),
            _ => None,
        })
    }

    /// Position right after the leading directives
    pub fn declarations_start(&self) -> usize {
        self.declarations
            .iter()
            .position(|d| !matches!(d, ExternalDeclaration::Directive(_)))
            .unwrap_or(self.declarations.len())
    }

    /// Position of the first function definition
    pub fn functions_start(&self) -> usize {
        self.declarations
            .iter()
            .position(|d| matches!(d, ExternalDeclaration::Function(_)))
            .unwrap_or(self.declarations.len())
    }

    /// Global variable declaration and declarator for `name`
    pub fn global_variable(
        &self,
        name: &str,
    ) -> Option<(usize, &VariableDeclaration, &Declarator)> {
        self.declarations
            .iter()
            .enumerate()
            .find_map(|(position, d)| match d {
                ExternalDeclaration::Declaration(Declaration::Variable(var)) => {
                    var.declarator(name).map(|decl| (position, var, decl))
                }
                _ => None,
            })
    }

    /// Visit every identifier occurrence with its declaration position and role
    pub fn visit_identifiers(&self, f: &mut dyn FnMut(usize, &str, IdentifierRole)) {
        for (position, declaration) in self.declarations.iter().enumerate() {
            let mut runs: Vec<&[Token]> = Vec::new();
            let mut names: Vec<(&str, IdentifierRole)> = Vec::new();
            match declaration {
                ExternalDeclaration::Directive(_) => {}
                ExternalDeclaration::Declaration(Declaration::Other(other)) => runs.push(other),
                ExternalDeclaration::Declaration(Declaration::Variable(var)) => {
                    runs.extend(var.layout.as_deref());
                    runs.extend(var.ty.array.as_deref());
                    for declarator in &var.declarators {
                        runs.extend(declarator.array.as_deref());
                        runs.extend(declarator.initializer.as_deref());
                    }
                    if !crate::glsl::token::is_keyword(&var.ty.name) {
                        names.push((&var.ty.name, IdentifierRole::Type));
                    }
                    for declarator in &var.declarators {
                        names.push((&declarator.name, IdentifierRole::Declarator));
                    }
                }
                ExternalDeclaration::Function(function) => {
                    runs.push(&function.return_type);
                    runs.push(&function.parameters);
                    runs.extend(function.body.iter().map(|s| s.tokens.as_slice()));
                    names.push((&function.name, IdentifierRole::Function));
                }
            }
            for run in runs {
                visit_token_identifiers(position, run, f);
            }
            for (name, role) in names {
                f(position, name, role);
            }
        }
    }

    /// Apply `f` to every token run in the tree
    pub fn try_for_each_token_run(
        &mut self,
        f: &mut dyn FnMut(&mut Vec<Token>) -> Result<(), PatchError>,
    ) -> Result<(), PatchError> {
        for declaration in &mut self.declarations {
            match declaration {
                ExternalDeclaration::Directive(_) => {}
                ExternalDeclaration::Declaration(Declaration::Other(tokens)) => f(tokens)?,
                ExternalDeclaration::Declaration(Declaration::Variable(var)) => {
                    if let Some(layout) = &mut var.layout {
                        f(layout)?;
                    }
                    if let Some(array) = &mut var.ty.array {
                        f(array)?;
                    }
                    for declarator in &mut var.declarators {
                        if let Some(array) = &mut declarator.array {
                            f(array)?;
                        }
                        if let Some(initializer) = &mut declarator.initializer {
                            f(initializer)?;
                        }
                    }
                }
                ExternalDeclaration::Function(function) => {
                    f(&mut function.return_type)?;
                    f(&mut function.parameters)?;
                    for statement in &mut function.body {
                        f(&mut statement.tokens)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply `f` to the runs that hold expressions: global initializers and
    /// function bodies. Declaration syntax (interface blocks, structs,
    /// parameter lists) is left alone.
    pub fn try_for_each_expression_run(
        &mut self,
        f: &mut dyn FnMut(&mut Vec<Token>) -> Result<(), PatchError>,
    ) -> Result<(), PatchError> {
        for declaration in &mut self.declarations {
            match declaration {
                ExternalDeclaration::Declaration(Declaration::Variable(var)) => {
                    for declarator in &mut var.declarators {
                        if let Some(initializer) = &mut declarator.initializer {
                            f(initializer)?;
                        }
                    }
                }
                ExternalDeclaration::Function(function) => {
                    for statement in &mut function.body {
                        f(&mut statement.tokens)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply `f` to every name slot that is not part of a token run
    pub fn for_each_name_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        for declaration in &mut self.declarations {
            match declaration {
                ExternalDeclaration::Declaration(Declaration::Variable(var)) => {
                    f(&mut var.ty.name);
                    for declarator in &mut var.declarators {
                        f(&mut declarator.name);
                    }
                }
                ExternalDeclaration::Function(function) => f(&mut function.name),
                _ => {}
            }
        }
    }
}

fn visit_token_identifiers(
    position: usize,
    tokens: &[Token],
    f: &mut dyn FnMut(usize, &str, IdentifierRole),
) {
    let mut previous: Option<&Token> = None;
    for token in tokens {
        if let Token::Identifier(name) = token {
            if !crate::glsl::token::is_keyword(name) {
                let role = if previous == Some(&Token::Dot) {
                    IdentifierRole::Member
                } else {
                    IdentifierRole::Reference
                };
                f(position, name, role);
            }
        }
        previous = Some(token);
    }
}

impl fmt::Display for TranslationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::glsl::printing::print_compact(self))
    }
}
