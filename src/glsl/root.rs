//! Index build sessions and tree mutations
//!
//! A [Root] pairs a tree with its identifier index for the duration of one
//! session. Every mutation goes through it and rebuilds the index afterwards,
//! so queries made between rewrites always see the current tree.

use crate::error::{PatchError, StructuralError};
use crate::glsl::ast::{
    Declaration, Declarator, ExternalDeclaration, StorageQualifier, TranslationUnit,
    VariableDeclaration, VersionStatement,
};
use crate::glsl::index::IdentifierIndex;
use crate::glsl::parsing::{
    matching_close, parse_expression, parse_snippet_declarations, parse_statements,
};
use crate::glsl::token::Token;

/// Where injected declarations go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionPoint {
    /// After leading directives, before the first declaration
    BeforeDeclarations,
    /// Before the first function definition
    BeforeFunctions,
    /// After everything else
    End,
}

/// Index expression following an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscript {
    /// `name[N]` with an integer literal
    Constant(u32),
    /// `name[expr]` with anything else
    Dynamic,
    /// `name` without brackets
    Absent,
}

pub struct Root<'t> {
    tree: &'t mut TranslationUnit,
    index: IdentifierIndex,
}

impl<'t> Root<'t> {
    /// Run `f` with a session bound to `tree`. The index lives exactly as long
    /// as the call.
    pub fn index_build_session<R>(
        tree: &mut TranslationUnit,
        f: impl FnOnce(&mut Root<'_>) -> R,
    ) -> R {
        let index = IdentifierIndex::build(tree);
        let mut root = Root { tree, index };
        f(&mut root)
    }

    pub fn tree(&self) -> &TranslationUnit {
        self.tree
    }

    pub fn index(&self) -> &IdentifierIndex {
        &self.index
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.has(name)
    }

    fn reindex(&mut self) {
        self.index = IdentifierIndex::build(self.tree);
    }

    /// Fails unless a function named `name` is defined
    pub fn require_function(&self, name: &str) -> Result<(), PatchError> {
        match self.tree.function(name) {
            Some(_) => Ok(()),
            None => Err(PatchError::missing_anchor(name)),
        }
    }

    pub fn version(&self) -> Option<VersionStatement> {
        self.tree.version
    }

    pub fn set_version(&mut self, version: VersionStatement) {
        self.tree.version = Some(version);
    }

    /// Rename every non-member occurrence of `from`, declarations included
    pub fn rename(&mut self, from: &str, to: &str) -> Result<bool, PatchError> {
        if !self.index.has(from) {
            return Ok(false);
        }
        self.tree.for_each_name_mut(&mut |name| {
            if name == from {
                *name = to.to_string();
            }
        });
        self.tree.try_for_each_token_run(&mut |run| {
            for position in reference_positions(run, from) {
                run[position] = Token::identifier(to);
            }
            Ok(())
        })?;
        self.reindex();
        Ok(true)
    }

    /// Replace every reference to `name` inside expressions
    pub fn replace_references(&mut self, name: &str, expression: &str) -> Result<bool, PatchError> {
        self.replace_matching(name, expression, |_, _| true)
    }

    /// Like [Root::replace_references], skipping occurrences that are
    /// already subscripted
    pub fn replace_bare_references(
        &mut self,
        name: &str,
        expression: &str,
    ) -> Result<bool, PatchError> {
        self.replace_matching(name, expression, |run, position| {
            run.get(position + 1) != Some(&Token::LeftBracket)
        })
    }

    fn replace_matching(
        &mut self,
        name: &str,
        expression: &str,
        keep: impl Fn(&[Token], usize) -> bool,
    ) -> Result<bool, PatchError> {
        if !self.index.has(name) {
            return Ok(false);
        }
        let replacement = parse_expression(expression)?;
        let mut changed = false;
        self.tree.try_for_each_expression_run(&mut |run| {
            let tokens: &[Token] = run;
            let positions: Vec<usize> = reference_positions(tokens, name)
                .into_iter()
                .filter(|&position| keep(tokens, position))
                .collect();
            for position in positions.into_iter().rev() {
                run.splice(position..=position, replacement.iter().cloned());
                changed = true;
            }
            Ok(())
        })?;
        self.reindex();
        Ok(changed)
    }

    /// Replace `name[...]` (or bare `name`) with the expression `f` returns
    /// for its subscript
    pub fn replace_subscripts(
        &mut self,
        name: &str,
        mut f: impl FnMut(Subscript) -> Result<String, PatchError>,
    ) -> Result<bool, PatchError> {
        if !self.index.has(name) {
            return Ok(false);
        }
        let mut changed = false;
        self.tree.try_for_each_expression_run(&mut |run| {
            for position in reference_positions(run, name).into_iter().rev() {
                let (subscript, end) = subscript_at(run, position);
                let replacement = parse_expression(&f(subscript)?)?;
                run.splice(position..end, replacement);
                changed = true;
            }
            Ok(())
        })?;
        self.reindex();
        Ok(changed)
    }

    /// Rewrite calls `name(args)` into `wrapper(callee(args))`
    pub fn wrap_calls(
        &mut self,
        name: &str,
        callee: &str,
        wrapper: &str,
    ) -> Result<bool, PatchError> {
        if !self.index.has(name) {
            return Ok(false);
        }
        let mut changed = false;
        self.tree.try_for_each_expression_run(&mut |run| {
            for position in reference_positions(run, name).into_iter().rev() {
                if run.get(position + 1) != Some(&Token::LeftParen) {
                    continue;
                }
                let close = matching_close(run, position + 1)
                    .ok_or_else(|| PatchError::syntax(0, format!("unclosed call to `{}`", name)))?;
                run.insert(close + 1, Token::RightParen);
                run[position] = Token::identifier(callee);
                run.splice(
                    position..position,
                    [Token::identifier(wrapper), Token::LeftParen],
                );
                changed = true;
            }
            Ok(())
        })?;
        self.reindex();
        Ok(changed)
    }

    /// Insert the declarations in `source` at `point`
    ///
    /// An existing global variable with the same name, type and storage is
    /// replaced by the injected one. Any other redeclaration is an error.
    pub fn inject(&mut self, point: InjectionPoint, source: &str) -> Result<(), PatchError> {
        let declarations = parse_snippet_declarations(source)?;

        for declaration in &declarations {
            if let ExternalDeclaration::Declaration(Declaration::Variable(var)) = declaration {
                for declarator in &var.declarators {
                    self.merge_global(var, declarator)?;
                }
            }
        }

        let position = match point {
            InjectionPoint::BeforeDeclarations => self.tree.declarations_start(),
            InjectionPoint::BeforeFunctions => self.tree.functions_start(),
            InjectionPoint::End => self.tree.declarations.len(),
        };
        self.tree.declarations.splice(position..position, declarations);
        self.reindex();
        Ok(())
    }

    /// Drop an existing declarator that the injected one replaces. The two must
    /// agree on type and storage.
    fn merge_global(
        &mut self,
        requested: &VariableDeclaration,
        declarator: &Declarator,
    ) -> Result<(), PatchError> {
        let name = declarator.name.as_str();
        let Some((position, var, existing)) = self.tree.global_variable(name) else {
            return Ok(());
        };
        let compatible = var.type_of(existing) == requested.type_of(declarator)
            && StorageQualifier::merges_with(var.storage(), requested.storage());
        if !compatible {
            return Err(StructuralError::IncompatibleRedeclaration {
                name: name.to_string(),
                existing: var.signature_of(existing),
                requested: requested.signature_of(declarator),
            }
            .into());
        }

        if let ExternalDeclaration::Declaration(Declaration::Variable(var)) =
            &mut self.tree.declarations[position]
        {
            var.declarators.retain(|d| d.name != name);
            if var.declarators.is_empty() {
                self.tree.declarations.remove(position);
            }
        }
        Ok(())
    }

    /// Insert statements at the start of `main`
    pub fn prepend_main(&mut self, source: &str) -> Result<(), PatchError> {
        let statements = parse_statements(source)?;
        let main = self
            .tree
            .function_mut("main")
            .ok_or_else(|| PatchError::missing_anchor("main"))?;
        main.body.splice(0..0, statements);
        self.reindex();
        Ok(())
    }

    /// Rename `main` to `irisMain` and add a new `main` that calls it and then
    /// runs `epilogue`
    pub fn wrap_main(&mut self, epilogue: &str) -> Result<(), PatchError> {
        let main = self
            .tree
            .function_mut("main")
            .ok_or_else(|| PatchError::missing_anchor("main"))?;
        main.name = "irisMain".to_string();
        self.inject(
            InjectionPoint::End,
            &format!("void main() {{ irisMain(); {} }}", epilogue),
        )
    }

    /// Put `prologue` in front of every `name();` statement, the pair wrapped
    /// in a block. Returns the number of statements rewritten.
    pub fn surround_call_statements(
        &mut self,
        name: &str,
        prologue: &str,
    ) -> Result<usize, PatchError> {
        let prologue = parse_expression(prologue)?;
        let mut count = 0;
        for declaration in &mut self.tree.declarations {
            let ExternalDeclaration::Function(function) = declaration else {
                continue;
            };
            for statement in &mut function.body {
                let run = &mut statement.tokens;
                for position in reference_positions(run, name).into_iter().rev() {
                    let is_call_statement = matches!(
                        run.get(position + 1..position + 4),
                        Some([Token::LeftParen, Token::RightParen, Token::Semicolon])
                    );
                    if !is_call_statement {
                        continue;
                    }
                    run.insert(position + 4, Token::RightBrace);
                    let opening = std::iter::once(Token::LeftBrace).chain(prologue.iter().cloned());
                    run.splice(position..position, opening);
                    count += 1;
                }
            }
        }
        self.reindex();
        Ok(count)
    }

    /// Swap one storage qualifier for another on every global declaration
    pub fn retarget_storage(&mut self, from: StorageQualifier, to: StorageQualifier) -> usize {
        use crate::glsl::ast::Qualifier;
        let mut count = 0;
        for declaration in &mut self.tree.declarations {
            if let ExternalDeclaration::Declaration(Declaration::Variable(var)) = declaration {
                for qualifier in &mut var.qualifiers {
                    if *qualifier == Qualifier::Storage(from) {
                        *qualifier = Qualifier::Storage(to);
                        count += 1;
                    }
                }
            }
        }
        count
    }
}

/// Positions of `name` in `run` that are not member selections
fn reference_positions(run: &[Token], name: &str) -> Vec<usize> {
    run.iter()
        .enumerate()
        .filter(|(position, token)| {
            token.is_identifier(name) && (*position == 0 || run[position - 1] != Token::Dot)
        })
        .map(|(position, _)| position)
        .collect()
}

/// Classify the subscript after `run[position]` and return the end of the
/// indexed expression
fn subscript_at(run: &[Token], position: usize) -> (Subscript, usize) {
    if run.get(position + 1) != Some(&Token::LeftBracket) {
        return (Subscript::Absent, position + 1);
    }
    let Some(close) = matching_close(run, position + 1) else {
        return (Subscript::Dynamic, position + 1);
    };
    let subscript = match &run[position + 2..close] {
        [Token::IntConstant(literal)] => literal
            .trim_end_matches(['u', 'U'])
            .parse::<u32>()
            .map(Subscript::Constant)
            .unwrap_or(Subscript::Dynamic),
        _ => Subscript::Dynamic,
    };
    (subscript, close + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glsl::parsing::parse;
    use crate::glsl::printing::print_compact;

    fn with_root<R>(source: &str, f: impl FnOnce(&mut Root<'_>) -> R) -> (R, String) {
        let mut tree = parse(source).unwrap();
        let result = Root::index_build_session(&mut tree, f);
        (result, print_compact(&tree))
    }

    #[test]
    fn test_rename_skips_members() {
        let source = "uniform sampler2D texture;\nvoid main(){ x = texture2D(texture, v.texture); }";
        let (changed, out) = with_root(source, |root| {
            let changed = root.rename("texture", "gtexture").unwrap();
            assert!(root.has("gtexture"));
            assert!(!root.index().is_referenced("texture"));
            changed
        });
        assert!(changed);
        assert!(out.contains("uniform sampler2D gtexture;"));
        assert!(out.contains("texture2D(gtexture,v.texture)"));
    }

    #[test]
    fn test_rename_missing_is_noop() {
        let (changed, _) = with_root("void main(){}", |root| root.rename("nothing", "else").unwrap());
        assert!(!changed);
    }

    #[test]
    fn test_replace_references_reindexes() {
        let (_, out) = with_root("void main(){ gl_FragColor.a = 1.0; }", |root| {
            assert!(root.replace_references("gl_FragColor", "gl_FragData[0]").unwrap());
            assert!(!root.has("gl_FragColor"));
            assert!(root.has("gl_FragData"));
        });
        assert!(out.contains("gl_FragData[0].a=1.0;"));
    }

    #[test]
    fn test_replace_bare_references() {
        let (_, out) = with_root("void main(){ a = c; b = c[1]; }", |root| {
            root.replace_bare_references("c", "c[0]").unwrap();
        });
        assert!(out.contains("a=c[0];b=c[1];"));
    }

    #[test]
    fn test_replacements_skip_declaration_syntax() {
        let (_, out) = with_root(
            "in VS { vec4 entityColor; } vin[];\nvec4 f(vec4 entityColor);\nvec4 g = entityColor;\nvoid main(){ c = entityColor; }",
            |root| {
                assert!(root.replace_bare_references("entityColor", "entityColor[0]").unwrap());
            },
        );
        assert!(out.contains("in VS{vec4 entityColor;}vin[];"));
        assert!(out.contains("vec4 f(vec4 entityColor);"));
        assert!(out.contains("vec4 g=entityColor[0];"));
        assert!(out.contains("c=entityColor[0];"));
    }

    #[test]
    fn test_replace_subscripts() {
        let (seen, out) = with_root("void main(){ d[1] = vec4(0.0); d[2u].r = 1.0; }", |root| {
            let mut seen = Vec::new();
            root.replace_subscripts("d", |subscript| {
                seen.push(subscript);
                match subscript {
                    Subscript::Constant(n) => Ok(format!("out{}", n)),
                    _ => Ok("bad".to_string()),
                }
            })
            .unwrap();
            seen
        });
        assert_eq!(seen, vec![Subscript::Constant(1), Subscript::Constant(2)]);
        assert!(out.contains("out1=vec4(0.0);out2.r=1.0;"));
    }

    #[test]
    fn test_dynamic_subscript_error_propagates() {
        let mut tree = parse("void main(){ d[i] = vec4(0.0); }").unwrap();
        let result = Root::index_build_session(&mut tree, |root| {
            root.replace_subscripts("d", |subscript| match subscript {
                Subscript::Constant(n) => Ok(n.to_string()),
                _ => Err(StructuralError::DynamicIndex("d".into()).into()),
            })
        });
        assert!(matches!(
            result,
            Err(PatchError::Structural(StructuralError::DynamicIndex(_)))
        ));
    }

    #[test]
    fn test_wrap_calls() {
        let (_, out) = with_root("void main(){ float s = shadow2D(tex, vec3(uv, d)).r; }", |root| {
            root.wrap_calls("shadow2D", "texture", "vec4").unwrap();
        });
        assert!(out.contains("vec4(texture(tex,vec3(uv,d))).r"));
    }

    #[test]
    fn test_inject_positions() {
        let (_, out) = with_root("#extension GL_x : enable\nfloat a;\nvoid main(){}", |root| {
            root.inject(InjectionPoint::BeforeDeclarations, "uniform float first;").unwrap();
            root.inject(InjectionPoint::BeforeFunctions, "void helper() {}").unwrap();
            root.inject(InjectionPoint::End, "float last;").unwrap();
        });
        assert_eq!(
            out,
            "#extension GL_x : enable\nuniform float first;\nfloat a;\nvoid helper(){}\nvoid main(){}\nfloat last;\n"
        );
    }

    #[test]
    fn test_inject_merges_same_type() {
        let (_, out) = with_root("varying vec4 other, entityColor;\nvoid main(){}", |root| {
            root.inject(InjectionPoint::BeforeDeclarations, "in vec4 entityColor;").unwrap();
        });
        assert_eq!(out, "in vec4 entityColor;\nvarying vec4 other;\nvoid main(){}\n");
    }

    #[test]
    fn test_inject_rejects_other_type() {
        let mut tree = parse("varying vec3 entityColor;\nvoid main(){}").unwrap();
        let err = Root::index_build_session(&mut tree, |root| {
            root.inject(InjectionPoint::BeforeDeclarations, "in vec4 entityColor;")
        })
        .unwrap_err();
        assert_eq!(
            err,
            PatchError::Structural(StructuralError::IncompatibleRedeclaration {
                name: "entityColor".into(),
                existing: "varying vec3".into(),
                requested: "in vec4".into(),
            })
        );
    }

    #[test]
    fn test_inject_rejects_other_storage() {
        let mut tree = parse("uniform vec3 Normal;\nvoid main(){}").unwrap();
        let err = Root::index_build_session(&mut tree, |root| {
            root.inject(InjectionPoint::BeforeDeclarations, "in vec3 Normal;")
        })
        .unwrap_err();
        assert_eq!(
            err,
            PatchError::Structural(StructuralError::IncompatibleRedeclaration {
                name: "Normal".into(),
                existing: "uniform vec3".into(),
                requested: "in vec3".into(),
            })
        );
        assert!(tree.global_variable("Normal").is_some());
    }

    #[test]
    fn test_inject_merges_legacy_storage() {
        let source = "attribute vec3 Position;\nvarying vec2 uv;\nvoid main(){}";
        let (_, out) = with_root(source, |root| {
            root.inject(InjectionPoint::BeforeDeclarations, "in vec3 Position; out vec2 uv;")
                .unwrap();
        });
        assert_eq!(out, "in vec3 Position;\nout vec2 uv;\nvoid main(){}\n");

        let mut tree = parse("attribute vec4 c;\nvoid main(){}").unwrap();
        let result = Root::index_build_session(&mut tree, |root| {
            root.inject(InjectionPoint::BeforeDeclarations, "out vec4 c;")
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_prepend_and_wrap_main() {
        let (_, out) = with_root("void main(){ a(); }", |root| {
            root.prepend_main("b();").unwrap();
            root.wrap_main("c();").unwrap();
            assert!(root.index().is_declared("irisMain"));
        });
        assert_eq!(out, "void irisMain(){b();a();}\nvoid main(){irisMain();c();}\n");
    }

    #[test]
    fn test_missing_main() {
        let mut tree = parse("void notMain(){}").unwrap();
        Root::index_build_session(&mut tree, |root| {
            assert_eq!(root.require_function("main"), Err(PatchError::missing_anchor("main")));
            assert!(root.prepend_main("a();").is_err());
            assert!(root.wrap_main("").is_err());
        });
    }

    #[test]
    fn test_surround_nested_call_statements() {
        let (count, out) = with_root(
            "void main(){ for(int i=0;i<3;i++){ EmitVertex(); } EmitVertex(); EndPrimitive(); }",
            |root| root.surround_call_statements("EmitVertex", "a = b[0];").unwrap(),
        );
        assert_eq!(count, 2);
        assert!(out.contains("{{a=b[0];EmitVertex();}}"));
        assert!(out.contains("{a=b[0];EmitVertex();}EndPrimitive();"));
    }

    #[test]
    fn test_retarget_storage() {
        let (count, out) = with_root("attribute vec3 p;\nvarying vec2 uv;\nvoid main(){}", |root| {
            root.retarget_storage(StorageQualifier::Attribute, StorageQualifier::In)
                + root.retarget_storage(StorageQualifier::Varying, StorageQualifier::Out)
        });
        assert_eq!(count, 2);
        assert!(out.starts_with("in vec3 p;\nout vec2 uv;\n"));
    }
}
