//! Compact printer
//!
//! Writes the version line, then one line per external declaration. Inside a
//! line tokens are joined without whitespace unless two neighbours would lex
//! as a single token.

use crate::glsl::ast::{
    Declaration, ExternalDeclaration, FunctionDefinition, TranslationUnit, VariableDeclaration,
};
use crate::glsl::token::Token;

pub fn print_compact(unit: &TranslationUnit) -> String {
    let mut out = String::new();

    if let Some(version) = &unit.version {
        out.push_str(&format!("#version {}", version.number));
        if let Some(profile) = version.profile {
            out.push(' ');
            out.push_str(profile.as_str());
        }
        out.push('\n');
    }

    for declaration in &unit.declarations {
        match declaration {
            ExternalDeclaration::Directive(directive) => out.push_str(&directive.text),
            ExternalDeclaration::Declaration(Declaration::Variable(var)) => {
                write_tokens(&mut out, &variable_tokens(var));
                out.push(';');
            }
            ExternalDeclaration::Declaration(Declaration::Other(tokens)) => {
                write_tokens(&mut out, tokens);
                out.push(';');
            }
            ExternalDeclaration::Function(function) => {
                write_tokens(&mut out, &function_tokens(function));
            }
        }
        out.push('\n');
    }

    out
}

fn variable_tokens(var: &VariableDeclaration) -> Vec<Token> {
    let mut tokens = Vec::new();
    if let Some(layout) = &var.layout {
        tokens.extend(layout.iter().cloned());
    }
    tokens.extend(var.qualifiers.iter().map(|q| Token::identifier(q.as_str())));
    tokens.push(Token::identifier(&var.ty.name));
    if let Some(array) = &var.ty.array {
        tokens.extend(array.iter().cloned());
    }
    for (i, declarator) in var.declarators.iter().enumerate() {
        if i > 0 {
            tokens.push(Token::Comma);
        }
        tokens.push(Token::identifier(&declarator.name));
        if let Some(array) = &declarator.array {
            tokens.extend(array.iter().cloned());
        }
        if let Some(initializer) = &declarator.initializer {
            tokens.push(Token::Assign);
            tokens.extend(initializer.iter().cloned());
        }
    }
    tokens
}

fn function_tokens(function: &FunctionDefinition) -> Vec<Token> {
    let mut tokens = function.return_type.clone();
    tokens.push(Token::identifier(&function.name));
    tokens.push(Token::LeftParen);
    tokens.extend(function.parameters.iter().cloned());
    tokens.push(Token::RightParen);
    tokens.push(Token::LeftBrace);
    for statement in &function.body {
        tokens.extend(statement.tokens.iter().cloned());
    }
    tokens.push(Token::RightBrace);
    tokens
}

fn write_tokens(out: &mut String, tokens: &[Token]) {
    let mut previous: Option<&Token> = None;
    for token in tokens {
        if let Some(previous) = previous {
            if needs_space(previous, token) {
                out.push(' ');
            }
        }
        out.push_str(&token.to_string());
        previous = Some(token);
    }
}

fn needs_space(left: &Token, right: &Token) -> bool {
    (left.is_word() && right.is_word()) || (left.is_operator_like() && right.is_operator_like())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glsl::parsing::parse;

    #[test]
    fn test_compact_output() {
        let unit = parse(
            "#version 330 core\n\nuniform   mat4 m ;\n// comment\nvoid main ( ) {\n  gl_Position = m * vec4 ( 1.0 ) ;\n}\n",
        )
        .unwrap();
        insta::assert_snapshot!(print_compact(&unit).trim_end(), @r###"
        #version 330 core
        uniform mat4 m;
        void main(){gl_Position=m*vec4(1.0);}
        "###);
    }

    #[test]
    fn test_operators_do_not_fuse() {
        let unit = parse("void main(){ a = b - -c; d = e + +f; g = h < -i; }").unwrap();
        let out = print_compact(&unit);
        assert!(out.contains("a=b- -c;"));
        assert!(out.contains("d=e+ +f;"));
        assert!(out.contains("g=h< -i;"));
    }

    #[test]
    fn test_printed_output_reparses_identically() {
        let source = "#version 150\nlayout(location = 0) out vec4 color[2];\nstruct S { float a; };\nvec3 f(vec3 x) { return x * 2.0; }\nvoid main() { if (true) { color[0] = vec4(f(vec3(1.0)), 1.0); } else color[1] = vec4(0.0); }";
        let first = parse(source).unwrap();
        let printed = print_compact(&first);
        assert_eq!(parse(&printed).unwrap(), first);
    }

    #[test]
    fn test_empty_unit() {
        assert_eq!(print_compact(&TranslationUnit::default()), "");
    }
}
