//! Identifier index
//!
//! An ordered map from every non-keyword identifier in a tree to where it
//! occurs. Ordering by name makes prefix queries a range scan that stops at the
//! first non-matching key.

use crate::glsl::ast::{IdentifierRole, TranslationUnit};
use std::collections::BTreeMap;
use std::ops::Bound;

/// One occurrence of a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    /// Position of the external declaration containing the occurrence
    pub declaration: usize,
    pub role: IdentifierRole,
}

#[derive(Debug, Clone, Default)]
pub struct IdentifierIndex {
    entries: BTreeMap<String, Vec<Occurrence>>,
}

impl IdentifierIndex {
    pub fn build(unit: &TranslationUnit) -> Self {
        let mut entries: BTreeMap<String, Vec<Occurrence>> = BTreeMap::new();
        unit.visit_identifiers(&mut |declaration, name, role| {
            entries
                .entry(name.to_string())
                .or_default()
                .push(Occurrence { declaration, role });
        });
        IdentifierIndex { entries }
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> &[Occurrence] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `name` is introduced by a global declarator or function definition
    pub fn is_declared(&self, name: &str) -> bool {
        self.get(name).iter().any(|o| {
            matches!(o.role, IdentifierRole::Declarator | IdentifierRole::Function)
        })
    }

    /// Whether `name` is used anywhere other than as a member selection
    pub fn is_referenced(&self, name: &str) -> bool {
        self.get(name)
            .iter()
            .any(|o| o.role == IdentifierRole::Reference)
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names starting with `prefix`, in lexical order
    pub fn prefix_query<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(name, _)| name.starts_with(prefix))
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glsl::parsing::parse;

    fn index(source: &str) -> IdentifierIndex {
        IdentifierIndex::build(&parse(source).unwrap())
    }

    #[test]
    fn test_keywords_are_not_indexed() {
        let index = index("uniform vec4 color;\nvoid main(){ gl_FragColor = color; }");
        assert!(index.has("color"));
        assert!(index.has("gl_FragColor"));
        assert!(!index.has("vec4"));
        assert!(!index.has("void"));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_declared_vs_referenced() {
        let index = index("float a;\nvoid main(){ b = a; }");
        assert!(index.is_declared("a"));
        assert!(index.is_referenced("a"));
        assert!(!index.is_declared("b"));
        assert!(index.is_declared("main"));
        assert!(index.get("missing").is_empty());
    }

    #[test]
    fn test_prefix_query_is_bounded() {
        let index = index("float iris_a, iris_b, irisMain2, iri, jris_c;");
        let found: Vec<&str> = index.prefix_query("iris_").collect();
        assert_eq!(found, vec!["iris_a", "iris_b"]);
        assert_eq!(index.prefix_query("irisMain").count(), 1);
        assert_eq!(index.prefix_query("moj_import").count(), 0);
    }

    #[test]
    fn test_member_selection_role() {
        let index = index("void main(){ v.xyz = w.position; }");
        assert_eq!(index.get("xyz")[0].role, IdentifierRole::Member);
        assert!(!index.is_referenced("position"));
    }
}
