//! Data types carried by parameters and variables.
//!
//! A type has a name, a display color, an optional validation pattern and an
//! optional parent. The parent relation is a single chain: a type is
//! assignable to itself and to every type on its ancestor chain.

use crate::error::{EditorError, Result};
use crate::model::id::TypeId;
use crate::render::Color;
use regex::Regex;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct DataType {
    pub id: TypeId,
    pub name: String,
    pub color: Color,
    /// Parent type (single-level "extends").
    pub parent: Option<TypeId>,
    /// Source of the validation pattern, as written by the user.
    pattern: Option<String>,
    /// The pattern anchored to the whole value.
    validation: Option<Regex>,
}

impl DataType {
    /// Whether a parameter of this type may hold a fixed literal.
    pub fn allows_fixed_value(&self) -> bool {
        self.validation.is_some()
    }

    /// Test a literal against the validation pattern.
    ///
    /// Fails closed: a type without a pattern admits no literal at all.
    pub fn is_valid(&self, value: &str) -> bool {
        self.validation
            .as_ref()
            .map(|re| re.is_match(value))
            .unwrap_or(false)
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }
}

/// All types known to a workspace, indexed by `TypeId`.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: Vec<DataType>,
    name_index: HashMap<String, TypeId>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Register a type.
    ///
    /// The parent must already be registered, which keeps the ancestor chain
    /// acyclic.
    pub fn add(
        &mut self,
        name: &str,
        color: Color,
        pattern: Option<&str>,
        parent: Option<TypeId>,
    ) -> Result<TypeId> {
        if name.trim().is_empty() {
            return Err(EditorError::MissingField("type name".to_string()));
        }
        if self.name_index.contains_key(name) {
            return Err(EditorError::DuplicateName {
                kind: "type",
                name: name.to_string(),
            });
        }
        if let Some(parent) = parent {
            if self.get(parent).is_none() {
                return Err(EditorError::UnknownType(format!("{}", parent)));
            }
        }
        let validation = match pattern {
            Some(p) => Some(Regex::new(&format!("^(?:{})$", p)).map_err(|e| {
                EditorError::InvalidPattern {
                    type_name: name.to_string(),
                    message: e.to_string(),
                }
            })?),
            None => None,
        };

        let id = TypeId(self.types.len() as u32);
        self.types.push(DataType {
            id,
            name: name.to_string(),
            color,
            parent,
            pattern: pattern.map(str::to_string),
            validation,
        });
        self.name_index.insert(name.to_string(), id);
        Ok(id)
    }

    #[inline]
    pub fn get(&self, id: TypeId) -> Option<&DataType> {
        self.types.get(id.index())
    }

    pub fn find_by_name(&self, name: &str) -> Option<TypeId> {
        self.name_index.get(name).copied()
    }

    pub fn name_of(&self, id: TypeId) -> &str {
        self.get(id).map(|t| t.name.as_str()).unwrap_or("?")
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataType> {
        self.types.iter()
    }

    /// `src` followed by each of its ancestors.
    pub fn ancestors(&self, src: TypeId) -> Ancestors<'_> {
        Ancestors {
            registry: self,
            current: self.get(src).map(|t| t.id),
            remaining: self.types.len(),
        }
    }

    /// Whether a value of type `src` may be used where `dest` is expected.
    ///
    /// True when `dest` is `src` or one of `src`'s ancestors.
    pub fn is_assignable(&self, dest: TypeId, src: TypeId) -> bool {
        self.ancestors(src).any(|t| t == dest)
    }

    /// Whether `value` is an acceptable literal for `type_id`.
    pub fn is_valid_value(&self, type_id: TypeId, value: &str) -> bool {
        self.get(type_id).is_some_and(|t| t.is_valid(value))
    }
}

pub struct Ancestors<'a> {
    registry: &'a TypeRegistry,
    current: Option<TypeId>,
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = TypeId;

    fn next(&mut self) -> Option<TypeId> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.current?;
        self.remaining -= 1;
        self.current = self.registry.get(id).and_then(|t| t.parent);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (TypeRegistry, TypeId, TypeId, TypeId) {
        let mut reg = TypeRegistry::new();
        let any = reg.add("Any", [128, 128, 128, 255], None, None).unwrap();
        let number = reg
            .add("Number", [0, 0, 255, 255], Some(r"-?\d+(\.\d+)?"), Some(any))
            .unwrap();
        let int = reg
            .add("Integer", [0, 128, 255, 255], Some(r"-?\d+"), Some(number))
            .unwrap();
        (reg, any, number, int)
    }

    #[test]
    fn test_is_valid_fails_closed() {
        let (reg, any, number, _) = registry();
        assert!(!reg.get(any).unwrap().is_valid("anything"));
        assert!(!reg.get(any).unwrap().allows_fixed_value());
        assert!(reg.get(number).unwrap().is_valid("2.5"));
        assert!(!reg.get(number).unwrap().is_valid("2.5x"));
    }

    #[test]
    fn test_pattern_matches_whole_value() {
        let (reg, _, _, int) = registry();
        assert!(reg.is_valid_value(int, "42"));
        assert!(!reg.is_valid_value(int, "a42"));
        assert!(!reg.is_valid_value(int, "42 "));
    }

    #[test]
    fn test_assignability_walks_source_chain() {
        let (reg, any, number, int) = registry();
        assert!(reg.is_assignable(number, int));
        assert!(reg.is_assignable(any, int));
        assert!(!reg.is_assignable(int, number));
        assert!(reg.is_assignable(int, int));
    }

    #[test]
    fn test_duplicate_and_unknown_parent_rejected() {
        let (mut reg, _, _, _) = registry();
        assert!(matches!(
            reg.add("Number", [0; 4], None, None),
            Err(EditorError::DuplicateName { .. })
        ));
        assert!(matches!(
            reg.add("Other", [0; 4], None, Some(TypeId(99))),
            Err(EditorError::UnknownType(_))
        ));
        assert!(matches!(
            reg.add("Broken", [0; 4], Some("("), None),
            Err(EditorError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_ancestors_order() {
        let (reg, any, number, int) = registry();
        let chain: Vec<_> = reg.ancestors(int).collect();
        assert_eq!(chain, vec![int, number, any]);
    }

    // Property-based tests using proptest
    use proptest::prelude::*;

    /// Registry where type `i` derives from `parents[i]` (an earlier index) or is a root.
    fn forest(parents: &[Option<usize>]) -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        for (i, parent) in parents.iter().enumerate() {
            let parent = parent.filter(|p| *p < i).map(|p| TypeId(p as u32));
            reg.add(&format!("T{}", i), [0; 4], None, parent).unwrap();
        }
        reg
    }

    proptest! {
        #[test]
        fn test_assignability_reflexive_and_transitive(
            parents in prop::collection::vec(prop::option::of(0usize..12), 1..12),
            picks in prop::collection::vec(0usize..12, 3),
        ) {
            let reg = forest(&parents);
            let n = reg.len();
            let [a, b, c] = [picks[0] % n, picks[1] % n, picks[2] % n]
                .map(|i| TypeId(i as u32));

            prop_assert!(reg.is_assignable(a, a));
            if reg.is_assignable(a, b) && reg.is_assignable(b, c) {
                prop_assert!(reg.is_assignable(a, c));
            }
            // Two distinct types are never mutually assignable
            if a != b {
                prop_assert!(!(reg.is_assignable(a, b) && reg.is_assignable(b, a)));
            }
        }
    }
}
