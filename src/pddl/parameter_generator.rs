use std::collections::HashSet;

use super::object::{Object, ObjectRegistry};
use super::parser::ast::{self, TypedList};

/// A typed parameter, e.g. `?b - (either block table)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub types: Vec<String>,
}

impl Parameter {
    pub fn from_typed_lists(lists: &[TypedList]) -> Vec<Self> {
        ast::flatten(lists).into_iter()
            .map(|(name, types)| Self { name: name.to_owned(), types: types.to_vec() })
            .collect()
    }
}

/// Every argument tuple for a parameter list: the Cartesian product of the
/// objects each parameter admits. The last parameter varies fastest.
#[derive(Debug, Clone, Default)]
pub struct ParameterGenerator {
    candidates: Vec<Vec<Object>>,
}

impl ParameterGenerator {
    pub fn new(objects: &ObjectRegistry, parameters: &[Parameter]) -> Self {
        let candidates = parameters.iter()
            .map(|p| {
                let mut seen = HashSet::new();
                p.types.iter()
                    .flat_map(|t| objects.of_type(t))
                    .filter(|o| seen.insert(o.name().to_owned()))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { candidates }
    }

    pub fn candidates(&self) -> &[Vec<Object>] {
        &self.candidates
    }

    /// Number of tuples; one for an empty parameter list. Saturates instead of overflowing.
    pub fn len(&self) -> usize {
        self.candidates.iter().fold(1usize, |n, c| n.saturating_mul(c.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Iter<'_> {
        let exhausted = self.candidates.iter().any(Vec::is_empty);
        Iter { candidates: &self.candidates, indices: vec![0; self.candidates.len()], exhausted }
    }
}

impl<'a> IntoIterator for &'a ParameterGenerator {
    type Item = Vec<Object>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a> {
    candidates: &'a [Vec<Object>],
    indices: Vec<usize>,
    exhausted: bool,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Vec<Object>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let tuple = self.indices.iter()
            .zip(self.candidates)
            .map(|(&i, c)| c[i].clone())
            .collect();
        // odometer step
        self.exhausted = true;
        for (index, candidates) in self.indices.iter_mut().zip(self.candidates).rev() {
            *index += 1;
            if *index < candidates.len() {
                self.exhausted = false;
                break;
            }
            *index = 0;
        }
        Some(tuple)
    }
}
