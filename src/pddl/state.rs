use std::collections::{btree_set, BTreeSet, HashMap};
use std::fmt;

use super::error::Result;
use super::object::ObjectRegistry;
use super::proposition::Proposition;

/// A world state: the set of facts that hold. Ordered, so iteration and text
/// output are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct State(pub BTreeSet<Proposition>);

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, proposition: &Proposition) -> bool {
        self.0.contains(proposition)
    }

    pub fn insert(&mut self, proposition: Proposition) -> bool {
        self.0.insert(proposition)
    }

    pub fn remove(&mut self, proposition: &Proposition) -> bool {
        self.0.remove(proposition)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, Proposition> {
        self.0.iter()
    }

    pub fn is_superset(&self, other: &State) -> bool {
        self.0.is_superset(&other.0)
    }

    pub fn parse<I, S>(texts: I, objects: &ObjectRegistry, arities: &HashMap<String, usize>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        texts.into_iter()
            .map(|t| Proposition::parse(t.as_ref(), objects, arities))
            .collect()
    }

    pub fn stringify(&self) -> BTreeSet<String> {
        self.0.iter().map(Proposition::to_string).collect()
    }
}

impl FromIterator<Proposition> for State {
    fn from_iter<T: IntoIterator<Item = Proposition>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Proposition> for State {
    fn extend<T: IntoIterator<Item = Proposition>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

impl IntoIterator for State {
    type Item = Proposition;
    type IntoIter = btree_set::IntoIter<Proposition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a State {
    type Item = &'a Proposition;
    type IntoIter = btree_set::Iter<'a, Proposition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, "}}")
    }
}
