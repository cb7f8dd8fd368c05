use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::error::{Error, Result};
use super::parser::ast::{self, ROOT_TYPE};

#[derive(Debug, PartialEq, Eq)]
pub struct ObjectData {
    pub name: String,
    /// Declared type and every ancestor, `object` included.
    pub types: BTreeSet<String>,
}

/// A typed symbol. Cheap to clone; identity is the name.
#[derive(Debug, Clone)]
pub struct Object(Arc<ObjectData>);

impl Object {
    pub fn new(name: impl Into<String>, types: BTreeSet<String>) -> Self {
        Self(Arc::new(ObjectData { name: name.into(), types }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn types(&self) -> &BTreeSet<String> {
        &self.0.types
    }

    pub fn is_a(&self, kind: &str) -> bool {
        self.0.types.contains(kind)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state)
    }
}

impl PartialOrd for Object {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Object {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.name.cmp(&other.0.name)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// The type lattice. A type may list several parents via `(either ...)` or
/// repeated declarations.
#[derive(Debug, Default, Clone)]
pub struct TypeHierarchy {
    parents: HashMap<String, BTreeSet<String>>,
    /// Declaration order, root type first.
    order: Vec<String>,
}

impl TypeHierarchy {
    pub fn new(types: &[ast::TypedList]) -> Self {
        let mut hierarchy = Self::default();
        hierarchy.declare(ROOT_TYPE);
        for list in types {
            for kind in &list.kind {
                hierarchy.declare(kind);
            }
            for name in &list.identifiers {
                hierarchy.declare(name);
                if name == ROOT_TYPE {
                    continue;
                }
                if let Some(parents) = hierarchy.parents.get_mut(name) {
                    parents.extend(list.kind.iter().filter(|k| *k != name).cloned());
                }
            }
        }
        hierarchy
    }

    fn declare(&mut self, name: &str) {
        if !self.parents.contains_key(name) {
            self.parents.insert(name.to_owned(), BTreeSet::new());
            self.order.push(name.to_owned());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parents.contains_key(name)
    }

    pub fn parents(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.parents.get(name)
    }

    /// `name` plus everything reachable through parent links, plus `object`.
    pub fn ancestors(&self, name: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![name.to_owned()];
        while let Some(kind) = stack.pop() {
            if !seen.insert(kind.clone()) {
                continue;
            }
            if let Some(parents) = self.parents.get(&kind) {
                stack.extend(parents.iter().cloned());
            }
        }
        seen.insert(ROOT_TYPE.to_owned());
        seen
    }

    pub fn is_subtype(&self, kind: &str, of: &str) -> bool {
        of == ROOT_TYPE || self.ancestors(kind).contains(of)
    }

    pub fn types(&self) -> &[String] {
        &self.order
    }
}

pub type ObjectMap = HashMap<String, Vec<Object>>;

/// Every object of a domain+problem pair and the type -> members index.
#[derive(Debug, Clone)]
pub struct ObjectRegistry {
    hierarchy: TypeHierarchy,
    objects: Vec<Object>,
    by_name: HashMap<String, Object>,
    by_type: ObjectMap,
}

impl ObjectRegistry {
    /// Constants come first, then problem objects. A name declared twice is an error.
    pub fn new(domain: &ast::Domain, problem: &ast::Problem) -> Result<Self> {
        let hierarchy = TypeHierarchy::new(&domain.types);
        let mut registry = Self {
            objects: Vec::new(),
            by_name: HashMap::new(),
            by_type: hierarchy.types().iter().map(|t| (t.clone(), Vec::new())).collect(),
            hierarchy,
        };
        for (name, kinds) in ast::flatten(&domain.constants).into_iter().chain(ast::flatten(&problem.objects)) {
            registry.add(name, kinds)?;
        }
        Ok(registry)
    }

    fn add(&mut self, name: &str, kinds: &[String]) -> Result<()> {
        if self.by_name.contains_key(name) {
            return Err(Error::DuplicateObject(name.to_owned()));
        }
        let types = kinds.iter().flat_map(|k| self.hierarchy.ancestors(k)).collect::<BTreeSet<_>>();
        let object = Object::new(name, types);
        for kind in object.types() {
            self.by_type.entry(kind.clone()).or_default().push(object.clone());
        }
        self.by_name.insert(name.to_owned(), object.clone());
        self.objects.push(object);
        Ok(())
    }

    /// Names are case-insensitive, as in PDDL sources.
    pub fn get(&self, name: &str) -> Result<&Object> {
        self.by_name.get(name)
            .or_else(|| self.by_name.get(&name.to_ascii_lowercase()))
            .ok_or_else(|| Error::UnknownObject(name.to_owned()))
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    /// Members of `kind` in declaration order; empty when the type has none.
    pub fn of_type(&self, kind: &str) -> &[Object] {
        self.by_type.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn object_map(&self) -> &ObjectMap {
        &self.by_type
    }

    pub fn types(&self) -> &[String] {
        self.hierarchy.types()
    }

    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pddl::parser::Parser;

    fn load(domain: &str, problem: &str) -> Result<ObjectRegistry> {
        let domain = Parser::new(domain).next().unwrap().unwrap().into_domain().unwrap();
        let problem = Parser::new(problem).next().unwrap().unwrap().into_problem().unwrap();
        ObjectRegistry::new(&domain, &problem)
    }

    #[test]
    fn test_lattice() {
        let hierarchy = TypeHierarchy::new(&[
            ast::TypedList::new(vec!["cup".into()], vec!["container".into(), "washable".into()]),
            ast::TypedList::new(vec!["container".into()], vec!["object".into()]),
        ]);
        assert_eq!(hierarchy.ancestors("cup").into_iter().collect::<Vec<_>>(), vec!["container", "cup", "object", "washable"]);
        assert!(hierarchy.is_subtype("cup", "washable"));
        assert!(!hierarchy.is_subtype("container", "cup"));
        assert_eq!(hierarchy.types(), &["object", "container", "washable", "cup"]);
    }

    #[test]
    fn test_registry() {
        let registry = load(
            "(define (domain d) (:types block - object table) (:constants t1 - table))",
            "(define (problem p) (:domain d) (:objects a b - block) (:goal (and)))",
        ).unwrap();
        let names = |objs: &[Object]| objs.iter().map(|o| o.name().to_owned()).collect::<Vec<_>>();
        assert_eq!(names(registry.objects()), vec!["t1", "a", "b"]);
        assert_eq!(names(registry.of_type("block")), vec!["a", "b"]);
        assert_eq!(names(registry.of_type("object")), vec!["t1", "a", "b"]);
        assert!(registry.of_type("nothing").is_empty());
        assert!(registry.get("a").unwrap().is_a("object"));
        assert!(matches!(registry.get("z"), Err(Error::UnknownObject(n)) if n == "z"));
    }

    #[test]
    fn test_duplicate_object() {
        let err = load(
            "(define (domain d) (:constants a))",
            "(define (problem p) (:domain d) (:objects a) (:goal (and)))",
        ).unwrap_err();
        assert!(matches!(err, Error::DuplicateObject(n) if n == "a"));
    }
}
