use std::fmt;
use enumset::{EnumSet, EnumSetType};

#[derive(PartialEq, Debug)]
pub enum Stmt {
    Domain(Domain),
    Problem(Problem)
}

impl Stmt {
    pub fn into_domain(self) -> Option<Domain> {
        match self {
            Self::Domain(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_problem(self) -> Option<Problem> {
        match self {
            Self::Problem(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Problem {
    pub name: String,
    pub domain: String,
    pub requirements: EnumSet<Requirements>,
    pub objects: Vec<TypedList>,
    /// Ground atoms asserted in the initial state.
    pub init: Vec<Atom>,
    pub goal: Expr,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Domain {
    pub name: String,
    pub requirements: EnumSet<Requirements>,
    pub types: Vec<TypedList>,
    pub constants: Vec<TypedList>,
    pub predicates: Vec<Predicate>,
    pub actions: Vec<Action>,
    pub derived: Vec<DerivedPredicate>,
    pub axioms: Vec<Axiom>,
}

#[derive(EnumSetType, Debug)]
pub enum Requirements {
    /// Basic STRIPS-style adds and deletes
    Strips,
    /// Allow type names in declarations of variables
    Typing,
    /// Allow `not` in goal descriptions
    NegativePreconditions,
    /// Allow `or` in goal descriptions
    DisjunctivePreconditions,
    /// Support `=` as built-in predicate
    Equality,
    /// Allow `exists` in goal descriptions
    ExistentialPreconditions,
    /// Allow `forall` in goal descriptions
    UniversalPreconditions,
    /// Same as `:existential-preconditions` + `:universal-preconditions`
    QuantifiedPreconditions,
    /// Allow `when` in action effects
    ConditionalEffects,
    ActionCosts,
    Fluents,
    NumericFluents,
    /// Same as `:strips` + `:typing` + `:negative-preconditions` +
    /// `:disjunctive-preconditions` + `:equality` +
    /// `:quantified-preconditions` + `:conditional-effects`
    ADL,
    DurativeActions,
    /// Allows predicates whose truth value is defined by a formula
    DerivedPredicates,
    TimedInitialLiterals,
    Preferences,
    Constraints,
    /// PDDL 1.2 `:axiom` sections
    DomainAxioms,
    SubgoalThroughAxioms,
    SafetyConstraints,
    ExpressionEvaluation,
    OpenWorld,
    TrueNegation,
    UCPOP,
    ObjectFluents,
    DurationInequalities,
    ContinuousEffects,
}

impl Requirements {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        use Requirements::*;
        Some(match keyword.to_ascii_lowercase().as_str() {
            "strips" => Strips,
            "typing" => Typing,
            "negative-preconditions" => NegativePreconditions,
            "disjunctive-preconditions" => DisjunctivePreconditions,
            "equality" => Equality,
            "existential-preconditions" => ExistentialPreconditions,
            "universal-preconditions" => UniversalPreconditions,
            "quantified-preconditions" => QuantifiedPreconditions,
            "conditional-effects" => ConditionalEffects,
            "action-costs" => ActionCosts,
            "fluents" => Fluents,
            "numeric-fluents" => NumericFluents,
            "adl" => ADL,
            "durative-actions" => DurativeActions,
            "derived-predicates" => DerivedPredicates,
            "timed-initial-literals" => TimedInitialLiterals,
            "preferences" => Preferences,
            "constraints" => Constraints,
            "domain-axioms" => DomainAxioms,
            "subgoal-through-axioms" => SubgoalThroughAxioms,
            "safety-constraints" => SafetyConstraints,
            "expression-evaluation" => ExpressionEvaluation,
            "open-world" => OpenWorld,
            "true-negation" => TrueNegation,
            "ucpop" => UCPOP,
            "object-fluents" => ObjectFluents,
            "duration-inequalities" => DurationInequalities,
            "continuous-effects" => ContinuousEffects,
            _ => return None,
        })
    }

    pub fn keyword(&self) -> &'static str {
        use Requirements::*;
        match self {
            Strips => "strips",
            Typing => "typing",
            NegativePreconditions => "negative-preconditions",
            DisjunctivePreconditions => "disjunctive-preconditions",
            Equality => "equality",
            ExistentialPreconditions => "existential-preconditions",
            UniversalPreconditions => "universal-preconditions",
            QuantifiedPreconditions => "quantified-preconditions",
            ConditionalEffects => "conditional-effects",
            ActionCosts => "action-costs",
            Fluents => "fluents",
            NumericFluents => "numeric-fluents",
            ADL => "adl",
            DurativeActions => "durative-actions",
            DerivedPredicates => "derived-predicates",
            TimedInitialLiterals => "timed-initial-literals",
            Preferences => "preferences",
            Constraints => "constraints",
            DomainAxioms => "domain-axioms",
            SubgoalThroughAxioms => "subgoal-through-axioms",
            SafetyConstraints => "safety-constraints",
            ExpressionEvaluation => "expression-evaluation",
            OpenWorld => "open-world",
            TrueNegation => "true-negation",
            UCPOP => "ucpop",
            ObjectFluents => "object-fluents",
            DurationInequalities => "duration-inequalities",
            ContinuousEffects => "continuous-effects",
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Term {
    Variable(String),
    Name(String),
}

/// A predicate applied to terms, e.g. `(on ?x b)`.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Atom {
    pub name: String,
    pub terms: Vec<Term>,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ComparisonOp {
    Equals,
    Greater,
    Smaller,
    GreaterOrEquals,
    SmallerOrEquals,
}

/// Goal description.
#[derive(PartialEq, Debug, Clone)]
pub enum Expr {
    Atom(Atom),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Imply(Box<Expr>, Box<Expr>),
    ForAll(Vec<TypedList>, Box<Expr>),
    Exists(Vec<TypedList>, Box<Expr>),
    Preference(Option<String>, Box<Expr>),
    /// Numeric comparison; operands are kept as source text.
    Comparison(ComparisonOp, Vec<String>),
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum NumericOp {
    Increase,
    Decrease,
    Assign,
    ScaleUp,
    ScaleDown,
}

#[derive(PartialEq, Debug, Clone)]
pub enum Effect {
    Add(Atom),
    Delete(Atom),
    When(Expr, Vec<Effect>),
    ForAll(Vec<TypedList>, Vec<Effect>),
    Numeric(NumericOp, Vec<String>),
}

#[derive(PartialEq, Debug, Clone)]
pub struct Action {
    pub name: String,
    pub parameters: Vec<TypedList>,
    pub precondition: Option<Expr>,
    pub effect: Vec<Effect>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Predicate {
    pub name: String,
    pub variables: Vec<TypedList>
}

/// `(:derived (head ?x - t) body)`
#[derive(PartialEq, Debug, Clone)]
pub struct DerivedPredicate {
    pub head: Predicate,
    pub body: Expr,
}

/// `(:axiom :vars (...) :context <GD> :implies <atom>)`
#[derive(PartialEq, Debug, Clone)]
pub struct Axiom {
    pub variables: Vec<TypedList>,
    pub context: Expr,
    pub implies: Atom,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TypedList {
    pub identifiers: Vec<String>,
    /// More than one kind means `(either ...)`. Untyped entries get `object`.
    pub kind: Vec<String>,
}

pub const ROOT_TYPE: &str = "object";

impl TypedList {
    pub fn new(identifiers: Vec<String>, kind: Vec<String>) -> Self {
        Self { identifiers, kind }
    }

    pub fn untyped(identifiers: Vec<String>) -> Self {
        Self { identifiers, kind: vec![ROOT_TYPE.to_owned()] }
    }
}

/// Expands `?a ?b - t ?c - u` into `[(a, [t]), (b, [t]), (c, [u])]`.
pub fn flatten(lists: &[TypedList]) -> Vec<(&str, &[String])> {
    lists.iter()
        .flat_map(|l| l.identifiers.iter().map(move |i| (i.as_str(), l.kind.as_slice())))
        .collect()
}

impl Predicate {
    pub fn arity(&self) -> usize {
        self.variables.iter().map(|v| v.identifiers.len()).sum()
    }
}

impl Action {
    pub fn arity(&self) -> usize {
        self.parameters.iter().map(|v| v.identifiers.len()).sum()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(v) => write!(f, "?{}", v),
            Term::Name(n) => write!(f, "{}", n),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.name)?;
        for t in &self.terms {
            write!(f, " {}", t)?;
        }
        write!(f, ")")
    }
}

struct Kind<'a>(&'a [String]);

impl fmt::Display for Kind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            [single] => write!(f, "{}", single),
            kinds => write!(f, "(either {})", kinds.join(" ")),
        }
    }
}

/// Renders a variable list, e.g. `?a ?b - block ?t - table`.
pub struct Variables<'a>(pub &'a [TypedList]);

impl fmt::Display for Variables<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut separator = "";
        for list in self.0 {
            for identifier in &list.identifiers {
                write!(f, "{}?{}", separator, identifier)?;
                separator = " ";
            }
            write!(f, " - {}", Kind(&list.kind))?;
        }
        Ok(())
    }
}

impl fmt::Display for TypedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.identifiers.join(" "), Kind(&self.kind))
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOp::Equals => write!(f, "="),
            ComparisonOp::Greater => write!(f, ">"),
            ComparisonOp::Smaller => write!(f, "<"),
            ComparisonOp::GreaterOrEquals => write!(f, ">="),
            ComparisonOp::SmallerOrEquals => write!(f, "<="),
        }
    }
}

impl fmt::Display for NumericOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericOp::Increase => write!(f, "increase"),
            NumericOp::Decrease => write!(f, "decrease"),
            NumericOp::Assign => write!(f, "assign"),
            NumericOp::ScaleUp => write!(f, "scale-up"),
            NumericOp::ScaleDown => write!(f, "scale-down"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Atom(atom) => write!(f, "{}", atom),
            Expr::And(v) => { write!(f, "(and")?; v.iter().try_for_each(|e| write!(f, " {}", e))?; write!(f, ")") },
            Expr::Or(v) => { write!(f, "(or")?; v.iter().try_for_each(|e| write!(f, " {}", e))?; write!(f, ")") },
            Expr::Not(e) => write!(f, "(not {})", e),
            Expr::Imply(l, r) => write!(f, "(imply {} {})", l, r),
            Expr::ForAll(vars, e) => write!(f, "(forall ({}) {})", Variables(vars), e),
            Expr::Exists(vars, e) => write!(f, "(exists ({}) {})", Variables(vars), e),
            Expr::Preference(Some(name), e) => write!(f, "(preference {} {})", name, e),
            Expr::Preference(None, e) => write!(f, "(preference {})", e),
            Expr::Comparison(op, operands) => write!(f, "({} {})", op, operands.join(" ")),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Add(atom) => write!(f, "{}", atom),
            Effect::Delete(atom) => write!(f, "(not {})", atom),
            Effect::When(cond, effects) => {
                write!(f, "(when {} (and", cond)?;
                effects.iter().try_for_each(|e| write!(f, " {}", e))?;
                write!(f, "))")
            },
            Effect::ForAll(vars, effects) => {
                write!(f, "(forall ({}) (and", Variables(vars))?;
                effects.iter().try_for_each(|e| write!(f, " {}", e))?;
                write!(f, "))")
            },
            Effect::Numeric(op, operands) => write!(f, "({} {})", op, operands.join(" ")),
        }
    }
}
