#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A domain or problem source could not be read or parsed.
    #[error("{file}: {message}")]
    Load { file: String, message: String },
    #[error("Malformed call '{0}', expected name(arg1, arg2, ...)")]
    MalformedCall(String),
    #[error("Object '{0}' is declared more than once")]
    DuplicateObject(String),
    #[error("Action '{0}' is defined more than once")]
    DuplicateAction(String),
    #[error("Unknown object '{0}'")]
    UnknownObject(String),
    #[error("Unknown action '{0}'")]
    UnknownAction(String),
    #[error("Unknown variable '?{0}'")]
    UnknownVariable(String),
    #[error("'{name}' takes {expected} argument(s), got {actual}")]
    ArityMismatch { name: String, expected: usize, actual: usize },
    #[error("Unsupported construct in goal or effect: {0}")]
    UnsupportedGoalConstruct(String),
    #[error("Derived predicate '{0}' depends on its own negation")]
    NegativeCycle(String),
    #[error("Derived predicate closure did not converge within {0} passes")]
    ClosureDiverged(usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
