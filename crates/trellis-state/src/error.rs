use thiserror::Error;

/// Why a path could not be resolved or assigned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathErrorKind {
    #[error("no key `{0}`")]
    MissingKey(String),

    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("`{0}` is not a list index")]
    NotAnIndex(String),

    #[error("cannot descend into a {0}")]
    NotAContainer(&'static str),

    #[error("expected a list, found a {0}")]
    NotAList(&'static str),

    #[error("cannot store a {0} into a float slot")]
    Coercion(&'static str),

    #[error("record fields cannot be added or removed")]
    FixedRecord,

    #[error("the root cannot be removed")]
    Root,
}

/// A path that does not resolve against the current tree.
///
/// Recoverable by design: `get` turns it into `None`, `set` into a no-op.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot resolve `{path}`: {kind}")]
pub struct PathError {
    pub path: String,
    pub kind: PathErrorKind,
}

impl PathError {
    pub fn new(path: impl Into<String>, kind: PathErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[derive(Error, Debug)]
pub enum StateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Path(#[from] PathError),
}

pub type Result<T> = std::result::Result<T, StateError>;
