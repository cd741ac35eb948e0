use thiserror::Error;

/**
    Errors from the structural merge of collection results.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("merge input #{0} is not a mapping")]
    NotAMapping(usize),

    #[error("cannot merge a mapping with a non-mapping value at key '{0}'")]
    ShapeConflict(String),
}

/**
    Errors from building a dedupe identity key.
*/
#[derive(Debug, Clone, Error)]
pub enum KeyError {
    #[error("invalid identity pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("identity pattern '{0}' has no capture group")]
    MissingGroup(String),
}

/**
    Error returned by `FromStr` implementations on enum types.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}
