use thiserror::Error;

/// Structural defects of a tree handed to the layout engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("invalid node name `{0}`")]
    InvalidName(String),
    #[error("duplicate node `{0}`")]
    DuplicateName(String),
    #[error("unknown node `{0}`")]
    UnknownNode(String),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid tree document: {0}")]
    Document(#[from] json5::Error),
    #[error("line {line}: invalid class name `{name}`")]
    InvalidClassName { line: usize, name: String },
    #[error("no class names found in input")]
    Empty,
    #[error(transparent)]
    Tree(#[from] TreeError),
}
