/// Structural or numeric defects in a cascade definition.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CascadeParseError {
    #[error("no <stages> section")]
    MissingStages,
    #[error("<stages> is never closed")]
    UnclosedStages,
    #[error("<{tag}> opened on line {line} is never closed")]
    UnclosedTag { tag: String, line: usize },
    #[error("unterminated tag starting on line {line}")]
    UnterminatedTag { line: usize },
    #[error("line {line}: </{found}> does not close <{expected}>")]
    UnexpectedClose {
        found: String,
        expected: String,
        line: usize,
    },
    #[error("line {line}: invalid number {value:?} in <{tag}>")]
    InvalidNumber {
        tag: String,
        value: String,
        line: usize,
    },
    #[error("line {line}: rectangle {value:?} needs `x y width height [weight]`")]
    InvalidRect { value: String, line: usize },
}

/// Errors returned when loading a cascade.
#[derive(thiserror::Error, Debug)]
pub enum CascadeLoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] CascadeParseError),
    #[error("cascade has no usable stages")]
    NotLoaded,
}
