use thiserror::Error;

/// Failures detected while reading or building a template.
///
/// Missing values and missing partials are not errors: they render as
/// empty text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid delimiters tag: {0:?}")]
    Delimiter(String),
    #[error("tag opened at offset {0} is not closed")]
    UnclosedTag(usize),
    #[error("section {0:?} is not closed")]
    MissingClosingTag(String),
    #[error("unexpected closing tag {0:?}")]
    StrayClosingTag(String),
}

pub type Result<T> = std::result::Result<T, Error>;
