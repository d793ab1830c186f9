use thiserror::Error;

/// A grammar rejected its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("no grammar named `{name}`")]
    GrammarNotFound { name: String },

    #[error("no grammar applies to {filename}")]
    NoGrammar { filename: String },

    #[error("failed to read {filename}")]
    Io {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{grammar} failed to load {filename}")]
    Parse {
        filename: String,
        grammar: String,
        #[source]
        source: ParseError,
    },

    #[error("invalid path expression `{expr}` at offset {offset}: {message}")]
    Path {
        expr: String,
        offset: usize,
        message: String,
    },

    #[error("path `{expr}` matches {count} nodes")]
    TooManyMatches { expr: String, count: usize },

    #[error("cannot create `{expr}`: {reason}")]
    NotCreatable { expr: String, reason: String },
}

impl TreeError {
    /// Failures reading or parsing a file (as opposed to grammar lookup or
    /// path-expression errors).
    pub fn is_load_error(&self) -> bool {
        matches!(self, TreeError::Io { .. } | TreeError::Parse { .. })
    }
}
