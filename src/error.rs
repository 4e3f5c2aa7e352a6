use crate::core::Value;

/// Host-side error type. A thrown JavaScript value travels through the
/// interpreter as `JSError::Thrown`; the only places that consume it are a
/// `try` statement's catch clause and the embedder `eval` boundary.
#[derive(thiserror::Error, Debug)]
pub enum JSError {
    #[error("SyntaxError: {message} ({name}:{line}:{column})")]
    Parse {
        message: String,
        name: String,
        line: u32,
        column: u32,
    },

    #[error("uncaught {0}")]
    Thrown(Value),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl JSError {
    /// One-line rendering suitable for the CLI and REPL.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// The JavaScript value in flight, if this error is a thrown exception.
    pub fn thrown_value(&self) -> Option<&Value> {
        match self {
            JSError::Thrown(v) => Some(v),
            _ => None,
        }
    }
}
