/// Parse-time errors. A query that produces one of these is rejected before
/// any input is read; no partially-constructed pipe ever runs.
#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("unexpected end of query; expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("unexpected token {token:?}; expected {expected}")]
    UnexpectedToken { token: String, expected: &'static str },

    #[error("unknown pipe {name:?}")]
    UnknownPipe { name: String },

    #[error("pipe '{pipe}': missing field name after 'at'")]
    MissingFieldName { pipe: &'static str },

    #[error("pipe '{pipe}': expected '(' after 'if'")]
    MissingFilterParen { pipe: &'static str },

    #[error("pipe '{pipe}': needs at least one field name")]
    MissingFieldList { pipe: &'static str },

    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("empty query")]
    EmptyQuery,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("line {line}: cannot parse input record: {message}")]
    BadInputLine { line: usize, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProcessingError {
    /// Broken pipes are the normal way downstream consumers (head, less)
    /// hang up on a stream filter, not a failure to report.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(
            self,
            ProcessingError::IoError(e) if e.kind() == std::io::ErrorKind::BrokenPipe
        )
    }
}
