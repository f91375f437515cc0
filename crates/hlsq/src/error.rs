/// Errors raised while compiling a query expression.
///
/// Parsing manifest text never fails; only query compilation does.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("expected '{{name}} {{op}} {{value}}' got `{input}`")]
    Malformed { input: String },

    #[error("no operator `{op}` defined on {kind} values")]
    UnsupportedOperator { op: String, kind: &'static str },

    #[error("invalid rlike pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl QueryError {
    pub fn malformed(input: impl Into<String>) -> Self {
        Self::Malformed {
            input: input.into(),
        }
    }

    pub fn unsupported_operator(op: impl Into<String>, kind: &'static str) -> Self {
        Self::UnsupportedOperator {
            op: op.into(),
            kind,
        }
    }
}

pub type Result<T, E = QueryError> = std::result::Result<T, E>;
