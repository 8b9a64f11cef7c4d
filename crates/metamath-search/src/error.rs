use serde::Serialize;

use crate::query::SearchField;
use crate::search::SearchOutput;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Input list of assertions for search is empty!")]
    EmptyAssertionList,

    #[error("Step unification error: {0}")]
    StepUnify(String),

    #[error("Search execution error: {message}")]
    Execution {
        message: String,
        output: Box<SearchOutput>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Failure reported by the host grammar while parsing a search term.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("{0}")]
    Parse(String),

    #[error("Symbol {0} is not declared before the search reference statement")]
    OutOfScope(String),
}

/// Failure reported by the host step unifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepUnifyError {
    #[error("Step {step} has no parse tree")]
    MissingParseTree { step: String },

    #[error("Work variable pool exhausted: {0}")]
    WorkVariables(String),
}

impl From<StepUnifyError> for SearchError {
    fn from(error: StepUnifyError) -> Self {
        SearchError::StepUnify(error.to_string())
    }
}

/// Search status codes, ordered by ascending severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnCode {
    #[default]
    Ok = 0,
    ArgError = 1,
    Timeout = 2,
    Interrupted = 3,
    Execution = 4,
}

impl ReturnCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::ArgError => "arg_error",
            Self::Timeout => "timeout",
            Self::Interrupted => "interrupted",
            Self::Execution => "execution",
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// One structured error, attached to the field that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub code: ReturnCode,
    pub field: Option<SearchField>,
    pub message: String,
}

impl FieldError {
    pub fn arg(field: SearchField, message: impl Into<String>) -> Self {
        Self {
            code: ReturnCode::ArgError,
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn status(code: ReturnCode, message: impl Into<String>) -> Self {
        Self {
            code,
            field: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => f.write_str(&self.message),
        }
    }
}
