//! Error types for bayesq.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the exact failure. Construction problems surface as [`ValidationError`]
//! before any query runs; lookups that fail mid-query surface as
//! [`QueryError`] and abort the whole query.

use thiserror::Error;

/// Validation errors raised while building distributions and networks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Variable name cannot be empty")]
    EmptyVariableName,

    #[error("Distribution for '{variable}' has no probability entries")]
    EmptyDistribution {
        variable: String,
    },

    #[error("Entry {key:?} of '{variable}' has {actual} parent values, expected {expected}")]
    ParentArity {
        variable: String,
        key: Vec<String>,
        expected: usize,
        actual: usize,
    },

    #[error("Probability {probability} for {key:?} of '{variable}' is out of range [0.0, 1.0]")]
    ProbabilityOutOfRange {
        variable: String,
        key: Vec<String>,
        probability: f64,
    },

    #[error("Probabilities of '{variable}' given {parent_values:?} sum to {sum}, expected 1")]
    NotNormalized {
        variable: String,
        parent_values: Vec<String>,
        sum: f64,
    },

    #[error("Parent '{parent}' is listed more than once for '{variable}'")]
    DuplicateParent {
        variable: String,
        parent: String,
    },

    #[error("Variable '{variable}' cannot be its own parent")]
    SelfParent {
        variable: String,
    },

    #[error("Variable '{variable}' has more than one distribution")]
    DuplicateVariable {
        variable: String,
    },

    #[error("Parent '{parent}' of '{variable}' is not a variable of the network")]
    UnknownParent {
        variable: String,
        parent: String,
    },

    #[error("Parent relation contains a cycle through {variables:?}")]
    Cycle {
        variables: Vec<String>,
    },
}

/// Errors that abort a probability query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("Unknown variable: {variable}")]
    UnknownVariable {
        variable: String,
    },

    #[error("No probability for '{variable}' at {key:?}")]
    MissingProbability {
        variable: String,
        key: Vec<String>,
    },

    #[error("Assignment has no value for '{variable}'")]
    IncompleteAssignment {
        variable: String,
    },

    #[error("Evidence has zero probability")]
    ZeroProbabilityEvidence,
}

/// Top-level error type for bayesq.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BayesError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Network definition error: {message}")]
    Definition {
        message: String,
    },
}

impl BayesError {
    /// Creates a definition (loading/parsing) error.
    #[must_use]
    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a query error.
    #[must_use]
    pub const fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// Returns true if this is a definition (loading/parsing) error.
    #[must_use]
    pub const fn is_definition(&self) -> bool {
        matches!(self, Self::Definition { .. })
    }
}

/// Result type alias for bayesq operations.
pub type BayesResult<T> = Result<T, BayesError>;
