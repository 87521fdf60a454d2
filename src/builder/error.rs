//! Definition errors raised while declaring and compiling a chart.

use thiserror::Error;

/// Errors that make a chart declaration unusable.
///
/// Compilation stops at the first one; no partial chart is ever returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChartError {
    #[error("`{operand}` has a malformed signature: {reason}")]
    MalformedSignature { operand: String, reason: String },

    #[error("{chart}: no states declared. Call .state(name) before .build()")]
    NoStates { chart: String },

    #[error("{chart}: state {state} is declared more than once")]
    DuplicateState { chart: String, state: String },

    #[error("{chart}: state {state} is used in the chart but never declared")]
    UndeclaredState { chart: String, state: String },

    #[error("{chart}: back-reference for {state} is not allowed at root level")]
    BackReferenceAtRoot { chart: String, state: String },

    #[error("{chart}: guard on {state} is not allowed at root level")]
    GuardAtRoot { chart: String, state: String },

    #[error("{chart}: action on {state} is not allowed at root level")]
    ActionAtRoot { chart: String, state: String },

    #[error("{chart}: transitions from {state} are declared twice; use a back-reference")]
    DuplicateDeclaration { chart: String, state: String },

    #[error("{chart}: transition from {from} to {to} is declared twice")]
    DuplicateTransition {
        chart: String,
        from: String,
        to: String,
    },

    #[error("{chart}: missing outgoing declaration for state {state}; declare it, even if empty")]
    MissingDeclaration { chart: String, state: String },
}
