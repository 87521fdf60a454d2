//! Errors raised while reading, writing and transitioning a bound holder.

use crate::core::EffectFailure;
use serde_json::Value;
use thiserror::Error;

/// A holder could not be read from or written to.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HolderError {
    #[error("holder has no field `{0}`")]
    MissingField(String),

    #[error("field `{field}` holds a non-string value: {value}")]
    NotAString { field: String, value: Value },

    #[error("holder is not a JSON object")]
    NotAnObject,

    #[error("holder is already borrowed")]
    Borrowed,

    #[error("holder lock is poisoned")]
    Poisoned,
}

/// Errors that can occur during transitions.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The holder's field holds a value that matches no declared state.
    #[error("field `{field}` holds unknown state \"{value}\"")]
    UnknownState { field: String, value: String },

    /// A transition or write named a state the chart does not declare.
    #[error("unknown state \"{0}\"")]
    UnknownTarget(String),

    /// The holder's field is unset.
    #[error("field `{field}` holds no state")]
    NoCurrentState { field: String },

    #[error("no transition from {from} to {to}")]
    DoesNotExist { from: String, to: String },

    /// Every missing parameter, in declaration order.
    #[error("transition from {from} to {to} is missing arguments: {}", .missing.join(", "))]
    MissingArgs {
        from: String,
        to: String,
        missing: Vec<String>,
    },

    /// The guard returned something other than `true`; `reason` is what it returned.
    #[error("transition from {from} to {to} is not allowed: {reason}")]
    NotAllowed {
        from: String,
        to: String,
        reason: Value,
    },

    /// The state was committed, then an action failed.
    #[error("transition to {to} committed, but {source}")]
    EffectFailed {
        to: String,
        #[source]
        source: EffectFailure,
    },

    #[error(transparent)]
    Holder(#[from] HolderError),
}

/// Coarse classification of [`TransitionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionErrorKind {
    UnknownState,
    UnknownTarget,
    NoCurrentState,
    DoesNotExist,
    MissingArgs,
    NotAllowed,
    EffectFailed,
    Holder,
}

impl TransitionError {
    pub fn kind(&self) -> TransitionErrorKind {
        match self {
            Self::UnknownState { .. } => TransitionErrorKind::UnknownState,
            Self::UnknownTarget(_) => TransitionErrorKind::UnknownTarget,
            Self::NoCurrentState { .. } => TransitionErrorKind::NoCurrentState,
            Self::DoesNotExist { .. } => TransitionErrorKind::DoesNotExist,
            Self::MissingArgs { .. } => TransitionErrorKind::MissingArgs,
            Self::NotAllowed { .. } => TransitionErrorKind::NotAllowed,
            Self::EffectFailed { .. } => TransitionErrorKind::EffectFailed,
            Self::Holder(_) => TransitionErrorKind::Holder,
        }
    }

    /// Whether a dry run would report this as `false` rather than an error.
    pub fn is_not_allowed(&self) -> bool {
        matches!(self, Self::NotAllowed { .. })
    }
}
