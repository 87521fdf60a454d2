//! Core chart types.
//!
//! This module contains the building blocks a chart is declared from:
//! - Named states via [`State`]
//! - Guard trees of [`Condition`] leaves
//! - Action chains of [`Effect`] leaves
//! - The parameter model shared by both ([`Param`], [`Args`])
//!
//! Nothing in here touches an external holder; that is the job of
//! [`crate::runtime`].

mod effect;
mod expression;
mod guard;
mod state;

pub use effect::{chain, Action, BoxError, Effect, EffectFailure, FnEffect};
pub(crate) use expression::merge_names;
pub use expression::{Args, Expression, Leaf, Operand, Param, Signature};
pub use guard::{and, not, or, passes, Condition, FnCondition, Guard, PASS};
pub use state::{pretty_label, State};
