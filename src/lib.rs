//! Sluice: declarative state charts bound to external holders
//!
//! A chart is declared once as a set of named states plus a nested table of
//! allowed transitions. Each transition can carry a guard (a boolean tree of
//! conditions) and an action (a chain of effects). The compiled chart is
//! immutable and holds no runtime state; it is bound to a field of some
//! external record, and every transition reads and writes that field.
//!
//! # Core Concepts
//!
//! - **State**: a named value with a display label
//! - **Guard**: `&`, `|` and `~` over [`Condition`] leaves; a transition is
//!   allowed only when its guard evaluates to exactly `true`
//! - **Action**: [`Effect`] leaves chained with `+`, run after the new state
//!   is written
//! - **Chart**: the validated, flattened transition table
//! - **Machine**: a chart bound to one field of a [`StateHolder`]
//!
//! # Example
//!
//! ```rust
//! use sluice::builder::{state, ChartBuilder};
//! use sluice::{args, Args, FnCondition, Guard, Param};
//! use std::collections::HashMap;
//!
//! let paid = Guard::leaf(
//!     FnCondition::new("Paid", |args: &Args| args.get_as::<bool>("paid").unwrap_or(false))
//!         .param(Param::required("paid")),
//! )
//! .unwrap();
//!
//! let chart = ChartBuilder::new("Order")
//!     .states(["NEW", "SHIPPED", "CANCELLED"])
//!     .declare(state("NEW").edges([
//!         state("SHIPPED").when(paid).terminal(),
//!         state("CANCELLED").terminal(),
//!     ]))
//!     .build()
//!     .unwrap();
//!
//! let mut order: HashMap<String, Option<String>> = HashMap::new();
//! let mut machine = chart.bind(&mut order).unwrap();
//!
//! assert!(!machine.can("SHIPPED", &args!(paid = false)).unwrap());
//! machine.to("SHIPPED", &args!(paid = true)).unwrap();
//! assert_eq!(machine.current().unwrap().label(), "Shipped");
//! ```

pub mod builder;
pub mod core;
pub mod runtime;

// Re-export commonly used types
pub use builder::{state, Chart, ChartBuilder, ChartError, Target, Transition};
pub use core::{
    Action, Args, Condition, Effect, FnCondition, FnEffect, Guard, Operand, Param, State,
};
pub use runtime::{HolderError, Machine, StateHolder, TransitionError};
