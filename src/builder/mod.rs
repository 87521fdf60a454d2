//! Declaring and compiling charts.
//!
//! A chart is declared as a set of states plus nested entries describing the
//! outgoing transitions of each state. [`ChartBuilder::build`] validates the
//! declaration and flattens it into an immutable [`Chart`].

pub mod chart;
pub mod error;
pub mod macros;
pub mod transition;

pub use chart::{Chart, ChartBuilder};
pub use error::ChartError;
pub use transition::{Entry, Outgoing, Target, Transition};

use crate::core::{Action, Guard};

/// Reference a state inside a declaration.
///
/// # Example
///
/// ```
/// use sluice::builder::{state, ChartBuilder};
///
/// let chart = ChartBuilder::new("Switch")
///     .states(["OFF", "ON"])
///     .declare(state("OFF").edges([state("ON").edges([state("OFF").elsewhere()])]))
///     .build()
///     .unwrap();
///
/// assert_eq!(chart.transitions().count(), 2);
/// ```
pub fn state(name: impl Into<String>) -> Target {
    Target::new(name)
}

/// Reference a state with a guard on the edge leading to it.
///
/// # Example
///
/// ```
/// use sluice::builder::with_guard;
/// use sluice::core::{FnCondition, Guard};
/// use sluice::Args;
///
/// let paid = Guard::leaf(FnCondition::new("Paid", |_: &Args| true)).unwrap();
/// let target = with_guard("SHIPPED", paid);
/// assert!(target.guard().is_some());
/// ```
pub fn with_guard(name: impl Into<String>, guard: Guard) -> Target {
    Target::new(name).when(guard)
}

/// Reference a state with an action on the edge leading to it.
pub fn with_action(name: impl Into<String>, action: Action) -> Target {
    Target::new(name).then(action)
}
