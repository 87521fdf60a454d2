//! Named chart states.
//!
//! A state is identified by its name. The name doubles as the value written
//! to the external holder (its dehydrated form), and a human label is derived
//! from it for display and form widgets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named node in a chart.
///
/// States are plain values: attaching a guard or an action to a state inside
/// a declaration produces a separate [`Target`](crate::builder::Target) and
/// never changes the state itself.
///
/// # Example
///
/// ```rust
/// use sluice::core::State;
///
/// let state = State::new("HOME_FRONT_DOOR");
/// assert_eq!(state.value(), "HOME_FRONT_DOOR");
/// assert_eq!(state.label(), "Home Front Door");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    name: String,
    label: String,
}

impl State {
    /// Create a state, deriving its label from the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let label = pretty_label(&name);
        Self { name, label }
    }

    /// The state's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dehydrated form written to a holder. Always equal to the name.
    pub fn value(&self) -> &str {
        &self.name
    }

    /// Human readable label, e.g. `"Home Front Door"` for `HOME_FRONT_DOOR`.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl AsRef<str> for State {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Turn a state name into a label: underscores become spaces and each word
/// is title-cased.
///
/// A letter is upper-cased when it follows a non-letter and lower-cased
/// otherwise, so `"STEP_2B"` becomes `"Step 2B"`.
pub fn pretty_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    let mut after_letter = false;
    for c in name.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if after_letter {
                label.extend(c.to_lowercase());
            } else {
                label.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            label.push(c);
            after_letter = false;
        }
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_is_the_name() {
        let state = State::new("ALPHA");
        assert_eq!(state.name(), "ALPHA");
        assert_eq!(state.value(), "ALPHA");
        assert_eq!(state.to_string(), "ALPHA");
        assert_eq!(state.as_ref(), "ALPHA");
    }

    #[test]
    fn label_is_title_cased() {
        assert_eq!(State::new("ALPHA").label(), "Alpha");
        assert_eq!(State::new("HOME_BEDROOM").label(), "Home Bedroom");
        assert_eq!(State::new("awaiting_payment").label(), "Awaiting Payment");
    }

    #[test]
    fn label_restarts_words_after_digits() {
        assert_eq!(pretty_label("STEP_2B"), "Step 2B");
        assert_eq!(pretty_label("PHASE1"), "Phase1");
        assert_eq!(pretty_label(""), "");
    }

    #[test]
    fn states_compare_by_name() {
        assert_eq!(State::new("BETA"), State::new("BETA"));
        assert_ne!(State::new("BETA"), State::new("GAMMA"));
    }

    #[test]
    fn state_serializes_correctly() {
        let state = State::new("IN_REVIEW");
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: State = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
        assert_eq!(deserialized.label(), "In Review");
    }
}
