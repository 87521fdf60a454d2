//! Declaration entries and compiled transition descriptors.

use crate::core::{merge_names, Action, Expression, Guard, State};
use std::fmt;

/// A state reference inside a declaration, optionally carrying a guard and an
/// action for the edge that leads to it.
#[derive(Clone, Debug)]
pub struct Target {
    state: String,
    guard: Option<Guard>,
    action: Option<Action>,
}

impl Target {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            guard: None,
            action: None,
        }
    }

    /// Attach a guard. A second call combines both with AND.
    pub fn when(mut self, guard: Guard) -> Self {
        self.guard = Some(match self.guard.take() {
            Some(existing) => existing.and(guard),
            None => guard,
        });
        self
    }

    /// Attach an action. A second call appends to the chain.
    pub fn then(mut self, action: Action) -> Self {
        self.action = Some(match self.action.take() {
            Some(existing) => existing.then(action),
            None => action,
        });
        self
    }

    /// Reference this state's outgoing set, declared elsewhere in the chart.
    pub fn elsewhere(self) -> Entry {
        Entry {
            target: self,
            outgoing: Outgoing::Elsewhere,
        }
    }

    /// Declare this state's outgoing set inline.
    pub fn edges<I>(self, entries: I) -> Entry
    where
        I: IntoIterator<Item = Entry>,
    {
        Entry {
            target: self,
            outgoing: Outgoing::Declared(entries.into_iter().collect()),
        }
    }

    /// Declare this state as terminal: it has no outgoing transitions.
    pub fn terminal(self) -> Entry {
        self.edges([])
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn guard(&self) -> Option<&Guard> {
        self.guard.as_ref()
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }
}

/// The outgoing side of an entry.
#[derive(Clone, Debug)]
pub enum Outgoing {
    /// The state's outgoing transitions, declared here.
    Declared(Vec<Entry>),
    /// Back-reference: the outgoing set is declared somewhere else.
    Elsewhere,
}

/// One key/value pair of a declaration.
#[derive(Clone, Debug)]
pub struct Entry {
    pub(crate) target: Target,
    pub(crate) outgoing: Outgoing,
}

impl Entry {
    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn outgoing(&self) -> &Outgoing {
        &self.outgoing
    }
}

/// A compiled edge of the transition table.
#[derive(Clone, Debug)]
pub struct Transition {
    from: State,
    to: State,
    guard: Option<Guard>,
    action: Option<Action>,
}

impl Transition {
    pub(crate) fn new(from: State, to: State, target: &Target) -> Self {
        Self {
            from,
            to,
            guard: target.guard.clone(),
            action: target.action.clone(),
        }
    }

    pub fn from(&self) -> &State {
        &self.from
    }

    pub fn to(&self) -> &State {
        &self.to
    }

    pub fn guard(&self) -> Option<&Guard> {
        self.guard.as_ref()
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    /// Parameters the guard or the action accept.
    pub fn parameters(&self) -> Vec<&str> {
        merge_names(
            self.guard
                .iter()
                .flat_map(Expression::parameters)
                .chain(self.action.iter().flat_map(Expression::parameters)),
        )
    }

    /// Parameters every caller must supply: the guard's first, then the
    /// action's, in declaration order.
    pub fn required_parameters(&self) -> Vec<&str> {
        merge_names(
            self.guard
                .iter()
                .flat_map(Expression::required_parameters)
                .chain(self.action.iter().flat_map(Expression::required_parameters)),
        )
    }
}

/// Renders the edge the way it is declared, e.g. `BETA (Sometimes) [Log + Log]`.
impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to.name())?;
        if let Some(guard) = &self.guard {
            let rendered = guard.to_string();
            if rendered.starts_with('(') && rendered.ends_with(')') {
                write!(f, " {rendered}")?;
            } else {
                write!(f, " ({rendered})")?;
            }
        }
        if let Some(action) = self.action.as_ref().filter(|action| !action.is_empty()) {
            write!(f, " [{action}]")?;
        }
        Ok(())
    }
}
