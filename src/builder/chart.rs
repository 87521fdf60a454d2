//! Builder and compiler for charts.

use crate::builder::error::ChartError;
use crate::builder::transition::{Entry, Outgoing, Transition};
use crate::core::State;
use crate::runtime::{Machine, StateHolder, TransitionError, DEFAULT_FIELD};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tracing::debug;

/// Builder for declaring charts with a fluent API.
///
/// States are declared first, in order; the first one is the initial state.
/// Declarations then describe the outgoing transitions of each state, nested
/// as deeply as is convenient.
///
/// # Example
///
/// ```rust
/// use sluice::builder::{state, ChartBuilder};
///
/// let chart = ChartBuilder::new("Door")
///     .states(["CLOSED", "OPEN", "LOCKED"])
///     .declare(state("CLOSED").edges([
///         state("OPEN").edges([state("CLOSED").elsewhere()]),
///         state("LOCKED").edges([state("CLOSED").elsewhere()]),
///     ]))
///     .build()
///     .unwrap();
///
/// assert_eq!(chart.initial().name(), "CLOSED");
/// assert!(chart.transition("OPEN", "CLOSED").is_some());
/// assert!(chart.transition("OPEN", "LOCKED").is_none());
/// ```
pub struct ChartBuilder {
    name: String,
    states: Vec<String>,
    declarations: Vec<Entry>,
}

impl ChartBuilder {
    /// Create a builder. The name only shows up in errors and logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            declarations: Vec::new(),
        }
    }

    /// Declare one state.
    pub fn state(mut self, name: impl Into<String>) -> Self {
        self.states.push(name.into());
        self
    }

    /// Declare several states, in order.
    pub fn states<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add a root-level declaration.
    pub fn declare(mut self, entry: Entry) -> Self {
        self.declarations.push(entry);
        self
    }

    /// Add several root-level declarations.
    pub fn declarations<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = Entry>,
    {
        self.declarations.extend(entries);
        self
    }

    /// Validate the declaration and flatten it into a transition table.
    pub fn build(self) -> Result<Chart, ChartError> {
        let Self {
            name,
            states: names,
            declarations,
        } = self;

        if names.is_empty() {
            return Err(ChartError::NoStates { chart: name });
        }

        let mut states = Vec::with_capacity(names.len());
        for (i, state) in names.iter().enumerate() {
            if names[..i].contains(state) {
                return Err(ChartError::DuplicateState {
                    chart: name,
                    state: state.clone(),
                });
            }
            states.push(State::new(state.clone()));
        }

        let resolve = |state: &str| {
            states
                .iter()
                .find(|declared| declared.name() == state)
                .cloned()
                .ok_or_else(|| ChartError::UndeclaredState {
                    chart: name.clone(),
                    state: state.to_string(),
                })
        };

        for entry in &declarations {
            let target = entry.target();
            if matches!(entry.outgoing(), Outgoing::Elsewhere) {
                return Err(ChartError::BackReferenceAtRoot {
                    chart: name.clone(),
                    state: target.state().to_string(),
                });
            }
            resolve(target.state())?;
            if target.guard().is_some() {
                return Err(ChartError::GuardAtRoot {
                    chart: name.clone(),
                    state: target.state().to_string(),
                });
            }
            if target.action().is_some() {
                return Err(ChartError::ActionAtRoot {
                    chart: name.clone(),
                    state: target.state().to_string(),
                });
            }
        }

        let mut rows: Vec<Row> = Vec::new();
        let mut row_index: HashMap<String, usize> = HashMap::new();
        let mut queue: VecDeque<&Entry> = declarations.iter().collect();

        while let Some(entry) = queue.pop_front() {
            let from = resolve(entry.target().state())?;
            let Outgoing::Declared(children) = entry.outgoing() else {
                continue;
            };
            if row_index.contains_key(from.name()) {
                return Err(ChartError::DuplicateDeclaration {
                    chart: name.clone(),
                    state: from.name().to_string(),
                });
            }

            let mut transitions: Vec<Transition> = Vec::with_capacity(children.len());
            for child in children {
                let to = resolve(child.target().state())?;
                if transitions.iter().any(|existing| existing.to() == &to) {
                    return Err(ChartError::DuplicateTransition {
                        chart: name.clone(),
                        from: from.name().to_string(),
                        to: to.name().to_string(),
                    });
                }
                transitions.push(Transition::new(from.clone(), to, child.target()));
                queue.push_back(child);
            }

            row_index.insert(from.name().to_string(), rows.len());
            rows.push(Row { from, transitions });
        }

        for transition in rows.iter().flat_map(|row| &row.transitions) {
            if !row_index.contains_key(transition.to().name()) {
                return Err(ChartError::MissingDeclaration {
                    chart: name.clone(),
                    state: transition.to().name().to_string(),
                });
            }
        }

        debug!(
            chart = %name,
            states = states.len(),
            transitions = rows.iter().map(|row| row.transitions.len()).sum::<usize>(),
            "compiled chart"
        );

        Ok(Chart {
            name,
            states,
            rows,
            row_index,
        })
    }
}

impl Default for ChartBuilder {
    fn default() -> Self {
        Self::new("Chart")
    }
}

#[derive(Clone, Debug)]
struct Row {
    from: State,
    transitions: Vec<Transition>,
}

/// A compiled, immutable transition table plus its declared states.
///
/// A chart holds no runtime state of its own; bind it to a holder with
/// [`Chart::bind`] to drive transitions. One chart can back any number of
/// machines at once.
#[derive(Clone, Debug)]
pub struct Chart {
    name: String,
    states: Vec<State>,
    rows: Vec<Row>,
    row_index: HashMap<String, usize>,
}

impl Chart {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared states, in declaration order.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The first declared state; unset holders are initialized to it.
    pub fn initial(&self) -> &State {
        &self.states[0]
    }

    /// Look up a declared state by name.
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|state| state.name() == name)
    }

    /// `(value, label)` for every declared state, for select widgets and the like.
    pub fn state_choices(&self) -> Vec<(&str, &str)> {
        self.states
            .iter()
            .map(|state| (state.value(), state.label()))
            .collect()
    }

    /// States with an outgoing declaration, in table order.
    pub fn from_states(&self) -> impl Iterator<Item = &State> {
        self.rows.iter().map(|row| &row.from)
    }

    /// Outgoing transitions of `from`, or `None` if `from` has no declaration.
    pub fn transitions_from(&self, from: &str) -> Option<&[Transition]> {
        self.row_index
            .get(from)
            .map(|&index| self.rows[index].transitions.as_slice())
    }

    /// The transition from `from` to `to`, if the table has one.
    pub fn transition(&self, from: &str, to: &str) -> Option<&Transition> {
        self.transitions_from(from)?
            .iter()
            .find(|transition| transition.to().name() == to)
    }

    /// Every transition in the table.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.rows.iter().flat_map(|row| row.transitions.iter())
    }

    /// Whether `state` was declared with an empty outgoing set.
    pub fn is_terminal(&self, state: &str) -> bool {
        self.transitions_from(state)
            .is_some_and(|transitions| transitions.is_empty())
    }

    /// Bind to the `"state"` field of `holder`.
    ///
    /// An unset field is initialized to [`Chart::initial`] right away.
    pub fn bind<H: StateHolder>(&self, holder: H) -> Result<Machine<'_, H>, TransitionError> {
        self.bind_field(holder, DEFAULT_FIELD)
    }

    /// Bind to a named field of `holder`.
    pub fn bind_field<H: StateHolder>(
        &self,
        holder: H,
        field: impl Into<String>,
    ) -> Result<Machine<'_, H>, TransitionError> {
        Machine::new(self, holder, field.into())
    }
}

impl fmt::Display for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {{", self.name)?;
        for row in &self.rows {
            let edges: Vec<String> = row.transitions.iter().map(ToString::to_string).collect();
            if edges.is_empty() {
                writeln!(f, "    {}: {{}},", row.from)?;
            } else {
                writeln!(f, "    {}: {{ {} }},", row.from, edges.join(", "))?;
            }
        }
        write!(f, "}}")
    }
}
