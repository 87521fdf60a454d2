//! Chart bound to an external holder.

use crate::builder::{Chart, Transition};
use crate::core::{passes, Args, State};
use crate::runtime::error::TransitionError;
use crate::runtime::holder::StateHolder;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::{debug, trace, warn};

/// Field a machine binds to unless told otherwise.
pub const DEFAULT_FIELD: &str = "state";

/// A chart bound to one field of an external holder.
///
/// The machine stores nothing but the chart reference, the holder handle and
/// the field name; the current state always lives in the holder.
///
/// # Example
///
/// ```rust
/// use sluice::builder::{state, ChartBuilder};
/// use sluice::Args;
/// use std::collections::HashMap;
///
/// let chart = ChartBuilder::new("Switch")
///     .states(["OFF", "ON"])
///     .declare(state("OFF").edges([state("ON").edges([state("OFF").elsewhere()])]))
///     .build()
///     .unwrap();
///
/// let mut record: HashMap<String, Option<String>> = HashMap::new();
/// let mut machine = chart.bind(&mut record).unwrap();
///
/// assert_eq!(machine.current().unwrap().name(), "OFF");
/// machine.to("ON", &Args::new()).unwrap();
/// assert!(machine.can("OFF", &Args::new()).unwrap());
/// drop(machine);
///
/// assert_eq!(record["state"].as_deref(), Some("ON"));
/// ```
#[derive(Debug)]
pub struct Machine<'c, H: StateHolder> {
    chart: &'c Chart,
    holder: H,
    field: String,
}

impl<'c, H: StateHolder> Machine<'c, H> {
    /// Bind `chart` to `field` of `holder`, initializing an unset field to the
    /// chart's first state. A field already holding an unknown state is
    /// rejected.
    pub(crate) fn new(chart: &'c Chart, holder: H, field: String) -> Result<Self, TransitionError> {
        let mut machine = Self {
            chart,
            holder,
            field,
        };

        if machine.state()?.is_none() {
            let initial = chart.initial();
            machine.write(initial)?;
            debug!(
                chart = chart.name(),
                field = %machine.field,
                state = initial.name(),
                "initialized unset state"
            );
        }

        Ok(machine)
    }

    pub fn chart(&self) -> &'c Chart {
        self.chart
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn holder(&self) -> &H {
        &self.holder
    }

    pub fn holder_mut(&mut self) -> &mut H {
        &mut self.holder
    }

    /// Release the holder handle.
    pub fn into_holder(self) -> H {
        self.holder
    }

    /// Current state, or `None` if the field is unset.
    ///
    /// A value that matches no declared state is an error: the field was
    /// changed behind the chart's back.
    pub fn state(&self) -> Result<Option<&'c State>, TransitionError> {
        let Some(value) = self.holder.read_state(&self.field)? else {
            return Ok(None);
        };
        self.chart
            .state(&value)
            .map(Some)
            .ok_or_else(|| TransitionError::UnknownState {
                field: self.field.clone(),
                value,
            })
    }

    /// Current state; an unset field is an error.
    pub fn current(&self) -> Result<&'c State, TransitionError> {
        self.state()?.ok_or_else(|| TransitionError::NoCurrentState {
            field: self.field.clone(),
        })
    }

    /// Write a declared state without going through any transition.
    pub fn set_state(&mut self, target: impl AsRef<str>) -> Result<&'c State, TransitionError> {
        let state = self.resolve(target.as_ref())?;
        self.write(state)?;
        debug!(
            chart = self.chart.name(),
            field = %self.field,
            state = state.name(),
            "state set directly"
        );
        Ok(state)
    }

    /// Move to `target`, running its guard and then its action.
    pub fn to(&mut self, target: impl AsRef<str>, args: &Args) -> Result<&'c State, TransitionError> {
        self.transition(target.as_ref(), false, args)
    }

    /// Whether `to(target, args)` would be allowed.
    ///
    /// Only a guard rejection turns into `Ok(false)`. Unknown states, missing
    /// transitions and missing arguments are still errors.
    pub fn can(&self, target: impl AsRef<str>, args: &Args) -> Result<bool, TransitionError> {
        match self.check(target.as_ref(), args) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_allowed() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// `(value, label)` of every state reachable from the current one with
    /// `args`, in declaration order.
    pub fn choices(&self, args: &Args) -> Result<Vec<(String, String)>, TransitionError> {
        let current = self.current()?;
        let Some(transitions) = self.chart.transitions_from(current.name()) else {
            return Ok(Vec::new());
        };

        let mut choices = Vec::new();
        for transition in transitions {
            let to = transition.to();
            if self.can(to, args)? {
                choices.push((to.value().to_string(), to.label().to_string()));
            }
        }
        Ok(choices)
    }

    /// The full transition protocol.
    ///
    /// Resolves the target, finds the transition from the current state,
    /// checks required arguments, and evaluates the guard. A dry run stops
    /// there. Otherwise the new state is written first and the action runs
    /// after, so it observes the new state; an action failure does not undo
    /// the write.
    pub fn transition(
        &mut self,
        target: &str,
        dry_run: bool,
        args: &Args,
    ) -> Result<&'c State, TransitionError> {
        let transition = self.check(target, args)?;
        let to = transition.to();

        if dry_run {
            trace!(
                chart = self.chart.name(),
                from = transition.from().name(),
                to = to.name(),
                "dry run allowed"
            );
            return Ok(to);
        }

        self.write(to)?;
        debug!(
            chart = self.chart.name(),
            field = %self.field,
            from = transition.from().name(),
            to = to.name(),
            "transition committed"
        );

        if let Some(action) = transition.action() {
            action.exec(args).map_err(|source| {
                warn!(
                    chart = self.chart.name(),
                    to = to.name(),
                    effect = %source.effect,
                    "action failed after commit"
                );
                TransitionError::EffectFailed {
                    to: to.name().to_string(),
                    source,
                }
            })?;
        }

        Ok(to)
    }

    fn check(&self, target: &str, args: &Args) -> Result<&'c Transition, TransitionError> {
        let to = self.resolve(target)?;
        let from = self.current()?;
        let transition = self
            .chart
            .transition(from.name(), to.name())
            .ok_or_else(|| TransitionError::DoesNotExist {
                from: from.name().to_string(),
                to: to.name().to_string(),
            })?;

        if let Validation::Failure(missing) = require_args(transition, args) {
            return Err(TransitionError::MissingArgs {
                from: from.name().to_string(),
                to: to.name().to_string(),
                missing: missing.iter().cloned().collect(),
            });
        }

        if let Some(guard) = transition.guard() {
            let verdict = guard.eval(args);
            if !passes(&verdict) {
                trace!(
                    chart = self.chart.name(),
                    from = from.name(),
                    to = to.name(),
                    guard = %guard,
                    %verdict,
                    "guard rejected transition"
                );
                return Err(TransitionError::NotAllowed {
                    from: from.name().to_string(),
                    to: to.name().to_string(),
                    reason: verdict,
                });
            }
        }

        Ok(transition)
    }

    fn resolve(&self, target: &str) -> Result<&'c State, TransitionError> {
        self.chart
            .state(target)
            .ok_or_else(|| TransitionError::UnknownTarget(target.to_string()))
    }

    fn write(&mut self, state: &State) -> Result<(), TransitionError> {
        self.holder.write_state(&self.field, state.value())?;
        Ok(())
    }
}

/// Check every required parameter, accumulating ALL that are missing.
fn require_args(transition: &Transition, args: &Args) -> Validation<(), NonEmptyVec<String>> {
    let checks: Vec<Validation<(), NonEmptyVec<String>>> = transition
        .required_parameters()
        .into_iter()
        .map(|name| {
            if args.contains(name) {
                Validation::success(())
            } else {
                Validation::fail(name.to_string())
            }
        })
        .collect();

    Validation::all_vec(checks).map(|_| ())
}
