//! Side-effecting actions run after a transition commits.

use super::expression::{Args, Expression, Leaf, Operand, Param, Signature};
use crate::builder::ChartError;
use std::fmt;
use std::ops::Add;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Error type returned by effect leaves.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A leaf procedure with named parameters.
///
/// Like [`Condition`](super::Condition), an effect declares its parameters
/// through [`Operand::params`] and receives only those arguments. The default
/// execution does nothing.
pub trait Effect: Operand {
    fn exec(&self, args: &Args) -> Result<(), BoxError> {
        let _ = args;
        Ok(())
    }
}

type Procedure = Box<dyn Fn(&Args) -> Result<(), BoxError> + Send + Sync>;

/// An effect built from a closure.
///
/// # Example
///
/// ```rust
/// use sluice::core::{Action, FnEffect, Param};
/// use sluice::Args;
///
/// let notify = FnEffect::new("Notify", |args: &Args| {
///     let _email = args.get_as::<String>("email");
///     Ok(())
/// })
/// .param(Param::required("email"));
///
/// let action = Action::leaf(notify).unwrap();
/// assert_eq!(action.to_string(), "Notify");
/// ```
pub struct FnEffect {
    name: String,
    params: Vec<Param>,
    procedure: Procedure,
}

impl FnEffect {
    pub fn new<F>(name: impl Into<String>, procedure: F) -> Self
    where
        F: Fn(&Args) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            procedure: Box::new(procedure),
        }
    }

    /// Declare a parameter.
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }
}

impl Operand for FnEffect {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> Vec<Param> {
        self.params.clone()
    }
}

impl Effect for FnEffect {
    fn exec(&self, args: &Args) -> Result<(), BoxError> {
        (self.procedure)(args)
    }
}

/// An effect in a chain returned an error. Later effects did not run.
#[derive(Debug, Error)]
#[error("effect `{effect}` failed: {source}")]
pub struct EffectFailure {
    pub effect: String,
    #[source]
    pub source: BoxError,
}

/// An ordered chain of effects.
///
/// Chaining two chains yields one flat chain; execution runs every effect
/// left to right and stops at the first failure.
#[derive(Clone, Debug, Default)]
pub struct Action {
    steps: Vec<Leaf<dyn Effect>>,
}

impl Action {
    /// Wrap an effect, validating its declared parameters.
    pub fn leaf<E: Effect + 'static>(effect: E) -> Result<Self, ChartError> {
        Self::shared(Arc::new(effect))
    }

    /// Wrap an effect that is already shared.
    pub fn shared(effect: Arc<dyn Effect>) -> Result<Self, ChartError> {
        Ok(Self {
            steps: vec![Leaf::new(effect)?],
        })
    }

    /// Append `next` after every effect already in this chain.
    pub fn then(mut self, next: Action) -> Self {
        self.steps.extend(next.steps);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Effect names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(Leaf::name).collect()
    }

    /// Run every effect in order with the arguments each one declared.
    pub fn exec(&self, args: &Args) -> Result<(), EffectFailure> {
        for step in &self.steps {
            trace!(effect = step.name(), "running effect");
            step.operand()
                .exec(&step.signature().select(args))
                .map_err(|source| EffectFailure {
                    effect: step.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}

impl Expression for Action {
    fn signatures(&self) -> Vec<&Signature> {
        self.steps.iter().map(Leaf::signature).collect()
    }
}

/// `chain(a, b)`: run `a`, then `b`.
pub fn chain(first: Action, second: Action) -> Action {
    first.then(second)
}

impl Add for Action {
    type Output = Action;

    fn add(self, rhs: Action) -> Action {
        self.then(rhs)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(" + "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn recorder(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Action {
        let log = Arc::clone(log);
        let label = name.to_string();
        Action::leaf(
            FnEffect::new(name, move |args: &Args| {
                let whatever = args.get_as::<String>("whatever").unwrap_or_default();
                log.lock().unwrap().push(format!("{label}:{whatever}"));
                Ok(())
            })
            .param(Param::required("whatever")),
        )
        .unwrap()
    }

    fn failing(name: &str) -> Action {
        Action::leaf(FnEffect::new(name, |_: &Args| Err("disk full".into()))).unwrap()
    }

    #[test]
    fn default_effect_does_nothing() {
        struct Quiet;

        impl Operand for Quiet {
            fn name(&self) -> &str {
                "Quiet"
            }
        }

        impl Effect for Quiet {}

        let action = Action::leaf(Quiet).unwrap();
        assert!(action.exec(&Args::new()).is_ok());
    }

    #[test]
    fn chain_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let action = chain(recorder("First", &log), recorder("Second", &log));

        action.exec(&Args::new().with("whatever", "x")).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["First:x", "Second:x"]);
    }

    #[test]
    fn chain_of_chains_is_flat() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let left = recorder("A", &log) + recorder("B", &log);
        let right = recorder("C", &log) + recorder("D", &log);
        let action = left + right;

        assert_eq!(action.len(), 4);
        assert_eq!(action.names(), vec!["A", "B", "C", "D"]);
        assert_eq!(action.to_string(), "A + B + C + D");
    }

    #[test]
    fn failure_stops_the_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let action = recorder("Before", &log) + failing("Broken") + recorder("After", &log);

        let err = action.exec(&Args::new().with("whatever", "y")).unwrap_err();

        assert_eq!(err.effect, "Broken");
        assert_eq!(err.source.to_string(), "disk full");
        assert_eq!(*log.lock().unwrap(), vec!["Before:y"]);
    }

    #[test]
    fn effects_only_see_declared_arguments() {
        let action = Action::leaf(
            FnEffect::new("Strict", |args: &Args| {
                if args.contains("secret") {
                    Err("saw an undeclared argument".into())
                } else if args.get("retries") == Some(&json!(3)) {
                    Ok(())
                } else {
                    Err("default not applied".into())
                }
            })
            .param(Param::optional("retries", 3)),
        )
        .unwrap();

        assert!(action.exec(&Args::new().with("secret", 1)).is_ok());
    }

    #[test]
    fn parameters_are_unioned() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let tagged = Action::leaf(
            FnEffect::new("Tag", |_: &Args| Ok(()))
                .param(Param::optional("tag", "none"))
                .param(Param::required("whatever")),
        )
        .unwrap();
        let action = recorder("Log", &log) + tagged;

        assert_eq!(action.parameters(), vec!["whatever", "tag"]);
        assert_eq!(action.required_parameters(), vec!["whatever"]);
    }

    #[test]
    fn malformed_effect_is_rejected() {
        let result = Action::leaf(
            FnEffect::new("Broken", |_: &Args| Ok(())).param(Param::required("bad name")),
        );
        assert!(matches!(
            result,
            Err(ChartError::MalformedSignature { ref operand, .. }) if operand == "Broken"
        ));

        let result = Action::leaf(
            FnEffect::new("Twice", |_: &Args| Ok(()))
                .param(Param::required("whatever"))
                .param(Param::optional("whatever", 1)),
        );
        assert!(matches!(result, Err(ChartError::MalformedSignature { .. })));
    }

    #[test]
    fn empty_chain_renders_empty() {
        let action = Action::default();
        assert!(action.is_empty());
        assert_eq!(action.to_string(), "");
        assert!(action.exec(&Args::new()).is_ok());
    }
}
