//! Guard predicates for controlling transitions.
//!
//! A guard is a tree of [`Condition`] leaves combined with AND, OR and NOT.
//! Evaluating a guard yields a JSON value: exactly `true` lets the transition
//! through, anything else blocks it and doubles as the rejection reason.

use super::expression::{Args, Expression, Leaf, Operand, Param, Signature};
use crate::builder::ChartError;
use serde_json::Value;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;
use tracing::trace;

/// The verdict that lets a transition through.
pub const PASS: Value = Value::Bool(true);

/// Whether a verdict lets a transition through. Only `true` does.
pub fn passes(verdict: &Value) -> bool {
    matches!(verdict, Value::Bool(true))
}

/// A leaf predicate with named parameters.
///
/// Implement [`Operand::params`] to declare which arguments the condition
/// reads; [`Condition::eval`] then receives exactly those (with defaults
/// filled in). The default evaluation always passes.
///
/// # Example
///
/// ```rust
/// use sluice::core::{Condition, Operand, Param, PASS};
/// use sluice::Args;
/// use serde_json::Value;
///
/// struct Funded;
///
/// impl Operand for Funded {
///     fn name(&self) -> &str {
///         "Funded"
///     }
///
///     fn params(&self) -> Vec<Param> {
///         vec![Param::required("balance")]
///     }
/// }
///
/// impl Condition for Funded {
///     fn eval(&self, args: &Args) -> Value {
///         match args.get_as::<i64>("balance") {
///             Some(balance) if balance > 0 => PASS,
///             _ => Value::from("balance must be positive"),
///         }
///     }
/// }
/// ```
pub trait Condition: Operand {
    /// Return [`PASS`] to allow the transition, or any other value to block it.
    fn eval(&self, args: &Args) -> Value {
        let _ = args;
        PASS
    }
}

type Predicate = Box<dyn Fn(&Args) -> Value + Send + Sync>;

/// A condition built from a closure.
///
/// # Example
///
/// ```rust
/// use sluice::core::{FnCondition, Guard, Param};
/// use sluice::Args;
///
/// let sometimes = FnCondition::new("Sometimes", |args: &Args| {
///     args.get("sometimes").cloned().unwrap_or_default()
/// })
/// .param(Param::required("sometimes"));
///
/// let guard = Guard::leaf(sometimes).unwrap();
/// assert_eq!(guard.to_string(), "Sometimes");
/// ```
pub struct FnCondition {
    name: String,
    params: Vec<Param>,
    predicate: Predicate,
}

impl FnCondition {
    pub fn new<F, V>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Args) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            predicate: Box::new(move |args| predicate(args).into()),
        }
    }

    /// Declare a parameter.
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }
}

impl Operand for FnCondition {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> Vec<Param> {
        self.params.clone()
    }
}

impl Condition for FnCondition {
    fn eval(&self, args: &Args) -> Value {
        (self.predicate)(args)
    }
}

/// A boolean tree of conditions.
///
/// AND and OR short-circuit on whether the left operand *passed*, and return
/// the raw value of whichever operand decided the outcome. NOT collapses its
/// operand to a plain boolean, dropping any rejection reason.
#[derive(Clone, Debug)]
pub enum Guard {
    Leaf(Leaf<dyn Condition>),
    Not(Box<Guard>),
    And(Box<Guard>, Box<Guard>),
    Or(Box<Guard>, Box<Guard>),
}

impl Guard {
    /// Wrap a condition, validating its declared parameters.
    pub fn leaf<C: Condition + 'static>(condition: C) -> Result<Self, ChartError> {
        Self::shared(Arc::new(condition))
    }

    /// Wrap a condition that is already shared.
    pub fn shared(condition: Arc<dyn Condition>) -> Result<Self, ChartError> {
        Ok(Self::Leaf(Leaf::new(condition)?))
    }

    /// A guard that always passes.
    pub fn always() -> Self {
        struct Always;

        impl Operand for Always {
            fn name(&self) -> &str {
                "Always"
            }
        }

        impl Condition for Always {}

        let always: Arc<dyn Condition> = Arc::new(Always);
        Self::Leaf(Leaf::parameterless(always))
    }

    pub fn and(self, other: Guard) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Guard) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Evaluate against the caller's arguments.
    ///
    /// Each leaf receives only the arguments it declared.
    pub fn eval(&self, args: &Args) -> Value {
        match self {
            Self::Leaf(leaf) => {
                let verdict = leaf.operand().eval(&leaf.signature().select(args));
                trace!(condition = leaf.name(), %verdict, "evaluated condition");
                verdict
            }
            Self::Not(inner) => Value::Bool(!passes(&inner.eval(args))),
            Self::And(left, right) => {
                let verdict = left.eval(args);
                if passes(&verdict) {
                    right.eval(args)
                } else {
                    verdict
                }
            }
            Self::Or(left, right) => {
                let verdict = left.eval(args);
                if passes(&verdict) {
                    verdict
                } else {
                    right.eval(args)
                }
            }
        }
    }

    fn collect<'a>(&'a self, signatures: &mut Vec<&'a Signature>) {
        match self {
            Self::Leaf(leaf) => signatures.push(leaf.signature()),
            Self::Not(inner) => inner.collect(signatures),
            Self::And(left, right) | Self::Or(left, right) => {
                left.collect(signatures);
                right.collect(signatures);
            }
        }
    }
}

impl Expression for Guard {
    fn signatures(&self) -> Vec<&Signature> {
        let mut signatures = Vec::new();
        self.collect(&mut signatures);
        signatures
    }
}

/// `and(a, b)`: passes when both pass.
pub fn and(left: Guard, right: Guard) -> Guard {
    left.and(right)
}

/// `or(a, b)`: passes when either passes.
pub fn or(left: Guard, right: Guard) -> Guard {
    left.or(right)
}

/// `not(a)`: passes when `a` does not.
pub fn not(guard: Guard) -> Guard {
    guard.negate()
}

impl BitAnd for Guard {
    type Output = Guard;

    fn bitand(self, rhs: Guard) -> Guard {
        self.and(rhs)
    }
}

impl BitOr for Guard {
    type Output = Guard;

    fn bitor(self, rhs: Guard) -> Guard {
        self.or(rhs)
    }
}

impl Not for Guard {
    type Output = Guard;

    fn not(self) -> Guard {
        self.negate()
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(leaf) => f.write_str(leaf.name()),
            Self::Not(inner) => write!(f, "~{inner}"),
            Self::And(left, right) => write!(f, "({left} & {right})"),
            Self::Or(left, right) => write!(f, "({left} | {right})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sometimes() -> Guard {
        Guard::leaf(
            FnCondition::new("Sometimes", |args: &Args| {
                args.get("sometimes").cloned().unwrap_or_default()
            })
            .param(Param::required("sometimes")),
        )
        .unwrap()
    }

    fn maybe() -> Guard {
        Guard::leaf(
            FnCondition::new("Maybe", |args: &Args| match args.get("maybe") {
                Some(Value::Bool(true)) => PASS,
                _ => json!("I guess not"),
            })
            .param(Param::required("maybe")),
        )
        .unwrap()
    }

    fn never() -> Guard {
        Guard::leaf(FnCondition::new("Never", |_: &Args| false)).unwrap()
    }

    fn args(sometimes: bool, maybe: bool) -> Args {
        Args::new().with("sometimes", sometimes).with("maybe", maybe)
    }

    #[test]
    fn default_condition_passes() {
        struct Unconditioned;

        impl Operand for Unconditioned {
            fn name(&self) -> &str {
                "Unconditioned"
            }
        }

        impl Condition for Unconditioned {}

        let guard = Guard::leaf(Unconditioned).unwrap();
        assert_eq!(guard.eval(&Args::new()), PASS);
        assert_eq!(Guard::always().eval(&Args::new()), PASS);
    }

    #[test]
    fn only_exact_true_passes() {
        assert!(passes(&json!(true)));
        assert!(!passes(&json!(false)));
        assert!(!passes(&json!(1)));
        assert!(!passes(&json!("true")));
        assert!(!passes(&Value::Null));
    }

    #[test]
    fn leaf_returns_raw_verdict() {
        assert_eq!(maybe().eval(&args(true, false)), json!("I guess not"));
        assert_eq!(never().eval(&Args::new()), json!(false));
    }

    #[test]
    fn not_collapses_to_boolean() {
        let guard = not(maybe());
        assert_eq!(guard.eval(&args(false, false)), json!(true));
        assert_eq!(guard.eval(&args(false, true)), json!(false));
    }

    #[test]
    fn and_returns_deciding_operand() {
        let guard = and(sometimes(), maybe());
        assert_eq!(guard.eval(&args(true, true)), json!(true));
        assert_eq!(guard.eval(&args(true, false)), json!("I guess not"));
        assert_eq!(guard.eval(&args(false, true)), json!(false));
        assert_eq!(guard.eval(&args(false, false)), json!(false));
    }

    #[test]
    fn or_returns_deciding_operand() {
        let guard = or(sometimes(), maybe());
        assert_eq!(guard.eval(&args(true, true)), json!(true));
        assert_eq!(guard.eval(&args(true, false)), json!(true));
        assert_eq!(guard.eval(&args(false, true)), json!(true));
        assert_eq!(guard.eval(&args(false, false)), json!("I guess not"));
    }

    #[test]
    fn truthy_rejection_does_not_pass_and() {
        let truthy = Guard::leaf(FnCondition::new("Truthy", |_: &Args| "not today")).unwrap();
        let guard = and(truthy, Guard::always());
        assert_eq!(guard.eval(&Args::new()), json!("not today"));
    }

    #[test]
    fn and_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let counter = Guard::leaf(FnCondition::new("Counter", move |_: &Args| {
            counted.fetch_add(1, Ordering::SeqCst);
            true
        }))
        .unwrap();

        let guard = and(never(), counter.clone());
        guard.eval(&Args::new());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let guard = or(Guard::always(), counter);
        guard.eval(&Args::new());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn leaves_only_see_declared_arguments() {
        let seen = Guard::leaf(
            FnCondition::new("Seen", |args: &Args| {
                args.len() == 2 && args.get("limit") == Some(&json!(3))
            })
            .param(Param::required("amount"))
            .param(Param::optional("limit", 3)),
        )
        .unwrap();

        let args = Args::new().with("amount", 1).with("other", true);
        assert_eq!(seen.eval(&args), PASS);
    }

    #[test]
    fn parameters_are_unioned() {
        let guard = sometimes() & (maybe() | !sometimes());
        assert_eq!(guard.parameters(), vec!["sometimes", "maybe"]);
        assert_eq!(guard.required_parameters(), vec!["sometimes", "maybe"]);
        assert!(never().parameters().is_empty());
    }

    #[test]
    fn required_excludes_defaulted() {
        let guard = Guard::leaf(
            FnCondition::new("Limit", |_: &Args| true)
                .param(Param::optional("limit", 10))
                .param(Param::required("amount")),
        )
        .unwrap();
        assert_eq!(guard.parameters(), vec!["limit", "amount"]);
        assert_eq!(guard.required_parameters(), vec!["amount"]);
    }

    #[test]
    fn display_renders_infix() {
        assert_eq!(sometimes().to_string(), "Sometimes");
        assert_eq!((!sometimes()).to_string(), "~Sometimes");
        assert_eq!((sometimes() & maybe()).to_string(), "(Sometimes & Maybe)");
        assert_eq!(
            (sometimes() | (maybe() & !never())).to_string(),
            "(Sometimes | (Maybe & ~Never))"
        );
    }

    #[test]
    fn malformed_condition_is_rejected() {
        let result = Guard::leaf(
            FnCondition::new("Broken", |_: &Args| true).param(Param::required("bad name")),
        );
        assert!(matches!(result, Err(ChartError::MalformedSignature { .. })));
    }
}
