//! Shared pieces of the guard and action expression trees.
//!
//! Leaves declare their named parameters as data. Trees built from leaves
//! report the union of those parameters, and every leaf only ever sees the
//! arguments it declared, with defaults filled in for absent optional ones.

use crate::builder::ChartError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A named parameter of a guard or action leaf.
///
/// Required parameters have no default and must be supplied by every caller
/// of a transition that uses the leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    name: String,
    default: Option<Value>,
}

impl Param {
    /// A parameter the caller must always supply.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// A parameter that falls back to `default` when the caller omits it.
    pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Named arguments passed to `to`, `can` and `choices`.
///
/// # Example
///
/// ```rust
/// use sluice::Args;
///
/// let args = Args::new().with("amount", 40).with("approved", true);
/// assert_eq!(args.get_as::<u32>("amount"), Some(40));
/// assert!(args.contains("approved"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(BTreeMap<String, Value>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Deserialize one argument into a concrete type.
    ///
    /// Returns `None` when the argument is absent or has the wrong shape.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.0
            .get(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// Anything that can sit at a leaf of an expression tree.
///
/// `params` is read once, when the leaf is wrapped, and validated into a
/// [`Signature`].
pub trait Operand: Send + Sync {
    /// Name used when rendering expressions, e.g. `Sometimes`.
    fn name(&self) -> &str;

    /// Declared parameters, in order. Defaults to none.
    fn params(&self) -> Vec<Param> {
        Vec::new()
    }
}

/// A validated parameter list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    /// Validate the parameters declared by `operand`.
    ///
    /// Every name must be a non-empty identifier and appear only once.
    pub fn new(operand: &str, params: Vec<Param>) -> Result<Self, ChartError> {
        let malformed = |reason: String| ChartError::MalformedSignature {
            operand: operand.to_string(),
            reason,
        };

        for (i, param) in params.iter().enumerate() {
            let name = param.name();
            if name.is_empty() {
                return Err(malformed("parameter name is empty".to_string()));
            }
            if !is_identifier(name) {
                return Err(malformed(format!("parameter `{name}` is not an identifier")));
            }
            if params[..i].iter().any(|earlier| earlier.name() == name) {
                return Err(malformed(format!("parameter `{name}` is declared twice")));
            }
        }

        Ok(Self { params })
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Names of the parameters without defaults.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|param| param.is_required())
            .map(Param::name)
    }

    /// The slice of `args` this signature declares, with defaults filled in.
    pub fn select(&self, args: &Args) -> Args {
        let mut selected = Args::new();
        for param in &self.params {
            match (args.get(param.name()), param.default()) {
                (Some(value), _) | (None, Some(value)) => {
                    selected.insert(param.name(), value.clone());
                }
                (None, None) => {}
            }
        }
        selected
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A leaf operand together with its validated signature.
pub struct Leaf<T: ?Sized> {
    operand: Arc<T>,
    signature: Signature,
}

impl<T: Operand + ?Sized> Leaf<T> {
    pub fn new(operand: Arc<T>) -> Result<Self, ChartError> {
        let signature = Signature::new(operand.name(), operand.params())?;
        Ok(Self { operand, signature })
    }

    /// Wrap an operand that declares no parameters.
    pub(crate) fn parameterless(operand: Arc<T>) -> Self {
        Self {
            operand,
            signature: Signature::default(),
        }
    }

    pub fn name(&self) -> &str {
        self.operand.name()
    }

    pub fn operand(&self) -> &T {
        &self.operand
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl<T: ?Sized> Clone for Leaf<T> {
    fn clone(&self) -> Self {
        Self {
            operand: Arc::clone(&self.operand),
            signature: self.signature.clone(),
        }
    }
}

impl<T: Operand + ?Sized> fmt::Debug for Leaf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("name", &self.name())
            .field("params", &self.signature.params())
            .finish()
    }
}

/// Parameter introspection shared by guard trees and action chains.
pub trait Expression {
    /// Signatures of every leaf, left to right.
    fn signatures(&self) -> Vec<&Signature>;

    /// Every parameter any leaf accepts, first occurrence first.
    fn parameters(&self) -> Vec<&str> {
        merge_names(
            self.signatures()
                .into_iter()
                .flat_map(|signature| signature.params().iter().map(Param::name)),
        )
    }

    /// Every parameter some leaf requires, first occurrence first.
    fn required_parameters(&self) -> Vec<&str> {
        merge_names(
            self.signatures()
                .into_iter()
                .flat_map(|signature| signature.required()),
        )
    }
}

/// Deduplicate names while keeping the order they were first seen in.
pub(crate) fn merge_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut merged: Vec<&str> = Vec::new();
    for name in names {
        if !merged.contains(&name) {
            merged.push(name);
        }
    }
    merged
}
