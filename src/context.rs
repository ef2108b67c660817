//! Evaluation context: parameter and variable bindings plus the resolver
//! callbacks, and the seeding hook for the `rand` operator.

use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// Callback resolving a `[param]` placeholder by name.
pub type ParamResolver = dyn Fn(&str) -> Value;
/// Callback resolving a single-letter variable.
pub type VariableResolver = dyn Fn(char) -> Value;

/// Configuration an evaluation runs against.
///
/// Parameters and variables can be registered directly in the maps or
/// resolved through callbacks; the maps win when both are present. Resolvers
/// must be pure: one evaluation may call them any number of times.
///
/// # Examples
///
/// ```
/// use expr_engine::{EvalContext, Expression, Value};
///
/// let mut ctx = EvalContext::new();
/// ctx.set_parameter("p", Value::Real(41.0));
///
/// let expr = Expression::new("[p] + 1");
/// assert_eq!(expr.eval(&ctx), Value::Real(42.0));
/// ```
#[derive(Clone, Default)]
pub struct EvalContext {
    parameters: HashMap<String, Value>,
    variables: HashMap<char, Value>,
    param_resolver: Option<Rc<ParamResolver>>,
    variable_resolver: Option<Rc<VariableResolver>>,
    random_seed: Option<u64>,
}

impl EvalContext {
    pub fn new() -> Self {
        EvalContext::default()
    }

    /// Binds a `[name]` placeholder. Returns the previous binding, if any.
    pub fn set_parameter(&mut self, name: &str, value: Value) -> Option<Value> {
        self.parameters.insert(name.to_string(), value)
    }

    /// Binds a single-letter variable. Returns the previous binding, if any.
    pub fn set_variable(&mut self, letter: char, value: Value) -> Option<Value> {
        self.variables.insert(letter, value)
    }

    /// Installs a fallback resolver consulted for parameters missing from
    /// the map.
    pub fn set_param_resolver(&mut self, resolver: impl Fn(&str) -> Value + 'static) {
        self.param_resolver = Some(Rc::new(resolver));
    }

    /// Installs a fallback resolver consulted for variables missing from the
    /// map.
    pub fn set_variable_resolver(&mut self, resolver: impl Fn(char) -> Value + 'static) {
        self.variable_resolver = Some(Rc::new(resolver));
    }

    /// Fixes the seed of the `rand` operator for deterministic evaluation.
    /// Without a seed the generator is seeded from entropy on first use.
    pub fn seed_random(&mut self, seed: u64) {
        self.random_seed = Some(seed);
    }

    pub(crate) fn random_seed(&self) -> Option<u64> {
        self.random_seed
    }

    pub(crate) fn resolve_param(&self, name: &str) -> Value {
        if let Some(value) = self.parameters.get(name) {
            return value.clone();
        }
        match &self.param_resolver {
            Some(resolver) => resolver(name),
            None => Value::Invalid,
        }
    }

    pub(crate) fn resolve_variable(&self, letter: char) -> Value {
        if let Some(value) = self.variables.get(&letter) {
            return value.clone();
        }
        match &self.variable_resolver {
            Some(resolver) => resolver(letter),
            None => Value::Invalid,
        }
    }
}
