#![doc = r#"
# expr-engine

An expression engine for a small math/logic language: it parses a textual
expression into an AST, validates the tree for structural coherence, renders it
back to canonical text, LaTeX or an ASCII diagram, and evaluates it to a tagged
[`Value`].

The language covers real and complex arithmetic, trigonometry, statistics over
sequences, higher-order sequence operations (`gen`, `has`, `pick`, `sel`,
`sort`, `trans`, `acc`), large-scale constructs (`Σ`, `Π` and one- to
three-dimensional numeric integration), named user-defined functions over
single-letter formals, and parameter placeholders resolved through
caller-supplied callbacks.

## Quick start

```rust
use expr_engine::{interp, Value};

assert_eq!(interp("1+2*3", None), Value::Real(7.0));
assert_eq!(interp("(1+2)*3", None), Value::Real(9.0));
assert_eq!(interp("2^10", None), Value::Real(1024.0));
```

## The facade

[`Expression`] owns a parsed tree (or the offset where parsing gave up) and
exposes the renderers and the evaluator:

```rust
use expr_engine::{Expression, EvalContext, Value};

let expr = Expression::new("{f(x)=x*x}f(5)");
assert!(expr.is_valid());
assert_eq!(expr.eval(&EvalContext::new()), Value::Real(25.0));

let bad = Expression::new("1+*2");
assert!(!bad.is_valid());
assert!(bad.failure_offset().is_some());
```

## Parameters and variables

Placeholders written `[name]` and single-letter variables are resolved through
the evaluation context: maps first, then the optional callbacks.

```rust
use expr_engine::{Expression, EvalContext, Value};

let mut ctx = EvalContext::new();
ctx.set_parameter("answer", Value::Real(41.0));
ctx.set_variable_resolver(|letter| match letter {
    'x' => Value::Real(2.0),
    _ => Value::Invalid,
});

let expr = Expression::new("[answer] + x / 2");
assert_eq!(expr.eval(&ctx), Value::Real(42.0));
```

## Sequences and higher-order operators

```rust
use expr_engine::{interp, Value};

assert_eq!(interp("total(1,2,3,4)", None), Value::Real(10.0));
assert_eq!(interp("cnt(uniq((1,1,2,3,3)))", None), Value::Real(3.0));

// gen(seed, size): a seed function receives the accumulated sequence.
let v = interp("{g(s)=cnt(s)}gen(g, 5)", None);
assert_eq!(
    v,
    Value::Sequence(vec![
        Value::Real(0.0),
        Value::Real(1.0),
        Value::Real(2.0),
        Value::Real(3.0),
        Value::Real(4.0),
    ])
);
```

## Failure model

Parsing and validation failures make the handler invalid and record the
farthest character offset the scanner reached. Evaluation never returns an
error: resolution misses, domain violations without a complex continuation,
wrong wrap arities and the like all produce [`Value::Invalid`], which
propagates.
"#]

pub mod ast;
pub mod context;
pub mod engine;
pub mod error;
pub mod eval;
pub mod link;
pub mod operate;
pub mod operator;
pub mod parser;
pub mod render;
pub mod sieve;
pub mod value;

pub use context::EvalContext;
pub use engine::{interp, Expression};
pub use error::{ExprError, Result};
pub use value::Value;

/// Floating-point type used for all real computation.
pub type Real = f64;

/// Numeric constants shared by the parser, the evaluator and the tests.
pub mod constants {
    use super::Real;

    pub const PI: Real = core::f64::consts::PI;
    pub const E: Real = core::f64::consts::E;

    /// Tolerance for the approach relation (`~=`) and the zahlen test.
    pub const EPSILON: Real = 1.0e-9;

    /// Upper bound on the length of a generated sequence.
    pub const MAX_GENERATE_SIZE: usize = 10_000_000;

    /// Trapezoid subdivisions for `∫`, `∫∫` and `∫∫∫`.
    pub const INTEGRATE_STEPS: usize = 1_000_000;
    pub const INTEGRATE2_STEPS: usize = 8_000;
    pub const INTEGRATE3_STEPS: usize = 500;

    /// Default epsilon used by `assert_approx_eq!`.
    pub const TEST_PRECISION: Real = 1e-10;
}

/// True when the two reals differ by less than [`constants::EPSILON`].
pub fn approach_to(left: Real, right: Real) -> bool {
    (left - right).abs() < constants::EPSILON
}

/// True when `value` is within [`constants::EPSILON`] of an integer.
///
/// Used to detect near-singular arguments to `tan`, `cot`, `sec` and `csc`.
pub fn is_zahlen(value: Real) -> bool {
    approach_to(value, value.round())
}

/// Asserts that two floating-point values are approximately equal.
///
/// NaN equals NaN and same-signed infinities are equal, so domain-edge
/// results can be asserted directly.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr $(,)?) => {
        $crate::assert_approx_eq!($left, $right, $crate::constants::TEST_PRECISION)
    };
    ($left:expr, $right:expr, $epsilon:expr $(,)?) => {{
        let left_val: $crate::Real = $left;
        let right_val: $crate::Real = $right;
        let eps: $crate::Real = $epsilon;

        if left_val.is_nan() && right_val.is_nan() {
            // NaN == NaN for our purposes
        } else if left_val.is_infinite()
            && right_val.is_infinite()
            && left_val.signum() == right_val.signum()
        {
            // Same-signed infinities are equal
        } else {
            assert!(
                (left_val - right_val).abs() < eps,
                "assertion failed: `(left ≈ right)` (left: `{}`, right: `{}`, epsilon: `{}`)",
                left_val,
                right_val,
                eps
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approach_to() {
        assert!(approach_to(1.0, 1.0 + 1e-12));
        assert!(!approach_to(1.0, 1.0 + 1e-6));
    }

    #[test]
    fn test_is_zahlen() {
        assert!(is_zahlen(3.0));
        assert!(is_zahlen(2.9999999999));
        assert!(!is_zahlen(2.5));
    }

    #[test]
    fn test_assert_approx_eq_edge_cases() {
        assert_approx_eq!(f64::NAN, f64::NAN);
        assert_approx_eq!(f64::INFINITY, f64::INFINITY);
        assert_approx_eq!(0.1 + 0.2, 0.3, 1e-12);
    }
}
