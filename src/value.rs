//! The tagged runtime value produced by evaluation.

use core::fmt;
use core::hash::{Hash, Hasher};

use num_complex::Complex64;

use crate::{approach_to, Real};

/// Runtime value of an evaluated (sub)expression.
///
/// Equality is structural; reals compare by IEEE `==`. A `Hash` impl is
/// provided so values can key sets and maps (`uniq`, `mode`): it normalises
/// `-0.0` to `0.0` so equal reals hash equally. NaN never equals anything,
/// including itself, so NaN elements simply never deduplicate.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent or failed computation. Coerces to `false` and `0.0`.
    Invalid,
    Boolean(bool),
    Real(Real),
    Complex(Complex64),
    Str(String),
    /// Ordered finite list of values.
    Sequence(Vec<Value>),
}

impl Value {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Value::Invalid)
    }

    /// Boolean coercion: non-zero reals, complex values with both parts
    /// non-zero and non-empty strings are true; sequences never are.
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Real(r) => *r != 0.0,
            Value::Complex(c) => c.re != 0.0 && c.im != 0.0,
            Value::Str(s) => !s.is_empty(),
            _ => false,
        }
    }

    /// Real coercion: booleans become 0/1, complex values keep their real
    /// part, strings parse leniently (unparsable text is 0).
    pub fn to_real(&self) -> Real {
        match self {
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Real(r) => *r,
            Value::Complex(c) => c.re,
            Value::Str(s) => s.trim().parse::<Real>().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn to_complex(&self) -> Complex64 {
        match self {
            Value::Complex(c) => *c,
            other => Complex64::new(other.to_real(), 0.0),
        }
    }

    /// Plain text form: strings unquoted, sequences in parentheses.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::Invalid => String::new(),
            Value::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Real(r) => format_real(*r),
            Value::Complex(c) => format_complex(c),
            Value::Str(s) => s.clone(),
            Value::Sequence(items) => {
                let inner: Vec<String> = items.iter().map(Value::to_plain_string).collect();
                format!("({})", inner.join(","))
            }
        }
    }

    /// Source-like text form: strings quoted, sequences in parentheses.
    pub fn to_text(&self) -> String {
        match self {
            Value::Str(s) => format!("\"{}\"", s),
            Value::Sequence(items) => {
                let inner: Vec<String> = items.iter().map(Value::to_text).collect();
                format!("({})", inner.join(","))
            }
            other => other.to_plain_string(),
        }
    }
}

/// Shortest round-trip formatting already trims trailing zeros ("7", "1.5").
pub(crate) fn format_real(value: Real) -> String {
    format!("{}", value)
}

fn format_complex(value: &Complex64) -> String {
    let re = value.re;
    let im = value.im;
    if approach_to(im, 0.0) {
        return format_real(re);
    }

    let imag_str = if approach_to(im, 1.0) {
        "i".to_string()
    } else if approach_to(im, -1.0) {
        "-i".to_string()
    } else {
        format!("{}i", format_real(im))
    };

    if approach_to(re, 0.0) {
        imag_str
    } else if im < 0.0 {
        format!("{}{}", format_real(re), imag_str)
    } else {
        format!("{}+{}", format_real(re), imag_str)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain_string())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Invalid, Value::Invalid) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Complex(a), Value::Complex(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

fn hash_real<H: Hasher>(value: Real, state: &mut H) {
    // -0.0 must hash like 0.0 because it compares equal to it.
    let normalized = if value == 0.0 { 0.0 } else { value };
    normalized.to_bits().hash(state);
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Invalid => {}
            Value::Boolean(b) => b.hash(state),
            Value::Real(r) => hash_real(*r, state),
            Value::Complex(c) => {
                hash_real(c.re, state);
                hash_real(c.im, state);
            }
            Value::Str(s) => s.hash(state),
            Value::Sequence(items) => {
                items.len().hash(state);
                for item in items {
                    item.hash(state);
                }
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Real> for Value {
    fn from(value: Real) -> Self {
        Value::Real(value)
    }
}

impl From<Complex64> for Value {
    fn from(value: Complex64) -> Self {
        Value::Complex(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}
