//! Type-directed operator application: the scalar rules over booleans, reals,
//! complex numbers and strings, and the statistics over sequences.
//!
//! Real-domain rejections with a complex continuation (`sqrt(-1)`, `ln(-2)`,
//! fractional powers of negative bases, inverse trig outside [-1, 1], ...)
//! re-dispatch to the complex rules instead of failing.

use std::collections::HashSet;

use num_complex::Complex64;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

use crate::constants::{EPSILON, E, PI};
use crate::operator::{Arity, Category, OpCode, Operator};
use crate::sieve::Sieve;
use crate::value::Value;
use crate::{approach_to, is_zahlen, Real};

/// Mutable evaluator-owned resources the scalar rules may touch: the prime
/// sieve and the random generator.
pub struct Scratch {
    pub sieve: Sieve,
    rng: Option<SmallRng>,
    seed: Option<u64>,
}

impl Scratch {
    pub fn new(seed: Option<u64>) -> Self {
        Scratch {
            sieve: Sieve::new(),
            rng: None,
            seed,
        }
    }

    /// Uniform in [0, 1). The generator is seeded on first use, from the
    /// configured seed or from entropy.
    pub fn random(&mut self) -> Real {
        let seed = self.seed;
        let rng = self.rng.get_or_insert_with(|| match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        });
        rng.gen::<Real>()
    }
}

/// Applies `op` to evaluated operands. Unary operators receive a synthetic
/// zero on their vacant side; mismatched operand types yield Invalid.
pub fn operate(left: &Value, op: &Operator, right: &Value, scratch: &mut Scratch) -> Value {
    match op.category {
        Category::Logic => operate_bool(left.to_boolean(), op, right.to_boolean()),
        Category::Relation | Category::Arithmetic => {
            let unary_prefix = op.arity == Arity::Unary && !op.postfix;
            let unary_postfix = op.arity == Arity::Unary && op.postfix;

            match right {
                Value::Real(r) => match left {
                    Value::Real(l) => operate_real(*l, op, *r, scratch),
                    Value::Complex(l) => operate_complex(*l, op, Complex64::new(*r, 0.0)),
                    _ if unary_prefix => operate_real(0.0, op, *r, scratch),
                    _ => Value::Invalid,
                },
                Value::Complex(r) => match left {
                    Value::Real(l) => operate_complex(Complex64::new(*l, 0.0), op, *r),
                    Value::Complex(l) => operate_complex(*l, op, *r),
                    _ if unary_prefix => operate_complex(Complex64::new(0.0, 0.0), op, *r),
                    _ => Value::Invalid,
                },
                Value::Str(r) => match left {
                    Value::Str(l) => operate_string(l, op, r),
                    _ => Value::Invalid,
                },
                _ if unary_postfix => match left {
                    Value::Real(l) => operate_real(*l, op, 0.0, scratch),
                    Value::Complex(l) => operate_complex(*l, op, Complex64::new(0.0, 0.0)),
                    _ => Value::Invalid,
                },
                _ => Value::Invalid,
            }
        }
        Category::Evaluation => match right {
            Value::Sequence(items) => operate_sequence(op, unwrap_singleton(items)),
            _ => Value::Invalid,
        },
        // Invocation, LargeScale and Function calls are dispatched by the
        // evaluator, which needs the unevaluated wrap.
        _ => Value::Invalid,
    }
}

/// `op((s))` equals `op(s)`: a one-element wrap holding a sequence is the
/// sequence.
fn unwrap_singleton(items: &[Value]) -> &[Value] {
    match items {
        [Value::Sequence(inner)] => inner,
        other => other,
    }
}

fn operate_bool(left: bool, op: &Operator, right: bool) -> Value {
    match op.code() {
        Some(OpCode::And) => Value::Boolean(left && right),
        Some(OpCode::Or) => Value::Boolean(left || right),
        Some(OpCode::Not) => Value::Boolean(!right),
        _ => Value::Invalid,
    }
}

fn complex_fallback(left: Real, op: &Operator, right: Real) -> Value {
    operate_complex(Complex64::new(left, 0.0), op, Complex64::new(right, 0.0))
}

/// Signed infinity matching the sign of the overflowing raw result, for trig
/// evaluated within EPSILON of a pole.
fn signed_infinity(raw: Real) -> Value {
    if raw.is_sign_negative() {
        Value::Real(f64::NEG_INFINITY)
    } else {
        Value::Real(f64::INFINITY)
    }
}

fn operate_real(left: Real, op: &Operator, right: Real, scratch: &mut Scratch) -> Value {
    let Some(code) = op.code() else {
        return Value::Invalid;
    };

    match code {
        // relations
        OpCode::Less => Value::Boolean(left < right),
        OpCode::LessEqual => Value::Boolean(left <= right),
        OpCode::Equal => Value::Boolean(left == right),
        OpCode::Approach => Value::Boolean(approach_to(left, right)),
        OpCode::NotEqual => Value::Boolean(left != right),
        OpCode::GreaterEqual => Value::Boolean(left >= right),
        OpCode::Greater => Value::Boolean(left > right),

        // arithmetic
        OpCode::Plus => Value::Real(left + right),
        OpCode::Minus => Value::Real(left - right),
        OpCode::Multiply => Value::Real(left * right),
        OpCode::Divide => {
            if right == 0.0 {
                if left == 0.0 {
                    Value::Invalid
                } else {
                    Value::Real(left / right)
                }
            } else {
                Value::Real(left / right)
            }
        }
        OpCode::Modulus => {
            if right == 0.0 {
                Value::Invalid
            } else {
                Value::Real(left % right)
            }
        }
        OpCode::Negative => Value::Real(-right),
        OpCode::Ceil => Value::Real(right.ceil()),
        OpCode::Floor => Value::Real(right.floor()),
        OpCode::Trunc => Value::Real(right.trunc()),
        OpCode::Round => Value::Real(right.round()),
        OpCode::Rint => Value::Real(right.round_ties_even()),
        OpCode::Abs => Value::Real(right.abs()),
        OpCode::Phase => Value::Real(if right < 0.0 { PI } else { 0.0 }),
        OpCode::RealPart => Value::Real(right),
        OpCode::ImagPart => Value::Real(0.0),
        OpCode::Conjugate => Value::Real(right),
        OpCode::Factorial => {
            if left < 0.0 {
                Value::Invalid
            } else {
                Value::Real(libm::tgamma(left + 1.0))
            }
        }
        OpCode::Gamma => {
            if right <= 0.0 && is_zahlen(right) {
                Value::Invalid
            } else {
                Value::Real(libm::tgamma(right))
            }
        }
        OpCode::Permute | OpCode::Combine => {
            if left < 0.0 || right < 0.0 {
                return Value::Invalid;
            }
            let (n, k) = if left < right {
                (right, left)
            } else {
                (left, right)
            };
            let permute = libm::tgamma(n + 1.0) / libm::tgamma(n - k + 1.0);
            if code == OpCode::Permute {
                Value::Real(permute)
            } else {
                Value::Real(permute / libm::tgamma(k + 1.0))
            }
        }
        OpCode::HypotPair => Value::Real(left.hypot(right)),
        OpCode::Pow => {
            if left < 0.0 && !is_zahlen(right) {
                complex_fallback(left, op, right)
            } else {
                Value::Real(left.powf(right))
            }
        }
        OpCode::Exp => Value::Real(right.exp()),
        OpCode::Log => {
            if left == 1.0 {
                Value::Invalid
            } else if left <= 0.0 || right <= 0.0 {
                complex_fallback(left, op, right)
            } else if left == 2.0 {
                Value::Real(right.log2())
            } else if left == 10.0 {
                Value::Real(right.log10())
            } else if left == E {
                Value::Real(right.ln())
            } else {
                Value::Real(right.ln() / left.ln())
            }
        }
        OpCode::Lg => {
            if right <= 0.0 {
                complex_fallback(left, op, right)
            } else {
                Value::Real(right.log10())
            }
        }
        OpCode::Ln => {
            if right <= 0.0 {
                complex_fallback(left, op, right)
            } else {
                Value::Real(right.ln())
            }
        }
        OpCode::Sqrt => {
            if right < 0.0 {
                complex_fallback(left, op, right)
            } else {
                Value::Real(right.sqrt())
            }
        }
        OpCode::Root => {
            if left == 0.0 {
                Value::Invalid
            } else if right < 0.0 {
                complex_fallback(left, op, right)
            } else {
                Value::Real(right.powf(1.0 / left))
            }
        }
        OpCode::Polar => Value::Complex(Complex64::new(left * right.cos(), left * right.sin())),
        OpCode::Degree => Value::Real(left * PI / 180.0),
        OpCode::ToDeg => Value::Real(right * 180.0 / PI),
        OpCode::ToRad => Value::Real(right * PI / 180.0),
        OpCode::Sin => Value::Real(right.sin()),
        OpCode::ArcSin => {
            if !(-1.0..=1.0).contains(&right) {
                complex_fallback(left, op, right)
            } else {
                Value::Real(right.asin())
            }
        }
        OpCode::Cos => Value::Real(right.cos()),
        OpCode::ArcCos => {
            if !(-1.0..=1.0).contains(&right) {
                complex_fallback(left, op, right)
            } else {
                Value::Real(right.acos())
            }
        }
        OpCode::Tan => {
            if is_zahlen(right / PI - 0.5) {
                signed_infinity(right.tan())
            } else {
                Value::Real(right.tan())
            }
        }
        OpCode::ArcTan => Value::Real(right.atan()),
        OpCode::Cot => {
            if is_zahlen(right / PI) {
                signed_infinity(right.cos() / right.sin())
            } else {
                Value::Real(right.cos() / right.sin())
            }
        }
        OpCode::ArcCot => Value::Real(PI / 2.0 - right.atan()),
        OpCode::Sec => {
            if is_zahlen(right / PI - 0.5) {
                signed_infinity(1.0 / right.cos())
            } else {
                Value::Real(1.0 / right.cos())
            }
        }
        OpCode::ArcSec => {
            if right > -1.0 && right < 1.0 {
                complex_fallback(left, op, right)
            } else {
                Value::Real((1.0 / right).acos())
            }
        }
        OpCode::Csc => {
            if is_zahlen(right / PI) {
                signed_infinity(1.0 / right.sin())
            } else {
                Value::Real(1.0 / right.sin())
            }
        }
        OpCode::ArcCsc => {
            if right > -1.0 && right < 1.0 {
                complex_fallback(left, op, right)
            } else {
                Value::Real((1.0 / right).asin())
            }
        }
        OpCode::Prime => {
            let n = right.trunc();
            if n < 2.0 {
                Value::Real(0.0)
            } else {
                Value::Real(if scratch.sieve.is_prime(n as u64) {
                    1.0
                } else {
                    0.0
                })
            }
        }
        OpCode::Composite => {
            let n = right.trunc();
            if n < 4.0 {
                Value::Real(0.0)
            } else {
                Value::Real(if scratch.sieve.is_composite(n as u64) {
                    1.0
                } else {
                    0.0
                })
            }
        }
        OpCode::NthPrime => {
            if right < 0.0 || !right.is_finite() {
                Value::Invalid
            } else {
                Value::Real(scratch.sieve.nth_prime(right.trunc() as usize) as Real)
            }
        }
        OpCode::NthComposite => {
            if right < 0.0 || !right.is_finite() {
                Value::Invalid
            } else {
                Value::Real(scratch.sieve.nth_composite(right.trunc() as usize) as Real)
            }
        }
        OpCode::Rand => {
            if right > 0.0 {
                Value::Real(scratch.random() * right)
            } else {
                Value::Invalid
            }
        }

        _ => Value::Invalid,
    }
}

fn operate_complex(left: Complex64, op: &Operator, right: Complex64) -> Value {
    let Some(code) = op.code() else {
        return Value::Invalid;
    };
    let one = Complex64::new(1.0, 0.0);

    match code {
        // Only equality-like relations are defined on complex values.
        OpCode::Equal => Value::Boolean(left == right),
        OpCode::NotEqual => Value::Boolean(left != right),
        OpCode::Approach => Value::Boolean((left - right).norm() < EPSILON),

        OpCode::Plus => Value::Complex(left + right),
        OpCode::Minus => Value::Complex(left - right),
        OpCode::Multiply => Value::Complex(left * right),
        OpCode::Divide => Value::Complex(left / right),
        OpCode::Negative => Value::Complex(-right),
        OpCode::Abs => Value::Real(right.norm()),
        OpCode::Phase => Value::Real(right.arg()),
        OpCode::RealPart => Value::Real(right.re),
        OpCode::ImagPart => Value::Real(right.im),
        OpCode::Conjugate => Value::Complex(right.conj()),
        OpCode::Pow => Value::Complex(left.powc(right)),
        OpCode::Exp => Value::Complex(right.exp()),
        OpCode::Log => {
            if left == one {
                Value::Invalid
            } else {
                Value::Complex(right.ln() / left.ln())
            }
        }
        OpCode::Lg => Value::Complex(right.log(10.0)),
        OpCode::Ln => Value::Complex(right.ln()),
        OpCode::Sqrt => Value::Complex(right.sqrt()),
        OpCode::Root => {
            if left == Complex64::new(0.0, 0.0) {
                Value::Invalid
            } else {
                Value::Complex(right.powc(one / left))
            }
        }
        OpCode::Sin => Value::Complex(right.sin()),
        OpCode::Cos => Value::Complex(right.cos()),
        OpCode::Tan => Value::Complex(right.tan()),
        OpCode::Cot => Value::Complex(right.cos() / right.sin()),
        OpCode::Sec => Value::Complex(one / right.cos()),
        OpCode::Csc => Value::Complex(one / right.sin()),
        // Inverses via acot(z) = atan(1/z), asec(z) = acos(1/z), ...
        OpCode::ArcSin => Value::Complex(right.asin()),
        OpCode::ArcCos => Value::Complex(right.acos()),
        OpCode::ArcTan => Value::Complex(right.atan()),
        OpCode::ArcCot => Value::Complex((one / right).atan()),
        OpCode::ArcSec => Value::Complex((one / right).acos()),
        OpCode::ArcCsc => Value::Complex((one / right).asin()),

        _ => Value::Invalid,
    }
}

fn operate_string(left: &str, op: &Operator, right: &str) -> Value {
    match op.code() {
        Some(OpCode::Less) => Value::Boolean(left < right),
        Some(OpCode::LessEqual) => Value::Boolean(left <= right),
        Some(OpCode::Equal) => Value::Boolean(left == right),
        Some(OpCode::NotEqual) => Value::Boolean(left != right),
        Some(OpCode::GreaterEqual) => Value::Boolean(left >= right),
        Some(OpCode::Greater) => Value::Boolean(left > right),
        // The right operand is the pattern, the left the subject.
        Some(OpCode::Approach) => match Regex::new(right) {
            Ok(pattern) => Value::Boolean(pattern.is_match(left)),
            Err(_) => Value::Invalid,
        },
        Some(OpCode::Plus) => Value::Str(format!("{}{}", left, right)),
        _ => Value::Invalid,
    }
}

fn operate_sequence(op: &Operator, items: &[Value]) -> Value {
    let Some(code) = op.code() else {
        return Value::Invalid;
    };

    if items.is_empty() {
        return if code == OpCode::Count {
            Value::Real(0.0)
        } else {
            Value::Invalid
        };
    }

    let n = items.len() as Real;
    let reals = || items.iter().map(Value::to_real).collect::<Vec<Real>>();

    match code {
        OpCode::Count => Value::Real(n),
        OpCode::Min => Value::Real(reals().into_iter().fold(f64::INFINITY, Real::min)),
        OpCode::Max => Value::Real(reals().into_iter().fold(f64::NEG_INFINITY, Real::max)),
        OpCode::Range => {
            let values = reals();
            let min = values.iter().cloned().fold(f64::INFINITY, Real::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, Real::max);
            Value::Real(max - min)
        }
        OpCode::Unique => {
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            for item in items {
                if seen.insert(item.clone()) {
                    out.push(item.clone());
                }
            }
            Value::Sequence(out)
        }
        OpCode::Total => Value::Real(reals().iter().sum()),
        OpCode::Mean => Value::Real(reals().iter().sum::<Real>() / n),
        OpCode::GeometricMean => Value::Real(reals().iter().product::<Real>().powf(1.0 / n)),
        OpCode::QuadraticMean => {
            Value::Real((reals().iter().map(|x| x * x).sum::<Real>() / n).sqrt())
        }
        OpCode::HarmonicMean => Value::Real(n / reals().iter().map(|x| 1.0 / x).sum::<Real>()),
        OpCode::Variance => Value::Real(population_variance(&reals())),
        OpCode::Deviation => Value::Real(population_variance(&reals()).sqrt()),
        OpCode::Median => {
            let mut values = reals();
            values.sort_by(|a, b| a.total_cmp(b));
            let middle = values.len() / 2;
            if values.len() % 2 == 1 {
                Value::Real(values[middle])
            } else {
                Value::Real((values[middle - 1] + values[middle]) / 2.0)
            }
        }
        OpCode::Mode => {
            let mut values = reals();
            values.sort_by(|a, b| a.total_cmp(b));
            let mut best = values[0];
            let mut best_count = 0usize;
            let mut index = 0;
            while index < values.len() {
                let mut end = index + 1;
                while end < values.len() && values[end] == values[index] {
                    end += 1;
                }
                // Strict > keeps the first maximum in ascending order.
                if end - index > best_count {
                    best_count = end - index;
                    best = values[index];
                }
                index = end;
            }
            Value::Real(best)
        }
        OpCode::Hypot => Value::Real(reals().iter().map(|x| x * x).sum::<Real>().sqrt()),
        OpCode::Norm => {
            let values = reals();
            let min = values.iter().cloned().fold(f64::INFINITY, Real::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, Real::max);
            let range = max - min;
            Value::Sequence(
                values
                    .iter()
                    .map(|x| {
                        Value::Real(if range == 0.0 { 0.5 } else { (x - min) / range })
                    })
                    .collect(),
            )
        }
        OpCode::ZScoreNorm => {
            let values = reals();
            let mean = values.iter().sum::<Real>() / n;
            let dev = population_variance(&values).sqrt();
            Value::Sequence(
                values
                    .iter()
                    .map(|x| Value::Real(if dev == 0.0 { 0.0 } else { (x - mean) / dev }))
                    .collect(),
            )
        }
        OpCode::Gcd => {
            let mut acc: u128 = 0;
            for value in reals() {
                let Some(v) = to_whole(value) else {
                    return Value::Invalid;
                };
                acc = gcd(acc, v);
                if acc == 1 {
                    break;
                }
            }
            Value::Real(acc as Real)
        }
        OpCode::Lcm => {
            let mut acc: u128 = 1;
            for value in reals() {
                let Some(v) = to_whole(value) else {
                    return Value::Invalid;
                };
                if v == 0 {
                    return Value::Real(0.0);
                }
                let g = gcd(acc, v);
                match (acc / g).checked_mul(v) {
                    Some(next) => acc = next,
                    None => return Value::Invalid,
                }
            }
            Value::Real(acc as Real)
        }
        OpCode::Dft => Value::Sequence(dft(items, false)),
        OpCode::Idft => Value::Sequence(dft(items, true)),
        OpCode::Fft => Value::Sequence(fft(items, false)),
        OpCode::Ifft => Value::Sequence(fft(items, true)),
        OpCode::Zt => z_transform(items),
        _ => Value::Invalid,
    }
}

fn population_variance(values: &[Real]) -> Real {
    let n = values.len() as Real;
    let mean = values.iter().sum::<Real>() / n;
    values.iter().map(|x| (x - mean) * (x - mean)).sum::<Real>() / n
}

fn to_whole(value: Real) -> Option<u128> {
    let truncated = value.abs().trunc();
    if truncated.is_finite() {
        Some(truncated as u128)
    } else {
        None
    }
}

fn gcd(a: u128, b: u128) -> u128 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Direct O(n²) transform at the exact length; the inverse divides by n.
fn dft(items: &[Value], inverse: bool) -> Vec<Value> {
    let n = items.len();
    let samples: Vec<Complex64> = items.iter().map(Value::to_complex).collect();
    let a = if inverse { 2.0 } else { -2.0 } * PI / n as Real;

    let mut out = Vec::with_capacity(n);
    for k in 0..n {
        let mut sum = Complex64::new(0.0, 0.0);
        for (j, sample) in samples.iter().enumerate() {
            let angle = a * (j * k) as Real;
            sum += sample * Complex64::new(angle.cos(), angle.sin());
        }
        if inverse {
            sum /= n as Real;
        }
        out.push(Value::Complex(sum));
    }
    out
}

/// Radix-2 Cooley-Tukey over a zero-padded copy whose length is the next
/// power of two; the inverse divides by that length.
fn fft(items: &[Value], inverse: bool) -> Vec<Value> {
    let padded = items.len().next_power_of_two();
    let mut buf: Vec<Complex64> = items.iter().map(Value::to_complex).collect();
    buf.resize(padded, Complex64::new(0.0, 0.0));
    fft_radix2(&mut buf, inverse);
    buf.into_iter().map(Value::Complex).collect()
}

fn fft_radix2(buf: &mut [Complex64], inverse: bool) {
    let n = buf.len();
    if n < 2 {
        return;
    }

    // Bit-reversal permutation.
    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            buf.swap(i, j);
        }
    }

    let sign = if inverse { 1.0 } else { -1.0 };
    let mut len = 2;
    while len <= n {
        let angle = sign * 2.0 * PI / len as Real;
        let wlen = Complex64::new(angle.cos(), angle.sin());
        for start in (0..n).step_by(len) {
            let mut w = Complex64::new(1.0, 0.0);
            for k in 0..len / 2 {
                let u = buf[start + k];
                let v = buf[start + k + len / 2] * w;
                buf[start + k] = u + v;
                buf[start + k + len / 2] = u - v;
                w *= wlen;
            }
        }
        len <<= 1;
    }

    if inverse {
        for x in buf.iter_mut() {
            *x /= n as Real;
        }
    }
}

/// `zt(s, z...)`: for each z, Σₖ sₖ·z^(−k). The first wrap element is the
/// sample sequence; the z-values follow directly or as one trailing sequence.
fn z_transform(items: &[Value]) -> Value {
    let Value::Sequence(samples) = &items[0] else {
        return Value::Invalid;
    };
    if items.len() < 2 {
        return Value::Invalid;
    }

    let zs: Vec<Complex64> = match &items[1..] {
        [Value::Sequence(inner)] => inner.iter().map(Value::to_complex).collect(),
        rest => rest.iter().map(Value::to_complex).collect(),
    };

    let mut out = Vec::with_capacity(zs.len());
    for z in zs {
        let mut sum = Complex64::new(0.0, 0.0);
        for (k, sample) in samples.iter().enumerate() {
            sum += sample.to_complex() * z.powi(-(k as i32));
        }
        out.push(Value::Complex(sum));
    }

    if out.len() == 1 {
        out.pop().unwrap_or(Value::Invalid)
    } else {
        Value::Sequence(out)
    }
}
