//! Tree-walking evaluator: node dispatch, user-function binding, and the
//! higher-order invocation/large-scale semantics.

use std::collections::HashMap;
use std::rc::Rc;

use num_complex::Complex64;

use crate::ast::{Ast, DefineMap, NodeId, NodeKind, Object};
use crate::constants::{
    INTEGRATE2_STEPS, INTEGRATE3_STEPS, INTEGRATE_STEPS, MAX_GENERATE_SIZE,
};
use crate::context::EvalContext;
use crate::operate::{operate, Scratch};
use crate::operator::{Category, OpCode, Operator};
use crate::value::Value;
use crate::Real;

/// Bound on nested user-function activations. Exceeding it yields Invalid
/// rather than overflowing the stack.
const MAX_CALL_DEPTH: usize = 256;

/// Evaluates the tree to a value. A top-level complex result with zero
/// imaginary part collapses to a real.
pub fn evaluate(ast: &Ast, ctx: &EvalContext) -> Value {
    let Some(root) = ast.root() else {
        return Value::Invalid;
    };

    let mut state = EvalState::new(ctx);
    match eval_node(ast, root, &mut state) {
        Value::Complex(c) if c.im == 0.0 => Value::Real(c.re),
        other => other,
    }
}

/// Per-evaluation assist: resolver access, formal-binding frames, the lazily
/// built define-map cache, and the sieve/RNG scratch.
struct EvalState<'c> {
    ctx: &'c EvalContext,
    /// Binding frames for user-function formals. Inside a call the innermost
    /// frame replaces the variable resolver entirely; parameters and
    /// definitions stay visible.
    frames: Vec<HashMap<char, Value>>,
    defines: HashMap<NodeId, Option<Rc<DefineMap>>>,
    scratch: Scratch,
    depth: usize,
}

impl<'c> EvalState<'c> {
    fn new(ctx: &'c EvalContext) -> Self {
        EvalState {
            ctx,
            frames: Vec::new(),
            defines: HashMap::new(),
            scratch: Scratch::new(ctx.random_seed()),
            depth: 0,
        }
    }

    fn resolve_variable(&self, letter: char) -> Value {
        match self.frames.last() {
            Some(frame) => frame.get(&letter).cloned().unwrap_or(Value::Invalid),
            None => self.ctx.resolve_variable(letter),
        }
    }

    /// Definitions in scope at `id`, memoized per node: the large-scale
    /// operators re-enter the same call nodes millions of times.
    fn define_map_for(&mut self, ast: &Ast, id: NodeId) -> Option<Rc<DefineMap>> {
        if let Some(cached) = self.defines.get(&id) {
            return cached.clone();
        }
        let map = ast.define_map(id).map(Rc::new);
        self.defines.insert(id, map.clone());
        map
    }
}

fn eval_node(ast: &Ast, id: NodeId, state: &mut EvalState) -> Value {
    match &ast.node(id).kind {
        NodeKind::Object(object) => match object {
            Object::Boolean(b) => Value::Boolean(*b),
            Object::Real(r) => Value::Real(*r),
            Object::Imaginary(c) => Value::Complex(Complex64::new(0.0, *c)),
            Object::Str(s) => Value::Str(s.clone()),
            Object::Param(name) => state.ctx.resolve_param(name),
            Object::Variable(letter) => state.resolve_variable(*letter),
            Object::Array(items) => Value::Sequence(
                items
                    .clone()
                    .into_iter()
                    .map(|item| eval_node(ast, item, state))
                    .collect(),
            ),
        },
        NodeKind::Expr { op, left, right } => match op.category {
            Category::Function => eval_function_call(ast, id, state),
            Category::Invocation | Category::LargeScale => eval_higher_order(ast, id, state),
            _ => {
                let lv = left
                    .map(|l| eval_node(ast, l, state))
                    .unwrap_or(Value::Invalid);
                let rv = right
                    .map(|r| eval_node(ast, r, state))
                    .unwrap_or(Value::Invalid);
                operate(&lv, op, &rv, &mut state.scratch)
            }
        },
    }
}

/// Binds `formals` positionally to `actuals` (missing actuals bind Invalid)
/// and evaluates `body` under the fresh frame.
fn eval_with_frame(
    ast: &Ast,
    body: NodeId,
    formals: &str,
    actuals: &[Value],
    state: &mut EvalState,
) -> Value {
    if state.depth >= MAX_CALL_DEPTH {
        log::debug!("call depth limit reached; yielding invalid");
        return Value::Invalid;
    }

    let mut frame = HashMap::new();
    for (index, letter) in formals.chars().enumerate() {
        frame.insert(
            letter,
            actuals.get(index).cloned().unwrap_or(Value::Invalid),
        );
    }

    state.frames.push(frame);
    state.depth += 1;
    let value = eval_node(ast, body, state);
    state.depth -= 1;
    state.frames.pop();
    value
}

fn eval_function_call(ast: &Ast, id: NodeId, state: &mut EvalState) -> Value {
    let Some(name) = ast.op(id).and_then(Operator::function_name) else {
        return Value::Invalid;
    };

    let Some(map) = state.define_map_for(ast, id) else {
        log::debug!("no definition in scope for function '{}'", name);
        return Value::Invalid;
    };
    let Some((formals, rule)) = map.get(name).cloned() else {
        return Value::Invalid;
    };

    let Some(items) = ast.right(id).and_then(|wrap| ast.array_items(wrap)) else {
        return Value::Invalid;
    };
    let actuals: Vec<Value> = items
        .to_vec()
        .into_iter()
        .map(|item| eval_node(ast, item, state))
        .collect();

    eval_with_frame(ast, rule, &formals, &actuals, state)
}

/// A wrap argument that can be invoked against binding candidates: either a
/// user-function call whose arguments carry variable letters (the letters are
/// the formals, so `f(x,2)` partially applies), or a bare variable that
/// resolves to a definition.
enum Callable {
    Call { node: NodeId, letters: String },
    Named { formals: String, rule: NodeId },
}

impl Callable {
    fn formal_count(&self) -> usize {
        match self {
            Callable::Call { letters, .. } => letters.chars().count(),
            Callable::Named { formals, .. } => formals.chars().count(),
        }
    }
}

fn classify(ast: &Ast, id: NodeId, state: &mut EvalState) -> Option<Callable> {
    if ast.is_function(id) {
        let letters = ast.function_variables(id);
        if !letters.is_empty() {
            return Some(Callable::Call { node: id, letters });
        }
        return None;
    }

    if let NodeKind::Object(Object::Variable(letter)) = &ast.node(id).kind {
        let name = letter.to_string();
        if let Some(map) = state.define_map_for(ast, id) {
            if let Some((formals, rule)) = map.get(&name) {
                return Some(Callable::Named {
                    formals: formals.clone(),
                    rule: *rule,
                });
            }
        }
    }

    None
}

fn invoke(ast: &Ast, callable: &Callable, candidates: &[Value], state: &mut EvalState) -> Value {
    match callable {
        Callable::Call { node, letters } => eval_with_frame(ast, *node, letters, candidates, state),
        Callable::Named { formals, rule } => {
            eval_with_frame(ast, *rule, formals, candidates, state)
        }
    }
}

/// Evaluated first wrap argument, which must be a sequence.
fn sequence_arg(ast: &Ast, id: NodeId, state: &mut EvalState) -> Option<Vec<Value>> {
    match eval_node(ast, id, state) {
        Value::Sequence(items) => Some(items),
        _ => None,
    }
}

fn eval_higher_order(ast: &Ast, id: NodeId, state: &mut EvalState) -> Value {
    let Some(code) = ast.op(id).and_then(Operator::code) else {
        return Value::Invalid;
    };
    let Some(wrap) = ast.right(id).and_then(|wrap| ast.array_items(wrap)) else {
        return Value::Invalid;
    };
    let wrap = wrap.to_vec();

    match code {
        OpCode::Generate => eval_generate(ast, &wrap, state),
        OpCode::Has => eval_has(ast, &wrap, state),
        OpCode::Pick => eval_pick(ast, &wrap, state),
        OpCode::Select => eval_select(ast, &wrap, state),
        OpCode::Sort => eval_sort(ast, &wrap, state),
        OpCode::Transform => eval_transform(ast, &wrap, state),
        OpCode::Accumulate => eval_accumulate(ast, &wrap, state),
        OpCode::Summate => eval_fold_range(ast, &wrap, state, false),
        OpCode::Produce => eval_fold_range(ast, &wrap, state, true),
        OpCode::Integrate => eval_integrate(ast, &wrap, state),
        OpCode::DoubleIntegrate => eval_integrate2(ast, &wrap, state),
        OpCode::TripleIntegrate => eval_integrate3(ast, &wrap, state),
        _ => Value::Invalid,
    }
}

/// `gen(seed, size_or_pred)`: a plain seed is evaluated once and repeated; an
/// invocable seed receives the accumulated sequence each step. A plain second
/// argument is the exact length; an invocable one is a predicate over
/// (accumulated, proposed) that stops generation on its first false, without
/// appending the proposed item. Output length is capped.
fn eval_generate(ast: &Ast, wrap: &[NodeId], state: &mut EvalState) -> Value {
    if wrap.len() < 2 {
        return Value::Invalid;
    }

    let seed = classify(ast, wrap[0], state);
    let plain_seed = match &seed {
        None => eval_node(ast, wrap[0], state),
        Some(_) => Value::Invalid,
    };

    fn propose(
        ast: &Ast,
        seed: &Option<Callable>,
        plain: &Value,
        out: &[Value],
        state: &mut EvalState,
    ) -> Value {
        match seed {
            None => plain.clone(),
            Some(callable) => invoke(ast, callable, &[Value::Sequence(out.to_vec())], state),
        }
    }

    let mut out: Vec<Value> = Vec::new();
    match classify(ast, wrap[1], state) {
        None => {
            let requested = eval_node(ast, wrap[1], state).to_real();
            if !requested.is_finite() {
                return Value::Invalid;
            }
            let count = (requested.trunc().max(0.0) as usize).min(MAX_GENERATE_SIZE);
            for _ in 0..count {
                let item = propose(ast, &seed, &plain_seed, &out, state);
                out.push(item);
            }
        }
        Some(predicate) => {
            while out.len() < MAX_GENERATE_SIZE {
                let item = propose(ast, &seed, &plain_seed, &out, state);
                let keep = invoke(
                    ast,
                    &predicate,
                    &[Value::Sequence(out.clone()), item.clone()],
                    state,
                )
                .to_boolean();
                if !keep {
                    break;
                }
                out.push(item);
            }
        }
    }

    Value::Sequence(out)
}

/// `has(seq, x_or_pred)`: linear scan by equality, or by a predicate invoked
/// with (item, index, sequence).
fn eval_has(ast: &Ast, wrap: &[NodeId], state: &mut EvalState) -> Value {
    if wrap.len() < 2 {
        return Value::Invalid;
    }
    let Some(items) = sequence_arg(ast, wrap[0], state) else {
        return Value::Invalid;
    };

    match classify(ast, wrap[1], state) {
        None => {
            let needle = eval_node(ast, wrap[1], state);
            Value::Boolean(items.contains(&needle))
        }
        Some(predicate) => {
            for (index, item) in items.iter().enumerate() {
                let hit = invoke(
                    ast,
                    &predicate,
                    &[
                        item.clone(),
                        Value::Real(index as Real),
                        Value::Sequence(items.clone()),
                    ],
                    state,
                )
                .to_boolean();
                if hit {
                    return Value::Boolean(true);
                }
            }
            Value::Boolean(false)
        }
    }
}

/// `pick(seq, index_or_pred, default?)`: negative indices count from the end;
/// the predicate form returns the first match. Falls back to `default`
/// (Invalid when absent).
fn eval_pick(ast: &Ast, wrap: &[NodeId], state: &mut EvalState) -> Value {
    if wrap.len() < 2 {
        return Value::Invalid;
    }
    let Some(items) = sequence_arg(ast, wrap[0], state) else {
        return Value::Invalid;
    };

    match classify(ast, wrap[1], state) {
        None => {
            let index = eval_node(ast, wrap[1], state).to_real().trunc() as i64;
            let len = items.len() as i64;
            let effective = if index < 0 { len + index } else { index };
            if (0..len).contains(&effective) {
                items[effective as usize].clone()
            } else {
                pick_default(ast, wrap, state)
            }
        }
        Some(predicate) => {
            for (index, item) in items.iter().enumerate() {
                let hit = invoke(
                    ast,
                    &predicate,
                    &[
                        item.clone(),
                        Value::Real(index as Real),
                        Value::Sequence(items.clone()),
                    ],
                    state,
                )
                .to_boolean();
                if hit {
                    return item.clone();
                }
            }
            pick_default(ast, wrap, state)
        }
    }
}

fn pick_default(ast: &Ast, wrap: &[NodeId], state: &mut EvalState) -> Value {
    match wrap.get(2) {
        Some(node) => eval_node(ast, *node, state),
        None => Value::Invalid,
    }
}

/// `sel(seq, x_or_pred)`: filter by strict equality or by predicate.
fn eval_select(ast: &Ast, wrap: &[NodeId], state: &mut EvalState) -> Value {
    if wrap.len() < 2 {
        return Value::Invalid;
    }
    let Some(items) = sequence_arg(ast, wrap[0], state) else {
        return Value::Invalid;
    };

    let mut out = Vec::new();
    match classify(ast, wrap[1], state) {
        None => {
            let needle = eval_node(ast, wrap[1], state);
            out.extend(items.into_iter().filter(|item| *item == needle));
        }
        Some(predicate) => {
            for (index, item) in items.iter().enumerate() {
                let keep = invoke(
                    ast,
                    &predicate,
                    &[
                        item.clone(),
                        Value::Real(index as Real),
                        Value::Sequence(items.clone()),
                    ],
                    state,
                )
                .to_boolean();
                if keep {
                    out.push(item.clone());
                }
            }
        }
    }
    Value::Sequence(out)
}

/// `sort(seq, pred_or_ascending?)`: a two-formal function is a less-than
/// comparator; a plain truthy value sorts ascending via `<`, falsy descending
/// via `>`. The sort is stable.
fn eval_sort(ast: &Ast, wrap: &[NodeId], state: &mut EvalState) -> Value {
    if wrap.is_empty() {
        return Value::Invalid;
    }
    let Some(mut items) = sequence_arg(ast, wrap[0], state) else {
        return Value::Invalid;
    };

    let order = match wrap.get(1) {
        None => SortOrder::Ascending,
        Some(node) => match classify(ast, *node, state) {
            Some(callable) => SortOrder::Comparator(callable),
            None => {
                if eval_node(ast, *node, state).to_boolean() {
                    SortOrder::Ascending
                } else {
                    SortOrder::Descending
                }
            }
        },
    };

    // Insertion sort keeps the ordering stable while the comparator runs
    // against the mutable evaluator state.
    for index in 1..items.len() {
        let mut position = index;
        while position > 0 {
            let item = items[position].clone();
            let previous = items[position - 1].clone();
            if sort_less(ast, &order, &item, &previous, state) {
                items.swap(position - 1, position);
                position -= 1;
            } else {
                break;
            }
        }
    }

    Value::Sequence(items)
}

enum SortOrder {
    Ascending,
    Descending,
    Comparator(Callable),
}

fn sort_less(ast: &Ast, order: &SortOrder, a: &Value, b: &Value, state: &mut EvalState) -> bool {
    match order {
        SortOrder::Ascending => operate(
            a,
            &Operator::builtin(OpCode::Less),
            b,
            &mut state.scratch,
        )
        .to_boolean(),
        SortOrder::Descending => operate(
            a,
            &Operator::builtin(OpCode::Greater),
            b,
            &mut state.scratch,
        )
        .to_boolean(),
        SortOrder::Comparator(callable) => {
            invoke(ast, callable, &[a.clone(), b.clone()], state).to_boolean()
        }
    }
}

/// `trans(seq, value_or_pred)`: map. The value form repeats the evaluated
/// value; the function form receives (item, index, sequence).
fn eval_transform(ast: &Ast, wrap: &[NodeId], state: &mut EvalState) -> Value {
    if wrap.len() < 2 {
        return Value::Invalid;
    }
    let Some(items) = sequence_arg(ast, wrap[0], state) else {
        return Value::Invalid;
    };

    match classify(ast, wrap[1], state) {
        None => {
            let value = eval_node(ast, wrap[1], state);
            Value::Sequence(items.iter().map(|_| value.clone()).collect())
        }
        Some(mapper) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                out.push(invoke(
                    ast,
                    &mapper,
                    &[
                        item.clone(),
                        Value::Real(index as Real),
                        Value::Sequence(items.clone()),
                    ],
                    state,
                ));
            }
            Value::Sequence(out)
        }
    }
}

/// `acc(seq, f, initial)`: left fold; `f` receives (accumulator, item,
/// index, sequence) through its first formals.
fn eval_accumulate(ast: &Ast, wrap: &[NodeId], state: &mut EvalState) -> Value {
    if wrap.len() < 2 {
        return Value::Invalid;
    }
    let Some(items) = sequence_arg(ast, wrap[0], state) else {
        return Value::Invalid;
    };
    let Some(folder) = classify(ast, wrap[1], state) else {
        return Value::Invalid;
    };

    let mut accumulator = match wrap.get(2) {
        Some(node) => eval_node(ast, *node, state),
        None => Value::Invalid,
    };

    for (index, item) in items.iter().enumerate() {
        accumulator = invoke(
            ast,
            &folder,
            &[
                accumulator.clone(),
                item.clone(),
                Value::Real(index as Real),
                Value::Sequence(items.clone()),
            ],
            state,
        );
    }
    accumulator
}

/// `Σ`/`Π` over the inclusive integer range [trunc(lo), trunc(hi)] when the
/// wrap is (lo, hi, f); any other wrap shape folds the evaluated wrap as a
/// sequence, which is what makes `sum(1,2,3,4)` work.
fn eval_fold_range(ast: &Ast, wrap: &[NodeId], state: &mut EvalState, multiply: bool) -> Value {
    if wrap.len() == 3 {
        if let Some(callable) = classify(ast, wrap[2], state) {
            let mut lo = eval_node(ast, wrap[0], state).to_real().trunc();
            let mut hi = eval_node(ast, wrap[1], state).to_real().trunc();
            if !lo.is_finite() || !hi.is_finite() {
                return Value::Invalid;
            }
            if hi < lo {
                std::mem::swap(&mut lo, &mut hi);
            }

            let mut acc = if multiply { 1.0 } else { 0.0 };
            let mut k = lo;
            while k <= hi {
                let term = invoke(ast, &callable, &[Value::Real(k)], state).to_real();
                acc = if multiply { acc * term } else { acc + term };
                k += 1.0;
            }
            return Value::Real(acc);
        }
    }

    let mut values: Vec<Value> = wrap
        .iter()
        .map(|node| eval_node(ast, *node, state))
        .collect();
    if matches!(values.as_slice(), [Value::Sequence(_)]) {
        match values.pop() {
            Some(Value::Sequence(inner)) => values = inner,
            _ => return Value::Invalid,
        }
    }

    let mut acc = if multiply { 1.0 } else { 0.0 };
    for value in values {
        let term = value.to_real();
        acc = if multiply { acc * term } else { acc + term };
    }
    Value::Real(acc)
}

/// `∫(lo, hi, f)`: composite trapezoid rule with a fixed subdivision count.
fn eval_integrate(ast: &Ast, wrap: &[NodeId], state: &mut EvalState) -> Value {
    if wrap.len() < 3 {
        return Value::Invalid;
    }
    let Some(callable) = classify(ast, wrap[2], state) else {
        return Value::Invalid;
    };

    let mut lo = eval_node(ast, wrap[0], state).to_real();
    let mut hi = eval_node(ast, wrap[1], state).to_real();
    if !lo.is_finite() || !hi.is_finite() {
        return Value::Invalid;
    }
    if hi < lo {
        std::mem::swap(&mut lo, &mut hi);
    }

    let steps = INTEGRATE_STEPS;
    let dx = (hi - lo) / steps as Real;
    let mut sum = 0.5
        * (invoke(ast, &callable, &[Value::Real(lo)], state).to_real()
            + invoke(ast, &callable, &[Value::Real(hi)], state).to_real());
    for k in 1..steps {
        let x = lo + k as Real * dx;
        sum += invoke(ast, &callable, &[Value::Real(x)], state).to_real();
    }
    Value::Real(sum * dx)
}

fn axis(ast: &Ast, lo: NodeId, hi: NodeId, state: &mut EvalState) -> Option<(Real, Real)> {
    let mut lo = eval_node(ast, lo, state).to_real();
    let mut hi = eval_node(ast, hi, state).to_real();
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    if hi < lo {
        std::mem::swap(&mut lo, &mut hi);
    }
    Some((lo, hi))
}

fn endpoint_weight(index: usize, steps: usize) -> Real {
    if index == 0 || index == steps {
        0.5
    } else {
        1.0
    }
}

/// `∫∫(y0, y1, x0, x1, f)`: tensor-product trapezoid; f receives (x, y).
fn eval_integrate2(ast: &Ast, wrap: &[NodeId], state: &mut EvalState) -> Value {
    if wrap.len() < 5 {
        return Value::Invalid;
    }
    let Some(callable) = classify(ast, wrap[4], state) else {
        return Value::Invalid;
    };
    if callable.formal_count() < 2 {
        return Value::Invalid;
    }

    let Some((y0, y1)) = axis(ast, wrap[0], wrap[1], state) else {
        return Value::Invalid;
    };
    let Some((x0, x1)) = axis(ast, wrap[2], wrap[3], state) else {
        return Value::Invalid;
    };

    let steps = INTEGRATE2_STEPS;
    let dy = (y1 - y0) / steps as Real;
    let dx = (x1 - x0) / steps as Real;

    let mut sum = 0.0;
    for i in 0..=steps {
        let y = y0 + i as Real * dy;
        let wy = endpoint_weight(i, steps);
        for j in 0..=steps {
            let x = x0 + j as Real * dx;
            let wx = endpoint_weight(j, steps);
            let f = invoke(
                ast,
                &callable,
                &[Value::Real(x), Value::Real(y)],
                state,
            )
            .to_real();
            sum += wy * wx * f;
        }
    }
    Value::Real(sum * dx * dy)
}

/// `∫∫∫(z0, z1, y0, y1, x0, x1, f)`: f receives (x, y, z).
fn eval_integrate3(ast: &Ast, wrap: &[NodeId], state: &mut EvalState) -> Value {
    if wrap.len() < 7 {
        return Value::Invalid;
    }
    let Some(callable) = classify(ast, wrap[6], state) else {
        return Value::Invalid;
    };
    if callable.formal_count() < 3 {
        return Value::Invalid;
    }

    let Some((z0, z1)) = axis(ast, wrap[0], wrap[1], state) else {
        return Value::Invalid;
    };
    let Some((y0, y1)) = axis(ast, wrap[2], wrap[3], state) else {
        return Value::Invalid;
    };
    let Some((x0, x1)) = axis(ast, wrap[4], wrap[5], state) else {
        return Value::Invalid;
    };

    let steps = INTEGRATE3_STEPS;
    let dz = (z1 - z0) / steps as Real;
    let dy = (y1 - y0) / steps as Real;
    let dx = (x1 - x0) / steps as Real;

    let mut sum = 0.0;
    for i in 0..=steps {
        let z = z0 + i as Real * dz;
        let wz = endpoint_weight(i, steps);
        for j in 0..=steps {
            let y = y0 + j as Real * dy;
            let wy = endpoint_weight(j, steps);
            for k in 0..=steps {
                let x = x0 + k as Real * dx;
                let wx = endpoint_weight(k, steps);
                let f = invoke(
                    ast,
                    &callable,
                    &[Value::Real(x), Value::Real(y), Value::Real(z)],
                    state,
                )
                .to_real();
                sum += wz * wy * wx * f;
            }
        }
    }
    Value::Real(sum * dx * dy * dz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn run(text: &str) -> Value {
        let ast = parse(text).unwrap_or_else(|err| panic!("parse {:?} failed: {}", text, err));
        evaluate(&ast, &EvalContext::new())
    }

    #[test]
    fn test_user_function_binding() {
        assert_eq!(run("{f(x)=x*x}f(5)"), Value::Real(25.0));
        assert_eq!(run("{f(x,y)=x-y}f(10,3)"), Value::Real(7.0));
        // A missing actual binds Invalid, which propagates.
        assert_eq!(run("{f(x,y)=x-y}f(10)"), Value::Invalid);
    }

    #[test]
    fn test_definitions_shadow_outer_blocks() {
        assert_eq!(run("{f(x)=x+1}({f(x)=x*2}f(10)) + f(1)"), Value::Real(22.0));
    }

    #[test]
    fn test_formals_replace_variable_resolution() {
        let mut ctx = EvalContext::new();
        ctx.set_variable('y', Value::Real(100.0));
        let ast = parse("{f(x)=x+y}f(1)").unwrap();
        // y is not a formal of f, so it is Invalid inside the call even
        // though the context could resolve it.
        assert_eq!(evaluate(&ast, &ctx), Value::Invalid);

        let ast = parse("y + 1").unwrap();
        assert_eq!(evaluate(&ast, &ctx), Value::Real(101.0));
    }

    #[test]
    fn test_generate_with_counting_seed() {
        assert_eq!(
            run("{g(s)=cnt(s)}gen(g, 5)"),
            Value::Sequence(vec![
                Value::Real(0.0),
                Value::Real(1.0),
                Value::Real(2.0),
                Value::Real(3.0),
                Value::Real(4.0),
            ])
        );
    }

    #[test]
    fn test_generate_plain_seed_and_predicate() {
        assert_eq!(
            run("gen(7, 3)"),
            Value::Sequence(vec![
                Value::Real(7.0),
                Value::Real(7.0),
                Value::Real(7.0)
            ])
        );

        // Predicate halts on first false without appending.
        assert_eq!(
            run("{g(s)=cnt(s), p(s,x)=x<3}gen(g, p)"),
            Value::Sequence(vec![
                Value::Real(0.0),
                Value::Real(1.0),
                Value::Real(2.0)
            ])
        );
    }

    #[test]
    fn test_has_pick_select() {
        assert_eq!(run("has((1,2,3), 2)"), Value::Boolean(true));
        assert_eq!(run("has((1,2,3), 9)"), Value::Boolean(false));
        assert_eq!(run("{p(x)=x>2}has((1,2,3), p)"), Value::Boolean(true));

        assert_eq!(run("pick((10,20,30), 1)"), Value::Real(20.0));
        assert_eq!(run("pick((10,20,30), -1)"), Value::Real(30.0));
        assert_eq!(run("pick((10,20,30), 9)"), Value::Invalid);
        assert_eq!(run("pick((10,20,30), 9, 42)"), Value::Real(42.0));
        assert_eq!(run("{p(x)=x>15}pick((10,20,30), p)"), Value::Real(20.0));

        assert_eq!(
            run("{p(x)=x%2==0}sel((1,2,3,4,5,6), p)"),
            Value::Sequence(vec![
                Value::Real(2.0),
                Value::Real(4.0),
                Value::Real(6.0)
            ])
        );
        assert_eq!(
            run("sel((1,2,1,3), 1)"),
            Value::Sequence(vec![Value::Real(1.0), Value::Real(1.0)])
        );
        // Filtering an empty selection yields an empty sequence.
        assert_eq!(run("sel((1,2,3), 9)"), Value::Sequence(vec![]));
    }

    #[test]
    fn test_sort_orders() {
        assert_eq!(
            run("sort((3,1,2))"),
            Value::Sequence(vec![
                Value::Real(1.0),
                Value::Real(2.0),
                Value::Real(3.0)
            ])
        );
        assert_eq!(
            run("sort((3,1,2), false)"),
            Value::Sequence(vec![
                Value::Real(3.0),
                Value::Real(2.0),
                Value::Real(1.0)
            ])
        );
        assert_eq!(
            run("{c(a,b)=a>b}sort((3,1,2), c)"),
            Value::Sequence(vec![
                Value::Real(3.0),
                Value::Real(2.0),
                Value::Real(1.0)
            ])
        );
    }

    #[test]
    fn test_transform_and_accumulate() {
        assert_eq!(
            run("{d(x)=x*2}trans((1,2,3), d)"),
            Value::Sequence(vec![
                Value::Real(2.0),
                Value::Real(4.0),
                Value::Real(6.0)
            ])
        );
        assert_eq!(
            run("trans((1,2,3), 0)"),
            Value::Sequence(vec![
                Value::Real(0.0),
                Value::Real(0.0),
                Value::Real(0.0)
            ])
        );
        assert_eq!(run("{f(a,x)=a+x}acc((1,2,3,4), f, 0)"), Value::Real(10.0));
        assert_eq!(run("{f(a,x)=a*x}acc((1,2,3,4), f, 1)"), Value::Real(24.0));

        // Over an empty sequence the fold is its initial value and the map
        // is empty.
        assert_eq!(
            run("{f(a,x)=a+x}acc(sel((1,2),9), f, 42)"),
            Value::Real(42.0)
        );
        assert_eq!(
            run("{d(x)=x*2}trans(sel((1,2),9), d)"),
            Value::Sequence(vec![])
        );
    }

    #[test]
    fn test_summation_and_product() {
        assert_eq!(run("{f(x)=x}Σ(1,10,f)"), Value::Real(55.0));
        assert_eq!(run("{f(x)=x}Π(1,5,f)"), Value::Real(120.0));
        // Reversed endpoints swap.
        assert_eq!(run("{f(x)=x}Σ(10,1,f)"), Value::Real(55.0));
        // Without an invocable third argument the wrap folds as a sequence.
        assert_eq!(run("sum(1,2,3,4)"), Value::Real(10.0));
        assert_eq!(run("sum((1,2,3,4))"), Value::Real(10.0));
        assert_eq!(run("prod(2,3,4)"), Value::Real(24.0));
    }

    #[test]
    fn test_recursion_bottoms_out_as_invalid() {
        // Unconditional recursion must terminate with Invalid, not overflow.
        assert_eq!(run("{f(x)=f(x)}f(1)"), Value::Invalid);
    }

    #[test]
    fn test_complex_collapse_at_top_level() {
        // i * i = -1 + 0i collapses to a real.
        assert_eq!(run("i*i"), Value::Real(-1.0));
    }
}
