//! Public facade: [`Expression`] owns one parsed tree and exposes validity,
//! the renderers and the evaluator; [`interp`] is the one-shot convenience.

use core::fmt;

use crate::ast::Ast;
use crate::context::EvalContext;
use crate::parser;
use crate::render;
use crate::value::Value;

/// A parsed expression, or the record of where parsing gave up.
///
/// Construction never panics and never returns an error: an unparsable text
/// produces an invalid handler carrying the farthest character offset the
/// scanner reached.
///
/// # Examples
///
/// ```
/// use expr_engine::{EvalContext, Expression, Value};
///
/// let expr = Expression::new("(1+2)*3");
/// assert!(expr.is_valid());
/// assert_eq!(expr.text(), "(1+2)*3");
/// assert_eq!(expr.eval(&EvalContext::new()), Value::Real(9.0));
/// ```
pub struct Expression {
    source: String,
    ast: Option<Ast>,
    failure: Option<usize>,
}

impl Expression {
    pub fn new(text: &str) -> Self {
        match parser::parse(text) {
            Ok(ast) => Expression {
                source: text.to_string(),
                ast: Some(ast),
                failure: None,
            },
            Err(err) => {
                log::debug!("parse of {:?} failed: {}", text, err);
                Expression {
                    source: text.to_string(),
                    ast: None,
                    failure: Some(err.position()),
                }
            }
        }
    }

    /// The text the expression was constructed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.ast.is_some()
    }

    /// Character offset at which parsing or validation gave up.
    pub fn failure_offset(&self) -> Option<usize> {
        self.failure
    }

    /// Canonical text; empty for an invalid expression. Re-parsing the result
    /// reproduces the tree.
    pub fn text(&self) -> String {
        self.ast.as_ref().map(render::render_text).unwrap_or_default()
    }

    /// LaTeX rendering; empty for an invalid expression.
    pub fn latex(&self) -> String {
        self.ast.as_ref().map(render::render_latex).unwrap_or_default()
    }

    /// Box-drawing tree diagram, each line shifted right by `indent` spaces.
    pub fn diagram(&self, indent: usize) -> String {
        self.ast
            .as_ref()
            .map(|ast| render::render_tree(ast, indent))
            .unwrap_or_default()
    }

    /// Names of the `[param]` placeholders the expression references, in
    /// first-appearance order.
    pub fn params(&self) -> Vec<String> {
        self.ast.as_ref().map(Ast::params).unwrap_or_default()
    }

    /// Evaluates against `ctx`. Invalid expressions and runtime failures
    /// yield [`Value::Invalid`].
    pub fn eval(&self, ctx: &EvalContext) -> Value {
        match &self.ast {
            Some(ast) => crate::eval::evaluate(ast, ctx),
            None => Value::Invalid,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Parses and evaluates in one call.
///
/// # Examples
///
/// ```
/// use expr_engine::{interp, Value};
///
/// assert_eq!(interp("2^10", None), Value::Real(1024.0));
/// assert_eq!(interp("1+", None), Value::Invalid);
/// ```
pub fn interp(text: &str, ctx: Option<&EvalContext>) -> Value {
    let expr = Expression::new(text);
    match ctx {
        Some(ctx) => expr.eval(ctx),
        None => expr.eval(&EvalContext::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_expression_surface() {
        let expr = Expression::new("1+2*3");
        assert!(expr.is_valid());
        assert_eq!(expr.failure_offset(), None);
        assert_eq!(expr.text(), "1+2*3");
        assert_eq!(expr.source(), "1+2*3");
        assert_eq!(expr.eval(&EvalContext::new()), Value::Real(7.0));
        assert_eq!(expr.to_string(), "1+2*3");
    }

    #[test]
    fn test_invalid_expression_surface() {
        let expr = Expression::new("1+*2");
        assert!(!expr.is_valid());
        assert!(expr.failure_offset().is_some());
        assert_eq!(expr.text(), "");
        assert_eq!(expr.latex(), "");
        assert_eq!(expr.diagram(0), "");
        assert_eq!(expr.params(), Vec::<String>::new());
        assert_eq!(expr.eval(&EvalContext::new()), Value::Invalid);
    }

    #[test]
    fn test_params_listing() {
        let expr = Expression::new("[rate] * [hours] + [rate]");
        assert_eq!(expr.params(), vec!["rate".to_string(), "hours".to_string()]);
    }

    #[test]
    fn test_interp_with_and_without_context() {
        assert_eq!(interp("6*7", None), Value::Real(42.0));

        let mut ctx = EvalContext::new();
        ctx.set_parameter("n", Value::Real(6.0));
        assert_eq!(interp("[n]*7", Some(&ctx)), Value::Real(42.0));
        assert_eq!(interp("[n]*7", None), Value::Invalid);
    }
}
