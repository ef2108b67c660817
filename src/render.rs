//! Renderers: canonical source text, LaTeX, and the box-drawing tree diagram.

use crate::ast::{Ast, NodeId, NodeKind, Object};
use crate::operator::{Category, OpCode, Operator};
use crate::value::format_real;
use crate::{approach_to, constants, Real};

/// Canonical text of the tree. Re-parsing the result reproduces the tree.
pub fn render_text(ast: &Ast) -> String {
    ast.root()
        .map(|root| text_of(ast, root))
        .unwrap_or_default()
}

fn text_of(ast: &Ast, id: NodeId) -> String {
    let core = match &ast.node(id).kind {
        NodeKind::Object(object) => match object {
            Object::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Object::Real(r) => format_real(*r),
            Object::Imaginary(c) => format!("{}i", format_real(*c)),
            Object::Str(s) => format!("\"{}\"", s),
            Object::Param(name) => format!("[{}]", name),
            Object::Variable(letter) => letter.to_string(),
            Object::Array(items) => {
                let inner: Vec<String> = items.iter().map(|item| text_of(ast, *item)).collect();
                format!("({})", inner.join(","))
            }
        },
        NodeKind::Expr { op, left, right } => {
            let mut left_text = left.map(|l| text_of(ast, l)).unwrap_or_default();
            let mut right_text = right.map(|r| text_of(ast, r)).unwrap_or_default();

            // Parenthesise a left child bound less tightly than this node,
            // and a right child not bound strictly less tightly.
            if let Some(l) = *left {
                if let Some(child_op) = ast.op(l) {
                    if op.priority < child_op.priority {
                        left_text = format!("({})", left_text);
                    }
                }
            }
            if let Some(r) = *right {
                if let Some(child_op) = ast.op(r) {
                    if op.priority <= child_op.priority {
                        right_text = format!("({})", right_text);
                    }
                }
            }

            format!("{}{}{}", left_text, op.symbol(), right_text)
        }
    };

    match defines_text(ast, id) {
        Some(defines) => format!("{}{}", defines, core),
        None => core,
    }
}

fn defines_text(ast: &Ast, id: NodeId) -> Option<String> {
    let defines = ast.node(id).defines?;
    let items = ast.array_items(defines)?;
    let inner: Vec<String> = items.iter().map(|item| text_of(ast, *item)).collect();
    Some(format!("{{{}}}", inner.join(",")))
}

/// LaTeX rendering with per-operator templates.
pub fn render_latex(ast: &Ast) -> String {
    ast.root()
        .map(|root| latex_of(ast, root))
        .unwrap_or_default()
}

fn latex_real(value: Real) -> String {
    if approach_to(value, constants::PI) {
        "\\pi".to_string()
    } else if approach_to(value, -constants::PI) {
        "-\\pi".to_string()
    } else if approach_to(value, constants::E) {
        "e".to_string()
    } else if approach_to(value, -constants::E) {
        "-e".to_string()
    } else if value == f64::INFINITY {
        "\\infty".to_string()
    } else if value == f64::NEG_INFINITY {
        "-\\infty".to_string()
    } else {
        format_real(value)
    }
}

fn latex_of(ast: &Ast, id: NodeId) -> String {
    let core = match &ast.node(id).kind {
        NodeKind::Object(object) => match object {
            Object::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Object::Real(r) => latex_real(*r),
            Object::Imaginary(c) => {
                if *c == 1.0 {
                    "i".to_string()
                } else {
                    format!("{}i", format_real(*c))
                }
            }
            Object::Str(s) => format!("\\text{{\"{}\"}}", s),
            Object::Param(name) => format!("[{}]", name),
            Object::Variable(letter) => letter.to_string(),
            Object::Array(items) => {
                let inner: Vec<String> = items.iter().map(|item| latex_of(ast, *item)).collect();
                format!("\\left({}\\right)", inner.join(","))
            }
        },
        NodeKind::Expr { op, left, right } => latex_expr(ast, op, *left, *right),
    };

    match ast.node(id).defines {
        Some(defines) => {
            let items = ast.array_items(defines).unwrap_or_default();
            let inner: Vec<String> = items.iter().map(|item| latex_of(ast, *item)).collect();
            format!("\\left\\{{{}\\right\\}}{}", inner.join(","), core)
        }
        None => core,
    }
}

/// Child rendering with the same parenthesisation rule as the text renderer,
/// using stretchy delimiters.
fn latex_operand(ast: &Ast, op: &Operator, child: Option<NodeId>, right_side: bool) -> String {
    let Some(child) = child else {
        return String::new();
    };
    let text = latex_of(ast, child);
    let wrap = match ast.op(child) {
        Some(child_op) => {
            if right_side {
                op.priority <= child_op.priority
            } else {
                op.priority < child_op.priority
            }
        }
        None => false,
    };
    if wrap {
        format!("\\left({}\\right)", text)
    } else {
        text
    }
}

fn latex_expr(ast: &Ast, op: &Operator, left: Option<NodeId>, right: Option<NodeId>) -> String {
    // User function: name followed by its argument list.
    let Some(code) = op.code() else {
        let name = op.function_name().unwrap_or_default();
        let args = right.map(|r| latex_of(ast, r)).unwrap_or_default();
        return format!("{}{}", name, args);
    };

    let lhs = |side: Option<NodeId>| side.map(|n| latex_of(ast, n)).unwrap_or_default();
    let l = || latex_operand(ast, op, left, false);
    let r = || latex_operand(ast, op, right, true);

    match code {
        OpCode::Divide => format!("\\frac{{{}}}{{{}}}", lhs(left), lhs(right)),
        OpCode::Sqrt => format!("\\sqrt{{{}}}", lhs(right)),
        OpCode::Root => format!("\\sqrt[{}]{{{}}}", lhs(left), lhs(right)),
        OpCode::Pow => format!("{{{}}}^{{{}}}", l(), lhs(right)),
        OpCode::Permute => format!("P_{{{}}}^{{{}}}", lhs(left), lhs(right)),
        OpCode::Combine => format!("C_{{{}}}^{{{}}}", lhs(left), lhs(right)),
        OpCode::Abs => format!("\\left|{}\\right|", lhs(right)),
        OpCode::Ceil => format!("\\left\\lceil {} \\right\\rceil", lhs(right)),
        OpCode::Floor => format!("\\left\\lfloor {} \\right\\rfloor", lhs(right)),
        OpCode::Polar => format!("{{{}}}\\angle{{{}}}", lhs(left), lhs(right)),
        OpCode::Degree => format!("{{{}}}^{{\\circ}}", l()),
        OpCode::Factorial => format!("{{{}}}!", l()),
        OpCode::Gamma => format!("\\Gamma{{{}}}", r()),
        OpCode::Exp => format!("e^{{{}}}", lhs(right)),
        OpCode::Log => format!("\\log_{{{}}}{{{}}}", lhs(left), r()),
        OpCode::Lg => format!("\\lg{{{}}}", r()),
        OpCode::Ln => format!("\\ln{{{}}}", r()),
        OpCode::Multiply => format!("{} \\cdot {}", l(), r()),
        OpCode::And => format!("{} \\land {}", l(), r()),
        OpCode::Or => format!("{} \\lor {}", l(), r()),
        OpCode::Not => format!("\\neg {}", r()),
        OpCode::Equal => format!("{} = {}", l(), r()),
        OpCode::Approach => format!("{} \\approx {}", l(), r()),
        OpCode::NotEqual => format!("{} \\neq {}", l(), r()),
        OpCode::LessEqual => format!("{} \\leq {}", l(), r()),
        OpCode::GreaterEqual => format!("{} \\geq {}", l(), r()),
        OpCode::Sin => format!("\\sin{{{}}}", r()),
        OpCode::Cos => format!("\\cos{{{}}}", r()),
        OpCode::Tan => format!("\\tan{{{}}}", r()),
        OpCode::Cot => format!("\\cot{{{}}}", r()),
        OpCode::Sec => format!("\\sec{{{}}}", r()),
        OpCode::Csc => format!("\\csc{{{}}}", r()),
        OpCode::ArcSin => format!("\\sin^{{-1}}{{{}}}", r()),
        OpCode::ArcCos => format!("\\cos^{{-1}}{{{}}}", r()),
        OpCode::ArcTan => format!("\\tan^{{-1}}{{{}}}", r()),
        OpCode::ArcCot => format!("\\cot^{{-1}}{{{}}}", r()),
        OpCode::ArcSec => format!("\\sec^{{-1}}{{{}}}", r()),
        OpCode::ArcCsc => format!("\\csc^{{-1}}{{{}}}", r()),
        OpCode::Summate => latex_big(ast, "\\Sigma", right).unwrap_or_else(|| latex_call(ast, op, right)),
        OpCode::Produce => latex_big(ast, "\\Pi", right).unwrap_or_else(|| latex_call(ast, op, right)),
        OpCode::Integrate => latex_integral(ast, right, 1).unwrap_or_else(|| latex_call(ast, op, right)),
        OpCode::DoubleIntegrate => {
            latex_integral(ast, right, 2).unwrap_or_else(|| latex_call(ast, op, right))
        }
        OpCode::TripleIntegrate => {
            latex_integral(ast, right, 3).unwrap_or_else(|| latex_call(ast, op, right))
        }
        _ => match op.category {
            // Remaining call-like operators keep their textual name.
            Category::Evaluation | Category::Invocation => latex_call(ast, op, right),
            _ => format!("{}{}{}", l(), op.symbol(), r()),
        },
    }
}

fn latex_call(ast: &Ast, op: &Operator, right: Option<NodeId>) -> String {
    let args = right.map(|r| latex_of(ast, r)).unwrap_or_default();
    format!("\\operatorname{{{}}}{}", op.symbol(), args)
}

/// `\Sigma_{x=lo}^{hi}{body}` for a three-element wrap.
fn latex_big(ast: &Ast, symbol: &str, right: Option<NodeId>) -> Option<String> {
    let items = ast.array_items(right?)?;
    if items.len() != 3 {
        return None;
    }
    Some(format!(
        "{}_{{x={}}}^{{{}}}{{{}}}",
        symbol,
        latex_of(ast, items[0]),
        latex_of(ast, items[1]),
        latex_of(ast, items[2]),
    ))
}

/// Nested `\int` templates; the innermost axis is x, then y, then z.
fn latex_integral(ast: &Ast, right: Option<NodeId>, dims: usize) -> Option<String> {
    let items = ast.array_items(right?)?;
    if items.len() != 2 * dims + 1 {
        return None;
    }

    let body = latex_of(ast, items[2 * dims]);
    let axes = ["x", "y", "z"];
    let mut rendered = body;
    for dim in 0..dims {
        // Innermost bounds are the last bound pair of the wrap.
        let lo = latex_of(ast, items[2 * (dims - 1 - dim)]);
        let hi = latex_of(ast, items[2 * (dims - 1 - dim) + 1]);
        rendered = format!(
            "\\int_{{{}}}^{{{}}}{{{} \\cdot d{}}}",
            lo, hi, rendered, axes[dim]
        );
    }
    Some(rendered)
}

/// ASCII tree diagram: the left child is printed above its parent, the right
/// child below; array elements hang below an `array` line. Every line is
/// shifted right by `indent` spaces.
pub fn render_tree(ast: &Ast, indent: usize) -> String {
    let Some(root) = ast.root() else {
        return String::new();
    };

    let block = draw(ast, root);
    let pad = " ".repeat(indent);
    let mut out = String::new();
    for line in block.lines {
        out.push_str(&pad);
        out.push_str(&line);
        out.push('\n');
    }
    out
}

struct Block {
    lines: Vec<String>,
    /// Index of the line holding this node's own label.
    root: usize,
}

fn node_token(ast: &Ast, id: NodeId) -> String {
    match &ast.node(id).kind {
        NodeKind::Object(Object::Array(_)) => "array".to_string(),
        NodeKind::Object(Object::Boolean(b)) => if *b { "true" } else { "false" }.to_string(),
        NodeKind::Object(Object::Real(r)) => format_real(*r),
        NodeKind::Object(Object::Imaginary(c)) => format!("{}i", format_real(*c)),
        NodeKind::Object(Object::Str(s)) => format!("\"{}\"", s),
        NodeKind::Object(Object::Param(name)) => format!("[{}]", name),
        NodeKind::Object(Object::Variable(letter)) => letter.to_string(),
        NodeKind::Expr { op, .. } => op.symbol().to_string(),
    }
}

fn draw(ast: &Ast, id: NodeId) -> Block {
    let upper = ast.left(id).map(|l| draw(ast, l));

    let mut lowers: Vec<Block> = Vec::new();
    if let Some(right) = ast.right(id) {
        lowers.push(draw(ast, right));
    }
    if let Some(items) = ast.array_items(id) {
        for item in items {
            lowers.push(draw(ast, *item));
        }
    }
    if let Some(defines) = ast.node(id).defines {
        let mut block = draw(ast, defines);
        block.lines[block.root] = "defines".to_string();
        lowers.push(block);
    }

    let mut lines = Vec::new();
    if let Some(upper) = upper {
        for (index, line) in upper.lines.iter().enumerate() {
            let prefix = if index < upper.root {
                "  "
            } else if index == upper.root {
                "┌─"
            } else {
                "│ "
            };
            lines.push(format!("{}{}", prefix, line));
        }
    }

    let root = lines.len();
    lines.push(node_token(ast, id));

    let count = lowers.len();
    for (position, lower) in lowers.iter().enumerate() {
        let last = position + 1 == count;
        for (index, line) in lower.lines.iter().enumerate() {
            let prefix = if index < lower.root {
                "│ "
            } else if index == lower.root {
                if last {
                    "└─"
                } else {
                    "├─"
                }
            } else if last {
                "  "
            } else {
                "│ "
            };
            lines.push(format!("{}{}", prefix, line));
        }
    }

    Block { lines, root }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn text(input: &str) -> String {
        render_text(&parse(input).unwrap())
    }

    fn latex(input: &str) -> String {
        render_latex(&parse(input).unwrap())
    }

    #[test]
    fn test_text_round_trip_is_fixed_point() {
        for input in [
            "1+2*3",
            "(1+2)*3",
            "2^10",
            "-5",
            "5~!",
            "cnt(1,2,3)",
            "{f(x)=x*x}f(5)",
            "\"a\"+\"b\"",
            "[p]+1",
            "(1,2,3)",
            "1/2/3",
            "2^(3^2)",
        ] {
            let once = text(input);
            let twice = render_text(&parse(&once).unwrap());
            assert_eq!(once, twice, "render of {:?} is not a fixed point", input);
        }
    }

    #[test]
    fn test_text_parenthesisation() {
        assert_eq!(text("(1+2)*3"), "(1+2)*3");
        assert_eq!(text("1+2*3"), "1+2*3");
        assert_eq!(text("1-(2-3)"), "1-(2-3)");
    }

    #[test]
    fn test_text_defines_prefix() {
        // The canonical text uses the primary `==` lexeme; `=` is its alias.
        assert_eq!(text("{f(x)=x*x}f(5)"), "{f(x)==x*x}f(5)");
    }

    #[test]
    fn test_latex_templates() {
        assert_eq!(latex("1/2"), "\\frac{1}{2}");
        assert_eq!(latex("2^10"), "{2}^{10}");
        assert_eq!(latex("√9"), "\\sqrt{9}");
        assert_eq!(latex("3√27"), "\\sqrt[3]{27}");
        assert_eq!(latex("2*3"), "2 \\cdot 3");
        assert_eq!(latex("1<=2"), "1 \\leq 2");
        assert_eq!(latex("1~=2"), "1 \\approx 2");
        assert_eq!(latex("abs(-1)"), "\\left|-1\\right|");
        assert_eq!(latex("asin(1)"), "\\sin^{-1}{1}");
    }

    #[test]
    fn test_latex_constants_relabel() {
        assert_eq!(latex("π"), "\\pi");
        assert_eq!(latex("e"), "e");
        assert_eq!(latex("pi+1"), "\\pi+1");
    }

    #[test]
    fn test_latex_largescale() {
        let rendered = latex("{f(x)=x}Σ(1,10,f)");
        assert!(rendered.contains("\\Sigma_{x=1}^{10}"), "{}", rendered);

        let rendered = latex("{f(x)=x}∫(0,1,f)");
        assert!(rendered.contains("\\int_{0}^{1}"), "{}", rendered);
        assert!(rendered.contains("\\cdot dx"), "{}", rendered);
    }

    #[test]
    fn test_tree_diagram_shape() {
        let ast = parse("1+2*3").unwrap();
        let diagram = render_tree(&ast, 0);
        let lines: Vec<&str> = diagram.lines().collect();
        assert_eq!(lines[0], "┌─1");
        assert_eq!(lines[1], "+");
        assert!(lines[2].contains("2"));
        assert!(diagram.contains("└─*"));
    }

    #[test]
    fn test_tree_diagram_indent_and_array() {
        let ast = parse("cnt(1,2)").unwrap();
        let diagram = render_tree(&ast, 2);
        assert!(diagram.lines().all(|line| line.starts_with("  ")));
        assert!(diagram.contains("array"));
    }
}
