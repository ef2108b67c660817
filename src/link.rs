//! Builders and linker: connecting a pending operand to an operator while
//! honoring arity and fixity, the precedence splice used by the parser, and
//! the structural validator run after parsing.

use crate::ast::{Ast, NodeId, NodeKind};
use crate::operator::{Arity, Category, Operator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Connects `child` into `parent`'s slot on `side`.
///
/// The empty operand side of a unary operator (left for prefix, right for
/// postfix) accepts only an absent child; every other slot requires one.
pub fn link_node(ast: &mut Ast, parent: NodeId, side: Side, child: Option<NodeId>) -> bool {
    let Some(op) = ast.op(parent) else {
        return false;
    };

    if op.arity == Arity::Unary {
        let vacant = if op.postfix { Side::Right } else { Side::Left };
        if side == vacant {
            return child.is_none();
        }
    }

    let Some(child_id) = child else {
        return false;
    };

    match &mut ast.node_mut(parent).kind {
        NodeKind::Expr { left, right, .. } => match side {
            Side::Left => *left = Some(child_id),
            Side::Right => *right = Some(child_id),
        },
        NodeKind::Object(_) => return false,
    }
    ast.node_mut(child_id).parent = Some(parent);

    true
}

/// Places a freshly parsed operator (`current`) and operand (`pending`) into
/// the growing atom, keeping `semi` at the deepest right-edge operator that
/// owns the incomplete slot.
///
/// A tighter-binding or unary operator takes the pending operand as its left
/// and becomes `semi`'s right child. A looser one closes `semi` with the
/// operand, then walks the parent chain to the first ancestor binding
/// strictly looser than itself and splices in as that ancestor's new right
/// child (or becomes the new root).
pub fn insert_node(
    ast: &mut Ast,
    root: &mut Option<NodeId>,
    semi: &mut Option<NodeId>,
    pending: &mut Option<NodeId>,
    current: &mut Option<NodeId>,
) -> bool {
    let Some(semi_id) = *semi else {
        let Some(current_id) = *current else {
            *root = pending.take();
            return true;
        };

        if !link_node(ast, current_id, Side::Left, *pending) {
            return false;
        }
        *pending = None;
        *root = Some(current_id);
        *semi = Some(current_id);
        *current = None;
        return true;
    };

    let Some(current_id) = *current else {
        if !link_node(ast, semi_id, Side::Right, *pending) {
            return false;
        }
        *pending = None;
        return true;
    };

    if !ast.is_expr(semi_id) || !ast.is_expr(current_id) {
        return false;
    }

    let current_unary = ast
        .op(current_id)
        .map(|op| op.arity == Arity::Unary)
        .unwrap_or(false);

    if ast.higher_than(current_id, semi_id) || current_unary {
        if !link_node(ast, current_id, Side::Left, *pending) {
            return false;
        }
        *pending = None;

        if !link_node(ast, semi_id, Side::Right, Some(current_id)) {
            return false;
        }
        *semi = Some(current_id);
        *current = None;
        true
    } else {
        if !link_node(ast, semi_id, Side::Right, *pending) {
            return false;
        }
        *pending = None;

        let mut ancestor = ast.node(semi_id).parent;
        while let Some(candidate) = ancestor {
            if ast.lower_than(candidate, current_id) {
                break;
            }
            ancestor = ast.node(candidate).parent;
        }

        if let Some(ancestor) = ancestor {
            let adopted = ast.right(ancestor);
            if !link_node(ast, current_id, Side::Left, adopted) {
                return false;
            }
            if !link_node(ast, ancestor, Side::Right, Some(current_id)) {
                return false;
            }
        } else {
            let old_root = *root;
            if !link_node(ast, current_id, Side::Left, old_root) {
                return false;
            }
            *root = Some(current_id);
        }
        *semi = Some(current_id);
        *current = None;
        true
    }
}

/// Checks one parent↔child link against the operator-category rules.
pub fn test_link(ast: &Ast, parent: NodeId, side: Side, child: Option<NodeId>) -> bool {
    let Some(op) = ast.op(parent) else {
        return false;
    };

    let Some(child) = child else {
        let vacant = if op.postfix { Side::Right } else { Side::Left };
        return op.arity == Arity::Unary && side == vacant;
    };

    match op.category {
        Category::Logic => ast.is_boolean_result(child) || ast.is_function(child),
        Category::Relation | Category::Arithmetic => ast.is_value_result(child),
        Category::Evaluation | Category::Invocation | Category::LargeScale => ast.is_array(child),
        Category::Function => ast.is_array(child) && function_resolves(ast, parent),
    }
}

/// A user-function call must resolve in the defines chain enclosing the call
/// node itself, so inner blocks shadow outer ones during validation exactly
/// as they do during evaluation.
fn function_resolves(ast: &Ast, call: NodeId) -> bool {
    let Some(name) = ast.op(call).and_then(Operator::function_name) else {
        return false;
    };
    ast.define_map(call)
        .map(|map| map.contains_key(name))
        .unwrap_or(false)
}

/// Structural validator: every expression link must satisfy [`test_link`],
/// array elements must validate recursively, and an attached defines block
/// must be an array of relation-equal items whose left side is a
/// user-function head. Rule bodies are not re-checked against the link rules;
/// predicate-shaped rules are legal.
pub fn test_node(ast: &Ast, id: NodeId) -> bool {
    if let Some(defines) = ast.node(id).defines {
        if !test_defines(ast, defines) {
            return false;
        }
    }

    match &ast.node(id).kind {
        NodeKind::Object(crate::ast::Object::Array(items)) => {
            items.iter().all(|item| test_node(ast, *item))
        }
        NodeKind::Object(_) => true,
        NodeKind::Expr { left, right, .. } => {
            test_link(ast, id, Side::Left, *left)
                && test_link(ast, id, Side::Right, *right)
                && left.map_or(true, |l| test_node(ast, l))
                && right.map_or(true, |r| test_node(ast, r))
        }
    }
}

fn test_defines(ast: &Ast, defines: NodeId) -> bool {
    let Some(items) = ast.array_items(defines) else {
        return false;
    };
    items.iter().all(|item| {
        ast.op(*item).and_then(Operator::code) == Some(crate::operator::OpCode::Equal)
            && ast.left(*item).map_or(false, |head| ast.is_function(head))
            && ast.right(*item).is_some()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Object;
    use crate::operator::OpCode;

    fn real(ast: &mut Ast, value: f64) -> NodeId {
        ast.alloc_object(Object::Real(value))
    }

    #[test]
    fn test_insert_builds_precedence_tree() {
        // 1+2*3 must become +(1, *(2, 3)).
        let mut ast = Ast::new();
        let mut root = None;
        let mut semi = None;
        let mut pending = Some(real(&mut ast, 1.0));
        let mut current = Some(ast.alloc_expr(Operator::builtin(OpCode::Plus)));
        assert!(insert_node(
            &mut ast,
            &mut root,
            &mut semi,
            &mut pending,
            &mut current
        ));

        pending = Some(real(&mut ast, 2.0));
        current = Some(ast.alloc_expr(Operator::builtin(OpCode::Multiply)));
        assert!(insert_node(
            &mut ast,
            &mut root,
            &mut semi,
            &mut pending,
            &mut current
        ));

        pending = Some(real(&mut ast, 3.0));
        current = None;
        assert!(insert_node(
            &mut ast,
            &mut root,
            &mut semi,
            &mut pending,
            &mut current
        ));

        let plus = root.unwrap();
        assert_eq!(ast.op(plus).unwrap().code(), Some(OpCode::Plus));
        let times = ast.right(plus).unwrap();
        assert_eq!(ast.op(times).unwrap().code(), Some(OpCode::Multiply));
        assert!(ast.is_numeric(ast.left(plus).unwrap()));
    }

    #[test]
    fn test_insert_splices_looser_operator_as_root() {
        // 2*3+1 must become +(*(2, 3), 1).
        let mut ast = Ast::new();
        let mut root = None;
        let mut semi = None;
        let mut pending = Some(real(&mut ast, 2.0));
        let mut current = Some(ast.alloc_expr(Operator::builtin(OpCode::Multiply)));
        assert!(insert_node(
            &mut ast,
            &mut root,
            &mut semi,
            &mut pending,
            &mut current
        ));

        pending = Some(real(&mut ast, 3.0));
        current = Some(ast.alloc_expr(Operator::builtin(OpCode::Plus)));
        assert!(insert_node(
            &mut ast,
            &mut root,
            &mut semi,
            &mut pending,
            &mut current
        ));

        pending = Some(real(&mut ast, 1.0));
        current = None;
        assert!(insert_node(
            &mut ast,
            &mut root,
            &mut semi,
            &mut pending,
            &mut current
        ));

        let plus = root.unwrap();
        assert_eq!(ast.op(plus).unwrap().code(), Some(OpCode::Plus));
        let times = ast.left(plus).unwrap();
        assert_eq!(ast.op(times).unwrap().code(), Some(OpCode::Multiply));
    }

    #[test]
    fn test_link_rejects_binary_without_operand() {
        let mut ast = Ast::new();
        let plus = ast.alloc_expr(Operator::builtin(OpCode::Plus));
        assert!(!link_node(&mut ast, plus, Side::Right, None));
    }

    #[test]
    fn test_link_rules_by_category() {
        let mut ast = Ast::new();
        let number = real(&mut ast, 1.0);
        let flag = ast.alloc_object(Object::Boolean(true));
        let relation = ast.alloc_expr(Operator::builtin(OpCode::Less));
        let and = ast.alloc_expr(Operator::builtin(OpCode::And));
        let plus = ast.alloc_expr(Operator::builtin(OpCode::Plus));
        let count = ast.alloc_expr(Operator::builtin(OpCode::Count));
        let wrap = ast.alloc_object(Object::Array(vec![number]));

        // Logic wants boolean results.
        assert!(test_link(&ast, and, Side::Left, Some(flag)));
        assert!(test_link(&ast, and, Side::Left, Some(relation)));
        assert!(!test_link(&ast, and, Side::Left, Some(number)));

        // Arithmetic wants value results.
        assert!(test_link(&ast, plus, Side::Left, Some(number)));
        assert!(!test_link(&ast, plus, Side::Left, Some(flag)));
        assert!(!test_link(&ast, plus, Side::Left, Some(wrap)));

        // Call-like operators want exactly an array on the right and an
        // empty left.
        assert!(test_link(&ast, count, Side::Right, Some(wrap)));
        assert!(!test_link(&ast, count, Side::Right, Some(number)));
        assert!(test_link(&ast, count, Side::Left, None));
    }
}
