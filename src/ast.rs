//! The expression tree.
//!
//! Nodes live in an arena owned by [`Ast`]; `parent`, `container` (the array
//! a node is an element of) and `defines` are arena indices, so the
//! back-references the parser and the scope walk need never alias owned data.
//! After parsing the tree is immutable.

use std::collections::HashMap;

use crate::operator::{Category, OpCode, Operator};
use crate::Real;

/// Index of a node inside its [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Leaf payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Boolean(bool),
    Real(Real),
    /// Coefficient of the imaginary axis; the literal `2i` parses to
    /// `Imaginary(2.0)` and bare `i` to `Imaginary(1.0)`.
    Imaginary(Real),
    Str(String),
    /// Placeholder `[name]`, resolved by the caller at evaluation time.
    Param(String),
    /// Single letter `A`-`Z` / `a`-`z`.
    Variable(char),
    /// Parenthesised group of two or more atoms, or a call argument list.
    Array(Vec<NodeId>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object(Object),
    Expr {
        op: Operator,
        left: Option<NodeId>,
        right: Option<NodeId>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Expression node whose left/right slot holds this node.
    pub parent: Option<NodeId>,
    /// Array object holding this node as an element.
    pub container: Option<NodeId>,
    /// Array of user-function definitions scoping this node's subtree.
    pub defines: Option<NodeId>,
}

/// Definitions visible at a node: name → (formal letters, rule node).
pub type DefineMap = HashMap<String, (String, NodeId)>;

/// Arena-owned expression tree.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            container: None,
            defines: None,
        });
        id
    }

    pub fn alloc_object(&mut self, object: Object) -> NodeId {
        let elements = match &object {
            Object::Array(items) => items.clone(),
            _ => Vec::new(),
        };
        let id = self.push(NodeKind::Object(object));
        for element in elements {
            self.nodes[element.index()].container = Some(id);
        }
        id
    }

    pub fn alloc_expr(&mut self, op: Operator) -> NodeId {
        self.push(NodeKind::Expr {
            op,
            left: None,
            right: None,
        })
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Attaches a defines array to `target` and links the array back into the
    /// upper chain, so resolution works from inside the definitions
    /// themselves (sibling references, recursion).
    pub fn attach_defines(&mut self, target: NodeId, defines: NodeId) {
        self.nodes[target.index()].defines = Some(defines);
        self.nodes[defines.index()].parent = Some(target);
    }

    pub fn op(&self, id: NodeId) -> Option<&Operator> {
        match &self.node(id).kind {
            NodeKind::Expr { op, .. } => Some(op),
            NodeKind::Object(_) => None,
        }
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        match &self.node(id).kind {
            NodeKind::Expr { left, .. } => *left,
            NodeKind::Object(_) => None,
        }
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        match &self.node(id).kind {
            NodeKind::Expr { right, .. } => *right,
            NodeKind::Object(_) => None,
        }
    }

    pub fn array_items(&self, id: NodeId) -> Option<&[NodeId]> {
        match &self.node(id).kind {
            NodeKind::Object(Object::Array(items)) => Some(items),
            _ => None,
        }
    }

    pub fn is_object(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Object(_))
    }

    pub fn is_expr(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Expr { .. })
    }

    pub fn is_boolean(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Object(Object::Boolean(_)))
    }

    pub fn is_numeric(&self, id: NodeId) -> bool {
        matches!(
            self.node(id).kind,
            NodeKind::Object(Object::Real(_)) | NodeKind::Object(Object::Imaginary(_))
        )
    }

    pub fn is_string(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Object(Object::Str(_)))
    }

    pub fn is_param(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Object(Object::Param(_)))
    }

    pub fn is_variable(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Object(Object::Variable(_)))
    }

    pub fn is_array(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Object(Object::Array(_)))
    }

    pub fn category(&self, id: NodeId) -> Option<Category> {
        self.op(id).map(|op| op.category)
    }

    pub fn is_function(&self, id: NodeId) -> bool {
        self.category(id) == Some(Category::Function)
    }

    pub fn is_unary(&self, id: NodeId) -> bool {
        self.op(id)
            .map(|op| op.arity == crate::operator::Arity::Unary)
            .unwrap_or(false)
    }

    /// Nodes whose evaluation yields a boolean: boolean literals, logic and
    /// relation expressions.
    pub fn is_boolean_result(&self, id: NodeId) -> bool {
        self.is_boolean(id)
            || matches!(
                self.category(id),
                Some(Category::Logic) | Some(Category::Relation)
            )
    }

    /// Nodes whose evaluation yields a value: numerics, strings, params,
    /// variables, and every non-logic, non-relation expression.
    pub fn is_value_result(&self, id: NodeId) -> bool {
        self.is_numeric(id)
            || self.is_string(id)
            || self.is_param(id)
            || self.is_variable(id)
            || matches!(
                self.category(id),
                Some(Category::Arithmetic)
                    | Some(Category::Evaluation)
                    | Some(Category::Invocation)
                    | Some(Category::LargeScale)
                    | Some(Category::Function)
            )
    }

    /// Next node outward: the containing array when there is one, else the
    /// parent expression.
    pub fn upper(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id);
        node.container.or(node.parent)
    }

    /// True when `id` binds strictly tighter than `other` (objects bind
    /// tighter than any expression).
    pub fn higher_than(&self, id: NodeId, other: NodeId) -> bool {
        match (self.op(id), self.op(other)) {
            (None, Some(_)) => true,
            (Some(a), Some(b)) => a.priority < b.priority,
            _ => false,
        }
    }

    /// True when `id` binds strictly looser than `other`.
    pub fn lower_than(&self, id: NodeId, other: NodeId) -> bool {
        match (self.op(id), self.op(other)) {
            (Some(_), None) => true,
            (Some(a), Some(b)) => b.priority < a.priority,
            _ => false,
        }
    }

    /// Concatenated letters of the variable elements in a function node's
    /// argument array. These are the formals when the node is used as a
    /// deferred function argument.
    pub fn function_variables(&self, id: NodeId) -> String {
        if !self.is_function(id) {
            return String::new();
        }
        let Some(wrap) = self.right(id) else {
            return String::new();
        };
        let Some(items) = self.array_items(wrap) else {
            return String::new();
        };
        items
            .iter()
            .filter_map(|item| match &self.node(*item).kind {
                NodeKind::Object(Object::Variable(letter)) => Some(*letter),
                _ => None,
            })
            .collect()
    }

    /// Definitions in scope at `id`: the nearest defines array on the upper
    /// chain, starting at the node itself. Inner blocks shadow outer ones
    /// wholesale.
    pub fn define_map(&self, id: NodeId) -> Option<DefineMap> {
        let mut walk = Some(id);
        let mut defines = None;
        while let Some(current) = walk {
            if let Some(def) = self.node(current).defines {
                if self.is_array(def) {
                    defines = Some(def);
                    break;
                }
            }
            walk = self.upper(current);
        }

        let items = self.array_items(defines?)?;
        let mut map = DefineMap::new();
        for item in items {
            if self.op(*item).and_then(Operator::code) != Some(OpCode::Equal) {
                continue;
            }
            let Some(rule) = self.right(*item) else {
                continue;
            };
            let Some(head) = self.left(*item) else {
                continue;
            };
            if !self.is_function(head) {
                continue;
            }
            let Some(name) = self.op(head).and_then(|op| op.function_name()) else {
                continue;
            };
            map.insert(
                name.to_string(),
                (self.function_variables(head), rule),
            );
        }

        if map.is_empty() {
            None
        } else {
            Some(map)
        }
    }

    /// Names of the `[param]` placeholders under the root, first appearance
    /// first, each reported once.
    pub fn params(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(root) = self.root {
            self.collect_params(root, &mut names);
        }
        names
    }

    fn collect_params(&self, id: NodeId, names: &mut Vec<String>) {
        match &self.node(id).kind {
            NodeKind::Object(Object::Param(name)) => {
                if !names.iter().any(|existing| existing == name) {
                    names.push(name.clone());
                }
            }
            NodeKind::Object(Object::Array(items)) => {
                for item in items.clone() {
                    self.collect_params(item, names);
                }
            }
            NodeKind::Expr { left, right, .. } => {
                if let Some(left) = *left {
                    self.collect_params(left, names);
                }
                if let Some(right) = *right {
                    self.collect_params(right, names);
                }
            }
            NodeKind::Object(_) => {}
        }
    }
}
