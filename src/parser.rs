//! Character-level parser: a two-state atom machine over the longest-match
//! operator tables, building the tree incrementally through the precedence
//! splice in [`crate::link`].

use crate::ast::{Ast, NodeId, Object};
use crate::error::{ExprError, Result};
use crate::link;
use crate::operator::{
    OpCode, Operator, BINARY_LEXEMES, POSTFIX_LEXEMES, PREFIX_LEXEMES,
};

/// Group/list nesting bound; beyond this the input is rejected rather than
/// risking the call stack.
const MAX_NESTING_DEPTH: usize = 500;

/// Parses `text` into a validated tree.
pub fn parse(text: &str) -> Result<Ast> {
    let mut parser = Parser::new(text);
    let root = parser.parse_atom()?;
    if !parser.finished() {
        return Err(parser.syntax_error());
    }

    parser.ast.set_root(root);
    if !link::test_node(&parser.ast, root) {
        return Err(ExprError::Structure {
            position: parser.farthest,
        });
    }

    Ok(parser.ast)
}

#[derive(Clone, Copy, PartialEq)]
enum State {
    /// Expecting a group, a prefix operator or an object literal.
    SegmentOpening,
    /// Expecting a sentinel, a binary operator or a postfix operator.
    SegmentClosed,
}

#[derive(Clone, Copy)]
enum Fixity {
    Prefix,
    Binary,
    Postfix,
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    /// High-water mark of consumed characters; reported on failure.
    farthest: usize,
    depth: usize,
    ast: Ast,
}

impl Parser {
    fn new(text: &str) -> Self {
        Parser {
            chars: text.chars().collect(),
            pos: 0,
            farthest: 0,
            depth: 0,
            ast: Ast::new(),
        }
    }

    fn syntax_error(&self) -> ExprError {
        ExprError::Syntax {
            position: self.farthest,
        }
    }

    fn is_space(ch: char) -> bool {
        matches!(ch, '\t'..='\r' | ' ')
    }

    fn get_char(&mut self, skip_space: bool) -> Option<char> {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            self.pos += 1;
            if self.pos > self.farthest {
                self.farthest = self.pos;
            }
            if !skip_space || !Self::is_space(ch) {
                return Some(ch);
            }
        }
        None
    }

    fn peek_char(&mut self) -> Option<char> {
        let ch = self.get_char(true);
        if ch.is_some() {
            self.pos -= 1;
        }
        ch
    }

    /// Consumes `text` if it matches from the current position. Insignificant
    /// whitespace is skipped between characters, as everywhere in the
    /// scanner.
    fn try_match(&mut self, text: &str) -> bool {
        let save = self.pos;
        for expected in text.chars() {
            if self.get_char(true) != Some(expected) {
                self.pos = save;
                return false;
            }
        }
        true
    }

    fn expect(&mut self, text: &str) -> Result<()> {
        if self.try_match(text) {
            Ok(())
        } else {
            Err(self.syntax_error())
        }
    }

    /// An atom runs up to end-of-input, `,`, `)` or `}`.
    fn atom_ended(&mut self) -> bool {
        matches!(self.peek_char(), None | Some(')') | Some(',') | Some('}'))
    }

    fn finished(&mut self) -> bool {
        self.peek_char().is_none()
    }

    fn insert(
        &mut self,
        root: &mut Option<NodeId>,
        semi: &mut Option<NodeId>,
        pending: &mut Option<NodeId>,
        current: &mut Option<NodeId>,
    ) -> Result<()> {
        if link::insert_node(&mut self.ast, root, semi, pending, current) {
            Ok(())
        } else {
            Err(self.syntax_error())
        }
    }

    fn parse_atom(&mut self) -> Result<NodeId> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            self.depth -= 1;
            return Err(ExprError::TooDeep {
                position: self.farthest,
            });
        }
        let result = self.parse_atom_inner();
        self.depth -= 1;
        result
    }

    fn parse_atom_inner(&mut self) -> Result<NodeId> {
        let defines = if self.try_match("{") {
            Some(self.parse_defines()?)
        } else {
            None
        };

        let mut root: Option<NodeId> = None;
        let mut semi: Option<NodeId> = None;
        let mut pending: Option<NodeId> = None;
        let mut current: Option<NodeId> = None;
        let mut state = State::SegmentOpening;

        loop {
            match state {
                State::SegmentOpening => {
                    if self.try_match("(") {
                        let first = self.parse_atom()?;
                        pending = Some(if self.try_match(",") {
                            self.parse_group_tail(first)?
                        } else {
                            self.expect(")")?;
                            first
                        });
                        state = State::SegmentClosed;
                    } else if let Some(op) = self.parse_operator(Fixity::Prefix) {
                        let call_like = op.is_call_like();
                        current = Some(self.ast.alloc_expr(op));
                        self.insert(&mut root, &mut semi, &mut pending, &mut current)?;
                        if call_like {
                            pending = Some(self.parse_list(false)?);
                            state = State::SegmentClosed;
                        }
                    } else if let Some(op) = self.parse_function_head() {
                        current = Some(self.ast.alloc_expr(op));
                        self.insert(&mut root, &mut semi, &mut pending, &mut current)?;
                        pending = Some(self.parse_list(false)?);
                        state = State::SegmentClosed;
                    } else {
                        pending = Some(self.parse_object()?);
                        state = State::SegmentClosed;
                    }
                }
                State::SegmentClosed => {
                    if self.atom_ended() {
                        self.insert(&mut root, &mut semi, &mut pending, &mut current)?;
                        let root = root.ok_or_else(|| self.syntax_error())?;
                        if let Some(defines) = defines {
                            self.ast.attach_defines(root, defines);
                        }
                        return Ok(root);
                    }

                    if let Some(op) = self.parse_operator(Fixity::Binary) {
                        current = Some(self.ast.alloc_expr(op));
                        self.insert(&mut root, &mut semi, &mut pending, &mut current)?;
                        state = State::SegmentOpening;
                    } else if let Some(op) = self.parse_operator(Fixity::Postfix) {
                        current = Some(self.ast.alloc_expr(op));
                        self.insert(&mut root, &mut semi, &mut pending, &mut current)?;
                        // Operand already consumed; the segment stays closed.
                    } else {
                        return Err(self.syntax_error());
                    }
                }
            }
        }
    }

    /// `{` has been consumed: a comma-separated array of definition atoms up
    /// to `}`. Shape is enforced by the validator.
    fn parse_defines(&mut self) -> Result<NodeId> {
        let mut items = Vec::new();
        loop {
            items.push(self.parse_atom()?);
            if self.try_match(",") {
                continue;
            }
            break;
        }
        self.expect("}")?;
        Ok(self.ast.alloc_object(Object::Array(items)))
    }

    /// `(` and the first atom and `,` have been consumed: the remaining
    /// elements of a parenthesised group.
    fn parse_group_tail(&mut self, first: NodeId) -> Result<NodeId> {
        let mut items = vec![first];
        loop {
            let item = self.parse_atom()?;
            if !self.complete_result(item) {
                return Err(self.syntax_error());
            }
            items.push(item);
            if self.try_match(",") {
                continue;
            }
            break;
        }
        self.expect(")")?;
        Ok(self.ast.alloc_object(Object::Array(items)))
    }

    /// List elements carry either a value or a boolean (`sort(s, false)`,
    /// predicate rules); bare arrays of arrays are fine too.
    fn complete_result(&self, item: NodeId) -> bool {
        self.ast.is_value_result(item) || self.ast.is_boolean_result(item) || self.ast.is_array(item)
    }

    /// Parenthesised argument list of a call-like operator, with at least
    /// one element.
    fn parse_list(&mut self, opened: bool) -> Result<NodeId> {
        if !opened {
            self.expect("(")?;
        }
        let mut items = Vec::new();
        loop {
            let item = self.parse_atom()?;
            if !self.complete_result(item) {
                return Err(self.syntax_error());
            }
            items.push(item);
            if self.try_match(",") {
                continue;
            }
            break;
        }
        self.expect(")")?;
        Ok(self.ast.alloc_object(Object::Array(items)))
    }

    fn parse_operator(&mut self, fixity: Fixity) -> Option<Operator> {
        let table: &[(&str, OpCode)] = match fixity {
            Fixity::Prefix => &*PREFIX_LEXEMES,
            Fixity::Binary => &*BINARY_LEXEMES,
            Fixity::Postfix => &*POSTFIX_LEXEMES,
        };
        for (lexeme, code) in table {
            if self.try_match(lexeme) {
                return Some(Operator::builtin(*code));
            }
        }
        None
    }

    /// A maximal run of letters followed by `(` is a user-function call head.
    fn parse_function_head(&mut self) -> Option<Operator> {
        let save = self.pos;
        let mut name = String::new();
        loop {
            let before = self.pos;
            match self.get_char(true) {
                Some(ch) if ch.is_ascii_alphabetic() => name.push(ch),
                Some(_) => {
                    self.pos = before;
                    break;
                }
                None => break,
            }
        }

        if name.is_empty() || self.peek_char() != Some('(') {
            self.pos = save;
            return None;
        }
        Some(Operator::function(name))
    }

    fn parse_object(&mut self) -> Result<NodeId> {
        if let Some(id) = self.parse_constant() {
            return Ok(id);
        }
        if let Some(id) = self.parse_numeric()? {
            return Ok(id);
        }
        if let Some(id) = self.parse_string()? {
            return Ok(id);
        }
        if let Some(id) = self.parse_param()? {
            return Ok(id);
        }
        if let Some(id) = self.parse_variable() {
            return Ok(id);
        }
        Err(self.syntax_error())
    }

    fn parse_constant(&mut self) -> Option<NodeId> {
        let object = if self.try_match("false") {
            Object::Boolean(false)
        } else if self.try_match("true") {
            Object::Boolean(true)
        } else if self.try_match("∞") || self.try_match("inf") {
            Object::Real(f64::INFINITY)
        } else if self.try_match("π") || self.try_match("pi") {
            Object::Real(crate::constants::PI)
        } else if self.try_match("e") {
            Object::Real(crate::constants::E)
        } else {
            return None;
        };
        Some(self.ast.alloc_object(object))
    }

    /// Digits with at most one `.`; a trailing `i` marks the imaginary axis
    /// and bare `i` means `1i`.
    fn parse_numeric(&mut self) -> Result<Option<NodeId>> {
        let save = self.pos;
        let mut text = String::new();
        loop {
            let before = self.pos;
            match self.get_char(true) {
                Some(ch) if ch.is_ascii_digit() || ch == '.' || ch == 'i' => text.push(ch),
                Some(_) => {
                    self.pos = before;
                    break;
                }
                None => break,
            }
        }

        if text.is_empty() {
            self.pos = save;
            return Ok(None);
        }

        if text.matches('.').count() > 1 {
            return Err(self.syntax_error());
        }

        let imaginary = match text.matches('i').count() {
            0 => false,
            1 => {
                if !text.ends_with('i') {
                    return Err(self.syntax_error());
                }
                text.pop();
                true
            }
            _ => return Err(self.syntax_error()),
        };

        let value = if text.is_empty() {
            // bare `i`
            1.0
        } else {
            text.parse::<f64>().map_err(|_| self.syntax_error())?
        };

        let object = if imaginary {
            Object::Imaginary(value)
        } else {
            Object::Real(value)
        };
        Ok(Some(self.ast.alloc_object(object)))
    }

    fn parse_string(&mut self) -> Result<Option<NodeId>> {
        let quote = if self.try_match("\"") {
            '"'
        } else if self.try_match("'") {
            '\''
        } else {
            return Ok(None);
        };

        let mut text = String::new();
        loop {
            match self.get_char(false) {
                Some(ch) if ch == quote => break,
                Some(ch) => text.push(ch),
                None => return Err(self.syntax_error()),
            }
        }
        Ok(Some(self.ast.alloc_object(Object::Str(text))))
    }

    fn parse_param(&mut self) -> Result<Option<NodeId>> {
        if !self.try_match("[") {
            return Ok(None);
        }

        let mut name = String::new();
        loop {
            match self.get_char(false) {
                Some(']') => break,
                Some(ch) => name.push(ch),
                None => return Err(self.syntax_error()),
            }
        }

        if name.is_empty() {
            return Err(self.syntax_error());
        }
        Ok(Some(self.ast.alloc_object(Object::Param(name))))
    }

    fn parse_variable(&mut self) -> Option<NodeId> {
        let save = self.pos;
        match self.get_char(true) {
            Some(ch) if ch.is_ascii_alphabetic() => {
                Some(self.ast.alloc_object(Object::Variable(ch)))
            }
            _ => {
                self.pos = save;
                None
            }
        }
    }
}
