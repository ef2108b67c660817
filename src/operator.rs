//! Operator catalog: one row of fixed attributes per built-in operator, plus
//! the longest-first lexeme tables the parser dispatches on.

use lazy_static::lazy_static;

/// Broad operator family. Link rules and evaluation dispatch key off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Logic,
    Relation,
    Arithmetic,
    /// Statistics over an evaluated sequence (`cnt`, `mean`, `fft`, ...).
    Evaluation,
    /// Higher-order sequence operations (`gen`, `sel`, `acc`, ...).
    Invocation,
    /// Summation, product and numeric integration.
    LargeScale,
    /// User-defined function call; carries a name instead of a code.
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
}

/// Code of a built-in operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    // logic
    And,
    Or,
    Not,

    // relation
    Equal,
    Approach,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulus,
    Negative,
    Ceil,
    Floor,
    Trunc,
    Round,
    Rint,
    Abs,
    Phase,
    RealPart,
    ImagPart,
    Conjugate,
    Factorial,
    Gamma,
    Permute,
    Combine,
    HypotPair,
    Pow,
    Exp,
    Log,
    Lg,
    Ln,
    Sqrt,
    Root,
    Polar,
    Degree,
    ToDeg,
    ToRad,
    Sin,
    ArcSin,
    Cos,
    ArcCos,
    Tan,
    ArcTan,
    Cot,
    ArcCot,
    Sec,
    ArcSec,
    Csc,
    ArcCsc,
    Prime,
    Composite,
    NthPrime,
    NthComposite,
    Rand,

    // evaluation
    Count,
    Min,
    Max,
    Range,
    Unique,
    Total,
    Mean,
    GeometricMean,
    QuadraticMean,
    HarmonicMean,
    Variance,
    Deviation,
    Median,
    Mode,
    Hypot,
    Norm,
    ZScoreNorm,
    Gcd,
    Lcm,
    Dft,
    Idft,
    Fft,
    Ifft,
    Zt,

    // invocation
    Generate,
    Has,
    Pick,
    Select,
    Sort,
    Transform,
    Accumulate,

    // largescale
    Summate,
    Produce,
    Integrate,
    DoubleIntegrate,
    TripleIntegrate,
}

/// Catalog row: the fixed attributes of one built-in operator.
pub struct OpInfo {
    pub code: OpCode,
    pub category: Category,
    pub arity: Arity,
    /// Binding priority; lower binds tighter.
    pub priority: u8,
    pub postfix: bool,
    /// Primary lexeme, used by the renderers.
    pub symbol: &'static str,
    /// Alternative lexemes accepted by the parser.
    pub aliases: &'static [&'static str],
}

const fn row(
    code: OpCode,
    category: Category,
    arity: Arity,
    priority: u8,
    postfix: bool,
    symbol: &'static str,
    aliases: &'static [&'static str],
) -> OpInfo {
    OpInfo {
        code,
        category,
        arity,
        priority,
        postfix,
        symbol,
        aliases,
    }
}

use Arity::{Binary, Unary};
use Category::{Arithmetic, Evaluation, Invocation, LargeScale, Logic, Relation};

/// The static catalog, in [`OpCode`] declaration order.
#[rustfmt::skip]
pub const CATALOG: &[OpInfo] = &[
    // logic
    row(OpCode::And,             Logic,      Binary, 9, false, "&&",    &["&"]),
    row(OpCode::Or,              Logic,      Binary, 9, false, "||",    &["|"]),
    row(OpCode::Not,             Logic,      Unary,  1, false, "!",     &[]),

    // relation
    row(OpCode::Equal,           Relation,   Binary, 8, false, "==",    &["="]),
    row(OpCode::Approach,        Relation,   Binary, 8, false, "~=",    &[]),
    row(OpCode::NotEqual,        Relation,   Binary, 8, false, "!=",    &[]),
    row(OpCode::Less,            Relation,   Binary, 7, false, "<",     &[]),
    row(OpCode::LessEqual,       Relation,   Binary, 7, false, "<=",    &[]),
    row(OpCode::Greater,         Relation,   Binary, 7, false, ">",     &[]),
    row(OpCode::GreaterEqual,    Relation,   Binary, 7, false, ">=",    &[]),

    // arithmetic
    row(OpCode::Plus,            Arithmetic, Binary, 5, false, "+",     &[]),
    row(OpCode::Minus,           Arithmetic, Binary, 5, false, "-",     &[]),
    row(OpCode::Multiply,        Arithmetic, Binary, 4, false, "*",     &[]),
    row(OpCode::Divide,          Arithmetic, Binary, 4, false, "/",     &[]),
    row(OpCode::Modulus,         Arithmetic, Binary, 4, false, "%",     &[]),
    row(OpCode::Negative,        Arithmetic, Unary,  3, false, "-",     &[]),
    row(OpCode::Ceil,            Arithmetic, Unary,  1, false, "ceil",  &[]),
    row(OpCode::Floor,           Arithmetic, Unary,  1, false, "floor", &[]),
    row(OpCode::Trunc,           Arithmetic, Unary,  1, false, "trunc", &[]),
    row(OpCode::Round,           Arithmetic, Unary,  1, false, "round", &[]),
    row(OpCode::Rint,            Arithmetic, Unary,  1, false, "rint",  &[]),
    row(OpCode::Abs,             Arithmetic, Unary,  1, false, "abs",   &[]),
    row(OpCode::Phase,           Arithmetic, Unary,  1, false, "arg",   &[]),
    row(OpCode::RealPart,        Arithmetic, Unary,  1, false, "real",  &[]),
    row(OpCode::ImagPart,        Arithmetic, Unary,  1, false, "imag",  &[]),
    row(OpCode::Conjugate,       Arithmetic, Unary,  1, false, "conj",  &[]),
    row(OpCode::Factorial,       Arithmetic, Unary,  2, true,  "~!",    &[]),
    row(OpCode::Gamma,           Arithmetic, Unary,  1, false, "Γ",     &["gamma"]),
    row(OpCode::Permute,         Arithmetic, Binary, 6, false, "pm",    &[]),
    row(OpCode::Combine,         Arithmetic, Binary, 6, false, "cb",    &[]),
    row(OpCode::HypotPair,       Arithmetic, Binary, 6, false, "⊿",     &["hypot"]),
    row(OpCode::Pow,             Arithmetic, Binary, 2, false, "^",     &[]),
    row(OpCode::Exp,             Arithmetic, Unary,  1, false, "exp",   &[]),
    row(OpCode::Log,             Arithmetic, Binary, 2, false, "log",   &[]),
    row(OpCode::Lg,              Arithmetic, Unary,  1, false, "lg",    &[]),
    row(OpCode::Ln,              Arithmetic, Unary,  1, false, "ln",    &[]),
    row(OpCode::Sqrt,            Arithmetic, Unary,  1, false, "√",     &["rt", "sqrt"]),
    row(OpCode::Root,            Arithmetic, Binary, 2, false, "√",     &["rt"]),
    row(OpCode::Polar,           Arithmetic, Binary, 6, false, "∠",     &["pl"]),
    row(OpCode::Degree,          Arithmetic, Unary,  1, true,  "°",     &["deg"]),
    row(OpCode::ToDeg,           Arithmetic, Unary,  1, false, "todeg", &[]),
    row(OpCode::ToRad,           Arithmetic, Unary,  1, false, "torad", &[]),
    row(OpCode::Sin,             Arithmetic, Unary,  1, false, "sin",   &[]),
    row(OpCode::ArcSin,          Arithmetic, Unary,  1, false, "asin",  &[]),
    row(OpCode::Cos,             Arithmetic, Unary,  1, false, "cos",   &[]),
    row(OpCode::ArcCos,          Arithmetic, Unary,  1, false, "acos",  &[]),
    row(OpCode::Tan,             Arithmetic, Unary,  1, false, "tan",   &[]),
    row(OpCode::ArcTan,          Arithmetic, Unary,  1, false, "atan",  &[]),
    row(OpCode::Cot,             Arithmetic, Unary,  1, false, "cot",   &[]),
    row(OpCode::ArcCot,          Arithmetic, Unary,  1, false, "acot",  &[]),
    row(OpCode::Sec,             Arithmetic, Unary,  1, false, "sec",   &[]),
    row(OpCode::ArcSec,          Arithmetic, Unary,  1, false, "asec",  &[]),
    row(OpCode::Csc,             Arithmetic, Unary,  1, false, "csc",   &[]),
    row(OpCode::ArcCsc,          Arithmetic, Unary,  1, false, "acsc",  &[]),
    row(OpCode::Prime,           Arithmetic, Unary,  1, false, "pri",   &[]),
    row(OpCode::Composite,       Arithmetic, Unary,  1, false, "com",   &[]),
    row(OpCode::NthPrime,        Arithmetic, Unary,  1, false, "npri",  &[]),
    row(OpCode::NthComposite,    Arithmetic, Unary,  1, false, "ncom",  &[]),
    row(OpCode::Rand,            Arithmetic, Unary,  1, false, "rand",  &[]),

    // evaluation
    row(OpCode::Count,           Evaluation, Unary,  1, false, "cnt",   &[]),
    row(OpCode::Min,             Evaluation, Unary,  1, false, "min",   &[]),
    row(OpCode::Max,             Evaluation, Unary,  1, false, "max",   &[]),
    row(OpCode::Range,           Evaluation, Unary,  1, false, "range", &[]),
    row(OpCode::Unique,          Evaluation, Unary,  1, false, "uniq",  &[]),
    row(OpCode::Total,           Evaluation, Unary,  1, false, "total", &[]),
    row(OpCode::Mean,            Evaluation, Unary,  1, false, "mean",  &[]),
    row(OpCode::GeometricMean,   Evaluation, Unary,  1, false, "gmean", &[]),
    row(OpCode::QuadraticMean,   Evaluation, Unary,  1, false, "qmean", &[]),
    row(OpCode::HarmonicMean,    Evaluation, Unary,  1, false, "hmean", &[]),
    row(OpCode::Variance,        Evaluation, Unary,  1, false, "var",   &[]),
    row(OpCode::Deviation,       Evaluation, Unary,  1, false, "dev",   &[]),
    row(OpCode::Median,          Evaluation, Unary,  1, false, "med",   &[]),
    row(OpCode::Mode,            Evaluation, Unary,  1, false, "mode",  &[]),
    row(OpCode::Hypot,           Evaluation, Unary,  1, false, "hypot", &[]),
    row(OpCode::Norm,            Evaluation, Unary,  1, false, "norm",  &[]),
    row(OpCode::ZScoreNorm,      Evaluation, Unary,  1, false, "znorm", &[]),
    row(OpCode::Gcd,             Evaluation, Unary,  1, false, "gcd",   &[]),
    row(OpCode::Lcm,             Evaluation, Unary,  1, false, "lcm",   &[]),
    row(OpCode::Dft,             Evaluation, Unary,  1, false, "dft",   &[]),
    row(OpCode::Idft,            Evaluation, Unary,  1, false, "idft",  &[]),
    row(OpCode::Fft,             Evaluation, Unary,  1, false, "fft",   &[]),
    row(OpCode::Ifft,            Evaluation, Unary,  1, false, "ifft",  &[]),
    row(OpCode::Zt,              Evaluation, Unary,  1, false, "zt",    &[]),

    // invocation
    row(OpCode::Generate,        Invocation, Unary,  1, false, "gen",   &[]),
    row(OpCode::Has,             Invocation, Unary,  1, false, "has",   &[]),
    row(OpCode::Pick,            Invocation, Unary,  1, false, "pick",  &[]),
    row(OpCode::Select,          Invocation, Unary,  1, false, "sel",   &[]),
    row(OpCode::Sort,            Invocation, Unary,  1, false, "sort",  &[]),
    row(OpCode::Transform,       Invocation, Unary,  1, false, "trans", &[]),
    row(OpCode::Accumulate,      Invocation, Unary,  1, false, "acc",   &[]),

    // largescale
    row(OpCode::Summate,         LargeScale, Unary,  1, false, "Σ",     &["sum"]),
    row(OpCode::Produce,         LargeScale, Unary,  1, false, "Π",     &["prod"]),
    row(OpCode::Integrate,       LargeScale, Unary,  1, false, "∫",     &["int"]),
    row(OpCode::DoubleIntegrate, LargeScale, Unary,  1, false, "∫∫",    &["int2"]),
    row(OpCode::TripleIntegrate, LargeScale, Unary,  1, false, "∫∫∫",   &["int3"]),
];

/// Catalog row of a built-in. Rows are laid out in `OpCode` order.
pub fn info(code: OpCode) -> &'static OpInfo {
    let row = &CATALOG[code as usize];
    debug_assert_eq!(row.code, code);
    row
}

/// Operator attached to an expression node: catalog attributes plus either a
/// built-in code or a user-function name.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub category: Category,
    pub arity: Arity,
    pub priority: u8,
    pub postfix: bool,
    pub payload: OpPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpPayload {
    Code(OpCode),
    Function(String),
}

impl Operator {
    pub fn builtin(code: OpCode) -> Self {
        let row = info(code);
        Operator {
            category: row.category,
            arity: row.arity,
            priority: row.priority,
            postfix: row.postfix,
            payload: OpPayload::Code(code),
        }
    }

    /// User-defined function call head: unary, tightest priority, not postfix.
    pub fn function(name: impl Into<String>) -> Self {
        Operator {
            category: Category::Function,
            arity: Arity::Unary,
            priority: 1,
            postfix: false,
            payload: OpPayload::Function(name.into()),
        }
    }

    pub fn code(&self) -> Option<OpCode> {
        match &self.payload {
            OpPayload::Code(code) => Some(*code),
            OpPayload::Function(_) => None,
        }
    }

    pub fn function_name(&self) -> Option<&str> {
        match &self.payload {
            OpPayload::Function(name) => Some(name),
            OpPayload::Code(_) => None,
        }
    }

    /// Primary lexeme (the function name for user functions).
    pub fn symbol(&self) -> &str {
        match &self.payload {
            OpPayload::Code(code) => info(*code).symbol,
            OpPayload::Function(name) => name,
        }
    }

    /// Call-like operators take a single parenthesised argument list.
    pub fn is_call_like(&self) -> bool {
        matches!(
            self.category,
            Category::Evaluation | Category::Invocation | Category::LargeScale | Category::Function
        )
    }
}

fn lexeme_table(arity: Arity, postfix: bool) -> Vec<(&'static str, OpCode)> {
    let mut entries: Vec<(&'static str, OpCode)> = Vec::new();
    for row in CATALOG {
        if row.arity != arity || row.postfix != postfix {
            continue;
        }
        entries.push((row.symbol, row.code));
        for alias in row.aliases {
            entries.push((alias, row.code));
        }
    }
    // Longest lexeme first so `<=` beats `<` and `∫∫∫` beats `∫∫`.
    entries.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
    entries
}

lazy_static! {
    /// Prefix unary lexemes, longest first.
    pub static ref PREFIX_LEXEMES: Vec<(&'static str, OpCode)> = lexeme_table(Arity::Unary, false);
    /// Postfix unary lexemes, longest first.
    pub static ref POSTFIX_LEXEMES: Vec<(&'static str, OpCode)> = lexeme_table(Arity::Unary, true);
    /// Binary lexemes, longest first.
    pub static ref BINARY_LEXEMES: Vec<(&'static str, OpCode)> = lexeme_table(Arity::Binary, false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_in_code_order() {
        for (index, row) in CATALOG.iter().enumerate() {
            assert_eq!(
                row.code as usize, index,
                "catalog row {} out of order: {:?}",
                index, row.code
            );
        }
    }

    #[test]
    fn test_info_lookup() {
        let pow = info(OpCode::Pow);
        assert_eq!(pow.symbol, "^");
        assert_eq!(pow.priority, 2);
        assert_eq!(pow.arity, Arity::Binary);

        let fact = info(OpCode::Factorial);
        assert!(fact.postfix);
        assert_eq!(fact.priority, 2);
    }

    #[test]
    fn test_lexeme_tables_are_longest_first() {
        for table in [&*PREFIX_LEXEMES, &*POSTFIX_LEXEMES, &*BINARY_LEXEMES] {
            let lengths: Vec<usize> = table.iter().map(|(s, _)| s.chars().count()).collect();
            let mut sorted = lengths.clone();
            sorted.sort_by(|a, b| b.cmp(a));
            assert_eq!(lengths, sorted);
        }
    }

    #[test]
    fn test_binary_table_prefers_two_char_relations() {
        let le = BINARY_LEXEMES.iter().position(|(s, _)| *s == "<=").unwrap();
        let lt = BINARY_LEXEMES.iter().position(|(s, _)| *s == "<").unwrap();
        assert!(le < lt);
    }

    #[test]
    fn test_operator_constructors() {
        let op = Operator::builtin(OpCode::Summate);
        assert!(op.is_call_like());
        assert_eq!(op.symbol(), "Σ");

        let f = Operator::function("f");
        assert_eq!(f.category, Category::Function);
        assert_eq!(f.function_name(), Some("f"));
        assert!(f.is_call_like());
    }
}
