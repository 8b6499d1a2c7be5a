//! Expression AST (spec §3, §4.3): five variants, recursive-descent built.

use smallvec::SmallVec;
use strum::Display;

/// Base accessor for a memory access (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MemoryBase {
    #[strum(serialize = "memory")]
    Memory,
    #[strum(serialize = "message")]
    Message,
    #[strum(serialize = "context")]
    Context,
}

/// Binary operators: arithmetic and comparison (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BinaryOperator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "=")]
    Equal,
    #[strum(serialize = "<>")]
    NotEqual,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEqual,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEqual,
}

/// An expression AST node. Nodes own their children.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprAst {
    LiteralInt(i32),
    LiteralDouble(f64),
    LiteralString(String),
    MemoryAccess {
        base: MemoryBase,
        path: SmallVec<[String; 4]>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<ExprAst>,
        right: Box<ExprAst>,
    },
}

impl ExprAst {
    pub fn binary_op(op: BinaryOperator, left: ExprAst, right: ExprAst) -> Self {
        ExprAst::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}
