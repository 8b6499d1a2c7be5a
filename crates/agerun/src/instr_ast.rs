//! Instruction AST (spec §3, §4.5): an assignment, or one of nine
//! function-call kinds.

use smallvec::SmallVec;
use strum::Display;

use crate::expr_ast::ExprAst;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InstructionKind {
    Assignment,
    Send,
    If,
    Compile,
    Create,
    Destroy,
    Deprecate,
    Exit,
    Parse,
    Build,
}

impl InstructionKind {
    /// The source keyword for this kind, or `None` for `Assignment`, which
    /// has no leading keyword of its own.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            InstructionKind::Assignment => None,
            InstructionKind::Send => Some("send"),
            InstructionKind::If => Some("if"),
            InstructionKind::Compile => Some("compile"),
            InstructionKind::Create => Some("create"),
            InstructionKind::Destroy => Some("destroy"),
            InstructionKind::Deprecate => Some("deprecate"),
            InstructionKind::Exit => Some("exit"),
            InstructionKind::Parse => Some("parse"),
            InstructionKind::Build => Some("build"),
        }
    }

    /// Fixed argument counts for function-call kinds (spec §4.5). `create`
    /// accepts 2 or 3, handled separately by its own parser.
    pub fn expected_arity(self) -> Option<usize> {
        match self {
            InstructionKind::Assignment | InstructionKind::Create => None,
            InstructionKind::Send => Some(2),
            InstructionKind::If => Some(3),
            InstructionKind::Compile => Some(3),
            InstructionKind::Destroy => Some(1),
            InstructionKind::Deprecate => Some(2),
            InstructionKind::Exit => Some(1),
            InstructionKind::Parse => Some(2),
            InstructionKind::Build => Some(2),
        }
    }
}

/// A single executable form within a method.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `memory.<path> := <expression>`.
    Assignment { path: String, expression: ExprAst },
    /// One of the nine function-call kinds.
    FunctionCall {
        kind: InstructionKind,
        name: &'static str,
        args: SmallVec<[ExprAst; 3]>,
        result_path: Option<String>,
    },
}

impl Instruction {
    pub fn kind(&self) -> InstructionKind {
        match self {
            Instruction::Assignment { .. } => InstructionKind::Assignment,
            Instruction::FunctionCall { kind, .. } => *kind,
        }
    }

    pub fn result_path(&self) -> Option<&str> {
        match self {
            Instruction::Assignment { path, .. } => Some(path.as_str()),
            Instruction::FunctionCall { result_path, .. } => result_path.as_deref(),
        }
    }
}
