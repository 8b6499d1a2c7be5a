#![doc = include_str!("../../../README.md")]

pub mod collab;
pub mod error;
pub mod expr_ast;
pub mod expr_eval;
pub mod expr_parser;
pub mod frame;
mod heap;
pub mod instr_ast;
pub mod instr_eval;
pub mod instr_parser;
pub mod log;
pub mod method_ast;
pub mod method_eval;
pub mod method_parser;
pub mod path;
pub mod value;

pub use crate::{
    collab::{AgentRegistry, Methodology},
    error::{AgeRunError, AgeRunResult},
    expr_ast::{BinaryOperator, ExprAst, MemoryBase},
    expr_eval::eval_expr,
    expr_parser::ExprParser,
    frame::{Frame, Memory},
    heap::{HeapDiff, HeapStats},
    instr_ast::{Instruction, InstructionKind},
    instr_eval::eval_instruction,
    instr_parser::{parse_instruction, parse_instruction_with_log},
    log::{LogSink, NoLogSink, VecLogSink},
    method_ast::MethodAst,
    method_eval::eval_method,
    method_parser::{parse_method, parse_method_with_log},
    path::Path,
    value::{OwnerId, Value, ValueTag},
};
