//! Method AST (spec §3, §4.6): an ordered list of instruction ASTs, one per
//! source line that survives comment-stripping.

use crate::instr_ast::Instruction;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodAst {
    instructions: Vec<Instruction>,
}

impl MethodAst {
    pub fn new() -> Self {
        Self { instructions: Vec::new() }
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
