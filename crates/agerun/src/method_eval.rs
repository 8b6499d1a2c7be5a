//! Method evaluator (spec §4.6): walks a method AST's instructions in
//! order, invoking the matching instruction evaluator against the frame.
//! Failure of any instruction aborts the method.

use crate::collab::{AgentRegistry, Methodology};
use crate::error::AgeRunResult;
use crate::frame::Frame;
use crate::instr_eval::eval_instruction;
use crate::method_ast::MethodAst;

pub fn eval_method(
    ast: &MethodAst,
    frame: &mut Frame<'_>,
    registry: &mut dyn AgentRegistry,
    methodology: &mut dyn Methodology,
) -> AgeRunResult<()> {
    for instruction in ast.instructions() {
        eval_instruction(instruction, frame, registry, methodology)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::test_doubles::{InMemoryAgentRegistry, InMemoryMethodology};
    use crate::method_parser::parse_method;
    use crate::value::Value;

    #[test]
    fn runs_a_short_method_end_to_end() {
        let ast = parse_method(
            "memory.x := 10\nmemory.y := memory.x + 1\nmemory.s := build(\"y={y}\", memory)\n",
        )
        .unwrap();
        let mut memory = Value::map();
        let context = Value::map();
        let message = Value::integer(0);
        let mut frame = Frame::new(&mut memory, &context, &message);
        let mut registry = InMemoryAgentRegistry::new();
        let mut methodology = InMemoryMethodology::new();
        eval_method(&ast, &mut frame, &mut registry, &mut methodology).unwrap();
        assert_eq!(frame.memory().get_map_path("y").unwrap().as_int(), 11);
        assert_eq!(frame.memory().get_map_path("s").unwrap().as_str(), Some("y=11"));
    }

    #[test]
    fn aborts_the_method_on_the_first_failing_instruction() {
        let ast = parse_method("memory.x := 1\nmemory.y := memory.missing\nmemory.z := 2\n").unwrap();
        let mut memory = Value::map();
        let context = Value::map();
        let message = Value::integer(0);
        let mut frame = Frame::new(&mut memory, &context, &message);
        let mut registry = InMemoryAgentRegistry::new();
        let mut methodology = InMemoryMethodology::new();
        let result = eval_method(&ast, &mut frame, &mut registry, &mut methodology);
        assert!(result.is_err());
        assert!(frame.memory().get_map_path("z").is_none());
    }
}
