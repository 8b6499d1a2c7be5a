//! Instruction evaluators (spec §4.7), one per instruction kind, sharing a
//! fixed six-step protocol: verify the kind tag, extract arguments, evaluate
//! and materialize each via the expression evaluator, validate tags, perform
//! the effect, then store-or-destroy the result.

use crate::collab::{AgentRegistry, Methodology};
use crate::error::{AgeRunError, AgeRunResult};
use crate::expr_eval::eval_expr;
use crate::frame::Frame;
use crate::instr_ast::{Instruction, InstructionKind};
use crate::value::{Value, ValueTag};

pub fn eval_instruction(
    instr: &Instruction,
    frame: &mut Frame<'_>,
    registry: &mut dyn AgentRegistry,
    methodology: &mut dyn Methodology,
) -> AgeRunResult<()> {
    match instr {
        Instruction::Assignment { path, expression } => eval_assignment(path, expression, frame),
        Instruction::FunctionCall {
            kind,
            args,
            result_path,
            ..
        } => eval_function_call(*kind, args, result_path.as_deref(), frame, registry, methodology),
    }
}

fn eval_assignment(path: &str, expression: &crate::expr_ast::ExprAst, frame: &mut Frame<'_>) -> AgeRunResult<()> {
    let value = eval_expr(expression, frame)?;
    store_result(path, value, frame)
}

fn eval_function_call(
    kind: InstructionKind,
    args: &[crate::expr_ast::ExprAst],
    result_path: Option<&str>,
    frame: &mut Frame<'_>,
    registry: &mut dyn AgentRegistry,
    methodology: &mut dyn Methodology,
) -> AgeRunResult<()> {
    let result = match kind {
        InstructionKind::Assignment => {
            unreachable!("Assignment is handled by eval_assignment")
        }
        InstructionKind::Send => eval_send(args, frame, registry)?,
        InstructionKind::If => return eval_if(args, result_path, frame),
        InstructionKind::Compile => eval_compile(args, frame, methodology)?,
        InstructionKind::Create => eval_create(args, frame, registry)?,
        InstructionKind::Destroy => eval_destroy(args, frame, registry)?,
        InstructionKind::Deprecate => eval_deprecate(args, frame, methodology)?,
        InstructionKind::Exit => eval_exit(args, frame, registry)?,
        InstructionKind::Parse => eval_parse(args, frame)?,
        InstructionKind::Build => eval_build(args, frame)?,
    };
    dispose_result(result, result_path, frame)
}

/// Stores the result into memory (claiming ownership for the map), or
/// destroys it when the instruction has no result path (step 6, spec §4.7).
fn dispose_result(result: Value, result_path: Option<&str>, frame: &mut Frame<'_>) -> AgeRunResult<()> {
    match result_path {
        Some(path) => store_result(path, result, frame),
        None => result.destroy(),
    }
}

fn store_result(path: &str, value: Value, frame: &mut Frame<'_>) -> AgeRunResult<()> {
    let suffix = path
        .strip_prefix("memory.")
        .or_else(|| (path == "memory").then_some(""))
        .ok_or_else(|| AgeRunError::path(format!("result path '{path}' must begin with 'memory.'")))?;
    if suffix.is_empty() {
        return Err(AgeRunError::path("cannot assign to the memory root itself"));
    }
    frame.memory_mut().set_map_path(suffix, value)
}

fn expect_string(value: Value, label: &str, kind: InstructionKind) -> AgeRunResult<String> {
    if value.tag() != ValueTag::String {
        value.destroy().ok();
        return Err(AgeRunError::type_error(format!("{label} must be a string"), kind));
    }
    Ok(value.as_str().expect("checked string tag").to_string())
}

fn expect_int(value: Value, label: &str, kind: InstructionKind) -> AgeRunResult<i32> {
    if value.tag() != ValueTag::Integer {
        value.destroy().ok();
        return Err(AgeRunError::type_error(format!("{label} must be an integer"), kind));
    }
    Ok(value.as_int())
}

fn bool_to_value(value: bool) -> Value {
    Value::integer(i32::from(value))
}

fn eval_send(args: &[crate::expr_ast::ExprAst], frame: &Frame<'_>, registry: &mut dyn AgentRegistry) -> AgeRunResult<Value> {
    let agent_id = expect_int(eval_expr(&args[0], frame)?, "agent id", InstructionKind::Send)?;
    let message = eval_expr(&args[1], frame)?;
    let delivered = registry.enqueue(agent_id, message)?;
    Ok(bool_to_value(delivered))
}

/// `if` only evaluates the selected branch (spec §4.7): the condition
/// decides first, then exactly one of the two branch expressions runs.
fn eval_if(args: &[crate::expr_ast::ExprAst], result_path: Option<&str>, frame: &mut Frame<'_>) -> AgeRunResult<()> {
    let condition = eval_expr(&args[0], frame)?;
    let truthy = is_truthy(&condition);
    condition.destroy()?;
    let branch = if truthy { &args[1] } else { &args[2] };
    let result = eval_expr(branch, frame)?;
    dispose_result(result, result_path, frame)
}

/// Integer `0` or empty string is false; everything else, including any
/// list/map/double, is true (spec §4.7).
fn is_truthy(value: &Value) -> bool {
    match value.tag() {
        ValueTag::Integer => value.as_int() != 0,
        ValueTag::String => !value.as_str().unwrap_or_default().is_empty(),
        _ => true,
    }
}

fn eval_compile(args: &[crate::expr_ast::ExprAst], frame: &Frame<'_>, methodology: &mut dyn Methodology) -> AgeRunResult<Value> {
    let name = expect_string(eval_expr(&args[0], frame)?, "method name", InstructionKind::Compile)?;
    let body = expect_string(eval_expr(&args[1], frame)?, "method body", InstructionKind::Compile)?;
    let version = expect_string(eval_expr(&args[2], frame)?, "method version", InstructionKind::Compile)?;
    let accepted = methodology.compile(&name, &body, &version)?;
    Ok(bool_to_value(accepted))
}

fn eval_create(args: &[crate::expr_ast::ExprAst], frame: &Frame<'_>, registry: &mut dyn AgentRegistry) -> AgeRunResult<Value> {
    let name = expect_string(eval_expr(&args[0], frame)?, "method name", InstructionKind::Create)?;
    let version = expect_string(eval_expr(&args[1], frame)?, "method version", InstructionKind::Create)?;
    let context = match args.get(2) {
        Some(expr) => {
            let value = eval_expr(expr, frame)?;
            if value.tag() != ValueTag::Map {
                value.destroy().ok();
                return Err(AgeRunError::type_error("context must be a map", InstructionKind::Create));
            }
            value
        }
        None => Value::map(),
    };
    let agent_id = registry.spawn(&name, &version, context)?;
    Ok(Value::integer(agent_id))
}

fn eval_destroy(args: &[crate::expr_ast::ExprAst], frame: &Frame<'_>, registry: &mut dyn AgentRegistry) -> AgeRunResult<Value> {
    let agent_id = expect_int(eval_expr(&args[0], frame)?, "agent id", InstructionKind::Destroy)?;
    let killed = registry.kill(agent_id)?;
    Ok(bool_to_value(killed))
}

fn eval_deprecate(args: &[crate::expr_ast::ExprAst], frame: &Frame<'_>, methodology: &mut dyn Methodology) -> AgeRunResult<Value> {
    let name = expect_string(eval_expr(&args[0], frame)?, "method name", InstructionKind::Deprecate)?;
    let version = expect_string(eval_expr(&args[1], frame)?, "method version", InstructionKind::Deprecate)?;
    let removed = methodology.deprecate(&name, &version)?;
    Ok(bool_to_value(removed))
}

fn eval_exit(args: &[crate::expr_ast::ExprAst], frame: &Frame<'_>, registry: &mut dyn AgentRegistry) -> AgeRunResult<Value> {
    let agent_id = expect_int(eval_expr(&args[0], frame)?, "agent id", InstructionKind::Exit)?;
    let killed = registry.kill(agent_id)?;
    Ok(bool_to_value(killed))
}

/// Scans `template` as literal chunks separated by `{name}` placeholders,
/// matching each literal chunk exactly against `input` and classifying the
/// text captured for each placeholder as int, double, or string.
fn eval_parse(args: &[crate::expr_ast::ExprAst], frame: &Frame<'_>) -> AgeRunResult<Value> {
    let template = expect_string(eval_expr(&args[0], frame)?, "template", InstructionKind::Parse)?;
    let input = expect_string(eval_expr(&args[1], frame)?, "input", InstructionKind::Parse)?;
    Ok(parse_template(&template, &input))
}

struct TemplateToken<'a> {
    literal: &'a str,
    placeholder: Option<&'a str>,
}

/// Splits `template` into literal/placeholder pairs. Stops at an unterminated
/// `{` (treated as the final token, with no placeholder).
fn tokenize_template(template: &str) -> Vec<TemplateToken<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    loop {
        let brace = template[pos..].find('{').map(|i| pos + i);
        let literal_end = brace.unwrap_or(template.len());
        let literal = &template[pos..literal_end];
        match brace {
            None => {
                tokens.push(TemplateToken { literal, placeholder: None });
                return tokens;
            }
            Some(brace) => match template[brace..].find('}') {
                Some(close_rel) => {
                    let name = &template[brace + 1..brace + close_rel];
                    tokens.push(TemplateToken { literal, placeholder: Some(name) });
                    pos = brace + close_rel + 1;
                    if pos >= template.len() {
                        return tokens;
                    }
                }
                None => {
                    tokens.push(TemplateToken { literal, placeholder: None });
                    return tokens;
                }
            },
        }
    }
}

/// A literal chunk not found at the expected input position is a whole-parse
/// mismatch: the result is a fresh empty map, discarding anything captured so
/// far (spec §4.7). An unterminated `{` only truncates the token list, so a
/// partial map can still come back from the tokens gathered before it.
fn parse_template(template: &str, input: &str) -> Value {
    let tokens = tokenize_template(template);
    let mut result = Value::map();
    let mut in_pos = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        if !token.literal.is_empty() {
            match input[in_pos..].find(token.literal) {
                Some(0) => in_pos += token.literal.len(),
                _ => return Value::map(),
            }
        }
        let Some(name) = token.placeholder else { continue };
        let next_literal = tokens.get(i + 1).map_or("", |t| t.literal);
        let captured_end = if next_literal.is_empty() {
            input.len()
        } else {
            match input[in_pos..].find(next_literal) {
                Some(offset) => in_pos + offset,
                None => return Value::map(),
            }
        };
        let captured = &input[in_pos..captured_end];
        in_pos = captured_end;
        result
            .set_map_path(name, classify(captured))
            .expect("result is a freshly constructed map with flat keys");
    }
    result
}

fn classify(text: &str) -> Value {
    if let Ok(i) = text.parse::<i32>() {
        return Value::integer(i);
    }
    if text.contains('.') {
        if let Ok(d) = text.parse::<f64>() {
            return Value::double(d);
        }
    }
    Value::string(text.to_string())
}

/// Substitutes each `{name}` placeholder with `values[name]`'s template
/// coercion (spec §4.1); unresolved placeholders and an unclosed `{` are
/// copied through verbatim.
fn eval_build(args: &[crate::expr_ast::ExprAst], frame: &Frame<'_>) -> AgeRunResult<Value> {
    let template = expect_string(eval_expr(&args[0], frame)?, "template", InstructionKind::Build)?;
    let values = eval_expr(&args[1], frame)?;
    if values.tag() != ValueTag::Map {
        values.destroy().ok();
        return Err(AgeRunError::type_error("values must be a map", InstructionKind::Build));
    }
    let built = build_template(&template, &values);
    values.destroy()?;
    Ok(Value::string(built))
}

fn build_template(template: &str, values: &Value) -> String {
    let mut out = String::new();
    let mut pos = 0usize;
    while let Some(rel) = template[pos..].find('{') {
        let brace_at = pos + rel;
        out.push_str(&template[pos..brace_at]);
        match template[brace_at..].find('}') {
            Some(close_rel) => {
                let name = &template[brace_at + 1..brace_at + close_rel];
                match values.get_map_path(name).and_then(Value::coerce_to_template_text) {
                    Some(text) => out.push_str(&text),
                    None => out.push_str(&template[brace_at..brace_at + close_rel + 1]),
                }
                pos = brace_at + close_rel + 1;
            }
            None => {
                out.push('{');
                pos = brace_at + 1;
            }
        }
    }
    out.push_str(&template[pos..]);
    out
}
