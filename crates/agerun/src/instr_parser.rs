//! Per-kind instruction parsers (spec §4.5), built from one shared skeleton:
//! skip whitespace, optionally consume a `memory.… :=` prefix, match the
//! function keyword, extract raw comma-separated arguments (honoring quotes
//! and nested parens), re-parse each as an expression, and check there is no
//! trailing content.
//!
//! The reference implementation repeats this skeleton once per instruction
//! kind across ten separate source files; this crate keeps only the
//! kind-specific keyword/arity as data and shares the rest (see DESIGN.md).

use crate::error::{AgeRunError, AgeRunResult};
use crate::expr_parser::ExprParser;
use crate::instr_ast::{Instruction, InstructionKind};
use crate::log::LogSink;

/// Parse one already-trimmed, comment-stripped source line into an
/// instruction AST.
pub fn parse_instruction(line: &str) -> AgeRunResult<Instruction> {
    parse_instruction_with_log(line, None)
}

/// Same as [`parse_instruction`], but reports every syntax failure to `log`
/// before returning it, and passes `log` down into the expression parser for
/// each argument and right-hand side it parses (spec §6).
pub fn parse_instruction_with_log(line: &str, log: Option<&dyn LogSink>) -> AgeRunResult<Instruction> {
    let start = skip_ws(line, 0);
    let (result_path, rhs_start) = extract_assignment_prefix(line, start);

    for kind in FUNCTION_KINDS {
        if match_keyword(line, rhs_start, kind.keyword().unwrap()) {
            return parse_function_call(line, rhs_start, *kind, result_path, log);
        }
    }

    match result_path {
        Some(path) => parse_plain_assignment(line, path, rhs_start, log),
        None => {
            let message = "expected an instruction (assignment or function call)";
            if let Some(log) = log {
                log.error_at(message, start);
            }
            Err(AgeRunError::syntax(message, start))
        }
    }
}

const FUNCTION_KINDS: &[InstructionKind] = &[
    InstructionKind::Send,
    InstructionKind::If,
    InstructionKind::Compile,
    InstructionKind::Create,
    InstructionKind::Destroy,
    InstructionKind::Deprecate,
    InstructionKind::Exit,
    InstructionKind::Parse,
    InstructionKind::Build,
];

fn parse_plain_assignment(
    line: &str,
    path: String,
    rhs_start: usize,
    log: Option<&dyn LogSink>,
) -> AgeRunResult<Instruction> {
    if !path.starts_with("memory.") && path != "memory" {
        return Err(AgeRunError::path(format!(
            "assignment target '{path}' must begin with 'memory.'"
        )));
    }
    let rhs = &line[rhs_start..];
    let expression = ExprParser::with_log(rhs, log).parse_expression()?;
    Ok(Instruction::Assignment { path, expression })
}

fn parse_function_call(
    line: &str,
    rhs_start: usize,
    kind: InstructionKind,
    result_path: Option<String>,
    log: Option<&dyn LogSink>,
) -> AgeRunResult<Instruction> {
    let keyword = kind.keyword().expect("function kinds always have a keyword");
    let mut pos = rhs_start + keyword.len();
    pos = skip_ws(line, pos);
    if line.as_bytes().get(pos) != Some(&b'(') {
        let message = format!("expected '(' after '{keyword}'");
        if let Some(log) = log {
            log.error_at(&message, pos);
        }
        return Err(AgeRunError::syntax(message, pos));
    }
    pos += 1;

    let (raw_args, pos) = extract_arguments(line, pos, log)?;
    check_arity(kind, raw_args.len())?;

    let trailing = skip_ws(line, pos);
    if trailing != line.len() {
        let message = "unexpected characters after function call";
        if let Some(log) = log {
            log.error_at(message, trailing);
        }
        return Err(AgeRunError::syntax(message, trailing));
    }

    let args = raw_args
        .iter()
        .map(|raw| ExprParser::with_log(raw, log).parse_expression())
        .collect::<AgeRunResult<smallvec::SmallVec<[_; 3]>>>()?;

    if let Some(path) = &result_path {
        if !path.starts_with("memory.") && path != "memory" {
            return Err(AgeRunError::path(format!(
                "assignment target '{path}' must begin with 'memory.'"
            )));
        }
    }

    Ok(Instruction::FunctionCall {
        kind,
        name: keyword,
        args,
        result_path,
    })
}

fn check_arity(kind: InstructionKind, actual: usize) -> AgeRunResult<()> {
    if kind == InstructionKind::Create {
        return if actual == 2 || actual == 3 {
            Ok(())
        } else {
            Err(AgeRunError::arity(2, actual))
        };
    }
    let expected = kind
        .expected_arity()
        .expect("non-create function kinds have a fixed arity");
    if actual == expected {
        Ok(())
    } else {
        Err(AgeRunError::arity(expected, actual))
    }
}

/// `strstr`-style unconditional search for the first `:=`, matching the
/// reference implementation (not quote-aware; see DESIGN.md).
fn extract_assignment_prefix(line: &str, start: usize) -> (Option<String>, usize) {
    match line.find(":=") {
        Some(idx) if idx >= start => {
            let path = line[start..idx].trim().to_string();
            let after = skip_ws(line, idx + 2);
            (Some(path), after)
        }
        _ => (None, start),
    }
}

fn match_keyword(line: &str, pos: usize, keyword: &str) -> bool {
    if pos > line.len() || !line[pos..].starts_with(keyword) {
        return false;
    }
    match line[pos + keyword.len()..].chars().next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => false,
        _ => true,
    }
}

/// Extracts the comma-separated raw argument strings between an already
/// consumed opening paren and its matching closing paren, honoring quotes
/// (backslash-escaped, same convention as the string literal scanner) and
/// nested parens. Returns the arguments and the position right after the
/// closing paren.
fn extract_arguments(
    line: &str,
    start: usize,
    log: Option<&dyn LogSink>,
) -> AgeRunResult<(Vec<String>, usize)> {
    let bytes = line.as_bytes();
    let mut pos = skip_ws(line, start);
    let mut current_start = pos;
    let mut args = Vec::new();
    let mut depth: i32 = 0;
    let mut in_quotes = false;

    loop {
        if pos >= line.len() {
            let message = "unterminated argument list";
            if let Some(log) = log {
                log.error_at(message, pos);
            }
            return Err(AgeRunError::syntax(message, pos));
        }
        let c = line[pos..].chars().next().expect("pos < line.len()");

        if c == '"' && (pos == 0 || bytes[pos - 1] != b'\\') {
            in_quotes = !in_quotes;
            pos += c.len_utf8();
            continue;
        }
        if !in_quotes {
            match c {
                '(' => {
                    depth += 1;
                    pos += 1;
                    continue;
                }
                ')' if depth > 0 => {
                    depth -= 1;
                    pos += 1;
                    continue;
                }
                ')' => {
                    let raw = line[current_start..pos].trim();
                    if !(args.is_empty() && raw.is_empty()) {
                        args.push(raw.to_string());
                    }
                    return Ok((args, pos + 1));
                }
                ',' if depth == 0 => {
                    args.push(line[current_start..pos].trim().to_string());
                    pos += 1;
                    pos = skip_ws(line, pos);
                    current_start = pos;
                    continue;
                }
                _ => {}
            }
        }
        pos += c.len_utf8();
    }
}

fn skip_ws(line: &str, pos: usize) -> usize {
    let mut pos = pos;
    while let Some(c) = line[pos..].chars().next() {
        if c.is_whitespace() {
            pos += c.len_utf8();
        } else {
            break;
        }
    }
    pos
}
