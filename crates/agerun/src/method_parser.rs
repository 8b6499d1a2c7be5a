//! Method parser (spec §4.6, §6): splits source into 1-indexed lines on
//! `\n`, `\r`, or `\r\n` (each one line), strips comments, and dispatches
//! each remaining line to the instruction parser.

use crate::error::AgeRunError;
use crate::instr_parser::parse_instruction_with_log;
use crate::log::LogSink;
use crate::method_ast::MethodAst;

/// Parses `source` into a method AST. On failure, returns the 1-based line
/// number alongside the instruction parser's error (spec §4.6).
pub fn parse_method(source: &str) -> Result<MethodAst, (usize, AgeRunError)> {
    parse_method_with_log(source, None)
}

/// Same as [`parse_method`], but passes `log` down to every line's
/// instruction parse so per-line syntax failures are reported as they
/// happen, not just on the line that ultimately aborts the method (spec §6).
pub fn parse_method_with_log(
    source: &str,
    log: Option<&dyn LogSink>,
) -> Result<MethodAst, (usize, AgeRunError)> {
    let mut ast = MethodAst::new();
    for (index, raw_line) in split_lines(source).into_iter().enumerate() {
        let line_number = index + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let code = strip_inline_comment(trimmed).trim();
        if code.is_empty() {
            continue;
        }
        match parse_instruction_with_log(code, log) {
            Ok(instruction) => ast.push(instruction),
            Err(err) => return Err((line_number, err)),
        }
    }
    Ok(ast)
}

/// Splits on `\n`, `\r`, and `\r\n`, each counted as a single separator.
fn split_lines(source: &str) -> Vec<&str> {
    let bytes = source.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\r' => {
                lines.push(&source[start..pos]);
                pos += if bytes.get(pos + 1) == Some(&b'\n') { 2 } else { 1 };
                start = pos;
            }
            b'\n' => {
                lines.push(&source[start..pos]);
                pos += 1;
                start = pos;
            }
            _ => pos += 1,
        }
    }
    lines.push(&source[start..]);
    lines
}

/// An inline comment starts at the first `#` outside a double-quoted string
/// and runs to end of line (spec §6).
fn strip_inline_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        if c == '"' && (i == 0 || bytes[i - 1] != b'\\') {
            in_quotes = !in_quotes;
        } else if c == '#' && !in_quotes {
            return &line[..i];
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instr_ast::InstructionKind;

    #[test]
    fn blank_lines_and_full_line_comments_are_skipped() {
        let ast = parse_method("\n# a comment\n\nmemory.x := 1\n").unwrap();
        assert_eq!(ast.len(), 1);
    }

    #[test]
    fn trailing_comment_outside_quotes_is_stripped() {
        let ast = parse_method("memory.x := 1 # set x").unwrap();
        assert_eq!(ast.len(), 1);
    }

    #[test]
    fn hash_inside_a_string_literal_is_not_a_comment() {
        let ast = parse_method(r#"memory.x := "a#b""#).unwrap();
        assert_eq!(ast.len(), 1);
    }

    #[test]
    fn crlf_and_bare_cr_each_count_as_one_line_separator() {
        let ast = parse_method("memory.x := 1\r\nmemory.y := 2\rmemory.z := 3\n").unwrap();
        assert_eq!(ast.len(), 3);
    }

    #[test]
    fn parse_failure_reports_the_one_based_line_number() {
        let err = parse_method("memory.x := 1\nexit(1, 2)\n").unwrap_err();
        assert_eq!(err.0, 2);
        assert!(matches!(err.1, AgeRunError::Arity { .. }));
    }

    #[test]
    fn with_log_reports_the_failing_lines_syntax_error() {
        use crate::log::VecLogSink;
        let sink = VecLogSink::default();
        let err = parse_method_with_log("memory.x := 1\nexit\n", Some(&sink)).unwrap_err();
        assert_eq!(err.0, 2);
        assert!(matches!(err.1, AgeRunError::Syntax { .. }));
        assert_eq!(sink.entries().len(), 1);
    }

    #[test]
    fn parses_every_instruction_kind_present_in_a_method_body() {
        let ast = parse_method(
            r#"
            memory.x := 1
            memory.sent := send(1, memory.x)
            memory.chosen := if(memory.x, 1, 2)
            memory.ok := compile("m", "memory.x := 1", "1.0.0")
            memory.agent := create("m", "1.0.0")
            memory.killed := destroy(memory.agent)
            memory.gone := deprecate("m", "1.0.0")
            memory.exited := exit(memory.agent)
            memory.r := parse("a={a}", "a=1")
            memory.s := build("a={a}", memory.r)
            "#,
        )
        .unwrap();
        assert_eq!(ast.len(), 10);
        assert_eq!(ast.instructions()[1].kind(), InstructionKind::Send);
        assert_eq!(ast.instructions()[9].kind(), InstructionKind::Build);
    }
}
