//! Expression evaluator (spec §4.4): interprets an [`ExprAst`] against a
//! [`Frame`], always producing a fresh, owned [`Value`].
//!
//! A `MemoryAccess` read is, conceptually, a borrow into the frame's memory;
//! this evaluator deep-copies it immediately rather than threading a live
//! borrow through the instruction evaluators, matching the reference
//! implementation's own evaluation helper (see DESIGN.md, component D).

use crate::error::{AgeRunError, AgeRunResult};
use crate::expr_ast::{BinaryOperator, ExprAst, MemoryBase};
use crate::frame::Frame;
use crate::value::{Value, ValueTag};

pub fn eval_expr(ast: &ExprAst, frame: &Frame<'_>) -> AgeRunResult<Value> {
    match ast {
        ExprAst::LiteralInt(value) => Ok(Value::integer(*value)),
        ExprAst::LiteralDouble(value) => Ok(Value::double(*value)),
        ExprAst::LiteralString(value) => Ok(Value::string(value.clone())),
        ExprAst::MemoryAccess { base, path } => eval_memory_access(*base, path, frame),
        ExprAst::BinaryOp { op, left, right } => {
            let left = eval_expr(left, frame)?;
            let right = eval_expr(right, frame)?;
            eval_binary_op(*op, &left, &right)
        }
    }
}

fn eval_memory_access(base: MemoryBase, path: &[String], frame: &Frame<'_>) -> AgeRunResult<Value> {
    let root = match base {
        MemoryBase::Memory => frame.memory(),
        MemoryBase::Context => frame.context(),
        MemoryBase::Message => frame.message(),
    };

    if base == MemoryBase::Message && !root.is_map() && path.is_empty() {
        return Ok(root.deep_copy());
    }

    let joined = path.join(".");
    if joined.is_empty() {
        return Ok(root.deep_copy());
    }
    match root.get_map_path(&joined) {
        Some(value) => Ok(value.deep_copy()),
        None => Err(AgeRunError::path(format!(
            "no value at memory path '{joined}'"
        ))),
    }
}

fn eval_binary_op(op: BinaryOperator, left: &Value, right: &Value) -> AgeRunResult<Value> {
    match op {
        BinaryOperator::Add => numeric_op(left, right, i32::wrapping_add, |a, b| a + b),
        BinaryOperator::Subtract => numeric_op(left, right, i32::wrapping_sub, |a, b| a - b),
        BinaryOperator::Multiply => numeric_op(left, right, i32::wrapping_mul, |a, b| a * b),
        BinaryOperator::Divide => divide(left, right),
        BinaryOperator::Equal => Ok(bool_to_value(values_equal(left, right)?)),
        BinaryOperator::NotEqual => Ok(bool_to_value(!values_equal(left, right)?)),
        BinaryOperator::Less => compare(left, right, std::cmp::Ordering::is_lt),
        BinaryOperator::LessEqual => compare(left, right, std::cmp::Ordering::is_le),
        BinaryOperator::Greater => compare(left, right, std::cmp::Ordering::is_gt),
        BinaryOperator::GreaterEqual => compare(left, right, std::cmp::Ordering::is_ge),
    }
}

fn numeric_op(
    left: &Value,
    right: &Value,
    int_op: impl Fn(i32, i32) -> i32,
    double_op: impl Fn(f64, f64) -> f64,
) -> AgeRunResult<Value> {
    match (left.tag(), right.tag()) {
        (ValueTag::Integer, ValueTag::Integer) => {
            Ok(Value::integer(int_op(left.as_int(), right.as_int())))
        }
        (ValueTag::Double, ValueTag::Double) => {
            Ok(Value::double(double_op(left.as_double(), right.as_double())))
        }
        (a, b) => Err(AgeRunError::arithmetic(format!(
            "cannot apply arithmetic to mismatched tags {a} and {b}"
        ))),
    }
}

fn divide(left: &Value, right: &Value) -> AgeRunResult<Value> {
    match (left.tag(), right.tag()) {
        (ValueTag::Integer, ValueTag::Integer) => {
            let divisor = right.as_int();
            if divisor == 0 {
                return Err(AgeRunError::arithmetic("division by zero"));
            }
            Ok(Value::integer(left.as_int().wrapping_div(divisor)))
        }
        (ValueTag::Double, ValueTag::Double) => {
            let divisor = right.as_double();
            if divisor == 0.0 {
                return Err(AgeRunError::arithmetic("division by zero"));
            }
            Ok(Value::double(left.as_double() / divisor))
        }
        (a, b) => Err(AgeRunError::arithmetic(format!(
            "cannot apply arithmetic to mismatched tags {a} and {b}"
        ))),
    }
}

fn values_equal(left: &Value, right: &Value) -> AgeRunResult<bool> {
    require_same_tag(left, right)?;
    Ok(left == right)
}

fn compare(left: &Value, right: &Value, accept: impl Fn(std::cmp::Ordering) -> bool) -> AgeRunResult<Value> {
    require_same_tag(left, right)?;
    let ordering = match left.tag() {
        ValueTag::Integer => left.as_int().cmp(&right.as_int()),
        ValueTag::Double => left
            .as_double()
            .partial_cmp(&right.as_double())
            .ok_or_else(|| AgeRunError::arithmetic("cannot compare NaN"))?,
        ValueTag::String => left.as_str().cmp(&right.as_str()),
        ValueTag::List | ValueTag::Map => {
            return Err(AgeRunError::arithmetic(
                "ordering comparison is not defined for lists or maps",
            ));
        }
    };
    Ok(bool_to_value(accept(ordering)))
}

fn require_same_tag(left: &Value, right: &Value) -> AgeRunResult<()> {
    if left.tag() == right.tag() {
        Ok(())
    } else {
        Err(AgeRunError::arithmetic(format!(
            "comparison requires matching tags, got {} and {}",
            left.tag(),
            right.tag()
        )))
    }
}

fn bool_to_value(value: bool) -> Value {
    Value::integer(i32::from(value))
}
