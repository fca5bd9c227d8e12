//! Default behaviour of the arithmetic, bitwise and comparison operators.
//!
//! Everything here is hook free. Instances are handled by the interpreter,
//! which only falls back to these functions once an overload is absent.

use std::{cmp::Ordering, rc::Rc};

use compact_str::{CompactString, CompactStringExt};

use super::{error::RuntimeErrorKind, List, Value};
use crate::parser::expression::{InfixOperator, PrefixOperator};

type BinaryResult = Result<Value, RuntimeErrorKind>;

fn unsupported(operator: InfixOperator, lhs: &Value, rhs: &Value) -> RuntimeErrorKind {
    RuntimeErrorKind::UnsupportedOperands {
        operator: operator.symbol(),
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}

fn overflow(operator: InfixOperator) -> RuntimeErrorKind {
    RuntimeErrorKind::Overflow(operator.symbol())
}

/// Both operands as floats when at least one of them is a float.
fn as_floats(lhs: &Value, rhs: &Value) -> Option<(f64, f64)> {
    match (lhs, rhs) {
        (Value::Float(l), Value::Float(r)) => Some((*l, *r)),
        (Value::Int(l), Value::Float(r)) => Some((*l as f64, *r)),
        (Value::Float(l), Value::Int(r)) => Some((*l, *r as f64)),
        _ => None,
    }
}

pub fn binary(operator: InfixOperator, lhs: &Value, rhs: &Value) -> BinaryResult {
    match operator {
        InfixOperator::Add => add(lhs, rhs),
        InfixOperator::Subtract => subtract(lhs, rhs),
        InfixOperator::Multiply => multiply(lhs, rhs),
        InfixOperator::Divide => divide(lhs, rhs),
        InfixOperator::FloorDivide => floor_divide(lhs, rhs),
        InfixOperator::Modulo => modulo(lhs, rhs),
        InfixOperator::Power => power(lhs, rhs),
        InfixOperator::BitAnd | InfixOperator::BitOr | InfixOperator::BitXor => {
            bitwise(operator, lhs, rhs)
        }
        InfixOperator::ShiftLeft | InfixOperator::ShiftRight => shift(operator, lhs, rhs),
        InfixOperator::LessThan
        | InfixOperator::LessThanEqual
        | InfixOperator::GreaterThan
        | InfixOperator::GreaterThanEqual => compare(operator, lhs, rhs),
        InfixOperator::EqualEqual => Ok(Value::Bool(lhs.is_equal(rhs))),
        InfixOperator::BangEqual => Ok(Value::Bool(!lhs.is_equal(rhs))),
    }
}

pub fn add(lhs: &Value, rhs: &Value) -> BinaryResult {
    match (lhs, rhs) {
        (Value::Int(l), Value::Int(r)) => l
            .checked_add(*r)
            .map(Value::Int)
            .ok_or(overflow(InfixOperator::Add)),
        (Value::String(l), Value::String(r)) => Ok(Value::String([l, r].concat_compact())),
        (Value::List(l), Value::List(r)) => {
            let mut elements = l.snapshot();
            elements.extend(r.snapshot());
            Ok(Value::List(Rc::new(List::new(elements))))
        }
        _ => match as_floats(lhs, rhs) {
            Some((l, r)) => Ok(Value::Float(l + r)),
            None => Err(unsupported(InfixOperator::Add, lhs, rhs)),
        },
    }
}

pub fn subtract(lhs: &Value, rhs: &Value) -> BinaryResult {
    match (lhs, rhs) {
        (Value::Int(l), Value::Int(r)) => l
            .checked_sub(*r)
            .map(Value::Int)
            .ok_or(overflow(InfixOperator::Subtract)),
        _ => match as_floats(lhs, rhs) {
            Some((l, r)) => Ok(Value::Float(l - r)),
            None => Err(unsupported(InfixOperator::Subtract, lhs, rhs)),
        },
    }
}

/// Upper bound on the length of a repeated string or list and of a `range`.
pub const MAX_SEQUENCE_LENGTH: usize = 1 << 28;

/// How many times a sequence of `length` can be repeated `count` times.
/// Negative counts repeat zero times.
fn repeat_count(length: usize, count: i64) -> Result<usize, RuntimeErrorKind> {
    let count = usize::try_from(count).unwrap_or(0);
    if length == 0 {
        return Ok(0);
    }
    match length.checked_mul(count) {
        Some(total) if total <= MAX_SEQUENCE_LENGTH => Ok(count),
        _ => Err(overflow(InfixOperator::Multiply)),
    }
}

fn repeat_string(text: &CompactString, count: i64) -> BinaryResult {
    let count = repeat_count(text.len(), count)?;
    Ok(Value::String(text.repeat(count).into()))
}

pub fn multiply(lhs: &Value, rhs: &Value) -> BinaryResult {
    match (lhs, rhs) {
        (Value::Int(l), Value::Int(r)) => l
            .checked_mul(*r)
            .map(Value::Int)
            .ok_or(overflow(InfixOperator::Multiply)),
        (Value::String(text), Value::Int(count)) | (Value::Int(count), Value::String(text)) => {
            repeat_string(text, *count)
        }
        (Value::List(list), Value::Int(count)) | (Value::Int(count), Value::List(list)) => {
            let elements = list.snapshot();
            let count = repeat_count(elements.len(), *count)?;
            let mut repeated = Vec::with_capacity(elements.len() * count);
            for _ in 0..count {
                repeated.extend(elements.iter().cloned());
            }
            Ok(Value::List(Rc::new(List::new(repeated))))
        }
        _ => match as_floats(lhs, rhs) {
            Some((l, r)) => Ok(Value::Float(l * r)),
            None => Err(unsupported(InfixOperator::Multiply, lhs, rhs)),
        },
    }
}

pub fn divide(lhs: &Value, rhs: &Value) -> BinaryResult {
    let (l, r) = match (lhs, rhs) {
        (Value::Int(l), Value::Int(r)) => (*l as f64, *r as f64),
        _ => as_floats(lhs, rhs).ok_or_else(|| unsupported(InfixOperator::Divide, lhs, rhs))?,
    };
    if r == 0.0 {
        return Err(RuntimeErrorKind::DivByZero);
    }
    Ok(Value::Float(l / r))
}

pub fn floor_divide(lhs: &Value, rhs: &Value) -> BinaryResult {
    match (lhs, rhs) {
        (Value::Int(l), Value::Int(r)) => {
            if *r == 0 {
                return Err(RuntimeErrorKind::DivByZero);
            }
            floor_div_int(*l, *r)
                .map(Value::Int)
                .ok_or(overflow(InfixOperator::FloorDivide))
        }
        _ => match as_floats(lhs, rhs) {
            Some((_, r)) if r == 0.0 => Err(RuntimeErrorKind::DivByZero),
            Some((l, r)) => Ok(Value::Float((l / r).floor())),
            None => Err(unsupported(InfixOperator::FloorDivide, lhs, rhs)),
        },
    }
}

pub fn modulo(lhs: &Value, rhs: &Value) -> BinaryResult {
    match (lhs, rhs) {
        (Value::Int(l), Value::Int(r)) => {
            if *r == 0 {
                return Err(RuntimeErrorKind::DivByZero);
            }
            Ok(Value::Int(mod_int(*l, *r)))
        }
        _ => match as_floats(lhs, rhs) {
            Some((_, r)) if r == 0.0 => Err(RuntimeErrorKind::DivByZero),
            Some((l, r)) => Ok(Value::Float(mod_float(l, r))),
            None => Err(unsupported(InfixOperator::Modulo, lhs, rhs)),
        },
    }
}

/// Integer division rounding towards negative infinity. `None` on overflow.
pub fn floor_div_int(lhs: i64, rhs: i64) -> Option<i64> {
    let quotient = lhs.checked_div(rhs)?;
    if (lhs % rhs != 0) && ((lhs < 0) != (rhs < 0)) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}

/// Remainder taking the sign of the divisor.
pub fn mod_int(lhs: i64, rhs: i64) -> i64 {
    // `i64::MIN % -1` overflows even though the result is zero.
    let remainder = lhs.checked_rem(rhs).unwrap_or(0);
    if remainder != 0 && ((remainder < 0) != (rhs < 0)) {
        remainder + rhs
    } else {
        remainder
    }
}

fn mod_float(lhs: f64, rhs: f64) -> f64 {
    let remainder = lhs % rhs;
    if remainder != 0.0 && ((remainder < 0.0) != (rhs < 0.0)) {
        remainder + rhs
    } else {
        remainder
    }
}

pub fn power(lhs: &Value, rhs: &Value) -> BinaryResult {
    match (lhs, rhs) {
        (Value::Int(base), Value::Int(exponent)) => {
            if *exponent < 0 {
                return Err(RuntimeErrorKind::DivByZero);
            }
            let Ok(exponent) = u32::try_from(*exponent) else {
                // Only 0, 1 and -1 stay in range for exponents this large.
                return match *base {
                    0 | 1 => Ok(Value::Int(*base)),
                    -1 if exponent % 2 == 0 => Ok(Value::Int(1)),
                    -1 => Ok(Value::Int(-1)),
                    _ => Err(overflow(InfixOperator::Power)),
                };
            };
            base.checked_pow(exponent)
                .map(Value::Int)
                .ok_or(overflow(InfixOperator::Power))
        }
        _ => match as_floats(lhs, rhs) {
            Some((l, r)) => Ok(Value::Float(l.powf(r))),
            None => Err(unsupported(InfixOperator::Power, lhs, rhs)),
        },
    }
}

fn bitwise(operator: InfixOperator, lhs: &Value, rhs: &Value) -> BinaryResult {
    let value = match (lhs, rhs) {
        (Value::Int(l), Value::Int(r)) => match operator {
            InfixOperator::BitAnd => Value::Int(l & r),
            InfixOperator::BitOr => Value::Int(l | r),
            _ => Value::Int(l ^ r),
        },
        (Value::Bool(l), Value::Bool(r)) => match operator {
            InfixOperator::BitAnd => Value::Bool(l & r),
            InfixOperator::BitOr => Value::Bool(l | r),
            _ => Value::Bool(l ^ r),
        },
        _ => return Err(unsupported(operator, lhs, rhs)),
    };
    Ok(value)
}

fn shift(operator: InfixOperator, lhs: &Value, rhs: &Value) -> BinaryResult {
    let (Value::Int(value), Value::Int(count)) = (lhs, rhs) else {
        return Err(unsupported(operator, lhs, rhs));
    };
    if !(0..64).contains(count) {
        return Err(overflow(operator));
    }
    let count = *count as u32;
    let shifted = match operator {
        InfixOperator::ShiftLeft => {
            let shifted = value << count;
            if shifted >> count != *value {
                return Err(overflow(operator));
            }
            shifted
        }
        _ => value >> count,
    };
    Ok(Value::Int(shifted))
}

/// Ordering of numbers and strings. `None` for anything else.
pub fn partial_order(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => {
            let (l, r) = as_floats(lhs, rhs)?;
            l.partial_cmp(&r)
        }
    }
}

fn compare(operator: InfixOperator, lhs: &Value, rhs: &Value) -> BinaryResult {
    let comparable = matches!(
        (lhs, rhs),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_))
            | (Value::String(_), Value::String(_))
    );
    if !comparable {
        return Err(unsupported(operator, lhs, rhs));
    }
    // NaN compares false with everything.
    let result = match partial_order(lhs, rhs) {
        None => false,
        Some(ordering) => match operator {
            InfixOperator::LessThan => ordering.is_lt(),
            InfixOperator::LessThanEqual => ordering.is_le(),
            InfixOperator::GreaterThan => ordering.is_gt(),
            _ => ordering.is_ge(),
        },
    };
    Ok(Value::Bool(result))
}

pub fn unary(operator: PrefixOperator, operand: &Value) -> BinaryResult {
    let unsupported = || RuntimeErrorKind::UnsupportedOperand {
        operator: operator.symbol(),
        operand: operand.type_name(),
    };
    match (operator, operand) {
        (PrefixOperator::Bang, value) => Ok(Value::Bool(!value.is_truthy())),
        (PrefixOperator::Plus, Value::Int(_) | Value::Float(_)) => Ok(operand.clone()),
        (PrefixOperator::Minus, Value::Int(v)) => v
            .checked_neg()
            .map(Value::Int)
            .ok_or(RuntimeErrorKind::Overflow(operator.symbol())),
        (PrefixOperator::Minus, Value::Float(v)) => Ok(Value::Float(-v)),
        (PrefixOperator::Tilde, Value::Int(v)) => Ok(Value::Int(!v)),
        _ => Err(unsupported()),
    }
}

/// Renders a float the way Python's `repr` does.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".into();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.into();
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let text = format!("{value:e}");
        let (mantissa, exponent) = text.split_once('e').unwrap_or((&text, "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }
    let text = format!("{value}");
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_render_like_python() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(-0.0), "-0.0");
        assert_eq!(format_float(2.0 / 3.0), "0.6666666666666666");
        assert_eq!(format_float(1e20), "1e+20");
        assert_eq!(format_float(1.5e-5), "1.5e-05");
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(f64::NAN), "nan");
    }

    #[test]
    fn floor_semantics() {
        assert_eq!(floor_div_int(7, 2), Some(3));
        assert_eq!(floor_div_int(-7, 2), Some(-4));
        assert_eq!(floor_div_int(7, -2), Some(-4));
        assert_eq!(mod_int(-7, 2), 1);
        assert_eq!(mod_int(7, -2), -1);
        assert_eq!(floor_div_int(i64::MIN, -1), None);
        assert_eq!(mod_int(i64::MIN, -1), 0);
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            divide(&Value::Int(1), &Value::Int(0)).unwrap_err(),
            RuntimeErrorKind::DivByZero
        );
        assert_eq!(
            modulo(&Value::Float(1.0), &Value::Int(0)).unwrap_err(),
            RuntimeErrorKind::DivByZero
        );
        assert_eq!(
            power(&Value::Int(2), &Value::Int(-1)).unwrap_err(),
            RuntimeErrorKind::DivByZero
        );
    }

    #[test]
    fn repetition_is_bounded() {
        assert_eq!(
            multiply(&Value::from("ab"), &Value::Int(i64::MAX)).unwrap_err(),
            RuntimeErrorKind::Overflow("*")
        );
        assert_eq!(
            multiply(&Value::Int(i64::MAX), &Value::list(vec![Value::Null])).unwrap_err(),
            RuntimeErrorKind::Overflow("*")
        );
        assert!(matches!(
            multiply(&Value::from(""), &Value::Int(i64::MAX)),
            Ok(Value::String(text)) if text.is_empty()
        ));
        assert!(matches!(
            multiply(&Value::from("ab"), &Value::Int(-3)),
            Ok(Value::String(text)) if text.is_empty()
        ));
    }

    #[test]
    fn huge_exponents_of_unit_bases() {
        let huge = Value::Int(5_000_000_000);
        assert!(matches!(power(&Value::Int(1), &huge), Ok(Value::Int(1))));
        assert!(matches!(power(&Value::Int(0), &huge), Ok(Value::Int(0))));
        assert!(matches!(power(&Value::Int(-1), &huge), Ok(Value::Int(1))));
        assert!(matches!(
            power(&Value::Int(-1), &Value::Int(5_000_000_001)),
            Ok(Value::Int(-1))
        ));
        assert_eq!(
            power(&Value::Int(2), &huge).unwrap_err(),
            RuntimeErrorKind::Overflow("**")
        );
    }

    #[test]
    fn shifts_reject_out_of_range_counts() {
        assert!(matches!(
            binary(InfixOperator::ShiftLeft, &Value::Int(1), &Value::Int(64)),
            Err(RuntimeErrorKind::Overflow(_))
        ));
        assert!(matches!(
            binary(InfixOperator::ShiftRight, &Value::Int(1), &Value::Int(-1)),
            Err(RuntimeErrorKind::Overflow(_))
        ));
        assert!(matches!(
            binary(InfixOperator::ShiftLeft, &Value::Int(3), &Value::Int(2)),
            Ok(Value::Int(12))
        ));
    }
}
