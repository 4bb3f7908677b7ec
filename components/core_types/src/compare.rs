//! Equality and relational comparison.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::FromPrimitive;

use crate::convert::{string_to_bigint, string_to_number, to_number};
use crate::value::Value;

/// Strict equality (`===`).
///
/// NaN never equals itself and +0 equals -0.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    a == b
}

/// Abstract equality (`==`).
pub fn abstract_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,

        (Value::Number(x), Value::String(s)) | (Value::String(s), Value::Number(x)) => {
            *x == string_to_number(s)
        }
        (Value::BigInt(n), Value::String(s)) | (Value::String(s), Value::BigInt(n)) => {
            string_to_bigint(s).map_or(false, |m| *n == m)
        }
        (Value::BigInt(n), Value::Number(x)) | (Value::Number(x), Value::BigInt(n)) => {
            compare_bigint_number(n, *x) == Some(Ordering::Equal)
        }

        (Value::Boolean(x), other) | (other, Value::Boolean(x)) if !matches!(other, Value::Boolean(_)) => {
            abstract_equals(&Value::Number(if *x { 1.0 } else { 0.0 }), other)
        }

        (Value::Object(o), other @ (Value::Number(_) | Value::String(_) | Value::BigInt(_)))
        | (other @ (Value::Number(_) | Value::String(_) | Value::BigInt(_)), Value::Object(o)) => {
            abstract_equals(&Value::string(o.default_string()), other)
        }

        _ => strict_equals(a, b),
    }
}

/// Compare a BigInt with a Number; `None` when the number is NaN
pub fn compare_bigint_number(n: &BigInt, x: f64) -> Option<Ordering> {
    if x.is_nan() {
        return None;
    }
    if x.is_infinite() {
        return Some(if x > 0.0 { Ordering::Less } else { Ordering::Greater });
    }
    let floor = x.floor();
    let whole = BigInt::from_f64(floor)?;
    match n.cmp(&whole) {
        Ordering::Equal if x > floor => Some(Ordering::Less),
        other => Some(other),
    }
}

/// Abstract relational comparison `a < b`.
///
/// `None` stands for the undefined outcome (a NaN operand or an
/// unparseable BigInt string), which every relational operator treats
/// as false.
pub fn less_than(a: &Value, b: &Value) -> Option<bool> {
    let a = to_primitive(a);
    let b = to_primitive(b);
    match (&a, &b) {
        (Value::String(x), Value::String(y)) => {
            Some(x.encode_utf16().cmp(y.encode_utf16()) == Ordering::Less)
        }
        (Value::BigInt(x), Value::BigInt(y)) => Some(x < y),
        (Value::BigInt(x), Value::String(s)) => string_to_bigint(s).map(|y| *x < y),
        (Value::String(s), Value::BigInt(y)) => string_to_bigint(s).map(|x| x < *y),
        (Value::BigInt(x), other) => {
            compare_bigint_number(x, to_number(other)).map(|o| o == Ordering::Less)
        }
        (other, Value::BigInt(y)) => {
            compare_bigint_number(y, to_number(other)).map(|o| o == Ordering::Greater)
        }
        _ => {
            let x = to_number(&a);
            let y = to_number(&b);
            if x.is_nan() || y.is_nan() {
                None
            } else {
                Some(x < y)
            }
        }
    }
}

/// `a <= b`, derived from [`less_than`] as `!(b < a)`
pub fn less_than_or_equal(a: &Value, b: &Value) -> bool {
    matches!(less_than(b, a), Some(false))
}

fn to_primitive(value: &Value) -> Value {
    match value {
        Value::Object(o) => Value::string(o.default_string()),
        other => other.clone(),
    }
}
