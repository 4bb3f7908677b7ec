//! Operator semantics
//!
//! Arithmetic, bitwise and relational operators over [`Value`]. Each one
//! coerces its operands the way the language does and reports script
//! errors (mixing BigInt with Number, BigInt division by zero) as
//! catchable faults.

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use core_types::compare::{abstract_equals, less_than, less_than_or_equal};
use core_types::convert::{to_int32, to_js_string, to_numeric, to_uint32};
use core_types::{Numeric, Value, VmFault, MAX_STRING_LENGTH};

fn mix_error() -> VmFault {
    VmFault::type_error("Cannot mix BigInt and other types, use explicit conversions")
}

fn to_primitive(value: &Value) -> Result<Value, VmFault> {
    match value {
        Value::Object(o) => Ok(Value::string(o.try_default_string()?)),
        other => Ok(other.clone()),
    }
}

fn numeric_pair(a: &Value, b: &Value) -> Result<(Numeric, Numeric), VmFault> {
    Ok((to_numeric(a)?, to_numeric(b)?))
}

fn binary<N, B>(a: &Value, b: &Value, number: N, bigint: B) -> Result<Value, VmFault>
where
    N: FnOnce(f64, f64) -> f64,
    B: FnOnce(&BigInt, &BigInt) -> Result<BigInt, VmFault>,
{
    match numeric_pair(a, b)? {
        (Numeric::Number(x), Numeric::Number(y)) => Ok(Value::Number(number(x, y))),
        (Numeric::BigInt(x), Numeric::BigInt(y)) => bigint(&x, &y).map(Value::BigInt),
        _ => Err(mix_error()),
    }
}

/// `a + b`: string concatenation when either primitive is a string,
/// numeric addition otherwise
pub fn add(a: &Value, b: &Value) -> Result<Value, VmFault> {
    let a = to_primitive(a)?;
    let b = to_primitive(b)?;
    if a.is_string() || b.is_string() {
        let left = to_js_string(&a)?;
        let right = to_js_string(&b)?;
        if left.len() + right.len() > MAX_STRING_LENGTH {
            return Err(VmFault::range_error("Invalid string length"));
        }
        let mut joined = String::with_capacity(left.len() + right.len());
        joined.push_str(&left);
        joined.push_str(&right);
        return Ok(Value::string(joined));
    }
    binary(&a, &b, |x, y| x + y, |x, y| Ok(x + y))
}

/// `a - b`
pub fn sub(a: &Value, b: &Value) -> Result<Value, VmFault> {
    binary(a, b, |x, y| x - y, |x, y| Ok(x - y))
}

/// `a * b`
pub fn mul(a: &Value, b: &Value) -> Result<Value, VmFault> {
    binary(a, b, |x, y| x * y, |x, y| Ok(x * y))
}

/// `a / b`
pub fn div(a: &Value, b: &Value) -> Result<Value, VmFault> {
    binary(
        a,
        b,
        |x, y| x / y,
        |x, y| {
            if y.is_zero() {
                Err(VmFault::range_error("Division by zero"))
            } else {
                Ok(x / y)
            }
        },
    )
}

/// `a % b`; the result takes the sign of the dividend
pub fn rem(a: &Value, b: &Value) -> Result<Value, VmFault> {
    binary(
        a,
        b,
        |x, y| x % y,
        |x, y| {
            if y.is_zero() {
                Err(VmFault::range_error("Division by zero"))
            } else {
                Ok(x % y)
            }
        },
    )
}

/// Number exponentiation with the language's NaN rules
pub fn number_pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

/// `a ** b`
pub fn pow(a: &Value, b: &Value) -> Result<Value, VmFault> {
    binary(a, b, number_pow, |x, y| {
        if *y < BigInt::zero() {
            return Err(VmFault::range_error("Exponent must be non-negative"));
        }
        let exponent = y
            .to_u32()
            .ok_or_else(|| VmFault::range_error("Maximum BigInt size exceeded"))?;
        Ok(x.pow(exponent))
    })
}

/// Unary `+`
pub fn plus(a: &Value) -> Result<Value, VmFault> {
    match to_numeric(a)? {
        Numeric::Number(n) => Ok(Value::Number(n)),
        Numeric::BigInt(_) => Err(VmFault::type_error(
            "Cannot convert a BigInt value to a number",
        )),
    }
}

/// Unary `-`
pub fn neg(a: &Value) -> Result<Value, VmFault> {
    Ok(match to_numeric(a)? {
        Numeric::Number(n) => Value::Number(-n),
        Numeric::BigInt(n) => Value::BigInt(-n),
    })
}

/// `a + 1` on the numeric value of `a`
pub fn inc(a: &Value) -> Result<Value, VmFault> {
    Ok(match to_numeric(a)? {
        Numeric::Number(n) => Value::Number(n + 1.0),
        Numeric::BigInt(n) => Value::BigInt(n + 1u32),
    })
}

/// `a - 1` on the numeric value of `a`
pub fn dec(a: &Value) -> Result<Value, VmFault> {
    Ok(match to_numeric(a)? {
        Numeric::Number(n) => Value::Number(n - 1.0),
        Numeric::BigInt(n) => Value::BigInt(n - 1u32),
    })
}

/// `~a`
pub fn bit_not(a: &Value) -> Result<Value, VmFault> {
    Ok(match to_numeric(a)? {
        Numeric::Number(n) => Value::Number(!to_int32(n) as f64),
        Numeric::BigInt(n) => Value::BigInt(-n - 1u32),
    })
}

fn int32_op(
    a: &Value,
    b: &Value,
    op: fn(i32, i32) -> i32,
    bigint: fn(&BigInt, &BigInt) -> BigInt,
) -> Result<Value, VmFault> {
    binary(
        a,
        b,
        |x, y| op(to_int32(x), to_int32(y)) as f64,
        |x, y| Ok(bigint(x, y)),
    )
}

/// `a & b`
pub fn bit_and(a: &Value, b: &Value) -> Result<Value, VmFault> {
    int32_op(a, b, |x, y| x & y, |x, y| x & y)
}

/// `a | b`
pub fn bit_or(a: &Value, b: &Value) -> Result<Value, VmFault> {
    int32_op(a, b, |x, y| x | y, |x, y| x | y)
}

/// `a ^ b`
pub fn bit_xor(a: &Value, b: &Value) -> Result<Value, VmFault> {
    int32_op(a, b, |x, y| x ^ y, |x, y| x ^ y)
}

fn shift_count(n: f64) -> u32 {
    to_uint32(n) & 0x1f
}

fn bigint_shift(x: &BigInt, y: &BigInt, left: bool) -> Result<BigInt, VmFault> {
    let count = y
        .to_i64()
        .ok_or_else(|| VmFault::range_error("Maximum BigInt size exceeded"))?;
    let count = if left { count } else { -count };
    let magnitude = usize::try_from(count.unsigned_abs())
        .map_err(|_| VmFault::range_error("Maximum BigInt size exceeded"))?;
    Ok(if count >= 0 {
        x << magnitude
    } else {
        x >> magnitude
    })
}

/// `a << b`
pub fn shl(a: &Value, b: &Value) -> Result<Value, VmFault> {
    binary(
        a,
        b,
        |x, y| to_int32(x).wrapping_shl(shift_count(y)) as f64,
        |x, y| bigint_shift(x, y, true),
    )
}

/// `a >> b`, sign-propagating
pub fn sar(a: &Value, b: &Value) -> Result<Value, VmFault> {
    binary(
        a,
        b,
        |x, y| (to_int32(x) >> shift_count(y)) as f64,
        |x, y| bigint_shift(x, y, false),
    )
}

/// `a >>> b`; the result is an unsigned 32-bit integer
pub fn shr(a: &Value, b: &Value) -> Result<Value, VmFault> {
    match numeric_pair(a, b)? {
        (Numeric::Number(x), Numeric::Number(y)) => {
            Ok(Value::Number((to_uint32(x) >> shift_count(y)) as f64))
        }
        (Numeric::BigInt(_), Numeric::BigInt(_)) => Err(VmFault::type_error(
            "BigInts have no unsigned right shift, use >> instead",
        )),
        _ => Err(mix_error()),
    }
}

fn reject_symbols(a: &Value, b: &Value) -> Result<(), VmFault> {
    if matches!(a, Value::Symbol(_)) || matches!(b, Value::Symbol(_)) {
        return Err(VmFault::type_error(
            "Cannot convert a Symbol value to a number",
        ));
    }
    Ok(())
}

/// `a == b`
pub fn loose_eq(a: &Value, b: &Value) -> Result<bool, VmFault> {
    match (a, b) {
        (Value::Object(_), Value::Object(_)) => Ok(abstract_equals(a, b)),
        _ => Ok(abstract_equals(&to_primitive(a)?, &to_primitive(b)?)),
    }
}

fn relational_operands(a: &Value, b: &Value) -> Result<(Value, Value), VmFault> {
    reject_symbols(a, b)?;
    Ok((to_primitive(a)?, to_primitive(b)?))
}

/// `a < b`
pub fn lt(a: &Value, b: &Value) -> Result<bool, VmFault> {
    let (a, b) = relational_operands(a, b)?;
    Ok(less_than(&a, &b) == Some(true))
}

/// `a > b`
pub fn gt(a: &Value, b: &Value) -> Result<bool, VmFault> {
    let (a, b) = relational_operands(a, b)?;
    Ok(less_than(&b, &a) == Some(true))
}

/// `a <= b`
pub fn lte(a: &Value, b: &Value) -> Result<bool, VmFault> {
    let (a, b) = relational_operands(a, b)?;
    Ok(less_than_or_equal(&a, &b))
}

/// `a >= b`
pub fn gte(a: &Value, b: &Value) -> Result<bool, VmFault> {
    let (a, b) = relational_operands(a, b)?;
    Ok(less_than_or_equal(&b, &a))
}
