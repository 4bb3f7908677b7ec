//! Type conversions: ToNumber, ToInt32/ToUint32, ToBoolean, ToString and
//! property-key normalization.
//!
//! Objects convert through their default string form; user `valueOf` and
//! `toString` methods are not consulted.

use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::{Num, ToPrimitive, Zero};

use crate::error::VmFault;
use crate::object::PropertyKey;
use crate::value::Value;

const TWO_32: f64 = 4_294_967_296.0;

/// Result of ToNumeric
#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    /// Number
    Number(f64),
    /// BigInt
    BigInt(BigInt),
}

/// ToBoolean
pub fn to_boolean(value: &Value) -> bool {
    value.is_truthy()
}

/// ToNumber.
///
/// Symbols yield NaN here; operators that must reject them go through
/// [`to_numeric`].
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => *n,
        Value::String(s) => string_to_number(s),
        Value::BigInt(n) => n.to_f64().unwrap_or(f64::NAN),
        Value::Symbol(_) => f64::NAN,
        Value::Object(o) => string_to_number(&o.default_string()),
    }
}

/// ToNumeric: like ToNumber but keeps BigInts and rejects symbols
pub fn to_numeric(value: &Value) -> Result<Numeric, VmFault> {
    match value {
        Value::BigInt(n) => Ok(Numeric::BigInt(n.clone())),
        Value::Symbol(_) => Err(VmFault::type_error(
            "Cannot convert a Symbol value to a number",
        )),
        other => Ok(Numeric::Number(to_number(other))),
    }
}

/// WhiteSpace and LineTerminator code points
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{9}'..='\u{d}'
            | ' '
            | '\u{a0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200a}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202f}'
            | '\u{205f}'
            | '\u{3000}'
            | '\u{feff}'
    )
}

/// StringToNumber: decimal literals with optional exponent, `Infinity`,
/// and unsigned `0x`/`0o`/`0b` integers; surrounding whitespace is ignored
/// and anything else is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim_matches(is_js_whitespace);
    if s.is_empty() {
        return 0.0;
    }
    if let Some(n) = parse_radix_literal(s) {
        return n;
    }
    let (sign, body) = match s.as_bytes()[0] {
        b'+' => (1.0, &s[1..]),
        b'-' => (-1.0, &s[1..]),
        _ => (1.0, s),
    };
    if body == "Infinity" {
        return sign * f64::INFINITY;
    }
    if !is_decimal_literal(body) {
        return f64::NAN;
    }
    body.parse::<f64>().map(|n| sign * n).unwrap_or(f64::NAN)
}

fn parse_radix_literal(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'0' {
        return None;
    }
    let radix = match bytes[1] {
        b'x' | b'X' => 16,
        b'o' | b'O' => 8,
        b'b' | b'B' => 2,
        _ => return None,
    };
    let digits = &s[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }
    let mut n = 0.0f64;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(d) => n = n * radix as f64 + d as f64,
            None => return Some(f64::NAN),
        }
    }
    Some(n)
}

fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut mantissa_digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        mantissa_digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    i == bytes.len()
}

/// StringToBigInt; `None` when the string is not an integer literal
pub fn string_to_bigint(s: &str) -> Option<BigInt> {
    let s = s.trim_matches(is_js_whitespace);
    if s.is_empty() {
        return Some(BigInt::zero());
    }
    let bytes = s.as_bytes();
    if bytes.len() > 2 && bytes[0] == b'0' {
        let radix = match bytes[1] {
            b'x' | b'X' => Some(16),
            b'o' | b'O' => Some(8),
            b'b' | b'B' => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return BigInt::from_str_radix(&s[2..], radix).ok();
        }
    }
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigInt::from_str_radix(s, 10).ok()
}

/// ToUint32 of a number: truncate, then reduce modulo 2^32
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(TWO_32) as u32
}

/// ToInt32 of a number: two's-complement reinterpretation of ToUint32
pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// ToString, failing for symbols as implicit conversion does
pub fn to_js_string(value: &Value) -> Result<Rc<str>, VmFault> {
    match value {
        Value::String(s) => Ok(Rc::clone(s)),
        Value::Symbol(_) => Err(VmFault::type_error(
            "Cannot convert a Symbol value to a string",
        )),
        Value::Object(o) => Ok(Rc::from(o.try_default_string()?)),
        other => Ok(Rc::from(other.to_string())),
    }
}

/// ToPropertyKey
pub fn to_property_key(value: &Value) -> PropertyKey {
    match value {
        Value::Symbol(s) => PropertyKey::Symbol(s.clone()),
        Value::Number(n) => match PropertyKey::from_number(*n) {
            Some(key) => key,
            None => PropertyKey::String(Rc::from(number_to_string(*n))),
        },
        Value::String(s) => match PropertyKey::parse_index(s) {
            Some(i) => PropertyKey::Index(i),
            None => PropertyKey::String(Rc::clone(s)),
        },
        other => PropertyKey::from(other.to_string().as_str()),
    }
}

/// Number::toString(10): shortest round-tripping digits, laid out in fixed
/// notation for decimal exponents in (-7, 21) and in exponent form outside.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let mut buffer = ryu::Buffer::new();
    let formatted = buffer.format_finite(n.abs());
    let (mantissa, exponent) = match formatted.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (formatted, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let all: String = int_part.chars().chain(frac_part.chars()).collect();
    let leading = all.len() - all.trim_start_matches('0').len();
    let digits = all.trim_start_matches('0').trim_end_matches('0');
    // position of the decimal point relative to the first significant digit
    let point = int_part.len() as i32 + exponent - leading as i32;
    let k = digits.len() as i32;

    let mut out = String::new();
    if n < 0.0 {
        out.push('-');
    }
    if k <= point && point <= 21 {
        out.push_str(digits);
        out.extend(std::iter::repeat('0').take((point - k) as usize));
    } else if 0 < point && point <= 21 {
        out.push_str(&digits[..point as usize]);
        out.push('.');
        out.push_str(&digits[point as usize..]);
    } else if -6 < point && point <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((-point) as usize));
        out.push_str(digits);
    } else {
        let e = point - 1;
        out.push_str(&digits[..1]);
        if k > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('e');
        out.push(if e < 0 { '-' } else { '+' });
        out.push_str(&e.abs().to_string());
    }
    out
}
