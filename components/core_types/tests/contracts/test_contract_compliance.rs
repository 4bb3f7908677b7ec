//! Contract compliance tests for core_types
//!
//! Value-level semantics the interpreter relies on.

use core_types::compare::{abstract_equals, strict_equals};
use core_types::convert::{to_int32, to_uint32};
use core_types::{ObjectRef, PropertyKey, Value};

/// The value variant set is closed and complete
#[test]
fn test_contract_value_variants() {
    let values = [
        Value::Undefined,
        Value::Null,
        Value::Boolean(true),
        Value::Number(1.0),
        Value::from("s"),
        Value::BigInt(num_bigint::BigInt::from(1)),
        Value::Symbol(core_types::SymbolRef::new(None)),
        Value::Object(ObjectRef::new_plain(None)),
    ];
    let types: Vec<&str> = values.iter().map(Value::type_of).collect();
    assert_eq!(
        types,
        vec!["undefined", "object", "boolean", "number", "string", "bigint", "symbol", "object"]
    );
}

/// NaN never equals itself; +0 equals -0
#[test]
fn test_contract_strict_equality() {
    assert!(!strict_equals(&Value::from(f64::NAN), &Value::from(f64::NAN)));
    assert!(strict_equals(&Value::from(0.0), &Value::from(-0.0)));
    assert!(abstract_equals(&Value::Null, &Value::Undefined));
    assert!(!strict_equals(&Value::Null, &Value::Undefined));
}

/// ToInt32/ToUint32 are modulo 2^32
#[test]
fn test_contract_int32_modulo() {
    assert_eq!(to_uint32(-1.0), 4294967295);
    assert_eq!(to_int32((1u64 << 31) as f64), i32::MIN);
    assert_eq!(to_int32(-((1u64 << 32) as f64)), 0);
}

/// Key conversion normalizes numeric strings and numbers alike
#[test]
fn test_contract_key_normalization() {
    let obj = ObjectRef::new_plain(None);
    obj.set(core_types::convert::to_property_key(&Value::from(1)), Value::from("one"));
    assert_eq!(obj.get(&PropertyKey::from("1")), Value::from("one"));
}
