//! Unit tests for the Value enum

use core_types::{ObjectRef, SymbolRef, Value};
use num_bigint::BigInt;

#[cfg(test)]
mod value_creation_tests {
    use super::*;

    #[test]
    fn test_value_from_primitives() {
        assert!(matches!(Value::from(true), Value::Boolean(true)));
        assert!(matches!(Value::from(3), Value::Number(n) if n == 3.0));
        assert!(matches!(Value::from("s"), Value::String(ref s) if &**s == "s"));
        assert!(matches!(Value::from(BigInt::from(1)), Value::BigInt(_)));
    }

    #[test]
    fn test_value_string_constructor() {
        assert_eq!(Value::string(String::from("abc")).as_str(), Some("abc"));
    }
}

#[cfg(test)]
mod truthiness_tests {
    use super::*;

    #[test]
    fn test_falsy_values() {
        for v in [
            Value::Undefined,
            Value::Null,
            Value::Boolean(false),
            Value::Number(0.0),
            Value::Number(-0.0),
            Value::Number(f64::NAN),
            Value::from(""),
            Value::BigInt(BigInt::from(0)),
        ] {
            assert!(!v.is_truthy(), "{:?} should be falsy", v);
        }
    }

    #[test]
    fn test_truthy_values() {
        for v in [
            Value::Boolean(true),
            Value::Number(-1.0),
            Value::from("false"),
            Value::BigInt(BigInt::from(-1)),
            Value::Object(ObjectRef::new_plain(None)),
            Value::Symbol(SymbolRef::new(None)),
        ] {
            assert!(v.is_truthy(), "{:?} should be truthy", v);
        }
    }
}

#[cfg(test)]
mod to_string_tests {
    use super::*;

    #[test]
    fn test_number_display() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(-2.5).to_string(), "-2.5");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Number(1e-7).to_string(), "1e-7");
    }

    #[test]
    fn test_object_display() {
        let obj = ObjectRef::new_plain(None);
        assert_eq!(Value::Object(obj).to_string(), "[object Object]");
    }

    #[test]
    fn test_type_of() {
        assert_eq!(Value::from("x").type_of(), "string");
        assert_eq!(Value::Symbol(SymbolRef::new(None)).type_of(), "symbol");
        assert_eq!(Value::Boolean(false).type_of(), "boolean");
    }
}
