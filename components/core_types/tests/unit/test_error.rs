//! Unit tests for VmFault and ErrorKind

use core_types::{ErrorKind, ObjectRef, Value, VmFault};

#[cfg(test)]
mod error_kind_tests {
    use super::*;

    #[test]
    fn test_error_kind_names() {
        assert_eq!(ErrorKind::Error.name(), "Error");
        assert_eq!(ErrorKind::SyntaxError.name(), "SyntaxError");
        assert_eq!(ErrorKind::ReferenceError.name(), "ReferenceError");
        assert_eq!(ErrorKind::URIError.name(), "URIError");
    }
}

#[cfg(test)]
mod vm_fault_tests {
    use super::*;

    #[test]
    fn test_script_errors_are_catchable() {
        assert!(!VmFault::type_error("t").is_fatal());
        assert!(!VmFault::range_error("r").is_fatal());
        assert!(!VmFault::reference_error("x is not defined").is_fatal());
    }

    #[test]
    fn test_internal_faults_are_fatal() {
        assert!(VmFault::StackUnderflow.is_fatal());
        assert!(VmFault::InvalidOpcode { opcode: 0xff, pc: 3 }.is_fatal());
        assert!(VmFault::InvalidLocal { index: 9 }.is_fatal());
        assert!(VmFault::Malformed("x".into()).is_fatal());
    }

    #[test]
    fn test_fault_messages() {
        assert_eq!(
            VmFault::InvalidOpcode { opcode: 0xff, pc: 3 }.to_string(),
            "invalid opcode 0xff at pc 3"
        );
        assert_eq!(VmFault::NotCallable("42".into()).to_string(), "42 is not a function");
    }

    #[test]
    fn test_uncaught_error_object_display() {
        let err = ObjectRef::new_error(ErrorKind::RangeError, "too deep", None);
        let fault = VmFault::Exception(Value::Object(err));
        assert_eq!(fault.to_string(), "Uncaught exception: RangeError: too deep");
    }
}
