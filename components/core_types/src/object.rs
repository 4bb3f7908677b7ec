//! Object model.
//!
//! Objects are shared, mutable property maps with an optional prototype.
//! Functions, arrays and error objects are ordinary objects tagged with an
//! [`ObjectKind`]. Reclamation is reference counting only; cycles leak.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::iter;
use std::rc::Rc;

use crate::error::{ErrorKind, VmFault};
use crate::function::Callable;
use crate::value::{SymbolRef, Value};

/// Longest string, in bytes, that string conversion and concatenation build
pub const MAX_STRING_LENGTH: usize = (1 << 30) - 25;

fn invalid_string_length() -> VmFault {
    VmFault::range_error("Invalid string length")
}

/// Normalized property key.
///
/// Canonical array-index strings and integral numbers in `0..2^32-1` map to
/// [`PropertyKey::Index`], so `o[1]` and `o["1"]` address the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Named property
    String(Rc<str>),
    /// Symbol-keyed property
    Symbol(SymbolRef),
    /// Integer index
    Index(u32),
}

impl PropertyKey {
    /// Parse a canonical array index ("0", "17"; not "01", "-1", "1.0").
    pub fn parse_index(s: &str) -> Option<u32> {
        if s.is_empty() || (s.len() > 1 && s.starts_with('0')) {
            return None;
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<u32>().ok().filter(|&i| i != u32::MAX)
    }

    /// Index key for an integral number, if it is one
    pub fn from_number(n: f64) -> Option<PropertyKey> {
        if n.fract() == 0.0 && n >= 0.0 && n < u32::MAX as f64 {
            Some(PropertyKey::Index(n as u32))
        } else {
            None
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        match PropertyKey::parse_index(s) {
            Some(i) => PropertyKey::Index(i),
            None => PropertyKey::String(Rc::from(s)),
        }
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        PropertyKey::Index(i)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => f.write_str(s),
            PropertyKey::Symbol(s) => write!(f, "{}", s),
            PropertyKey::Index(i) => write!(f, "{}", i),
        }
    }
}

/// What an object is, beyond its properties
#[derive(Clone)]
pub enum ObjectKind {
    /// Plain object
    Ordinary,
    /// Array with a tracked length
    Array,
    /// Callable object
    Function(Rc<dyn Callable>),
    /// Error instance carrying `name` and `message`
    Error(ErrorKind),
}

impl ObjectKind {
    fn label(&self) -> &'static str {
        match self {
            ObjectKind::Ordinary => "Object",
            ObjectKind::Array => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::Error(_) => "Error",
        }
    }
}

/// Object storage
pub struct JsObject {
    kind: ObjectKind,
    properties: HashMap<PropertyKey, Value>,
    order: Vec<PropertyKey>,
    prototype: Option<ObjectRef>,
    length: u32,
}

/// Shared reference to an object; equality is identity
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<JsObject>>);

fn length_key(key: &PropertyKey) -> bool {
    matches!(key, PropertyKey::String(s) if &**s == "length")
}

impl ObjectRef {
    /// Create an object of the given kind
    pub fn new(kind: ObjectKind, prototype: Option<ObjectRef>) -> Self {
        ObjectRef(Rc::new(RefCell::new(JsObject {
            kind,
            properties: HashMap::new(),
            order: Vec::new(),
            prototype,
            length: 0,
        })))
    }

    /// Create a plain object
    pub fn new_plain(prototype: Option<ObjectRef>) -> Self {
        Self::new(ObjectKind::Ordinary, prototype)
    }

    /// Create an array holding `elements`
    pub fn new_array(elements: Vec<Value>, prototype: Option<ObjectRef>) -> Self {
        let array = Self::new(ObjectKind::Array, prototype);
        for (i, value) in elements.into_iter().enumerate() {
            array.set(PropertyKey::Index(i as u32), value);
        }
        array
    }

    /// Create a function object around `callable`
    pub fn new_function(callable: Rc<dyn Callable>, prototype: Option<ObjectRef>) -> Self {
        Self::new(ObjectKind::Function(callable), prototype)
    }

    /// Create an error object with own `name` and `message` properties
    pub fn new_error(kind: ErrorKind, message: &str, prototype: Option<ObjectRef>) -> Self {
        let error = Self::new(ObjectKind::Error(kind), prototype);
        error.set(PropertyKey::from("name"), Value::from(kind.name()));
        error.set(PropertyKey::from("message"), Value::from(message));
        error
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The object's kind
    pub fn kind(&self) -> ObjectKind {
        self.0.borrow().kind.clone()
    }

    /// The callable behind a function object
    pub fn callable(&self) -> Option<Rc<dyn Callable>> {
        match &self.0.borrow().kind {
            ObjectKind::Function(callable) => Some(Rc::clone(callable)),
            _ => None,
        }
    }

    /// Whether the object can be called
    pub fn is_callable(&self) -> bool {
        matches!(self.0.borrow().kind, ObjectKind::Function(_))
    }

    /// Whether the object is an array
    pub fn is_array(&self) -> bool {
        matches!(self.0.borrow().kind, ObjectKind::Array)
    }

    /// Array length (0 for non-arrays)
    pub fn array_length(&self) -> u32 {
        self.0.borrow().length
    }

    /// The prototype, if any
    pub fn prototype(&self) -> Option<ObjectRef> {
        self.0.borrow().prototype.clone()
    }

    /// Replace the prototype. Returns false, changing nothing, if the new
    /// prototype chain would contain this object.
    pub fn set_prototype(&self, prototype: Option<ObjectRef>) -> bool {
        let mut cursor = prototype.clone();
        while let Some(proto) = cursor {
            if proto.ptr_eq(self) {
                return false;
            }
            cursor = proto.prototype();
        }
        self.0.borrow_mut().prototype = prototype;
        true
    }

    /// Own property lookup
    pub fn get_own(&self, key: &PropertyKey) -> Option<Value> {
        let obj = self.0.borrow();
        if matches!(obj.kind, ObjectKind::Array) && length_key(key) {
            return Some(Value::Number(obj.length as f64));
        }
        obj.properties.get(key).cloned()
    }

    /// Property lookup along the prototype chain; undefined if absent
    pub fn get(&self, key: &PropertyKey) -> Value {
        let mut cursor = Some(self.clone());
        while let Some(obj) = cursor {
            if let Some(value) = obj.get_own(key) {
                return value;
            }
            cursor = obj.prototype();
        }
        Value::Undefined
    }

    /// Convenience lookup by name
    pub fn get_named(&self, name: &str) -> Value {
        self.get(&PropertyKey::from(name))
    }

    /// Create or overwrite an own property
    pub fn set(&self, key: PropertyKey, value: Value) {
        // converted before borrowing, the value may be this object
        let requested_len = if length_key(&key) && self.is_array() {
            Some(crate::convert::to_number(&value))
        } else {
            None
        };
        let mut obj = self.0.borrow_mut();
        if matches!(obj.kind, ObjectKind::Array) {
            if let Some(new_len) = requested_len {
                if new_len >= 0.0 && new_len.fract() == 0.0 && new_len <= u32::MAX as f64 {
                    let new_len = new_len as u32;
                    if new_len < obj.length {
                        obj.properties
                            .retain(|k, _| !matches!(k, PropertyKey::Index(i) if *i >= new_len));
                        obj.order
                            .retain(|k| !matches!(k, PropertyKey::Index(i) if *i >= new_len));
                    }
                    obj.length = new_len;
                }
                return;
            }
            if let PropertyKey::Index(i) = key {
                if i >= obj.length {
                    obj.length = i + 1;
                }
            }
        }
        if obj.properties.insert(key.clone(), value).is_none() {
            obj.order.push(key);
        }
    }

    /// Convenience setter by name
    pub fn set_named(&self, name: &str, value: Value) {
        self.set(PropertyKey::from(name), value);
    }

    /// Remove an own property. Returns false only for the non-deletable
    /// array `length`.
    pub fn delete(&self, key: &PropertyKey) -> bool {
        let mut obj = self.0.borrow_mut();
        if matches!(obj.kind, ObjectKind::Array) && length_key(key) {
            return false;
        }
        if obj.properties.remove(key).is_some() {
            obj.order.retain(|k| k != key);
        }
        true
    }

    /// Whether the object itself has the property
    pub fn has_own(&self, key: &PropertyKey) -> bool {
        let obj = self.0.borrow();
        (matches!(obj.kind, ObjectKind::Array) && length_key(key)) || obj.properties.contains_key(key)
    }

    /// Whether the property exists on the object or its prototype chain
    pub fn has(&self, key: &PropertyKey) -> bool {
        let mut cursor = Some(self.clone());
        while let Some(obj) = cursor {
            if obj.has_own(key) {
                return true;
            }
            cursor = obj.prototype();
        }
        false
    }

    /// Own keys: indices ascending, then the rest in insertion order
    pub fn keys(&self) -> Vec<PropertyKey> {
        let obj = self.0.borrow();
        let mut indices: Vec<u32> = obj
            .order
            .iter()
            .filter_map(|k| match k {
                PropertyKey::Index(i) => Some(*i),
                _ => None,
            })
            .collect();
        indices.sort_unstable();
        indices
            .into_iter()
            .map(PropertyKey::Index)
            .chain(
                obj.order
                    .iter()
                    .filter(|k| !matches!(k, PropertyKey::Index(_)))
                    .cloned(),
            )
            .collect()
    }

    /// Whether `proto` appears on this object's prototype chain
    pub fn inherits_from(&self, proto: &ObjectRef) -> bool {
        let mut cursor = self.prototype();
        while let Some(obj) = cursor {
            if obj.ptr_eq(proto) {
                return true;
            }
            cursor = obj.prototype();
        }
        false
    }

    /// Default string form used where an object is converted to a primitive
    ///
    /// Fails with a RangeError when the result would exceed
    /// [`MAX_STRING_LENGTH`].
    pub fn try_default_string(&self) -> Result<String, VmFault> {
        let mut visiting = Vec::new();
        self.default_string_inner(&mut visiting)
    }

    /// Like [`ObjectRef::try_default_string`], rendering a failure as its
    /// message
    pub fn default_string(&self) -> String {
        self.try_default_string()
            .unwrap_or_else(|fault| fault.to_string())
    }

    fn default_string_inner(&self, visiting: &mut Vec<ObjectRef>) -> Result<String, VmFault> {
        if visiting.iter().any(|o| o.ptr_eq(self)) {
            return Ok(String::new());
        }
        Ok(match self.kind() {
            ObjectKind::Ordinary => "[object Object]".to_string(),
            ObjectKind::Function(callable) => {
                format!("function {}() {{ [native code] }}", callable.name())
            }
            ObjectKind::Error(kind) => {
                let name = match self.get_named("name") {
                    Value::Undefined => kind.name().to_string(),
                    other => other.to_string(),
                };
                let message = match self.get_named("message") {
                    Value::Undefined => String::new(),
                    other => other.to_string(),
                };
                if message.is_empty() {
                    name
                } else {
                    format!("{}: {}", name, message)
                }
            }
            ObjectKind::Array => {
                visiting.push(self.clone());
                let joined = self.join_elements(visiting);
                visiting.pop();
                joined?
            }
        })
    }

    /// Elements joined with commas; holes and nullish elements are empty.
    /// Only present indices are visited, so a sparse array costs its
    /// output, not its length.
    fn join_elements(&self, visiting: &mut Vec<ObjectRef>) -> Result<String, VmFault> {
        let separators = (self.array_length() as usize).saturating_sub(1);
        if separators > MAX_STRING_LENGTH {
            return Err(invalid_string_length());
        }
        let mut out = String::new();
        let mut written = 0;
        for key in self.keys() {
            let index = match key {
                PropertyKey::Index(i) => i as usize,
                _ => break,
            };
            out.extend(iter::repeat(',').take(index - written));
            written = index;
            match self.get(&key) {
                Value::Undefined | Value::Null => {}
                Value::Object(o) => out.push_str(&o.default_string_inner(visiting)?),
                other => out.push_str(&other.to_string()),
            }
            if out.len() + (separators - written) > MAX_STRING_LENGTH {
                return Err(invalid_string_length());
            }
        }
        out.extend(iter::repeat(',').take(separators - written));
        Ok(out)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(obj) => write!(f, "{}({:p})", obj.kind.label(), Rc::as_ptr(&self.0)),
            Err(_) => write!(f, "Object({:p})", Rc::as_ptr(&self.0)),
        }
    }
}
