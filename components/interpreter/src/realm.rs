//! Global environment: the global object and intrinsic prototypes

use std::collections::HashMap;
use std::rc::Rc;

use core_types::convert::to_js_string;
use core_types::{CallContext, Callable, ErrorKind, ObjectRef, Value, VmFault};

use crate::callable::{BoundFunction, FunctionCall, NativeFunction};
use crate::upvalue::Closure;

const SCRIPT_ERROR_KINDS: [ErrorKind; 7] = [
    ErrorKind::Error,
    ErrorKind::TypeError,
    ErrorKind::RangeError,
    ErrorKind::ReferenceError,
    ErrorKind::SyntaxError,
    ErrorKind::EvalError,
    ErrorKind::URIError,
];

/// Intrinsic objects shared by everything one VM creates
#[derive(Debug, Clone)]
pub struct Realm {
    global: ObjectRef,
    object_prototype: ObjectRef,
    function_prototype: ObjectRef,
    array_prototype: ObjectRef,
    error_prototypes: HashMap<ErrorKind, ObjectRef>,
}

impl Realm {
    /// Create a realm with the standard globals installed
    pub fn new() -> Self {
        let object_prototype = ObjectRef::new_plain(None);
        let function_prototype = ObjectRef::new_plain(Some(object_prototype.clone()));
        let array_prototype = ObjectRef::new_plain(Some(object_prototype.clone()));
        let global = ObjectRef::new_plain(Some(object_prototype.clone()));

        let base_error = ObjectRef::new_plain(Some(object_prototype.clone()));
        base_error.set_named("name", Value::from("Error"));
        base_error.set_named("message", Value::from(""));
        let mut error_prototypes = HashMap::new();
        for kind in SCRIPT_ERROR_KINDS {
            let proto = if kind == ErrorKind::Error {
                base_error.clone()
            } else {
                let proto = ObjectRef::new_plain(Some(base_error.clone()));
                proto.set_named("name", Value::from(kind.name()));
                proto.set_named("message", Value::from(""));
                proto
            };
            error_prototypes.insert(kind, proto);
        }

        let realm = Self {
            global,
            object_prototype,
            function_prototype,
            array_prototype,
            error_prototypes,
        };
        realm.install_globals();
        realm
    }

    fn install_globals(&self) {
        let global = &self.global;
        global.set_named("globalThis", Value::Object(global.clone()));
        global.set_named("undefined", Value::Undefined);
        global.set_named("NaN", Value::Number(f64::NAN));
        global.set_named("Infinity", Value::Number(f64::INFINITY));

        for kind in SCRIPT_ERROR_KINDS {
            let ctor = self.new_function(Rc::new(NativeFunction::constructor(
                kind.name(),
                move |cx, _this, args| {
                    let message = match args.first() {
                        None | Some(Value::Undefined) => Rc::from(""),
                        Some(v) => to_js_string(v)?,
                    };
                    Ok(cx.new_error(kind, &message))
                },
            )));
            let proto = self.error_prototype(kind);
            ctor.set_named("prototype", Value::Object(proto.clone()));
            proto.set_named("constructor", Value::Object(ctor.clone()));
            global.set_named(kind.name(), Value::Object(ctor));
        }

        let bind = self.new_function(Rc::new(NativeFunction::new("bind", |cx, this, args| {
            let target = this
                .as_object()
                .ok_or_else(|| VmFault::type_error("Bind must be called on a function"))?;
            let bound_this = args.first().cloned().unwrap_or(Value::Undefined);
            let bound_args = args.iter().skip(1).cloned().collect();
            let bound = BoundFunction::new(target.clone(), bound_this, bound_args)?;
            Ok(Value::Object(cx.new_function(Rc::new(bound))))
        })));
        self.function_prototype
            .set_named("bind", Value::Object(bind));

        let call = self.new_function(Rc::new(FunctionCall));
        self.function_prototype
            .set_named("call", Value::Object(call));
    }

    /// The global object
    pub fn global(&self) -> &ObjectRef {
        &self.global
    }

    /// `Object.prototype`
    pub fn object_prototype(&self) -> &ObjectRef {
        &self.object_prototype
    }

    /// `Function.prototype`
    pub fn function_prototype(&self) -> &ObjectRef {
        &self.function_prototype
    }

    /// `Array.prototype`
    pub fn array_prototype(&self) -> &ObjectRef {
        &self.array_prototype
    }

    /// Prototype for errors of `kind`; kinds without a constructor share
    /// `Error.prototype`
    pub fn error_prototype(&self, kind: ErrorKind) -> &ObjectRef {
        self.error_prototypes
            .get(&kind)
            .or_else(|| self.error_prototypes.get(&ErrorKind::Error))
            .unwrap_or(&self.object_prototype)
    }

    /// New plain object
    pub fn new_object(&self) -> ObjectRef {
        ObjectRef::new_plain(Some(self.object_prototype.clone()))
    }

    /// New array
    pub fn new_array(&self, elements: Vec<Value>) -> ObjectRef {
        ObjectRef::new_array(elements, Some(self.array_prototype.clone()))
    }

    /// New error object
    pub fn new_error(&self, kind: ErrorKind, message: &str) -> ObjectRef {
        ObjectRef::new_error(kind, message, Some(self.error_prototype(kind).clone()))
    }

    /// New function object with a `name` property
    pub fn new_function(&self, callable: Rc<dyn Callable>) -> ObjectRef {
        let name = Value::from(callable.name());
        let function = ObjectRef::new_function(callable, Some(self.function_prototype.clone()));
        function.set_named("name", name);
        function
    }

    /// New function object for a closure, with a fresh `prototype` object
    /// for instances it constructs
    pub fn new_closure(&self, closure: Closure) -> ObjectRef {
        let function = self.new_function(Rc::new(closure));
        let proto = self.new_object();
        proto.set_named("constructor", Value::Object(function.clone()));
        function.set_named("prototype", Value::Object(proto));
        function
    }

    /// Bind a host function as a global
    pub fn define_native<F>(&self, name: &str, func: F) -> ObjectRef
    where
        F: Fn(&mut dyn CallContext, &Value, &[Value]) -> Result<Value, VmFault> + 'static,
    {
        let function = self.new_function(Rc::new(NativeFunction::new(name, func)));
        self.global
            .set_named(name, Value::Object(function.clone()));
        function
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}
