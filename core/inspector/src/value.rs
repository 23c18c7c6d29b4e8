//! Live host values as seen by the inspector.
//!
//! The inspector never owns the program's object model. Hosts expose their
//! objects through [`HostObject`] and hand them over as [`Value::Object`]
//! handles; everything else is an immutable primitive.

use serde_json::Map;
use std::{any::Any, fmt, rc::Rc};
use thiserror::Error;

/// Maximum nesting followed when a value is serialized by value.
pub const MAX_BY_VALUE_DEPTH: usize = 32;

/// Shared handle to a live host object.
pub type ObjectRef = Rc<dyn HostObject>;

/// A value living in the inspected program.
#[derive(Debug, Clone)]
pub enum Value {
    /// An absent value.
    Undefined,
    /// The program's null value.
    Nil,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// An interned symbol.
    Symbol(Symbol),
    /// A reference to a live object.
    Object(ObjectRef),
}

impl Value {
    /// Returns `true` for values that describe themselves and are always inlined.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Undefined | Self::Nil | Self::Bool(_) | Self::Number(_) | Self::String(_)
        )
    }

    /// Returns the object handle if this value is a reference.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Wraps a host object into a value.
    pub fn object<T: HostObject>(object: T) -> Self {
        Self::Object(Rc::new(object))
    }

    /// Builds a value from a JSON literal sent by the client.
    ///
    /// Arrays and objects are materialized through `host`, so the callee sees
    /// ordinary host structures.
    pub fn from_json<H>(host: &H, json: &serde_json::Value) -> Self
    where
        H: crate::InspectorHost + ?Sized,
    {
        match json {
            serde_json::Value::Null => Self::Nil,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Number::Integer)
                .or_else(|| n.as_f64().map(Number::Float))
                .map_or(Self::Nil, Self::Number),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => {
                host.create_sequence(items.iter().map(|item| Self::from_json(host, item)).collect())
            }
            serde_json::Value::Object(fields) => host.create_mapping(
                fields
                    .iter()
                    .map(|(key, value)| (Self::String(key.clone()), Self::from_json(host, value)))
                    .collect(),
            ),
        }
    }

    /// Serializes the value by value.
    ///
    /// Nesting deeper than [`MAX_BY_VALUE_DEPTH`] (cyclic structures included)
    /// raises instead of recursing forever.
    pub fn to_json(&self) -> Result<serde_json::Value, Exception> {
        self.to_json_at(0)
    }

    fn to_json_at(&self, depth: usize) -> Result<serde_json::Value, Exception> {
        if depth > MAX_BY_VALUE_DEPTH {
            return Err(Exception::new(
                "SystemStackError",
                format!("value nesting exceeds {MAX_BY_VALUE_DEPTH} levels"),
            ));
        }

        Ok(match self {
            Self::Undefined | Self::Nil => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => n.to_json(),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Symbol(symbol) => serde_json::Value::String(symbol.name().to_owned()),
            Self::Object(object) => match object.kind() {
                ObjectKind::Sequence => serde_json::Value::Array(
                    object
                        .elements()
                        .iter()
                        .map(|element| element.to_json_at(depth + 1))
                        .collect::<Result<_, _>>()?,
                ),
                ObjectKind::Mapping => {
                    let mut map = Map::new();
                    for (key, value) in object.entries() {
                        map.insert(key.to_string(), value.to_json_at(depth + 1)?);
                    }
                    serde_json::Value::Object(map)
                }
                ObjectKind::Function => serde_json::Value::Null,
                ObjectKind::Plain | ObjectKind::Module | ObjectKind::Binding => {
                    let mut map = Map::new();
                    for slot in object.slots().into_iter().filter(|slot| !slot.internal) {
                        map.insert(slot.name, slot.value.to_json_at(depth + 1)?);
                    }
                    serde_json::Value::Object(map)
                }
            },
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Nil => f.write_str("nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Symbol(symbol) => f.write_str(symbol.name()),
            Self::Object(object) => f.write_str(&object.display_string()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(Number::Integer(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(Number::Integer(value.into()))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(Number::Float(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// A numeric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// An integer.
    Integer(i64),
    /// A floating point number.
    Float(f64),
}

impl Number {
    fn to_json(self) -> serde_json::Value {
        match self {
            Self::Integer(i) => serde_json::Value::from(i),
            Self::Float(f) => serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

/// An interned symbol with a host-stable numeric handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    handle: u64,
    name: Rc<str>,
}

impl Symbol {
    /// Creates a symbol. The host guarantees `handle` is stable for `name`.
    pub fn new(handle: u64, name: impl Into<Rc<str>>) -> Self {
        Self {
            handle,
            name: name.into(),
        }
    }

    /// The stable numeric handle.
    #[must_use]
    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// The symbol's name, without the leading colon.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A failure raised by the inspected program or by the host.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{class_name}: {message}")]
pub struct Exception {
    /// Class name of the raised error.
    pub class_name: String,
    /// Error message.
    pub message: String,
    /// The raised error object, if the host has one.
    pub value: Value,
}

impl Exception {
    /// Creates an exception without a backing error object.
    pub fn new(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            message: message.into(),
            value: Value::Undefined,
        }
    }

    /// Attaches the raised error object.
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }
}

/// Structural shape of a host object, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// An ordinary object with named slots and declared attributes.
    Plain,
    /// A key/value mapping.
    Mapping,
    /// An indexed sequence.
    Sequence,
    /// A callable.
    Function,
    /// A class or module.
    Module,
    /// A lexical scope binding.
    Binding,
}

/// An instance-level named slot.
#[derive(Debug, Clone)]
pub struct Slot {
    /// Slot name.
    pub name: String,
    /// Current value.
    pub value: Value,
    /// Host bookkeeping slot that must never be shown to clients.
    pub internal: bool,
}

impl Slot {
    /// A visible slot.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            internal: false,
        }
    }
}

/// A getter/setter pair declared by the object's type.
#[derive(Debug, Clone)]
pub struct Accessor {
    /// Property name.
    pub name: String,
    /// The getter function, if any.
    pub getter: Option<Value>,
    /// The setter function, if any.
    pub setter: Option<Value>,
}

/// A declared parameter of a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Whether the parameter may be omitted.
    pub optional: bool,
}

impl Parameter {
    /// A parameter callers must pass.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
        }
    }

    /// A parameter callers may leave out.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: true,
        }
    }
}

/// Document node identity, for node-subtype objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// The node name as reported by the document.
    pub node_name: String,
    /// The numeric node type.
    pub node_type: u16,
}

impl NodeInfo {
    /// `Node.ELEMENT_NODE`
    pub const ELEMENT_NODE: u16 = 1;
    /// `Node.DOCUMENT_TYPE_NODE`
    pub const DOCUMENT_TYPE_NODE: u16 = 10;
}

/// Something that can be invoked.
pub trait Callable {
    /// The declared name, if the callable has one.
    fn name(&self) -> Option<String>;

    /// The declared parameter list.
    fn parameters(&self) -> Vec<Parameter>;

    /// Invokes the callable with `receiver` as its self value.
    fn call(&self, receiver: &Value, arguments: &[Value]) -> Result<Value, Exception>;
}

/// A live object owned by the host.
///
/// Only [`display_string`](Self::display_string) is mandatory; every other
/// capability defaults to "not present".
pub trait HostObject: Any + fmt::Debug {
    /// The object's structural shape.
    fn kind(&self) -> ObjectKind {
        ObjectKind::Plain
    }

    /// The object's own string form.
    fn display_string(&self) -> String;

    /// Key/value pairs of a mapping.
    fn entries(&self) -> Vec<(Value, Value)> {
        Vec::new()
    }

    /// Elements of a sequence.
    fn elements(&self) -> Vec<Value> {
        Vec::new()
    }

    /// The element at `index` of a sequence.
    fn element(&self, index: usize) -> Option<Value> {
        self.elements().into_iter().nth(index)
    }

    /// The length, for objects that expose one.
    fn length(&self) -> Option<usize> {
        None
    }

    /// Instance-level named slots.
    fn slots(&self) -> Vec<Slot> {
        Vec::new()
    }

    /// Names of the attributes declared by the object's type.
    fn attributes(&self) -> Vec<String> {
        Vec::new()
    }

    /// Reads a declared attribute. May run program code and raise.
    fn read_attribute(&self, name: &str) -> Result<Value, Exception> {
        Err(Exception::new(
            "NoMethodError",
            format!("undefined method `{name}' for {}", self.display_string()),
        ))
    }

    /// Whether a setter exists for the named attribute or slot.
    fn has_setter(&self, _name: &str) -> bool {
        false
    }

    /// Getter/setter pairs declared by the type.
    fn accessors(&self) -> Vec<Accessor> {
        Vec::new()
    }

    /// Local variables of a scope binding.
    fn local_variables(&self) -> Vec<(String, Value)> {
        Vec::new()
    }

    /// The declared name of a class or module.
    fn declared_name(&self) -> Option<String> {
        None
    }

    /// Node identity of a document node.
    fn node(&self) -> Option<NodeInfo> {
        None
    }

    /// The callable view of a function object.
    fn callable(&self) -> Option<&dyn Callable> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Opaque;

    impl HostObject for Opaque {
        fn display_string(&self) -> String {
            "#<Opaque>".to_owned()
        }
    }

    #[test]
    fn primitives_are_self_describing() {
        assert!(Value::Nil.is_primitive());
        assert!(Value::Undefined.is_primitive());
        assert!(Value::from(3).is_primitive());
        assert!(Value::from("x").is_primitive());
        assert!(Value::from(true).is_primitive());
        assert!(!Value::Symbol(Symbol::new(1, "name")).is_primitive());
        assert!(!Value::object(Opaque).is_primitive());
    }

    #[test]
    fn object_equality_is_identity() {
        let a = Value::object(Opaque);
        let b = Value::object(Opaque);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn exception_display_names_class_and_message() {
        let exception = Exception::new("ZeroDivisionError", "divided by 0");
        assert_eq!(exception.to_string(), "ZeroDivisionError: divided by 0");
    }

    #[test]
    fn plain_objects_serialize_their_slots() {
        #[derive(Debug)]
        struct Point;

        impl HostObject for Point {
            fn display_string(&self) -> String {
                "#<Point>".to_owned()
            }

            fn slots(&self) -> Vec<Slot> {
                vec![
                    Slot::new("x", Value::from(1)),
                    Slot {
                        name: "__meta".to_owned(),
                        value: Value::Nil,
                        internal: true,
                    },
                ]
            }
        }

        let json = Value::object(Point).to_json().expect("serializable");
        assert_eq!(json, serde_json::json!({ "x": 1 }));
    }
}
