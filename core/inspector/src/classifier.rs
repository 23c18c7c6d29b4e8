//! Primitive/reference decisions and type tags.

use crate::{InspectorHost, ObjectKind, Value};
use log::warn;
use serde::{Deserialize, Serialize};

/// The `type` tag of a remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteObjectType {
    /// Numbers and symbols.
    Number,
    /// Strings.
    String,
    /// Booleans.
    Boolean,
    /// Everything that is not one of the others, nil included.
    Object,
    /// Callables.
    Function,
    /// Absent values.
    Undefined,
}

/// The `subtype` tag of a remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subtype {
    /// Indexed collections.
    Array,
    /// Document nodes.
    Node,
    /// Dates.
    Date,
    /// Regular expressions.
    Regexp,
    /// The null value.
    Null,
}

/// Result of classifying a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Whether the value is inlined rather than bound.
    pub is_primitive: bool,
    /// The type tag.
    pub type_: RemoteObjectType,
    /// The subtype tag, if any.
    pub subtype: Option<Subtype>,
}

/// How property enumeration and previews walk a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralKind {
    /// A number: one synthetic entry.
    Numeric,
    /// Key/value pairs.
    Mapping,
    /// Indexed elements.
    Sequence,
    /// Declared attributes, slots and scope locals.
    Generic,
}

/// Classifies `value`, asking the host oracle for the subtype of references.
pub fn classify<H: InspectorHost + ?Sized>(host: &H, value: &Value) -> Classification {
    Classification {
        is_primitive: value.is_primitive(),
        type_: type_of(value),
        subtype: subtype(host, value),
    }
}

/// Computes the `type` tag.
#[must_use]
pub fn type_of(value: &Value) -> RemoteObjectType {
    match value {
        Value::Number(_) | Value::Symbol(_) => RemoteObjectType::Number,
        Value::String(_) => RemoteObjectType::String,
        Value::Bool(_) => RemoteObjectType::Boolean,
        Value::Undefined => RemoteObjectType::Undefined,
        Value::Object(object) if object.callable().is_some() => RemoteObjectType::Function,
        Value::Nil | Value::Object(_) => RemoteObjectType::Object,
    }
}

/// Computes the `subtype` tag.
///
/// Oracle failures degrade to "no subtype".
pub fn subtype<H: InspectorHost + ?Sized>(host: &H, value: &Value) -> Option<Subtype> {
    match value {
        Value::Nil => Some(Subtype::Null),
        Value::Object(object) => host.precise_type(object).unwrap_or_else(|exception| {
            warn!("precise type lookup failed: {exception}");
            None
        }),
        _ => None,
    }
}

/// Picks the enumeration strategy for `value`.
#[must_use]
pub fn structural_kind(value: &Value) -> StructuralKind {
    match value {
        Value::Number(_) => StructuralKind::Numeric,
        Value::Object(object) => match object.kind() {
            ObjectKind::Mapping => StructuralKind::Mapping,
            ObjectKind::Sequence => StructuralKind::Sequence,
            _ => StructuralKind::Generic,
        },
        _ => StructuralKind::Generic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Callable, Exception, HostObject, ObjectRef, Parameter, Symbol};

    #[derive(Debug)]
    struct Function;

    impl Callable for Function {
        fn name(&self) -> Option<String> {
            Some("run".to_owned())
        }

        fn parameters(&self) -> Vec<Parameter> {
            Vec::new()
        }

        fn call(&self, _receiver: &Value, _arguments: &[Value]) -> Result<Value, Exception> {
            Ok(Value::Nil)
        }
    }

    impl HostObject for Function {
        fn kind(&self) -> ObjectKind {
            ObjectKind::Function
        }

        fn display_string(&self) -> String {
            "#<Proc>".to_owned()
        }

        fn callable(&self) -> Option<&dyn Callable> {
            Some(self)
        }
    }

    #[derive(Debug)]
    struct BrokenOracle;

    impl crate::InspectorHost for BrokenOracle {
        fn precise_type(&self, _object: &ObjectRef) -> Result<Option<Subtype>, Exception> {
            Err(Exception::new("RuntimeError", "oracle unavailable"))
        }

        fn internal_constructor_name(&self, _object: &ObjectRef) -> Result<String, Exception> {
            Ok("Object".to_owned())
        }

        fn evaluate(&self, _expression: &str) -> Result<Value, Exception> {
            Ok(Value::Undefined)
        }

        fn create_mapping(&self, _entries: Vec<(Value, Value)>) -> Value {
            Value::Nil
        }

        fn create_sequence(&self, _elements: Vec<Value>) -> Value {
            Value::Nil
        }
    }

    #[test]
    fn type_precedence() {
        assert_eq!(type_of(&Value::from(1.5)), RemoteObjectType::Number);
        assert_eq!(
            type_of(&Value::Symbol(Symbol::new(7, "sym"))),
            RemoteObjectType::Number
        );
        assert_eq!(type_of(&Value::from("s")), RemoteObjectType::String);
        assert_eq!(type_of(&Value::from(false)), RemoteObjectType::Boolean);
        assert_eq!(type_of(&Value::object(Function)), RemoteObjectType::Function);
        assert_eq!(type_of(&Value::Nil), RemoteObjectType::Object);
        assert_eq!(type_of(&Value::Undefined), RemoteObjectType::Undefined);
    }

    #[test]
    fn nil_is_an_object_with_null_subtype() {
        let classification = classify(&BrokenOracle, &Value::Nil);
        assert!(classification.is_primitive);
        assert_eq!(classification.type_, RemoteObjectType::Object);
        assert_eq!(classification.subtype, Some(Subtype::Null));
    }

    #[test]
    fn oracle_failures_mean_no_subtype() {
        let classification = classify(&BrokenOracle, &Value::object(Function));
        assert!(!classification.is_primitive);
        assert_eq!(classification.subtype, None);
    }

    #[test]
    fn enumeration_follows_the_object_shape() {
        assert_eq!(structural_kind(&Value::from(4)), StructuralKind::Numeric);
        assert_eq!(
            structural_kind(&Value::object(Function)),
            StructuralKind::Generic
        );
        assert_eq!(structural_kind(&Value::from("s")), StructuralKind::Generic);
    }
}
