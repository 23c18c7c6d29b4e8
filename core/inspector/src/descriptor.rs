//! Property enumeration.

use crate::{
    Exception, ObjectKind, ObjectRef, RemoteObject, StructuralKind, Value,
    classifier::structural_kind,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// One property of an inspected object.
///
/// `T` is [`RemoteObject`] on the wire; the builder produces raw outcomes that
/// are wrapped before anything leaves the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor<T = RemoteObject> {
    /// Property name.
    pub name: String,
    /// The value of a data property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
    /// The getter of an accessor property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<T>,
    /// The setter of an accessor property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<T>,
    /// Whether the value can be assigned.
    #[serde(default)]
    pub writable: bool,
    /// Whether the property can be redefined or deleted.
    #[serde(default)]
    pub configurable: bool,
    /// Whether the property shows up in enumeration.
    #[serde(default)]
    pub enumerable: bool,
    /// Reading the value raised; `value` describes the failure.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub was_thrown: bool,
}

impl<T> PropertyDescriptor<T> {
    fn data(name: impl Into<String>, value: T, writable: bool, configurable: bool) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            get: None,
            set: None,
            writable,
            configurable,
            enumerable: true,
            was_thrown: false,
        }
    }

    /// Converts every value, getter and setter with `f`.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PropertyDescriptor<U> {
        PropertyDescriptor {
            name: self.name,
            value: self.value.map(&mut f),
            get: self.get.map(&mut f),
            set: self.set.map(&mut f),
            writable: self.writable,
            configurable: self.configurable,
            enumerable: self.enumerable,
            was_thrown: self.was_thrown,
        }
    }
}

/// An internal property of an inspected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalPropertyDescriptor {
    /// Property name.
    pub name: String,
    /// Wrapped value.
    pub value: RemoteObject,
}

/// Property outcome before wrapping: the value, or what reading it raised.
pub(crate) type RawProperty = PropertyDescriptor<Result<Value, Exception>>;

/// Enumerates the properties of `value`.
///
/// `own_only` leaves out accessor pairs declared by the object's type.
pub(crate) fn describe_properties(value: &Value, own_only: bool) -> Vec<RawProperty> {
    match (structural_kind(value), value) {
        (StructuralKind::Numeric, _) => {
            vec![PropertyDescriptor::data(
                value.to_string(),
                Ok(value.clone()),
                true,
                true,
            )]
        }
        (StructuralKind::Mapping, Value::Object(object)) => object
            .entries()
            .into_iter()
            .map(|(key, value)| PropertyDescriptor::data(key.to_string(), Ok(value), true, true))
            .collect(),
        (StructuralKind::Sequence, Value::Object(object)) => object
            .elements()
            .into_iter()
            .enumerate()
            .map(|(index, element)| {
                PropertyDescriptor::data(index.to_string(), Ok(element), true, true)
            })
            .collect(),
        (StructuralKind::Generic, Value::Object(object)) => generic_properties(object, own_only),
        _ => Vec::new(),
    }
}

fn generic_properties(object: &ObjectRef, own_only: bool) -> Vec<RawProperty> {
    let mut descriptors = Vec::new();

    for name in object.attributes() {
        let writable = object.has_setter(&name);
        let outcome = object.read_attribute(&name);
        let was_thrown = outcome.is_err();
        if let Err(exception) = &outcome {
            debug!("reading attribute {name} raised: {exception}");
        }
        let mut descriptor = PropertyDescriptor::data(name, outcome, writable, false);
        descriptor.was_thrown = was_thrown;
        descriptors.push(descriptor);
    }

    if object.kind() == ObjectKind::Binding {
        descriptors.extend(
            object
                .local_variables()
                .into_iter()
                .map(|(name, value)| PropertyDescriptor::data(name, Ok(value), true, false)),
        );
    }

    descriptors.extend(
        object
            .slots()
            .into_iter()
            .filter(|slot| !slot.internal)
            .map(|slot| {
                let writable = object.has_setter(&slot.name);
                PropertyDescriptor::data(slot.name, Ok(slot.value), writable, false)
            }),
    );

    if !own_only {
        descriptors.extend(object.accessors().into_iter().map(|accessor| {
            PropertyDescriptor {
                name: accessor.name,
                value: None,
                get: accessor.getter.map(Ok),
                set: accessor.setter.map(Ok),
                writable: false,
                configurable: false,
                enumerable: false,
                was_thrown: false,
            }
        }));
    }

    descriptors
}
