//! The externally visible proxy of a value.

use crate::{
    Exception, InspectorHost, ObjectBinder, ObjectKind, ObjectPreview, RemoteObjectId,
    RemoteObjectType, Subtype, Value,
    classifier::{self, type_of},
    preview::generate_preview,
};
use log::warn;
use serde::{Deserialize, Serialize};

/// A serializable stand-in for a live or primitive value.
///
/// A proxy carrying an `objectId` is a live handle; one without is a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Type tag.
    #[serde(rename = "type")]
    pub type_: RemoteObjectType,
    /// Subtype tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<Subtype>,
    /// Handle to the bound value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
    /// Inlined value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Internal class name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Human readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Structural summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<ObjectPreview>,
}

impl RemoteObject {
    /// An unbound proxy carrying only a type tag.
    #[must_use]
    pub fn new(type_: RemoteObjectType) -> Self {
        Self {
            type_,
            subtype: None,
            object_id: None,
            value: None,
            class_name: None,
            description: None,
            preview: None,
        }
    }

    /// A snapshot proxy describing a failure to build the real one.
    #[must_use]
    pub fn fallback(exception: &Exception) -> Self {
        Self {
            value: Some(serde_json::Value::String(exception.to_string())),
            ..Self::new(RemoteObjectType::String)
        }
    }

    /// Whether the proxy is a live handle.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.object_id.is_some()
    }
}

/// Builds the proxy of `value`. Never fails: construction failures become a
/// [`RemoteObject::fallback`].
pub(crate) fn wrap_value<H: InspectorHost + ?Sized>(
    host: &H,
    binder: &mut ObjectBinder,
    value: &Value,
    group: Option<&str>,
    force_value: bool,
    generate_preview: bool,
) -> RemoteObject {
    try_wrap(host, binder, value, group, force_value, generate_preview).unwrap_or_else(
        |exception| {
            warn!("failed to wrap value, using fallback: {exception}");
            RemoteObject::fallback(&exception)
        },
    )
}

fn try_wrap<H: InspectorHost + ?Sized>(
    host: &H,
    binder: &mut ObjectBinder,
    value: &Value,
    group: Option<&str>,
    force_value: bool,
    with_preview: bool,
) -> Result<RemoteObject, Exception> {
    let type_ = type_of(value);

    let object = match value {
        Value::Symbol(symbol) => {
            return Ok(RemoteObject {
                value: Some(serde_json::Value::from(symbol.handle())),
                description: Some(format!(":{}", symbol.name())),
                ..RemoteObject::new(type_)
            });
        }
        Value::Object(object) if !force_value => object,
        Value::Undefined => return Ok(RemoteObject::new(type_)),
        Value::Nil => {
            return Ok(RemoteObject {
                value: Some(serde_json::Value::Null),
                subtype: Some(Subtype::Null),
                ..RemoteObject::new(type_)
            });
        }
        Value::Number(n) => {
            return Ok(RemoteObject {
                value: Some(value.to_json()?),
                description: Some(n.to_string()),
                ..RemoteObject::new(type_)
            });
        }
        _ => {
            return Ok(RemoteObject {
                value: Some(value.to_json()?),
                ..RemoteObject::new(type_)
            });
        }
    };

    let subtype = classifier::subtype(host, value);
    let class_name = host.internal_constructor_name(object)?;
    let description = describe(host, value)?;
    let preview = (with_preview && type_ == RemoteObjectType::Object)
        .then(|| generate_preview(host, object, subtype));

    Ok(RemoteObject {
        type_,
        subtype,
        object_id: Some(binder.bind(value.clone(), group)),
        value: None,
        class_name: Some(class_name),
        description,
        preview,
    })
}

/// The one-line description of a value; `None` for primitives.
pub(crate) fn describe<H: InspectorHost + ?Sized>(
    host: &H,
    value: &Value,
) -> Result<Option<String>, Exception> {
    let object = match value {
        Value::Symbol(symbol) => return Ok(Some(format!(":{}", symbol.name()))),
        Value::Object(object) => object,
        _ => return Ok(None),
    };

    if object.kind() == ObjectKind::Module {
        return Ok(Some(
            object
                .declared_name()
                .unwrap_or_else(|| object.display_string()),
        ));
    }

    let subtype = classifier::subtype(host, value);
    match subtype {
        Some(Subtype::Regexp | Subtype::Date) => return Ok(Some(object.display_string())),
        Some(Subtype::Node) => {
            if let Some(node) = object.node() {
                let name = node.node_name.to_lowercase();
                return Ok(Some(match node.node_type {
                    crate::NodeInfo::ELEMENT_NODE => format!("<{name}>"),
                    crate::NodeInfo::DOCUMENT_TYPE_NODE => format!("<!DOCTYPE {name}>"),
                    _ => name,
                }));
            }
        }
        _ => {}
    }

    if let Some(callable) = object.callable() {
        let name = callable.name().unwrap_or_else(|| "function".to_owned());
        let parameters = callable
            .parameters()
            .into_iter()
            .map(|parameter| {
                if parameter.optional {
                    format!("{} [optional]", parameter.name)
                } else {
                    parameter.name
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        return Ok(Some(format!("{name}({parameters})")));
    }

    let class_name = host.internal_constructor_name(object)?;
    if subtype == Some(Subtype::Array)
        && let Some(length) = object.length()
    {
        return Ok(Some(format!("{class_name}[{length}]")));
    }
    Ok(Some(class_name))
}
