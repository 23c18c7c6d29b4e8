//! Serialization of the paused stack.

use crate::{
    CallFrameId, FrameRef, InjectedScriptId, InspectorError, InspectorHost, ObjectBinder,
    RemoteObject, Value, remote_object::wrap_value,
};
use serde::{Deserialize, Serialize};
use std::iter;

/// The kind of one lexical scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    /// The global scope.
    Global,
    /// The frame's own locals.
    Local,
    /// An object scope.
    With,
    /// A captured enclosing scope.
    Closure,
    /// The scope of an exception handler.
    Catch,
}

impl ScopeType {
    /// Every scope kind, indexed by its numeric code.
    pub const ALL: [Self; 5] = [
        Self::Global,
        Self::Local,
        Self::With,
        Self::Closure,
        Self::Catch,
    ];

    /// Maps an engine scope code to its kind.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }
}

impl TryFrom<u8> for ScopeType {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

/// A position in a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrameLocation {
    /// The script's id, as text.
    pub script_id: String,
    /// The line within the script.
    pub line_number: u32,
}

/// One entry of a scope chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeProxy {
    /// The scope kind.
    #[serde(rename = "type")]
    pub scope_type: ScopeType,
    /// The wrapped scope object.
    pub object: RemoteObject,
}

/// The externally visible form of one stack frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrameProxy {
    /// Handle for later frame-scoped requests.
    pub call_frame_id: CallFrameId,
    /// Empty for top-level code.
    pub function_name: String,
    /// Current position.
    pub location: CallFrameLocation,
    /// Visible scopes, innermost first.
    pub scope_chain: Vec<ScopeProxy>,
    /// The frame's self value.
    pub this: RemoteObject,
}

/// Walks the stack from `top` towards the bottom.
pub fn frames(top: FrameRef) -> impl Iterator<Item = FrameRef> {
    iter::successors(Some(top), |frame| frame.caller())
}

/// Resolves a frame id against the paused stack.
pub fn frame_at(
    top: &FrameRef,
    injected_script_id: InjectedScriptId,
    call_frame_id: &CallFrameId,
) -> Result<FrameRef, InspectorError> {
    if call_frame_id.injected_script_id != injected_script_id {
        return Err(InspectorError::CallFrameNotFound);
    }
    frames(top.clone())
        .nth(call_frame_id.ordinal)
        .ok_or(InspectorError::CallFrameNotFound)
}

pub(crate) fn wrap_scope<H: InspectorHost + ?Sized>(
    host: &H,
    binder: &mut ObjectBinder,
    scope_type: ScopeType,
    object: &Value,
    group: Option<&str>,
) -> ScopeProxy {
    ScopeProxy {
        scope_type,
        object: wrap_value(host, binder, object, group, false, false),
    }
}

pub(crate) fn wrap_frames<H: InspectorHost + ?Sized>(
    host: &H,
    binder: &mut ObjectBinder,
    top: FrameRef,
    group: &str,
) -> Vec<CallFrameProxy> {
    let injected_script_id = binder.injected_script_id();
    frames(top)
        .enumerate()
        .map(|(ordinal, frame)| {
            let scope_chain = frame
                .scope_chain()
                .iter()
                .enumerate()
                .map(|(index, scope)| {
                    wrap_scope(host, binder, frame.scope_type(index), scope, Some(group))
                })
                .collect();
            CallFrameProxy {
                call_frame_id: CallFrameId {
                    ordinal,
                    injected_script_id,
                },
                function_name: if frame.is_function() {
                    frame.function_name()
                } else {
                    String::new()
                },
                location: CallFrameLocation {
                    script_id: frame.source_id().to_string(),
                    line_number: frame.line(),
                },
                scope_chain,
                this: wrap_value(host, binder, &frame.this_object(), Some(group), false, false),
            }
        })
        .collect()
}
