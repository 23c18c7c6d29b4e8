//! Capabilities the inspector consumes from the execution engine.
//!
//! The engine stays in charge of its object model, evaluation and stack
//! walking. The inspector only calls into it through these traits.
//!
//! # Example
//!
//! ```rust,ignore
//! use spyglass_inspector::{InjectedScript, InjectedScriptId};
//!
//! let mut script = InjectedScript::new(InjectedScriptId(1), MyEngine::default());
//! let result = script.evaluate("answer", Some("console"), false, false, true);
//! ```

use crate::{CallFrameLocation, Exception, ObjectRef, RemoteObject, ScopeType, Subtype, Value};
use serde::{Deserialize, Serialize};
use std::{fmt, rc::Rc};

/// Shared handle to a live stack frame.
pub type FrameRef = Rc<dyn CallFrame>;

/// The execution engine of one inspected context.
pub trait InspectorHost {
    /// The precise subtype of an object, if the engine knows one.
    fn precise_type(&self, object: &ObjectRef) -> Result<Option<Subtype>, Exception>;

    /// The engine's internal class name for an object.
    fn internal_constructor_name(&self, object: &ObjectRef) -> Result<String, Exception>;

    /// Evaluates an expression in the context's global scope.
    fn evaluate(&self, expression: &str) -> Result<Value, Exception>;

    /// Creates a fresh mapping holding `entries`.
    fn create_mapping(&self, entries: Vec<(Value, Value)>) -> Value;

    /// Creates a fresh sequence holding `elements`.
    fn create_sequence(&self, elements: Vec<Value>) -> Value;

    /// Engine-internal properties of a value.
    fn internal_properties(&self, _value: &Value) -> Vec<(String, Value)> {
        Vec::new()
    }

    /// Declaration details of a function.
    fn function_details(&self, _function: &ObjectRef) -> RawFunctionDetails {
        RawFunctionDetails::default()
    }

    /// Member names that complete an expression ending in `value`.
    fn completions(&self, _value: &Value) -> Vec<String> {
        Vec::new()
    }

    /// The database id of a database handle.
    fn database_id(&self, _object: &ObjectRef) -> Option<String> {
        None
    }

    /// The storage id of a storage handle.
    fn storage_id(&self, _object: &ObjectRef) -> Option<String> {
        None
    }

    /// Reveals an object to the client.
    fn inspect(&self, _object: &RemoteObject, _hints: &InspectHints) {}

    /// Loads extension module `name` from `source` and instantiates it.
    fn load_module(&self, name: &str, _source: &str) -> Result<Value, Exception> {
        Err(Exception::new(
            "NameError",
            format!("uninitialized constant {name}"),
        ))
    }
}

/// One activation record of the paused stack.
pub trait CallFrame: fmt::Debug {
    /// The calling frame, `None` for the bottom of the stack.
    fn caller(&self) -> Option<FrameRef>;

    /// Whether the frame runs a named function rather than top-level code.
    fn is_function(&self) -> bool;

    /// The function's name.
    fn function_name(&self) -> String;

    /// The id of the script the frame executes.
    fn source_id(&self) -> u64;

    /// The current line.
    fn line(&self) -> u32;

    /// The frame's self value.
    fn this_object(&self) -> Value;

    /// The scope objects, innermost first.
    fn scope_chain(&self) -> Vec<Value>;

    /// The kind of the scope at `index` of [`scope_chain`](Self::scope_chain).
    fn scope_type(&self, index: usize) -> ScopeType;

    /// Evaluates an expression in the frame's scope.
    fn evaluate(&self, expression: &str) -> Result<Value, Exception>;

    /// Restarts the frame. Returns `false` when the engine declines.
    fn restart(&self) -> bool {
        false
    }
}

/// Function details as reported by the engine, before wrapping.
#[derive(Debug, Clone, Default)]
pub struct RawFunctionDetails {
    /// Where the function is declared.
    pub location: Option<CallFrameLocation>,
    /// The declared name.
    pub function_name: String,
    /// Captured scopes, innermost first.
    pub raw_scopes: Vec<(ScopeType, Value)>,
}

/// Extra metadata attached to an object revealed by [`InspectorHost::inspect`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectHints {
    /// Set when the object is a database handle known to the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
    /// Set when the object is a storage handle known to the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom_storage_id: Option<String>,
}
