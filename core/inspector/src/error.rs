//! Error types of the inspector.
//!
//! Three failure channels are kept apart:
//!
//! - [`InspectorError`]: a handle or call-frame id could not be resolved, or a
//!   target has the wrong shape. Returned as `Err` from the operation.
//! - [`Exception`](crate::Exception): the inspected program raised. Never an
//!   `Err` of a protocol operation, it is turned into a thrown
//!   [`EvaluationResult`](crate::EvaluationResult).
//! - [`ProtocolError`]: the request itself could not be dispatched.

use crate::InjectedScriptId;
use thiserror::Error;

/// A resolution failure reported back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectorError {
    /// The object id is unknown, stale, or belongs to another context.
    #[error("Could not find object with given id")]
    ObjectNotFound,

    /// The call frame id is unknown or belongs to another context.
    #[error("Could not find call frame with given id")]
    CallFrameNotFound,

    /// The id resolved to something that is not a function.
    #[error("Cannot resolve function by id.")]
    NotAFunction,

    /// A call argument references an object of a different context.
    #[error("Arguments should belong to the same world as the target object.")]
    ForeignArgument,

    /// The function expression did not evaluate to a callable.
    #[error("Given expression does not evaluate to a function")]
    NotCallable,

    /// The execution engine declined to restart the frame.
    #[error("Restart frame is not supported")]
    RestartUnsupported,

    /// The text is not a well formed object id.
    #[error("Invalid object id: {0}")]
    MalformedObjectId(String),

    /// The text is not a well formed call frame id.
    #[error("Invalid call frame id: {0}")]
    MalformedCallFrameId(String),

    /// No context with this id is attached.
    #[error("Cannot find context with specified id: {0}")]
    UnknownContext(InjectedScriptId),

    /// No extension module was injected under this name.
    #[error("Module {0} is not injected")]
    UnknownModule(String),

    /// The host failed to load an extension module.
    #[error("Failed to inject module {name}: {reason}")]
    ModuleLoad {
        /// Requested module name.
        name: String,
        /// Description of the host failure.
        reason: String,
    },
}

/// Errors raised while dispatching a protocol request.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The command name is not part of the protocol.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The arguments did not match the command's schema.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[source] serde_json::Error),

    /// The response body could not be encoded.
    #[error("Failed to serialize: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The operation itself failed to resolve its target.
    #[error(transparent)]
    Inspector(#[from] InspectorError),
}
