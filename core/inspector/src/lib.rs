//! Remote object inspection for paused or running programs.
//!
//! This crate lets a debugger client look into the live values of an
//! execution engine without ever owning them. Values are handed out as
//! [`RemoteObject`] proxies: primitives travel inline, references travel as
//! opaque [`RemoteObjectId`] handles that later requests resolve again.
//!
//! # Overview
//!
//! - [`classifier`]: primitive/reference decisions and type tags
//! - [`ObjectBinder`]: the per-context live-object table and release groups
//! - [`PropertyDescriptor`]: property enumeration of bound values
//! - [`ObjectPreview`]: bounded one-level summaries
//! - [`RemoteObject`]: the proxy assembled from all of the above
//! - [`CallFrameProxy`]: the paused stack and its scope chains
//! - [`InjectedScript`]: one inspected context running every operation
//! - [`InjectedScriptManager`]: several isolated contexts side by side
//! - [`protocol`]: the framed request/response surface
//!
//! The engine plugs in through [`InspectorHost`], [`CallFrame`] and
//! [`HostObject`].
//!
//! # Example
//!
//! ```rust,ignore
//! use spyglass_inspector::{InjectedScriptManager, protocol::InspectorServer};
//!
//! let mut manager = InjectedScriptManager::new();
//! manager.create(MyEngine::default());
//!
//! let mut server = InspectorServer::new(manager);
//! server.run(&mut StdioTransport::stdio())?;
//! ```

pub mod binder;
pub mod call_frame;
pub mod classifier;
pub mod descriptor;
pub mod error;
pub mod host;
pub mod ids;
pub mod injected_script;
pub mod manager;
pub mod modules;
pub mod preview;
pub mod protocol;
pub mod remote_object;
pub mod value;

pub use binder::ObjectBinder;
pub use call_frame::{CallFrameLocation, CallFrameProxy, ScopeProxy, ScopeType};
pub use classifier::{Classification, RemoteObjectType, StructuralKind, Subtype, classify};
pub use descriptor::{InternalPropertyDescriptor, PropertyDescriptor};
pub use error::{InspectorError, ProtocolError};
pub use host::{CallFrame, FrameRef, InspectHints, InspectorHost, RawFunctionDetails};
pub use ids::{CallFrameId, InjectedScriptId, RemoteObjectId};
pub use injected_script::{
    BACKTRACE_GROUP, CONSOLE_GROUP, CallArgument, EvaluationResult, FunctionDetails,
    InjectedScript,
};
pub use manager::InjectedScriptManager;
pub use modules::ModuleRegistry;
pub use preview::{LENGTH_SLOT, ObjectPreview, PropertyPreview, Truncation, abbreviate_string};
pub use remote_object::RemoteObject;
pub use value::{
    Accessor, Callable, Exception, HostObject, NodeInfo, Number, ObjectKind, ObjectRef,
    Parameter, Slot, Symbol, Value,
};
