//! A small reference runtime for the Spyglass inspector.
//!
//! [`Runtime`] implements [`InspectorHost`](spyglass_inspector::InspectorHost)
//! over [`RuntimeObject`]s: plain instances, hashes, arrays, functions,
//! classes, bindings, nodes, dates and regular expressions. Expressions are
//! read by a tiny evaluator (see [`eval`]) and paused stacks are built from
//! [`RuntimeFrame`]s.
//!
//! # Example
//!
//! ```rust,ignore
//! use spyglass_inspector::InjectedScriptManager;
//! use spyglass_runtime::{Runtime, RuntimeObject};
//!
//! let runtime = Runtime::new();
//! runtime.define_global("list", RuntimeObject::array(vec![1.into(), 2.into()]).into_value());
//!
//! let mut manager = InjectedScriptManager::new();
//! let id = manager.create(runtime);
//! let result = manager.get_mut(id)?.evaluate("list", Some("console"), false, false, true);
//! ```

pub mod eval;
pub mod frame;
pub mod host;
pub mod object;

pub use eval::{Scope, SyntaxError};
pub use frame::RuntimeFrame;
pub use host::{Globals, Runtime};
pub use object::{AttributeGetter, Function, NativeBody, ObjectData, RuntimeObject};
