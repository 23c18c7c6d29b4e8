//! Stack frames of the reference runtime.

use crate::{
    Globals, ObjectData, RuntimeObject,
    eval::{self, Scope},
};
use log::debug;
use spyglass_inspector::{CallFrame, Exception, FrameRef, ScopeType, Value};
use std::{cell::Cell, rc::Rc};

/// A paused activation record.
///
/// Frames are assembled with the builder methods and then linked through
/// [`with_caller`](Self::with_caller), top of the stack last:
///
/// ```rust,ignore
/// let main = runtime.frame(1, 3).into_ref();
/// let top = runtime.frame(1, 12).in_function("area").with_caller(main).into_ref();
/// ```
#[derive(Debug)]
pub struct RuntimeFrame {
    globals: Globals,
    function_name: Option<String>,
    source_id: u64,
    line: u32,
    this: Value,
    scopes: Vec<(ScopeType, Value)>,
    caller: Option<FrameRef>,
    restartable: bool,
    restarts: Cell<u32>,
}

impl RuntimeFrame {
    /// A top-level frame at `line` of script `source_id`.
    #[must_use]
    pub fn new(globals: Globals, source_id: u64, line: u32) -> Self {
        Self {
            globals,
            function_name: None,
            source_id,
            line,
            this: Value::Nil,
            scopes: Vec::new(),
            caller: None,
            restartable: false,
            restarts: Cell::new(0),
        }
    }

    /// Marks the frame as running function `name`.
    #[must_use]
    pub fn in_function(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    /// Sets the frame's self value.
    #[must_use]
    pub fn with_this(mut self, this: Value) -> Self {
        self.this = this;
        self
    }

    /// Appends a scope. Scopes are listed innermost first.
    #[must_use]
    pub fn with_scope(mut self, scope_type: ScopeType, scope: Value) -> Self {
        self.scopes.push((scope_type, scope));
        self
    }

    /// Links the calling frame.
    #[must_use]
    pub fn with_caller(mut self, caller: FrameRef) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Allows the frame to be restarted.
    #[must_use]
    pub fn restartable(mut self) -> Self {
        self.restartable = true;
        self
    }

    /// Shares the frame.
    #[must_use]
    pub fn into_ref(self) -> FrameRef {
        Rc::new(self)
    }

    /// How many times the frame was restarted.
    #[must_use]
    pub fn restarts(&self) -> u32 {
        self.restarts.get()
    }
}

fn scope_lookup(scope: &Value, name: &str) -> Option<Value> {
    let object = scope.as_object().and_then(RuntimeObject::downcast)?;
    match object.data() {
        ObjectData::Binding(_) => object.local(name),
        ObjectData::Hash(_) => object.get(&Value::from(name)),
        _ => object.slot(&format!("@{name}")),
    }
}

impl Scope for RuntimeFrame {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .find_map(|(_, scope)| scope_lookup(scope, name))
            .or_else(|| self.globals.get(name))
    }

    fn self_value(&self) -> Value {
        self.this.clone()
    }

    fn symbol(&self, name: &str) -> Value {
        self.globals.symbol(name)
    }
}

impl CallFrame for RuntimeFrame {
    fn caller(&self) -> Option<FrameRef> {
        self.caller.clone()
    }

    fn is_function(&self) -> bool {
        self.function_name.is_some()
    }

    fn function_name(&self) -> String {
        self.function_name.clone().unwrap_or_default()
    }

    fn source_id(&self) -> u64 {
        self.source_id
    }

    fn line(&self) -> u32 {
        self.line
    }

    fn this_object(&self) -> Value {
        self.this.clone()
    }

    fn scope_chain(&self) -> Vec<Value> {
        self.scopes.iter().map(|(_, scope)| scope.clone()).collect()
    }

    fn scope_type(&self, index: usize) -> ScopeType {
        self.scopes
            .get(index)
            .map_or(ScopeType::Global, |(scope_type, _)| *scope_type)
    }

    fn evaluate(&self, expression: &str) -> Result<Value, Exception> {
        eval::evaluate(expression, self)
    }

    fn restart(&self) -> bool {
        if self.restartable {
            self.restarts.set(self.restarts.get() + 1);
            debug!("restarted frame at {}:{}", self.source_id, self.line);
        }
        self.restartable
    }
}
