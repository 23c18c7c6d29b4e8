//! The session context of one inspected world.
//!
//! An [`InjectedScript`] owns the live-object table of its context and runs
//! every protocol operation against it. Contexts never share state: ids minted
//! here only resolve here.

use crate::{
    CallFrameId, CallFrameLocation, CallFrameProxy, Exception, FrameRef, InjectedScriptId,
    InspectHints, InspectorError, InspectorHost, InternalPropertyDescriptor, ModuleRegistry,
    ObjectBinder, PropertyDescriptor, RemoteObject, RemoteObjectId, ScopeProxy, Subtype, Value,
    call_frame::{self, wrap_frames, wrap_scope},
    classifier::{self, type_of},
    descriptor::describe_properties,
    remote_object::{describe, wrap_value},
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Group that holds the `this` values and scopes of wrapped call frames.
pub const BACKTRACE_GROUP: &str = "backtrace";

/// Group whose evaluation results are remembered as the last console result.
pub const CONSOLE_GROUP: &str = "console";

/// Outcome of an evaluation or call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    /// The program raised; `result` describes what it raised.
    pub was_thrown: bool,
    /// The wrapped result or raised value.
    pub result: RemoteObject,
}

/// One argument of [`InjectedScript::call_function_on`].
///
/// An `objectId` wins over a `value`; with neither the argument is nil.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallArgument {
    /// Handle of a bound value of the same context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    /// A JSON literal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Declaration details of a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDetails {
    /// Where the function is declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<CallFrameLocation>,
    /// The declared name.
    pub function_name: String,
    /// The captured scopes, wrapped.
    pub scope_chain: Vec<ScopeProxy>,
}

/// One inspected context and its live-object table.
#[derive(Debug)]
pub struct InjectedScript<H> {
    id: InjectedScriptId,
    host: H,
    binder: ObjectBinder,
    modules: ModuleRegistry,
    last_result: Option<Value>,
}

impl<H: InspectorHost> InjectedScript<H> {
    /// Creates an empty context backed by `host`.
    pub fn new(id: InjectedScriptId, host: H) -> Self {
        Self {
            id,
            host,
            binder: ObjectBinder::new(id),
            modules: ModuleRegistry::default(),
            last_result: None,
        }
    }

    /// The context id embedded in every handle minted here.
    #[must_use]
    pub fn id(&self) -> InjectedScriptId {
        self.id
    }

    /// The execution engine of this context.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The live-object table.
    pub fn binder(&self) -> &ObjectBinder {
        &self.binder
    }

    /// The most recent result evaluated into the console group.
    pub fn last_result(&self) -> Option<&Value> {
        self.last_result.as_ref()
    }

    /// Builds the proxy of `value`, binding it into `group` when it is a reference.
    ///
    /// Never fails; see [`RemoteObject::fallback`].
    pub fn wrap(
        &mut self,
        value: &Value,
        group: Option<&str>,
        force_value: bool,
        generate_preview: bool,
    ) -> RemoteObject {
        wrap_value(
            &self.host,
            &mut self.binder,
            value,
            group,
            force_value,
            generate_preview,
        )
    }

    /// Wraps a value for a client that may or may not see into the context.
    ///
    /// Without access the proxy is never bound: it carries the type and either
    /// the primitive itself or the value's string form.
    pub fn wrap_object(
        &mut self,
        value: &Value,
        group: Option<&str>,
        can_access_inspected_window: bool,
        generate_preview: bool,
    ) -> RemoteObject {
        if can_access_inspected_window {
            return self.wrap(value, group, false, generate_preview);
        }

        let mut remote = RemoteObject::new(type_of(value));
        if value.is_primitive() {
            remote.value = value.to_json().ok();
        } else {
            remote.description = Some(value.to_string());
        }
        remote
    }

    /// Binds `value` without building a proxy.
    pub fn bind(&mut self, value: Value, group: Option<&str>) -> RemoteObjectId {
        self.binder.bind(value, group)
    }

    /// The value behind a handle.
    pub fn find_object_by_id(&self, object_id: &RemoteObjectId) -> Result<Value, InspectorError> {
        self.binder.resolve(object_id).cloned()
    }

    /// The value behind a handle, if it is a document node.
    pub fn node_for_object_id(&self, object_id: &RemoteObjectId) -> Option<Value> {
        let value = self.find_object_by_id(object_id).ok()?;
        (classifier::subtype(&self.host, &value) == Some(Subtype::Node)).then_some(value)
    }

    /// Drops one handle. Handles of other contexts are ignored.
    pub fn release_object(&mut self, object_id: &RemoteObjectId) {
        if object_id.injected_script_id == self.id {
            self.binder.release(object_id.id);
        }
    }

    /// Drops every handle of `group`.
    pub fn release_object_group(&mut self, group: &str) {
        self.binder.release_group(group);
    }

    /// Drops every handle, module and remembered result.
    pub fn clear(&mut self) {
        self.binder.clear();
        self.modules = ModuleRegistry::default();
        self.last_result = None;
    }

    fn group_of(&self, object_id: &RemoteObjectId) -> Option<String> {
        self.binder.group_of(object_id.id).map(str::to_owned)
    }

    fn thrown(&mut self, exception: &Exception, group: Option<&str>) -> EvaluationResult {
        debug!("context {} captured {exception}", self.id);
        let mut result = self.wrap(&exception.value, group, false, false);
        result.description = Some(exception.to_string());
        EvaluationResult {
            was_thrown: true,
            result,
        }
    }

    fn wrap_outcome(
        &mut self,
        outcome: Result<Value, Exception>,
        group: Option<&str>,
        return_by_value: bool,
        generate_preview: bool,
    ) -> EvaluationResult {
        match outcome {
            Ok(value) => {
                if group == Some(CONSOLE_GROUP) {
                    self.last_result = Some(value.clone());
                }
                EvaluationResult {
                    was_thrown: false,
                    result: self.wrap(&value, group, return_by_value, generate_preview),
                }
            }
            Err(exception) => self.thrown(&exception, group),
        }
    }

    /// Enumerates the properties of a bound value.
    ///
    /// Values are wrapped into the group of the inspected handle.
    pub fn get_properties(
        &mut self,
        object_id: &RemoteObjectId,
        own_properties: bool,
    ) -> Result<Vec<PropertyDescriptor>, InspectorError> {
        let value = self.find_object_by_id(object_id)?;
        let group = self.group_of(object_id);
        let group = group.as_deref();

        let descriptors = describe_properties(&value, own_properties)
            .into_iter()
            .map(|descriptor| {
                descriptor.map(|outcome| match outcome {
                    Ok(value) => self.wrap(&value, group, false, false),
                    Err(exception) => self.thrown(&exception, group).result,
                })
            })
            .collect();
        Ok(descriptors)
    }

    /// Engine-internal properties of a bound value.
    pub fn get_internal_properties(
        &mut self,
        object_id: &RemoteObjectId,
    ) -> Result<Vec<InternalPropertyDescriptor>, InspectorError> {
        let value = self.find_object_by_id(object_id)?;
        let group = self.group_of(object_id);

        let properties = self.host.internal_properties(&value);
        Ok(properties
            .into_iter()
            .map(|(name, value)| InternalPropertyDescriptor {
                name,
                value: self.wrap(&value, group.as_deref(), false, false),
            })
            .collect())
    }

    /// Declaration details of a bound function.
    pub fn get_function_details(
        &mut self,
        function_id: &RemoteObjectId,
    ) -> Result<FunctionDetails, InspectorError> {
        let value = self.find_object_by_id(function_id)?;
        let function = value
            .as_object()
            .filter(|object| object.callable().is_some())
            .ok_or(InspectorError::NotAFunction)?;
        let group = self.group_of(function_id);

        let raw = self.host.function_details(function);
        let scope_chain = raw
            .raw_scopes
            .iter()
            .map(|(scope_type, object)| {
                wrap_scope(
                    &self.host,
                    &mut self.binder,
                    *scope_type,
                    object,
                    group.as_deref(),
                )
            })
            .collect();

        Ok(FunctionDetails {
            location: raw.location,
            function_name: raw.function_name,
            scope_chain,
        })
    }

    /// Member names completing an expression that ends in the bound value.
    pub fn get_completions(
        &self,
        object_id: &RemoteObjectId,
    ) -> Result<Vec<String>, InspectorError> {
        let value = self.find_object_by_id(object_id)?;
        Ok(self.host.completions(&value))
    }

    /// Member names of a representative primitive of `type_name`.
    pub fn get_primitive_type_completions(&self, type_name: &str) -> Vec<String> {
        let sample = match type_name {
            "string" => Value::from(""),
            "boolean" => Value::from(true),
            "number" => Value::from(33.33),
            _ => Value::Nil,
        };
        self.host.completions(&sample)
    }

    /// Evaluates `expression` in the global scope and wraps the result into `group`.
    ///
    /// The command line API is not provided; the flag is accepted for
    /// compatibility.
    pub fn evaluate(
        &mut self,
        expression: &str,
        group: Option<&str>,
        _inject_command_line_api: bool,
        return_by_value: bool,
        generate_preview: bool,
    ) -> EvaluationResult {
        let outcome = self.host.evaluate(expression);
        self.wrap_outcome(outcome, group, return_by_value, generate_preview)
    }

    /// Evaluates `expression` to a function and calls it on a bound value.
    ///
    /// The result is wrapped into the target's group.
    pub fn call_function_on(
        &mut self,
        object_id: &RemoteObjectId,
        expression: &str,
        arguments: &[CallArgument],
        return_by_value: bool,
    ) -> Result<EvaluationResult, InspectorError> {
        let target = self.find_object_by_id(object_id)?;
        let group = self.group_of(object_id);
        let group = group.as_deref();

        let arguments = arguments
            .iter()
            .map(|argument| self.resolve_argument(argument))
            .collect::<Result<Vec<_>, _>>()?;

        let function = match self.host.evaluate(expression) {
            Ok(function) => function,
            Err(exception) => return Ok(self.thrown(&exception, group)),
        };
        let outcome = {
            let callable = function
                .as_object()
                .and_then(|object| object.callable())
                .ok_or(InspectorError::NotCallable)?;
            callable.call(&target, &arguments)
        };

        Ok(self.wrap_outcome(outcome, group, return_by_value, false))
    }

    fn resolve_argument(&self, argument: &CallArgument) -> Result<Value, InspectorError> {
        if let Some(object_id) = &argument.object_id {
            let object_id: RemoteObjectId = object_id.parse()?;
            if object_id.injected_script_id != self.id {
                return Err(InspectorError::ForeignArgument);
            }
            return self.find_object_by_id(&object_id);
        }
        Ok(argument
            .value
            .as_ref()
            .map_or(Value::Nil, |json| Value::from_json(&self.host, json)))
    }

    /// Wraps the paused stack, top frame first.
    pub fn wrap_call_frames(&mut self, top: Option<FrameRef>) -> Vec<CallFrameProxy> {
        let Some(top) = top else {
            return Vec::new();
        };
        wrap_frames(&self.host, &mut self.binder, top, BACKTRACE_GROUP)
    }

    /// Evaluates `expression` in the scope of one paused frame.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate_on_call_frame(
        &mut self,
        top: &FrameRef,
        call_frame_id: &CallFrameId,
        expression: &str,
        group: Option<&str>,
        _inject_command_line_api: bool,
        return_by_value: bool,
        generate_preview: bool,
    ) -> Result<EvaluationResult, InspectorError> {
        let frame = call_frame::frame_at(top, self.id, call_frame_id)?;
        let outcome = frame.evaluate(expression);
        Ok(self.wrap_outcome(outcome, group, return_by_value, generate_preview))
    }

    /// Asks the engine to restart one paused frame.
    pub fn restart_frame(
        &self,
        top: &FrameRef,
        call_frame_id: &CallFrameId,
    ) -> Result<(), InspectorError> {
        let frame = call_frame::frame_at(top, self.id, call_frame_id)?;
        if frame.restart() {
            Ok(())
        } else {
            Err(InspectorError::RestartUnsupported)
        }
    }

    /// Reveals `value` to the client, with database or storage hints when
    /// the engine knows the object.
    pub fn inspect_object(&mut self, value: Value) -> Value {
        if matches!(value, Value::Undefined | Value::Nil) {
            return value;
        }

        let remote = self.wrap(&value, None, false, false);
        let mut hints = InspectHints::default();
        if let Some(object) = value.as_object() {
            match describe(&self.host, &value) {
                Ok(Some(class)) if class == "Database" => {
                    hints.database_id = self.host.database_id(object);
                }
                Ok(Some(class)) if class == "Storage" => {
                    hints.dom_storage_id = self.host.storage_id(object);
                }
                Ok(_) => {}
                Err(exception) => warn!("failed to describe inspected object: {exception}"),
            }
        }
        self.host.inspect(&remote, &hints);
        value
    }

    /// The extension registered under `name`.
    pub fn module(&self, name: &str) -> Option<&Value> {
        self.modules.get(name)
    }

    /// Loads extension `name` through the engine and registers the instance.
    ///
    /// A failed load leaves no entry behind.
    pub fn inject_module(&mut self, name: &str, source: &str) -> Result<Value, InspectorError> {
        self.modules.remove(name);
        let instance =
            self.host
                .load_module(name, source)
                .map_err(|exception| InspectorError::ModuleLoad {
                    name: name.to_owned(),
                    reason: exception.to_string(),
                })?;
        debug!("context {} injected module {name}", self.id);
        self.modules.insert(name, instance.clone());
        Ok(instance)
    }

    /// Wraps a mapping of the inclusive index range `from..=to` to the
    /// elements of a bound sequence. The range stops at the last element;
    /// holes inside it map to nil.
    pub fn build_array_fragment(
        &mut self,
        object_id: &RemoteObjectId,
        from_index: u32,
        to_index: u32,
    ) -> Result<RemoteObject, InspectorError> {
        let value = self.find_object_by_id(object_id)?;
        let group = self.group_of(object_id);

        let length = length_of(&value);
        let entries = (from_index..=to_index)
            .map_while(|index| {
                let position = usize::try_from(index).ok().filter(|p| *p < length)?;
                let element = value
                    .as_object()
                    .and_then(|object| object.element(position))
                    .unwrap_or(Value::Nil);
                Some((Value::from(i64::from(index)), element))
            })
            .collect();
        let fragment = self.host.create_mapping(entries);
        Ok(self.wrap(&fragment, group.as_deref(), false, false))
    }

    /// Wraps a mapping holding only the length of a bound value.
    pub fn build_object_fragment(
        &mut self,
        object_id: &RemoteObjectId,
    ) -> Result<RemoteObject, InspectorError> {
        let value = self.find_object_by_id(object_id)?;
        let group = self.group_of(object_id);

        let length = i64::try_from(length_of(&value)).unwrap_or(i64::MAX);
        let fragment = self
            .host
            .create_mapping(vec![(Value::from("length"), Value::from(length))]);
        Ok(self.wrap(&fragment, group.as_deref(), false, false))
    }
}

fn length_of(value: &Value) -> usize {
    value.as_object().map_or(0, |object| {
        object.length().unwrap_or_else(|| object.elements().len())
    })
}
