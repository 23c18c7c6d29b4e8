//! The [`InspectorHost`] of the reference runtime.

use crate::{
    ObjectData, RuntimeFrame, RuntimeObject,
    eval::{self, Scope},
};
use indexmap::IndexMap;
use log::debug;
use rustc_hash::FxHashMap;
use spyglass_inspector::{
    CallFrameLocation, Callable, Exception, HostObject, InspectHints, InspectorHost, ObjectRef,
    RawFunctionDetails, RemoteObject, Subtype, Symbol, Value,
};
use std::{cell::RefCell, fmt, rc::Rc};

/// Member names offered for strings.
const STRING_MEMBERS: [&str; 4] = ["downcase", "length", "size", "upcase"];

/// Global variables and interned symbols, shared by a runtime and its frames.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    values: Rc<RefCell<IndexMap<String, Value>>>,
    symbols: Rc<RefCell<IndexMap<String, u64>>>,
}

impl Globals {
    /// Defines or replaces a global.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.values.borrow_mut().insert(name.into(), value);
    }

    /// Reads a global.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.borrow().get(name).cloned()
    }

    /// Names of the globals, in definition order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.values.borrow().keys().cloned().collect()
    }

    /// The symbol `name`. The same name always yields the same handle.
    #[must_use]
    pub fn symbol(&self, name: &str) -> Value {
        let mut symbols = self.symbols.borrow_mut();
        let next = symbols.len() as u64 + 1;
        let handle = *symbols.entry(name.to_owned()).or_insert(next);
        Value::Symbol(Symbol::new(handle, name))
    }

    /// A binding holding a snapshot of the globals.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        RuntimeObject::binding(self.values.borrow().clone()).into_value()
    }
}

impl Scope for Globals {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name)
    }

    fn self_value(&self) -> Value {
        Value::Nil
    }

    fn symbol(&self, name: &str) -> Value {
        Globals::symbol(self, name)
    }
}

#[derive(Clone)]
struct ModuleFactory(Rc<dyn Fn(&str) -> Result<Value, Exception>>);

impl fmt::Debug for ModuleFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModuleFactory")
    }
}

/// One inspected context of the reference runtime.
#[derive(Debug, Default)]
pub struct Runtime {
    globals: Globals,
    modules: RefCell<FxHashMap<String, ModuleFactory>>,
    inspected: RefCell<Vec<(RemoteObject, InspectHints)>>,
}

impl Runtime {
    /// A runtime without globals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The runtime's globals.
    #[must_use]
    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    /// Defines or replaces a global.
    pub fn define_global(&self, name: impl Into<String>, value: Value) {
        self.globals.define(name, value);
    }

    /// The symbol `name`.
    #[must_use]
    pub fn symbol(&self, name: &str) -> Value {
        self.globals.symbol(name)
    }

    /// Registers the factory that instantiates extension module `name`
    /// from its source text.
    pub fn register_module<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> Result<Value, Exception> + 'static,
    {
        self.modules
            .borrow_mut()
            .insert(name.into(), ModuleFactory(Rc::new(factory)));
    }

    /// Objects revealed to the client so far, oldest first.
    #[must_use]
    pub fn inspected(&self) -> Vec<(RemoteObject, InspectHints)> {
        self.inspected.borrow().clone()
    }

    /// Starts a frame that resolves free names against this runtime's globals.
    #[must_use]
    pub fn frame(&self, source_id: u64, line: u32) -> RuntimeFrame {
        RuntimeFrame::new(self.globals.clone(), source_id, line)
    }
}

fn foreign(object: &ObjectRef) -> Exception {
    eval::raise(
        "TypeError",
        format!("{} is not a runtime object", object.display_string()),
    )
}

impl InspectorHost for Runtime {
    fn precise_type(&self, object: &ObjectRef) -> Result<Option<Subtype>, Exception> {
        let Some(object) = RuntimeObject::downcast(object) else {
            return Ok(None);
        };
        Ok(match object.data() {
            ObjectData::Array(_) => Some(Subtype::Array),
            ObjectData::Node(_) => Some(Subtype::Node),
            ObjectData::Date(_) => Some(Subtype::Date),
            ObjectData::Regexp(_) => Some(Subtype::Regexp),
            // Collections that keep their own length slot are array-like.
            ObjectData::Plain if object.length().is_some() => Some(Subtype::Array),
            _ => None,
        })
    }

    fn internal_constructor_name(&self, object: &ObjectRef) -> Result<String, Exception> {
        RuntimeObject::downcast(object)
            .map(|runtime_object| runtime_object.class_name().to_owned())
            .ok_or_else(|| foreign(object))
    }

    fn evaluate(&self, expression: &str) -> Result<Value, Exception> {
        eval::evaluate(expression, &self.globals)
    }

    fn create_mapping(&self, entries: Vec<(Value, Value)>) -> Value {
        RuntimeObject::hash(entries).into_value()
    }

    fn create_sequence(&self, elements: Vec<Value>) -> Value {
        RuntimeObject::array(elements).into_value()
    }

    fn internal_properties(&self, value: &Value) -> Vec<(String, Value)> {
        let Some(object) = value.as_object().and_then(RuntimeObject::downcast) else {
            return Vec::new();
        };

        let mut properties = vec![(
            "[[Class]]".to_owned(),
            Value::from(object.class_name()),
        )];
        if let Some(function) = object.as_function() {
            let arity = i64::try_from(function.parameters().len()).unwrap_or(i64::MAX);
            properties.push(("[[Arity]]".to_owned(), Value::from(arity)));
            properties.push((
                "[[IsLambda]]".to_owned(),
                Value::from(function.name().is_none()),
            ));
        }
        if let Some(id) = object.handle_id() {
            properties.push(("[[HandleId]]".to_owned(), Value::from(id)));
        }
        properties
    }

    fn function_details(&self, function: &ObjectRef) -> RawFunctionDetails {
        let Some(function) = RuntimeObject::downcast(function).and_then(RuntimeObject::as_function)
        else {
            return RawFunctionDetails::default();
        };
        RawFunctionDetails {
            location: function
                .location()
                .map(|(source_id, line)| CallFrameLocation {
                    script_id: source_id.to_string(),
                    line_number: line,
                }),
            function_name: function.name().unwrap_or_default(),
            raw_scopes: function.captured().to_vec(),
        }
    }

    fn completions(&self, value: &Value) -> Vec<String> {
        let mut names: Vec<String> = match value {
            Value::String(_) => STRING_MEMBERS.iter().map(|&m| m.to_owned()).collect(),
            Value::Object(object) => match RuntimeObject::downcast(object) {
                Some(object) => {
                    let mut names: Vec<String> =
                        object.attribute_names().map(str::to_owned).collect();
                    names.extend(
                        object
                            .slots()
                            .into_iter()
                            .filter(|slot| !slot.internal)
                            .map(|slot| slot.name.trim_start_matches('@').to_owned()),
                    );
                    match object.data() {
                        ObjectData::Array(_) => {
                            names.extend(["first", "last", "length", "size"].map(str::to_owned));
                        }
                        ObjectData::Hash(entries) => {
                            names.extend(["length", "size"].map(str::to_owned));
                            names.extend(entries.borrow().iter().filter_map(|(key, _)| {
                                match key {
                                    Value::String(s) => Some(s.clone()),
                                    _ => None,
                                }
                            }));
                        }
                        ObjectData::Binding(_) => names.extend(
                            object.local_variables().into_iter().map(|(name, _)| name),
                        ),
                        _ => {}
                    }
                    names
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        };
        names.sort();
        names.dedup();
        names
    }

    fn database_id(&self, object: &ObjectRef) -> Option<String> {
        RuntimeObject::downcast(object)
            .filter(|object| object.class_name() == "Database")
            .and_then(|object| object.handle_id().map(str::to_owned))
    }

    fn storage_id(&self, object: &ObjectRef) -> Option<String> {
        RuntimeObject::downcast(object)
            .filter(|object| object.class_name() == "Storage")
            .and_then(|object| object.handle_id().map(str::to_owned))
    }

    fn inspect(&self, object: &RemoteObject, hints: &InspectHints) {
        debug!("inspect {:?}", object.description);
        self.inspected
            .borrow_mut()
            .push((object.clone(), hints.clone()));
    }

    fn load_module(&self, name: &str, source: &str) -> Result<Value, Exception> {
        let factory = self.modules.borrow().get(name).cloned();
        match factory {
            Some(ModuleFactory(factory)) => factory(source),
            None => Err(eval::raise(
                "NameError",
                format!("uninitialized constant {name}"),
            )),
        }
    }
}
