//! The object model of the reference runtime.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use spyglass_inspector::{
    Accessor, Callable, Exception, HostObject, LENGTH_SLOT, NodeInfo, Number, ObjectKind,
    ObjectRef, Parameter, ScopeType, Slot, Value,
};
use std::{any::Any, cell::RefCell, fmt, rc::Rc};

/// Native body of a function: `(receiver, arguments) -> result`.
pub type NativeBody = Rc<dyn Fn(&Value, &[Value]) -> Result<Value, Exception>>;

/// Getter of a declared attribute.
pub type AttributeGetter = Rc<dyn Fn(&RuntimeObject) -> Result<Value, Exception>>;

/// A function object.
#[derive(Clone)]
pub struct Function {
    name: Option<String>,
    parameters: Vec<Parameter>,
    body: NativeBody,
    location: Option<(u64, u32)>,
    captured: Vec<(ScopeType, Value)>,
}

impl Function {
    /// Where the function is declared, as `(source id, line)`.
    #[must_use]
    pub fn location(&self) -> Option<(u64, u32)> {
        self.location
    }

    /// Scopes captured by the function, innermost first.
    #[must_use]
    pub fn captured(&self) -> &[(ScopeType, Value)] {
        &self.captured
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl Callable for Function {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn parameters(&self) -> Vec<Parameter> {
        self.parameters.clone()
    }

    fn call(&self, receiver: &Value, arguments: &[Value]) -> Result<Value, Exception> {
        (self.body)(receiver, arguments)
    }
}

/// What kind of runtime object this is, with its payload.
#[derive(Debug)]
pub enum ObjectData {
    /// An ordinary instance.
    Plain,
    /// A hash with insertion-ordered entries.
    Hash(RefCell<Vec<(Value, Value)>>),
    /// An array.
    Array(RefCell<Vec<Value>>),
    /// A function.
    Function(Function),
    /// A class or module.
    Module(String),
    /// A lexical scope.
    Binding(RefCell<IndexMap<String, Value>>),
    /// A document node.
    Node(NodeInfo),
    /// A date, with its printed form.
    Date(String),
    /// A regular expression source.
    Regexp(String),
}

struct Attribute {
    name: String,
    getter: AttributeGetter,
}

/// An object of the reference runtime.
///
/// Slots and collections use interior mutability, so changes made after an
/// object was bound show up when its handle is inspected again.
pub struct RuntimeObject {
    class_name: String,
    data: ObjectData,
    slots: RefCell<Vec<Slot>>,
    attributes: Vec<Attribute>,
    setters: FxHashSet<String>,
    accessors: Vec<Accessor>,
    handle_id: Option<String>,
}

impl fmt::Debug for RuntimeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeObject")
            .field("class_name", &self.class_name)
            .field("data", &self.data)
            .field("slots", &self.slots)
            .field(
                "attributes",
                &self.attributes.iter().map(|a| &a.name).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl RuntimeObject {
    fn with_data(class_name: impl Into<String>, data: ObjectData) -> Self {
        Self {
            class_name: class_name.into(),
            data,
            slots: RefCell::default(),
            attributes: Vec::new(),
            setters: FxHashSet::default(),
            accessors: Vec::new(),
            handle_id: None,
        }
    }

    /// An instance of `class_name` without slots.
    pub fn plain(class_name: impl Into<String>) -> Self {
        Self::with_data(class_name, ObjectData::Plain)
    }

    /// A hash.
    #[must_use]
    pub fn hash(entries: Vec<(Value, Value)>) -> Self {
        Self::with_data("Hash", ObjectData::Hash(RefCell::new(entries)))
    }

    /// An array.
    #[must_use]
    pub fn array(elements: Vec<Value>) -> Self {
        Self::with_data("Array", ObjectData::Array(RefCell::new(elements)))
    }

    /// A named function.
    pub fn function<F>(name: impl Into<String>, parameters: Vec<Parameter>, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, Exception> + 'static,
    {
        Self::with_data(
            "Proc",
            ObjectData::Function(Function {
                name: Some(name.into()),
                parameters,
                body: Rc::new(body),
                location: None,
                captured: Vec::new(),
            }),
        )
    }

    /// An anonymous function.
    pub fn lambda<F>(parameters: Vec<Parameter>, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, Exception> + 'static,
    {
        let mut function = Self::function("", parameters, body);
        if let ObjectData::Function(f) = &mut function.data {
            f.name = None;
        }
        function
    }

    /// A class or module named `name`.
    pub fn module(name: impl Into<String>) -> Self {
        Self::with_data("Class", ObjectData::Module(name.into()))
    }

    /// A lexical scope holding `locals`.
    #[must_use]
    pub fn binding(locals: IndexMap<String, Value>) -> Self {
        Self::with_data("Binding", ObjectData::Binding(RefCell::new(locals)))
    }

    /// A document node.
    pub fn node(
        class_name: impl Into<String>,
        node_name: impl Into<String>,
        node_type: u16,
    ) -> Self {
        Self::with_data(
            class_name,
            ObjectData::Node(NodeInfo {
                node_name: node_name.into(),
                node_type,
            }),
        )
    }

    /// A date printed as `text`.
    pub fn date(text: impl Into<String>) -> Self {
        Self::with_data("Time", ObjectData::Date(text.into()))
    }

    /// A regular expression with the given source.
    pub fn regexp(source: impl Into<String>) -> Self {
        Self::with_data("Regexp", ObjectData::Regexp(source.into()))
    }

    /// The error object raised as `class_name` with `message`.
    pub fn error(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::plain(class_name).with_slot("@message", Value::from(message.into()))
    }

    /// Adds an instance slot.
    #[must_use]
    pub fn with_slot(self, name: impl Into<String>, value: Value) -> Self {
        self.slots.borrow_mut().push(Slot::new(name, value));
        self
    }

    /// Adds a bookkeeping slot that clients never see.
    #[must_use]
    pub fn with_internal_slot(self, name: impl Into<String>, value: Value) -> Self {
        self.slots.borrow_mut().push(Slot {
            name: name.into(),
            value,
            internal: true,
        });
        self
    }

    /// Declares an attribute computed by `getter` on every read.
    #[must_use]
    pub fn with_attribute<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&RuntimeObject) -> Result<Value, Exception> + 'static,
    {
        self.attributes.push(Attribute {
            name: name.into(),
            getter: Rc::new(getter),
        });
        self
    }

    /// Declares a setter for an attribute or slot.
    #[must_use]
    pub fn with_setter(mut self, name: impl Into<String>) -> Self {
        self.setters.insert(name.into());
        self
    }

    /// Declares a getter/setter pair on the object's type.
    #[must_use]
    pub fn with_accessor(mut self, accessor: Accessor) -> Self {
        self.accessors.push(accessor);
        self
    }

    /// Attaches the engine handle id used for database and storage hints.
    #[must_use]
    pub fn with_handle_id(mut self, id: impl Into<String>) -> Self {
        self.handle_id = Some(id.into());
        self
    }

    /// Records where a function is declared.
    #[must_use]
    pub fn with_location(mut self, source_id: u64, line: u32) -> Self {
        if let ObjectData::Function(function) = &mut self.data {
            function.location = Some((source_id, line));
        }
        self
    }

    /// Records a scope captured by a function.
    #[must_use]
    pub fn with_captured_scope(mut self, scope_type: ScopeType, scope: Value) -> Self {
        if let ObjectData::Function(function) = &mut self.data {
            function.captured.push((scope_type, scope));
        }
        self
    }

    /// Wraps the object into a shared value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::object(self)
    }

    /// Finds the runtime object behind a host handle.
    #[must_use]
    pub fn downcast(object: &ObjectRef) -> Option<&Self> {
        let object: &dyn HostObject = &**object;
        let any: &dyn Any = object;
        any.downcast_ref()
    }

    /// The class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The payload.
    #[must_use]
    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    /// The engine handle id.
    #[must_use]
    pub fn handle_id(&self) -> Option<&str> {
        self.handle_id.as_deref()
    }

    /// The function payload, for function objects.
    #[must_use]
    pub fn as_function(&self) -> Option<&Function> {
        match &self.data {
            ObjectData::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Reads a visible or internal slot.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<Value> {
        self.slots
            .borrow()
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| slot.value.clone())
    }

    /// Assigns a slot, creating it when missing.
    pub fn set_slot(&self, name: &str, value: Value) {
        let mut slots = self.slots.borrow_mut();
        match slots.iter_mut().find(|slot| slot.name == name) {
            Some(slot) => slot.value = value,
            None => slots.push(Slot::new(name, value)),
        }
    }

    /// Appends to an array. Other objects are left alone.
    pub fn push(&self, value: Value) {
        if let ObjectData::Array(elements) = &self.data {
            elements.borrow_mut().push(value);
        }
    }

    /// Inserts or replaces a hash entry. Other objects are left alone.
    pub fn insert(&self, key: Value, value: Value) {
        if let ObjectData::Hash(entries) = &self.data {
            let mut entries = entries.borrow_mut();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
        }
    }

    /// Looks up a hash entry by key.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<Value> {
        match &self.data {
            ObjectData::Hash(entries) => entries
                .borrow()
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    /// Assigns a local of a binding. Other objects are left alone.
    pub fn set_local(&self, name: &str, value: Value) {
        if let ObjectData::Binding(locals) = &self.data {
            locals.borrow_mut().insert(name.to_owned(), value);
        }
    }

    /// Reads a local of a binding.
    #[must_use]
    pub fn local(&self, name: &str) -> Option<Value> {
        match &self.data {
            ObjectData::Binding(locals) => locals.borrow().get(name).cloned(),
            _ => None,
        }
    }

    /// Names of the declared attributes.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

fn inspect(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        Value::Symbol(symbol) => format!(":{}", symbol.name()),
        other => other.to_string(),
    }
}

impl HostObject for RuntimeObject {
    fn kind(&self) -> ObjectKind {
        match &self.data {
            ObjectData::Hash(_) => ObjectKind::Mapping,
            ObjectData::Array(_) => ObjectKind::Sequence,
            ObjectData::Function(_) => ObjectKind::Function,
            ObjectData::Module(_) => ObjectKind::Module,
            ObjectData::Binding(_) => ObjectKind::Binding,
            ObjectData::Plain
            | ObjectData::Node(_)
            | ObjectData::Date(_)
            | ObjectData::Regexp(_) => ObjectKind::Plain,
        }
    }

    fn display_string(&self) -> String {
        match &self.data {
            ObjectData::Plain | ObjectData::Node(_) => format!("#<{}>", self.class_name),
            ObjectData::Hash(entries) => {
                let entries = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}=>{}", inspect(k), inspect(v)))
                    .collect::<Vec<_>>();
                format!("{{{}}}", entries.join(", "))
            }
            ObjectData::Array(elements) => {
                let elements = elements.borrow().iter().map(inspect).collect::<Vec<_>>();
                format!("[{}]", elements.join(", "))
            }
            ObjectData::Function(function) => match &function.name {
                Some(name) => format!("#<Proc:{name}>"),
                None => "#<Proc:(lambda)>".to_owned(),
            },
            ObjectData::Module(name) => name.clone(),
            ObjectData::Binding(_) => "#<Binding>".to_owned(),
            ObjectData::Date(text) => text.clone(),
            ObjectData::Regexp(source) => format!("/{source}/"),
        }
    }

    fn entries(&self) -> Vec<(Value, Value)> {
        match &self.data {
            ObjectData::Hash(entries) => entries.borrow().clone(),
            _ => Vec::new(),
        }
    }

    fn elements(&self) -> Vec<Value> {
        match &self.data {
            ObjectData::Array(elements) => elements.borrow().clone(),
            _ => Vec::new(),
        }
    }

    fn element(&self, index: usize) -> Option<Value> {
        match &self.data {
            ObjectData::Array(elements) => elements.borrow().get(index).cloned(),
            _ => None,
        }
    }

    fn length(&self) -> Option<usize> {
        match &self.data {
            ObjectData::Array(elements) => Some(elements.borrow().len()),
            ObjectData::Hash(entries) => Some(entries.borrow().len()),
            _ => match self.slot(LENGTH_SLOT)? {
                Value::Number(Number::Integer(n)) => usize::try_from(n).ok(),
                _ => None,
            },
        }
    }

    fn slots(&self) -> Vec<Slot> {
        self.slots.borrow().clone()
    }

    fn attributes(&self) -> Vec<String> {
        self.attribute_names().map(str::to_owned).collect()
    }

    fn read_attribute(&self, name: &str) -> Result<Value, Exception> {
        let attribute = self.attribute(name).ok_or_else(|| {
            Exception::new(
                "NoMethodError",
                format!("undefined method `{name}' for {}", self.display_string()),
            )
        })?;
        (attribute.getter)(self)
    }

    fn has_setter(&self, name: &str) -> bool {
        self.setters.contains(name)
    }

    fn accessors(&self) -> Vec<Accessor> {
        self.accessors.clone()
    }

    fn local_variables(&self) -> Vec<(String, Value)> {
        match &self.data {
            ObjectData::Binding(locals) => locals
                .borrow()
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn declared_name(&self) -> Option<String> {
        match &self.data {
            ObjectData::Module(name) if !name.is_empty() => Some(name.clone()),
            _ => None,
        }
    }

    fn node(&self) -> Option<NodeInfo> {
        match &self.data {
            ObjectData::Node(info) => Some(info.clone()),
            _ => None,
        }
    }

    fn callable(&self) -> Option<&dyn Callable> {
        match &self.data {
            ObjectData::Function(function) => Some(function),
            _ => None,
        }
    }
}
