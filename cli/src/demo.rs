//! A small program to inspect when no engine is attached.

use indexmap::IndexMap;
use spyglass_inspector::{
    Accessor, Exception, FrameRef, NodeInfo, Number, Parameter, ScopeType, Value,
};
use spyglass_runtime::{Runtime, RuntimeObject};

/// Script id of the demo program.
const SOURCE_ID: u64 = 1;

fn locals(entries: Vec<(&str, Value)>) -> Value {
    let locals: IndexMap<String, Value> = entries
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect();
    RuntimeObject::binding(locals).into_value()
}

fn integer(value: &Value) -> Result<i64, Exception> {
    match value {
        Value::Number(Number::Integer(i)) => Ok(*i),
        other => Err(Exception::new(
            "TypeError",
            format!("{other} can't be coerced into Integer"),
        )),
    }
}

/// Defines the demo globals and returns the paused stack, top frame first.
pub(crate) fn populate(runtime: &Runtime) -> FrameRef {
    let area = RuntimeObject::function(
        "area",
        vec![Parameter::required("width"), Parameter::optional("height")],
        |_, arguments| {
            let width = arguments.first().map_or(Ok(0), integer)?;
            let height = arguments.get(1).map_or(Ok(width), integer)?;
            Ok(Value::from(width * height))
        },
    )
    .with_location(SOURCE_ID, 10)
    .into_value();

    let rect = RuntimeObject::plain("Rect")
        .with_slot("@width", Value::from(4))
        .with_slot("@height", Value::from(5))
        .with_internal_slot("__object_id__", Value::from(8))
        .with_setter("@width")
        .with_attribute("area", |rect| {
            let width = rect.slot("@width").unwrap_or(Value::Nil);
            let height = rect.slot("@height").unwrap_or(Value::Nil);
            Ok(Value::from(integer(&width)? * integer(&height)?))
        })
        .with_accessor(Accessor {
            name: "width".to_owned(),
            getter: Some(Value::from("Rect#width")),
            setter: Some(Value::from("Rect#width=")),
        })
        .into_value();

    runtime.define_global("area", area);
    runtime.define_global("rect", rect.clone());
    runtime.define_global(
        "primes",
        RuntimeObject::array([2, 3, 5, 7, 11, 13].map(Value::from).to_vec()).into_value(),
    );
    runtime.define_global(
        "big",
        RuntimeObject::array((0..250).map(Value::from).collect()).into_value(),
    );
    runtime.define_global(
        "settings",
        RuntimeObject::hash(vec![
            (Value::from("theme"), Value::from("dark")),
            (Value::from("tab_width"), Value::from(4)),
            (runtime.symbol("verbose"), Value::from(false)),
        ])
        .into_value(),
    );
    runtime.define_global("Comparable", RuntimeObject::module("Comparable").into_value());
    runtime.define_global("pattern", RuntimeObject::regexp(r"\d+-\w+").into_value());
    runtime.define_global(
        "started_at",
        RuntimeObject::date("2024-05-01 12:00:00 +0000").into_value(),
    );
    runtime.define_global(
        "body",
        RuntimeObject::node("HTMLBodyElement", "BODY", NodeInfo::ELEMENT_NODE).into_value(),
    );
    runtime.define_global(
        "db",
        RuntimeObject::plain("Database")
            .with_handle_id("demo-db")
            .into_value(),
    );

    runtime.register_module("Counter", |source| {
        Ok(RuntimeObject::plain("Counter")
            .with_slot("@count", Value::from(0))
            .with_slot("@source", Value::from(source))
            .into_value())
    });

    let main = runtime
        .frame(SOURCE_ID, 24)
        .with_scope(ScopeType::Local, locals(vec![("shapes", Value::from(2))]))
        .with_scope(ScopeType::Global, runtime.globals().snapshot())
        .into_ref();

    runtime
        .frame(SOURCE_ID, 12)
        .in_function("area")
        .with_this(rect)
        .with_scope(
            ScopeType::Local,
            locals(vec![("width", Value::from(4)), ("height", Value::Nil)]),
        )
        .with_scope(ScopeType::Global, runtime.globals().snapshot())
        .with_caller(main)
        .restartable()
        .into_ref()
}
