//! Inspector operations against the reference runtime.

use indexmap::IndexMap;
use serde_json::json;
use spyglass_inspector::{
    CONSOLE_GROUP, CallArgument, CallFrameId, HostObject, InjectedScript, InjectedScriptId,
    InjectedScriptManager, InspectorError, Parameter, RemoteObject, RemoteObjectId,
    RemoteObjectType, ScopeType, Subtype, Value,
};
use spyglass_runtime::{Runtime, RuntimeObject};
use test_case::test_case;

fn script() -> InjectedScript<Runtime> {
    InjectedScript::new(InjectedScriptId(1), Runtime::new())
}

fn object_id(remote: &RemoteObject) -> RemoteObjectId {
    remote.object_id.expect("bound")
}

fn numbers(count: i64) -> Value {
    RuntimeObject::array((0..count).map(Value::from).collect()).into_value()
}

#[test]
fn primitives_travel_inline() {
    let mut script = script();
    let remote = script.wrap(&Value::from(42), Some(CONSOLE_GROUP), false, false);

    assert_eq!(remote.type_, RemoteObjectType::Number);
    assert_eq!(remote.value, Some(json!(42)));
    assert_eq!(remote.description.as_deref(), Some("42"));
    assert!(!remote.is_bound());
    assert!(script.binder().is_empty());
}

#[test]
fn nil_is_an_object_with_the_null_subtype() {
    let mut script = script();
    let remote = script.wrap(&Value::Nil, None, false, false);

    assert_eq!(remote.type_, RemoteObjectType::Object);
    assert_eq!(remote.subtype, Some(Subtype::Null));
    assert_eq!(remote.value, Some(serde_json::Value::Null));
}

#[test]
fn large_arrays_preview_up_to_the_budget() {
    let mut script = script();
    let remote = script.wrap(&numbers(150), Some(CONSOLE_GROUP), false, true);

    assert_eq!(remote.subtype, Some(Subtype::Array));
    assert_eq!(remote.description.as_deref(), Some("Array[150]"));
    let preview = remote.preview.expect("preview requested");
    assert_eq!(preview.properties.len(), 100);
    assert!(preview.overflow);
    assert!(!preview.lossless);
}

#[test]
fn small_arrays_preview_losslessly() {
    let mut script = script();
    let remote = script.wrap(&numbers(3), None, false, true);

    let preview = remote.preview.expect("preview requested");
    assert_eq!(preview.properties.len(), 3);
    assert!(!preview.overflow);
    assert!(preview.lossless);
    assert_eq!(preview.properties[2].name, "2");
    assert_eq!(preview.properties[2].value.as_deref(), Some("2"));
}

#[test]
fn previews_abbreviate_long_strings_without_losing_the_entry() {
    let mut script = script();
    let long = "x".repeat(150);
    let list = RuntimeObject::array(vec![Value::from(long)]).into_value();
    let remote = script.wrap(&list, None, false, true);

    let preview = remote.preview.expect("preview requested");
    let value = preview.properties[0].value.as_deref().expect("string value");
    assert_eq!(value.chars().count(), 101);
    assert!(value.ends_with('…'));
    assert!(preview.lossless);
}

fn hash_of(count: i64) -> Value {
    RuntimeObject::hash(
        (0..count)
            .map(|i| (Value::from(format!("k{i}")), Value::from(i)))
            .collect(),
    )
    .into_value()
}

#[test_case(hash_of(6), 5, true ; "hash over the budget")]
#[test_case(hash_of(5), 5, false ; "hash at the budget")]
#[test_case(
    RuntimeObject::plain("Wide")
        .with_slot("@a", Value::from(1))
        .with_slot("@b", Value::from(2))
        .with_slot("@c", Value::from(3))
        .with_slot("@d", Value::from(4))
        .with_slot("@e", Value::from(5))
        .with_slot("@f", Value::from(6))
        .into_value(),
    5,
    true ;
    "plain object over the budget"
)]
fn other_objects_preview_five_entries(value: Value, shown: usize, overflow: bool) {
    let mut script = script();
    let remote = script.wrap(&value, None, false, true);

    let preview = remote.preview.expect("preview requested");
    assert_eq!(preview.properties.len(), shown);
    assert_eq!(preview.overflow, overflow);
    assert_eq!(preview.lossless, !overflow);
}

#[test]
fn nested_objects_make_previews_lossy() {
    let mut script = script();
    let list = RuntimeObject::array(vec![Value::from(1), numbers(2)]).into_value();
    let remote = script.wrap(&list, None, false, true);

    let preview = remote.preview.expect("preview requested");
    assert!(!preview.overflow);
    assert!(!preview.lossless);
    assert_eq!(preview.properties[1].subtype, Some(Subtype::Array));
    assert_eq!(preview.properties[1].value.as_deref(), Some("Array[2]"));
}

#[test]
fn regexp_entries_keep_both_delimiters() {
    let mut script = script();
    let pattern = RuntimeObject::regexp("a".repeat(200)).into_value();
    let list = RuntimeObject::array(vec![pattern]).into_value();
    let remote = script.wrap(&list, None, false, true);

    let preview = remote.preview.expect("preview requested");
    let entry = &preview.properties[0];
    assert_eq!(entry.subtype, Some(Subtype::Regexp));
    let value = entry.value.as_deref().expect("description");
    assert_eq!(value.chars().count(), 100);
    assert!(value.starts_with('/'));
    assert!(value.ends_with('/'));
    assert!(value.contains('…'));
}

#[test]
fn array_like_objects_preview_their_slots() {
    let mut script = script();
    let list = RuntimeObject::plain("NodeList")
        .with_slot("@length", Value::from(2))
        .with_slot("@first", Value::from("a"))
        .with_slot("@second", Value::from("b"))
        .into_value();
    let remote = script.wrap(&list, None, false, true);

    assert_eq!(remote.subtype, Some(Subtype::Array));
    assert_eq!(remote.description.as_deref(), Some("NodeList[2]"));
    let preview = remote.preview.as_ref().expect("preview requested");
    let names: Vec<_> = preview.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["@first", "@second"]);
    assert!(preview.lossless);

    let properties = script.get_properties(&object_id(&remote), false).unwrap();
    assert_eq!(properties.len(), 3);
}

#[test]
fn handles_see_later_mutations() {
    let mut script = script();
    let point = RuntimeObject::plain("Point").with_slot("@x", Value::from(1));
    let value = point.into_value();
    let id = object_id(&script.wrap(&value, None, false, false));

    let live = RuntimeObject::downcast(value.as_object().unwrap()).unwrap();
    live.set_slot("@x", Value::from(2));
    live.set_slot("@y", Value::from(3));

    let properties = script.get_properties(&id, false).unwrap();
    let values: Vec<_> = properties
        .iter()
        .map(|p| (p.name.as_str(), p.value.as_ref().unwrap().value.clone()))
        .collect();
    assert_eq!(values, [("@x", Some(json!(2))), ("@y", Some(json!(3)))]);

    let list = numbers(1);
    let list_id = object_id(&script.wrap(&list, None, false, false));
    RuntimeObject::downcast(list.as_object().unwrap())
        .unwrap()
        .push(Value::from(9));
    let properties = script.get_properties(&list_id, false).unwrap();
    assert_eq!(properties.len(), 2);
    assert_eq!(properties[1].value.as_ref().unwrap().value, Some(json!(9)));
}

#[derive(Debug)]
struct Foreign;

impl HostObject for Foreign {
    fn display_string(&self) -> String {
        "#<Foreign>".to_owned()
    }
}

#[test]
fn host_failures_fall_back_to_a_string_without_binding() {
    let mut script = script();
    let remote = script.wrap(&Value::object(Foreign), Some(CONSOLE_GROUP), false, true);

    assert_eq!(remote.type_, RemoteObjectType::String);
    assert!(!remote.is_bound());
    assert_eq!(
        remote.value,
        Some(json!("TypeError: #<Foreign> is not a runtime object"))
    );
    assert!(script.binder().is_empty());
}

#[test]
fn thrown_evaluations_describe_the_exception() {
    let mut script = script();
    let result = script.evaluate(
        "raise ZeroDivisionError, \"divided by 0\"",
        Some(CONSOLE_GROUP),
        false,
        false,
        false,
    );

    assert!(result.was_thrown);
    assert_eq!(
        result.result.description.as_deref(),
        Some("ZeroDivisionError: divided by 0")
    );
    assert!(script.last_result().is_none());
}

#[test]
fn console_results_are_remembered() {
    let mut script = script();
    script.host().define_global("answer", Value::from(42));
    let result = script.evaluate("answer", Some(CONSOLE_GROUP), false, false, false);

    assert!(!result.was_thrown);
    assert_eq!(script.last_result(), Some(&Value::from(42)));
}

#[test]
fn released_groups_no_longer_resolve() {
    let mut script = script();
    let ids: Vec<_> = (0..3)
        .map(|_| {
            let value = RuntimeObject::plain("Point").into_value();
            object_id(&script.wrap(&value, Some("temp"), false, false))
        })
        .collect();

    script.release_object_group("temp");

    for id in &ids {
        assert_eq!(
            script.get_properties(id, false).unwrap_err(),
            InspectorError::ObjectNotFound
        );
    }
}

#[test]
fn released_objects_leave_their_group_alone() {
    let mut script = script();
    let first = object_id(&script.wrap(&numbers(1), Some("g"), false, false));
    let second = object_id(&script.wrap(&numbers(2), Some("g"), false, false));

    script.release_object(&first);

    assert!(script.find_object_by_id(&first).is_err());
    assert!(script.find_object_by_id(&second).is_ok());
}

#[test]
fn handles_of_another_context_do_not_resolve() {
    let mut manager = InjectedScriptManager::new();
    let a = manager.create(Runtime::new());
    let b = manager.create(Runtime::new());

    let id = {
        let script = manager.get_mut(a).unwrap();
        object_id(&script.wrap(&numbers(2), None, false, false))
    };
    let forged = RemoteObjectId {
        injected_script_id: b,
        id: id.id,
    };

    assert!(manager.for_object_id(&id).unwrap().find_object_by_id(&id).is_ok());
    assert_eq!(
        manager
            .get(b)
            .unwrap()
            .find_object_by_id(&id)
            .unwrap_err(),
        InspectorError::ObjectNotFound
    );
    assert_eq!(
        manager
            .for_object_id(&forged)
            .unwrap()
            .find_object_by_id(&forged)
            .unwrap_err(),
        InspectorError::ObjectNotFound
    );
}

#[test]
fn by_value_results_are_not_bound() {
    let mut script = script();
    let hash = RuntimeObject::hash(vec![
        (Value::from("a"), Value::from(1)),
        (Value::from("b"), numbers(2)),
    ])
    .into_value();
    let remote = script.wrap(&hash, None, true, false);

    assert!(!remote.is_bound());
    assert_eq!(remote.value, Some(json!({"a": 1, "b": [0, 1]})));
}

#[test]
fn symbols_keep_their_handle_even_by_value() {
    let mut script = script();
    let symbol = script.host().symbol("ready");
    let remote = script.wrap(&symbol, None, true, false);

    assert_eq!(remote.type_, RemoteObjectType::Number);
    assert_eq!(remote.description.as_deref(), Some(":ready"));
    assert_eq!(remote.value, Some(json!(1)));
}

#[test]
fn cyclic_by_value_results_fall_back_to_a_string() {
    let mut script = script();
    let list = RuntimeObject::array(Vec::new());
    let value = list.into_value();
    RuntimeObject::downcast(value.as_object().unwrap())
        .unwrap()
        .push(value.clone());

    let remote = script.wrap(&value, None, true, false);
    assert_eq!(remote.type_, RemoteObjectType::String);
    assert!(!remote.is_bound());
}

#[test_case(RuntimeObject::module("Comparable"), "Comparable" ; "module")]
#[test_case(RuntimeObject::regexp("a+"), "/a+/" ; "regexp")]
#[test_case(RuntimeObject::node("Element", "div", 1), "<div>" ; "element node")]
#[test_case(RuntimeObject::node("DocumentType", "html", 10), "<!DOCTYPE html>" ; "doctype node")]
#[test_case(RuntimeObject::plain("Point"), "Point" ; "plain object")]
#[test_case(
    RuntimeObject::function(
        "area",
        vec![Parameter::required("w"), Parameter::optional("h")],
        |_, _| Ok(Value::Nil),
    ),
    "area(w, h [optional])" ;
    "function"
)]
#[test_case(RuntimeObject::lambda(Vec::new(), |_, _| Ok(Value::Nil)), "function()" ; "anonymous function")]
fn descriptions(object: RuntimeObject, expected: &str) {
    let mut script = script();
    let remote = script.wrap(&object.into_value(), None, false, false);
    assert_eq!(remote.description.as_deref(), Some(expected));
}

#[test]
fn properties_of_plain_objects() {
    let mut script = script();
    let point = RuntimeObject::plain("Point")
        .with_slot("@x", Value::from(1))
        .with_internal_slot("__id__", Value::from(9))
        .with_attribute("norm", |_| Ok(Value::from(1.5)))
        .with_attribute("broken", |_| {
            Err(spyglass_inspector::Exception::new("RuntimeError", "nope"))
        })
        .with_setter("@x")
        .into_value();
    let id = object_id(&script.wrap(&point, Some("props"), false, false));

    let properties = script.get_properties(&id, true).unwrap();
    let names: Vec<_> = properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["norm", "broken", "@x"]);

    let broken = &properties[1];
    assert!(broken.was_thrown);
    assert_eq!(
        broken.value.as_ref().unwrap().description.as_deref(),
        Some("RuntimeError: nope")
    );
    assert!(properties[2].writable);
}

#[test]
fn properties_of_hashes_are_their_entries() {
    let mut script = script();
    let hash = RuntimeObject::hash(vec![(Value::from("k"), numbers(2))]).into_value();
    let id = object_id(&script.wrap(&hash, Some("g"), false, false));

    let properties = script.get_properties(&id, false).unwrap();
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].name, "k");
    let nested = properties[0].value.as_ref().unwrap();
    assert!(nested.is_bound());
    assert_eq!(
        script.binder().group_of(nested.object_id.unwrap().id),
        Some("g")
    );
}

#[test]
fn internal_properties_report_the_class() {
    let mut script = script();
    let id = object_id(&script.wrap(&numbers(1), None, false, false));
    let internal = script.get_internal_properties(&id).unwrap();

    assert_eq!(internal[0].name, "[[Class]]");
    assert_eq!(internal[0].value.value, Some(json!("Array")));
}

#[test]
fn function_details_include_captured_scopes() {
    let mut script = script();
    let closure: IndexMap<String, Value> = [("count".to_owned(), Value::from(3))].into();
    let function = RuntimeObject::function("tick", Vec::new(), |_, _| Ok(Value::Nil))
        .with_location(4, 17)
        .with_captured_scope(
            ScopeType::Closure,
            RuntimeObject::binding(closure).into_value(),
        )
        .into_value();
    let id = object_id(&script.wrap(&function, None, false, false));

    let details = script.get_function_details(&id).unwrap();
    assert_eq!(details.function_name, "tick");
    let location = details.location.unwrap();
    assert_eq!(location.script_id, "4");
    assert_eq!(location.line_number, 17);
    assert_eq!(details.scope_chain.len(), 1);
    assert_eq!(details.scope_chain[0].scope_type, ScopeType::Closure);
}

#[test]
fn function_details_of_non_functions_fail() {
    let mut script = script();
    let id = object_id(&script.wrap(&numbers(1), None, false, false));
    assert_eq!(
        script.get_function_details(&id).unwrap_err(),
        InspectorError::NotAFunction
    );
}

#[test]
fn call_function_on_passes_the_target_and_arguments() {
    let mut script = script();
    script.host().define_global(
        "sum_with",
        RuntimeObject::function("sum_with", Vec::new(), |receiver, arguments| {
            let base = receiver.as_object().and_then(|o| o.length()).unwrap_or(0);
            let extra = arguments.iter().filter(|a| **a != Value::Nil).count();
            Ok(Value::from(i64::try_from(base + extra).unwrap()))
        })
        .into_value(),
    );
    let target = object_id(&script.wrap(&numbers(3), Some("g"), false, false));
    let other = object_id(&script.wrap(&numbers(1), Some("g"), false, false));

    let arguments = [
        CallArgument {
            object_id: Some(other.to_string()),
            value: None,
        },
        CallArgument {
            object_id: None,
            value: Some(json!(5)),
        },
        CallArgument::default(),
    ];
    let result = script
        .call_function_on(&target, "sum_with", &arguments, false)
        .unwrap();
    assert!(!result.was_thrown);
    assert_eq!(result.result.value, Some(json!(5)));
}

#[test]
fn call_function_on_rejects_foreign_arguments() {
    let mut script = script();
    script.host().define_global(
        "noop",
        RuntimeObject::function("noop", Vec::new(), |_, _| Ok(Value::Nil)).into_value(),
    );
    let target = object_id(&script.wrap(&numbers(1), None, false, false));
    let foreign = RemoteObjectId {
        injected_script_id: InjectedScriptId(2),
        id: 1,
    };
    let arguments = [CallArgument {
        object_id: Some(foreign.to_string()),
        value: None,
    }];

    assert_eq!(
        script
            .call_function_on(&target, "noop", &arguments, false)
            .unwrap_err(),
        InspectorError::ForeignArgument
    );
}

#[test]
fn call_function_on_requires_a_callable() {
    let mut script = script();
    let target = object_id(&script.wrap(&numbers(1), None, false, false));
    assert_eq!(
        script
            .call_function_on(&target, "42", &[], false)
            .unwrap_err(),
        InspectorError::NotCallable
    );
}

#[test]
fn array_fragments_cover_an_inclusive_range() {
    let mut script = script();
    let array = RuntimeObject::array(vec![
        Value::from(1),
        Value::Nil,
        Value::from(3),
        Value::from(4),
    ])
    .into_value();
    let id = object_id(&script.wrap(&array, Some("g"), false, false));
    let fragment = script.build_array_fragment(&id, 1, 2).unwrap();
    let fragment_id = object_id(&fragment);

    let properties = script.get_properties(&fragment_id, false).unwrap();
    let names: Vec<_> = properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["1", "2"]);
    assert_eq!(
        properties[0].value.as_ref().unwrap().subtype,
        Some(Subtype::Null)
    );
    assert_eq!(properties[1].value.as_ref().unwrap().value, Some(json!(3)));
    assert_eq!(script.binder().group_of(fragment_id.id), Some("g"));
}

#[test]
fn array_fragments_stop_at_the_last_element() {
    let mut script = script();
    let id = object_id(&script.wrap(&numbers(3), None, false, false));
    let fragment = script.build_array_fragment(&id, 1, u32::MAX).unwrap();

    let properties = script
        .get_properties(&object_id(&fragment), false)
        .unwrap();
    let names: Vec<_> = properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["1", "2"]);

    let past_the_end = script.build_array_fragment(&id, 7, 9).unwrap();
    let properties = script
        .get_properties(&object_id(&past_the_end), false)
        .unwrap();
    assert!(properties.is_empty());
}

#[test]
fn object_fragments_hold_the_length() {
    let mut script = script();
    let id = object_id(&script.wrap(&numbers(7), None, false, false));
    let fragment = script.build_object_fragment(&id).unwrap();
    let properties = script
        .get_properties(&object_id(&fragment), false)
        .unwrap();

    assert_eq!(properties[0].name, "length");
    assert_eq!(properties[0].value.as_ref().unwrap().value, Some(json!(7)));
}

#[test]
fn modules_are_replaced_on_reinjection() {
    let mut script = script();
    script.host().register_module("Greeter", |source| {
        Ok(RuntimeObject::plain("Greeter")
            .with_slot("@source", Value::from(source))
            .into_value())
    });

    script.inject_module("Greeter", "v1").unwrap();
    script.inject_module("Greeter", "v2").unwrap();
    let module = script.module("Greeter").unwrap();
    let source = RuntimeObject::downcast(module.as_object().unwrap())
        .unwrap()
        .slot("@source");
    assert_eq!(source, Some(Value::from("v2")));

    let error = script.inject_module("Missing", "").unwrap_err();
    assert!(matches!(error, InspectorError::ModuleLoad { .. }));
    assert!(script.module("Missing").is_none());
}

#[test]
fn inspected_databases_carry_their_id() {
    let mut script = script();
    let database = RuntimeObject::plain("Database")
        .with_handle_id("db-1")
        .into_value();

    script.inspect_object(database);
    script.inspect_object(Value::Nil);

    let inspected = script.host().inspected();
    assert_eq!(inspected.len(), 1);
    assert_eq!(inspected[0].1.database_id.as_deref(), Some("db-1"));
    assert!(inspected[0].0.is_bound());
}

#[test]
fn without_access_objects_are_described_only() {
    let mut script = script();
    let remote = script.wrap_object(&numbers(2), None, false, false);
    assert!(!remote.is_bound());
    assert_eq!(remote.description.as_deref(), Some("[0, 1]"));
}

#[test]
fn only_nodes_are_found_as_nodes() {
    let mut script = script();
    let node = script.bind(RuntimeObject::node("Element", "div", 1).into_value(), None);
    let plain = script.bind(RuntimeObject::plain("Point").into_value(), None);

    assert!(script.node_for_object_id(&node).is_some());
    assert!(script.node_for_object_id(&plain).is_none());

    script.release_object(&node);
    assert!(script.node_for_object_id(&node).is_none());
}

#[test_case("string", &["downcase", "length", "size", "upcase"] ; "string")]
#[test_case("number", &[] ; "number")]
fn primitive_completions(type_name: &str, expected: &[&str]) {
    assert_eq!(script().get_primitive_type_completions(type_name), expected);
}

#[test]
fn call_frame_ids_of_another_context_are_rejected() {
    let mut script = script();
    let runtime = Runtime::new();
    let top = runtime.frame(1, 1).into_ref();
    let foreign = CallFrameId {
        ordinal: 0,
        injected_script_id: InjectedScriptId(9),
    };

    assert_eq!(
        script
            .evaluate_on_call_frame(&top, &foreign, "1", None, false, false, false)
            .unwrap_err(),
        InspectorError::CallFrameNotFound
    );
}

#[test]
fn manager_routes_and_discards_contexts() {
    let mut manager = InjectedScriptManager::new();
    let a = manager.create(Runtime::new());
    let b = manager.create(Runtime::new());
    assert_eq!((a, b), (InjectedScriptId(1), InjectedScriptId(2)));

    let in_a = object_id(
        &manager
            .get_mut(a)
            .unwrap()
            .wrap(&numbers(1), Some("g"), false, false),
    );
    let in_b = object_id(
        &manager
            .get_mut(b)
            .unwrap()
            .wrap(&numbers(1), Some("g"), false, false),
    );

    manager.release_object_group("g");
    assert!(manager.get(a).unwrap().binder().is_empty());
    assert!(manager.get(b).unwrap().binder().is_empty());

    let kept = object_id(
        &manager
            .get_mut(b)
            .unwrap()
            .wrap(&numbers(1), None, false, false),
    );
    let discarded = manager.discard(b).expect("attached");
    assert!(discarded.binder().is_empty());
    assert_eq!(manager.len(), 1);
    assert_eq!(
        manager.for_object_id(&kept).unwrap_err(),
        InspectorError::ObjectNotFound
    );
    assert_eq!(
        manager
            .for_call_frame_id(&CallFrameId {
                ordinal: 0,
                injected_script_id: b,
            })
            .unwrap_err(),
        InspectorError::CallFrameNotFound
    );
    assert_eq!(manager.get(b).unwrap_err(), InspectorError::UnknownContext(b));
    assert_ne!(in_a, in_b);
}
