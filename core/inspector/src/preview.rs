//! Bounded one-level summaries of objects.

use crate::{
    InspectorHost, ObjectRef, RemoteObjectType, StructuralKind, Subtype, Value,
    classifier::{self, structural_kind, type_of},
    remote_object::describe,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;

/// Strings longer than this are abbreviated in previews.
pub const ABBREVIATION_CUTOFF: usize = 100;

/// Entries shown for array-subtype objects.
pub const ARRAY_PREVIEW_BUDGET: usize = 100;

/// Entries shown for every other object.
pub const OBJECT_PREVIEW_BUDGET: usize = 5;

/// Slot that holds the length of array-like objects, hidden from previews.
pub const LENGTH_SLOT: &str = "@length";

/// Where an over-long string loses its characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// Keep the head, append an ellipsis.
    End,
    /// Keep head and tail around an ellipsis, so both delimiters stay visible.
    Middle,
}

/// A shallow, budget-capped summary of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPreview {
    /// No information was omitted.
    pub lossless: bool,
    /// Enumeration stopped at the budget.
    pub overflow: bool,
    /// The abbreviated entries.
    pub properties: Vec<PropertyPreview>,
}

/// One abbreviated entry of an [`ObjectPreview`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPreview {
    /// Entry name.
    pub name: String,
    /// Type tag of the entry's value.
    #[serde(rename = "type")]
    pub type_: RemoteObjectType,
    /// Abbreviated value or description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Subtype tag of the entry's value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<Subtype>,
}

/// Shortens `string` to at most `max_length` characters plus an ellipsis.
///
/// Newlines always become a visible `↵`. Applying the function twice with the
/// same cutoff gives the same result as applying it once.
#[must_use]
pub fn abbreviate_string(string: &str, max_length: usize, truncation: Truncation) -> String {
    let string = string.replace('\n', "\u{21B5}");
    let length = string.chars().count();
    if length <= max_length {
        return string;
    }

    match truncation {
        Truncation::Middle => {
            let left_half = max_length / 2;
            let right_half = max_length.saturating_sub(left_half + 1);
            let head: String = string.chars().take(left_half).collect();
            let tail: String = string.chars().skip(length - right_half).collect();
            format!("{head}\u{2026}{tail}")
        }
        Truncation::End => {
            let head: String = string.chars().take(max_length).collect();
            format!("{head}\u{2026}")
        }
    }
}

/// Summarizes `object`. `subtype` is the object's already computed subtype.
pub(crate) fn generate_preview<H: InspectorHost + ?Sized>(
    host: &H,
    object: &ObjectRef,
    subtype: Option<Subtype>,
) -> ObjectPreview {
    let budget = if subtype == Some(Subtype::Array) {
        ARRAY_PREVIEW_BUDGET
    } else {
        OBJECT_PREVIEW_BUDGET
    };
    let mut builder = PreviewBuilder {
        host,
        budget,
        preview: ObjectPreview {
            lossless: true,
            overflow: false,
            properties: Vec::new(),
        },
    };

    match structural_kind(&Value::Object(object.clone())) {
        StructuralKind::Numeric => {}
        StructuralKind::Mapping => {
            for (key, value) in object.entries() {
                if builder.push(key.to_string(), &value).is_break() {
                    break;
                }
            }
        }
        StructuralKind::Sequence => {
            // One element past the budget is enough to know about overflow.
            for index in 0..=budget {
                let Some(element) = object.element(index) else {
                    break;
                };
                if builder.push(index.to_string(), &element).is_break() {
                    break;
                }
            }
        }
        StructuralKind::Generic => {
            if builder.push_generic(object, subtype).is_break() {
                debug!("preview stopped at {budget} entries");
            }
        }
    }

    builder.preview
}

struct PreviewBuilder<'h, H: ?Sized> {
    host: &'h H,
    budget: usize,
    preview: ObjectPreview,
}

impl<H: InspectorHost + ?Sized> PreviewBuilder<'_, H> {
    fn check_budget(&mut self) -> ControlFlow<()> {
        if self.preview.properties.len() >= self.budget {
            self.preview.overflow = true;
            self.preview.lossless = false;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    fn push(&mut self, name: String, value: &Value) -> ControlFlow<()> {
        self.check_budget()?;
        let property = self.describe_one(name, value);
        self.preview.properties.push(property);
        ControlFlow::Continue(())
    }

    fn push_generic(&mut self, object: &ObjectRef, subtype: Option<Subtype>) -> ControlFlow<()> {
        let is_array = subtype == Some(Subtype::Array);
        for slot in object.slots() {
            if slot.internal || (is_array && slot.name == LENGTH_SLOT) {
                continue;
            }
            self.push(slot.name, &slot.value)?;
        }

        for name in object.attributes() {
            // Attribute reads may run program code, so stop before reading.
            self.check_budget()?;
            match object.read_attribute(&name) {
                Ok(value) => self.push(name, &value)?,
                Err(exception) => debug!("skipping attribute {name} in preview: {exception}"),
            }
        }

        ControlFlow::Continue(())
    }

    fn describe_one(&mut self, name: String, value: &Value) -> PropertyPreview {
        let type_ = type_of(value);
        let mut property = PropertyPreview {
            name,
            type_,
            value: None,
            subtype: None,
        };

        match value {
            Value::Nil => property.subtype = Some(Subtype::Null),
            Value::Undefined => {}
            Value::String(s) => {
                property.value = Some(abbreviate_string(s, ABBREVIATION_CUTOFF, Truncation::End));
            }
            Value::Bool(_) | Value::Number(_) => property.value = Some(value.to_string()),
            Value::Symbol(_) | Value::Object(_) => {
                self.preview.lossless = false;
                let subtype = classifier::subtype(self.host, value);
                let description = if type_ == RemoteObjectType::Function {
                    String::new()
                } else {
                    let truncation = if subtype == Some(Subtype::Regexp) {
                        Truncation::Middle
                    } else {
                        Truncation::End
                    };
                    match describe(self.host, value) {
                        Ok(description) => abbreviate_string(
                            &description.unwrap_or_default(),
                            ABBREVIATION_CUTOFF,
                            truncation,
                        ),
                        Err(exception) => {
                            warn!("failed to describe preview entry: {exception}");
                            String::new()
                        }
                    }
                };
                property.value = Some(description);
                property.subtype = subtype;
            }
        }

        property
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Exception, HostObject, ObjectKind, Slot};
    use std::{cell::Cell, rc::Rc};
    use test_case::test_case;

    #[derive(Debug)]
    struct ArrayHost;

    impl InspectorHost for ArrayHost {
        fn precise_type(&self, _object: &ObjectRef) -> Result<Option<Subtype>, Exception> {
            Ok(Some(Subtype::Array))
        }

        fn internal_constructor_name(&self, _object: &ObjectRef) -> Result<String, Exception> {
            Ok("Array".to_owned())
        }

        fn evaluate(&self, _expression: &str) -> Result<Value, Exception> {
            Ok(Value::Undefined)
        }

        fn create_mapping(&self, _entries: Vec<(Value, Value)>) -> Value {
            Value::Nil
        }

        fn create_sequence(&self, _elements: Vec<Value>) -> Value {
            Value::Nil
        }
    }

    /// A sequence that only hands out elements one at a time.
    #[derive(Debug)]
    struct Huge {
        length: usize,
        reads: Cell<usize>,
    }

    impl HostObject for Huge {
        fn kind(&self) -> ObjectKind {
            ObjectKind::Sequence
        }

        fn display_string(&self) -> String {
            "#<Huge>".to_owned()
        }

        fn elements(&self) -> Vec<Value> {
            unreachable!("previews read elements one by one")
        }

        fn element(&self, index: usize) -> Option<Value> {
            self.reads.set(self.reads.get() + 1);
            (index < self.length).then(|| Value::from(0))
        }

        fn length(&self) -> Option<usize> {
            Some(self.length)
        }
    }

    #[derive(Debug)]
    struct ArrayLike;

    impl HostObject for ArrayLike {
        fn display_string(&self) -> String {
            "#<NodeList>".to_owned()
        }

        fn slots(&self) -> Vec<Slot> {
            vec![
                Slot::new(LENGTH_SLOT, Value::from(2)),
                Slot::new("@first", Value::from("a")),
                Slot::new("@second", Value::from("b")),
            ]
        }
    }

    #[test]
    fn sequence_previews_read_one_past_the_budget() {
        let huge = Rc::new(Huge {
            length: 1_000_000,
            reads: Cell::new(0),
        });
        let object: ObjectRef = huge.clone();

        let preview = generate_preview(&ArrayHost, &object, Some(Subtype::Array));

        assert_eq!(preview.properties.len(), ARRAY_PREVIEW_BUDGET);
        assert!(preview.overflow);
        assert!(!preview.lossless);
        assert_eq!(huge.reads.get(), ARRAY_PREVIEW_BUDGET + 1);
    }

    #[test]
    fn sequences_within_the_budget_do_not_overflow() {
        let object: ObjectRef = Rc::new(Huge {
            length: 3,
            reads: Cell::new(0),
        });

        let preview = generate_preview(&ArrayHost, &object, Some(Subtype::Array));

        assert_eq!(preview.properties.len(), 3);
        assert!(!preview.overflow);
        assert!(preview.lossless);
    }

    #[test]
    fn array_like_objects_preview_their_slots_without_the_length() {
        let object: ObjectRef = Rc::new(ArrayLike);

        let preview = generate_preview(&ArrayHost, &object, Some(Subtype::Array));

        let names: Vec<_> = preview.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["@first", "@second"]);
        assert!(preview.lossless);
        assert!(!preview.overflow);
    }

    #[test_case("short", "short" ; "under the cutoff")]
    #[test_case("a\nb", "a\u{21B5}b" ; "newlines become glyphs")]
    fn short_strings_pass_through(input: &str, expected: &str) {
        assert_eq!(abbreviate_string(input, 100, Truncation::End), expected);
        assert_eq!(abbreviate_string(input, 100, Truncation::Middle), expected);
    }

    #[test]
    fn end_truncation_keeps_the_head() {
        let long = "x".repeat(150);
        let abbreviated = abbreviate_string(&long, 100, Truncation::End);
        assert_eq!(abbreviated.chars().count(), 101);
        assert!(abbreviated.ends_with('\u{2026}'));
        assert!(abbreviated.starts_with(&"x".repeat(100)));
    }

    #[test]
    fn middle_truncation_keeps_both_ends() {
        let long = format!("/{}/", "a".repeat(200));
        let abbreviated = abbreviate_string(&long, 100, Truncation::Middle);
        assert_eq!(abbreviated.chars().count(), 100);
        assert!(abbreviated.starts_with('/'));
        assert!(abbreviated.ends_with('/'));
        assert!(abbreviated.contains('\u{2026}'));
    }

    #[test_case(Truncation::End ; "end")]
    #[test_case(Truncation::Middle ; "middle")]
    fn abbreviation_is_idempotent(truncation: Truncation) {
        let long = "line\n".repeat(60);
        let once = abbreviate_string(&long, 100, truncation);
        let twice = abbreviate_string(&once, 100, truncation);
        assert_eq!(once, twice);
    }

    #[test]
    fn multibyte_characters_are_counted_as_characters() {
        let long = "\u{e9}".repeat(101);
        let abbreviated = abbreviate_string(&long, 100, Truncation::End);
        assert_eq!(abbreviated.chars().count(), 101);
    }
}
