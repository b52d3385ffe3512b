//! Schema-augmentor (spec.md §9 "Enum augmentation"): walks a schema tree
//! before compilation, replacing `enumRef` nodes with a concrete `enum`
//! array sourced from the enum registry, and recording every
//! `(pointer, enumName)` binding the response transformer later uses to map
//! stored codes back to literals.

use crate::domain::schema::EnumFieldBinding;
use crate::registry::EnumRegistry;
use serde_json::Value;

/// Returns the augmented schema (unresolved `enumRef`s left untouched, since
/// the enum registry may not have loaded that name yet) plus every binding
/// found, in the order the walk visited them.
pub fn augment(schema: &Value, enums: &EnumRegistry) -> (Value, Vec<EnumFieldBinding>) {
    let mut schema = schema.clone();
    let mut bindings = Vec::new();
    walk(&mut schema, "", enums, &mut bindings);
    (schema, bindings)
}

fn walk(node: &mut Value, pointer: &str, enums: &EnumRegistry, bindings: &mut Vec<EnumFieldBinding>) {
    let Value::Object(map) = node else { return };

    if let Some(Value::String(enum_name)) = map.get("enumRef").cloned() {
        if let Some(codes) = enums.codes(&enum_name) {
            map.insert("enum".to_string(), Value::Array(codes.into_iter().map(Value::String).collect()));
        }
        map.remove("enumRef");
        bindings.push(EnumFieldBinding { field_pointer: pointer.to_string(), enum_name });
    }

    if let Some(Value::Object(properties)) = map.get_mut("properties") {
        for (key, value) in properties.iter_mut() {
            let child_pointer = format!("{pointer}/{key}");
            walk(value, &child_pointer, enums, bindings);
        }
    }

    if let Some(items) = map.get_mut("items") {
        let child_pointer = format!("{pointer}/items");
        walk(items, &child_pointer, enums, bindings);
    }

    for combinator in ["allOf", "anyOf"] {
        if let Some(Value::Array(children)) = map.get_mut(combinator) {
            for child in children.iter_mut() {
                walk(child, pointer, enums, bindings);
            }
        }
    }
}
