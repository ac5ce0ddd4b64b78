//! Schema inference for typegen entries.
//!
//! A typegen source is a plain object of default values. Object keys
//! starting with `$` annotate their parent: `$schema` merges extra fields
//! (title, description, tsType, ...) into the node and `$default` turns the
//! object into a leaf with that default.

use std::fmt::Write as _;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::SchemaTool;

#[derive(Debug, Clone, Copy, Default)]
pub struct InferredSchema;

#[async_trait]
impl SchemaTool for InferredSchema {
    async fn resolve_schema(
        &self,
        source: &Value,
        defaults: &Map<String, Value>,
    ) -> anyhow::Result<Value> {
        anyhow::ensure!(
            source.is_object() || source.is_null(),
            "Schema source must be an object, got {}",
            type_of(source)
        );
        let defaults = Value::Object(defaults.clone());
        let empty = Value::Object(Map::new());
        let source = if source.is_null() { &empty } else { source };
        Ok(resolve_node(source, Some(&defaults), "#"))
    }

    fn generate_markdown(&self, schema: &Value) -> String {
        let mut out = String::new();
        if let Some(title) = schema.get("title").and_then(Value::as_str) {
            let _ = writeln!(out, "# {}\n", title);
        }
        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            markdown_properties(&mut out, properties, "", 2);
        }
        out
    }

    fn generate_types(&self, schema: &Value, interface_name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "export interface {} {{", interface_name);
        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            ts_properties(&mut out, properties, 1);
        }
        out.push_str("}\n");
        out
    }
}

fn resolve_node(value: &Value, user_default: Option<&Value>, id: &str) -> Value {
    let user_default = user_default.filter(|v| !v.is_null());

    let Value::Object(object) = value else {
        let default = user_default.unwrap_or(value);
        return leaf(default, id, None);
    };

    let meta = object.get("$schema").and_then(Value::as_object);
    if let Some(default) = object.get("$default") {
        return leaf(user_default.unwrap_or(default), id, meta);
    }

    let user_object = user_default.and_then(Value::as_object);
    let mut properties = Map::new();
    let mut default = Map::new();

    let keys = object
        .keys()
        .filter(|key| !key.starts_with('$'))
        .chain(
            user_object
                .into_iter()
                .flat_map(|o| o.keys())
                .filter(|key| !object.contains_key(key.as_str())),
        );
    for key in keys {
        let child_id = child_id(id, key);
        let source = object.get(key).unwrap_or(&Value::Null);
        let node = resolve_node(source, user_object.and_then(|o| o.get(key)), &child_id);
        if let Some(value) = node.get("default") {
            default.insert(key.clone(), value.clone());
        }
        properties.insert(key.clone(), node);
    }

    let mut node = Map::new();
    node.insert("type".into(), "object".into());
    node.insert("id".into(), id.into());
    node.insert("default".into(), Value::Object(default));
    node.insert("properties".into(), Value::Object(properties));
    apply_meta(&mut node, meta);
    Value::Object(node)
}

fn leaf(default: &Value, id: &str, meta: Option<&Map<String, Value>>) -> Value {
    let mut node = Map::new();
    node.insert("type".into(), type_of(default).into());
    node.insert("id".into(), id.into());
    node.insert("default".into(), default.clone());
    if let Value::Array(items) = default {
        node.insert("items".into(), items_schema(items));
    }
    apply_meta(&mut node, meta);
    Value::Object(node)
}

fn apply_meta(node: &mut Map<String, Value>, meta: Option<&Map<String, Value>>) {
    for (key, value) in meta.into_iter().flatten() {
        if key != "id" {
            node.insert(key.clone(), value.clone());
        }
    }
}

fn items_schema(items: &[Value]) -> Value {
    let mut types: Vec<&str> = Vec::new();
    for item in items {
        let ty = type_of(item);
        if !types.contains(&ty) {
            types.push(ty);
        }
    }
    let ty = match types.as_slice() {
        [] => Value::from("any"),
        [one] => Value::from(*one),
        many => Value::from(many.to_vec()),
    };
    let mut node = Map::new();
    node.insert("type".into(), ty);
    Value::Object(node)
}

fn child_id(parent: &str, key: &str) -> String {
    if parent == "#" {
        format!("#{}", key)
    } else {
        format!("{}/{}", parent, key)
    }
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "any",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn markdown_properties(out: &mut String, properties: &Map<String, Value>, prefix: &str, level: usize) {
    for (key, node) in properties {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        let _ = writeln!(out, "{} `{}`\n", "#".repeat(level.min(6)), path);

        let children = node.get("properties").and_then(Value::as_object);
        if children.is_none() {
            let _ = writeln!(out, "- **Type**: `{}`", ts_type(node));
            if let Some(default) = node.get("default") {
                let _ = writeln!(out, "- **Default**: `{}`", default);
            }
            out.push('\n');
        }
        if let Some(description) = node.get("description").and_then(Value::as_str) {
            let _ = writeln!(out, "{}\n", description);
        }
        if let Some(children) = children {
            markdown_properties(out, children, &path, level + 1);
        }
    }
}

fn ts_properties(out: &mut String, properties: &Map<String, Value>, depth: usize) {
    let indent = "  ".repeat(depth);
    for (key, node) in properties {
        let title = node.get("title").and_then(Value::as_str);
        let description = node.get("description").and_then(Value::as_str);
        let default = node
            .get("default")
            .filter(|_| node.get("properties").is_none());

        if title.is_some() || description.is_some() || default.is_some() {
            let _ = writeln!(out, "{}/**", indent);
            for line in title.into_iter().chain(description) {
                let _ = writeln!(out, "{} * {}", indent, line);
            }
            if let Some(default) = default {
                let _ = writeln!(out, "{} * @default {}", indent, default);
            }
            let _ = writeln!(out, "{} */", indent);
        }

        match node.get("properties").and_then(Value::as_object) {
            Some(children) => {
                let _ = writeln!(out, "{}{}: {{", indent, ts_key(key));
                ts_properties(out, children, depth + 1);
                let _ = writeln!(out, "{}}},", indent);
            }
            None => {
                let _ = writeln!(out, "{}{}: {},", indent, ts_key(key), ts_type(node));
            }
        }
    }
}

fn ts_key(key: &str) -> String {
    let mut chars = key.chars();
    let identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if identifier {
        key.to_string()
    } else {
        Value::from(key).to_string()
    }
}

fn ts_type(node: &Value) -> String {
    if let Some(ts_type) = node.get("tsType").and_then(Value::as_str) {
        return ts_type.to_string();
    }
    match node.get("type") {
        Some(Value::String(ty)) if ty == "array" => {
            let items = node.get("items").map(ts_type).unwrap_or_else(|| "any".into());
            format!("Array<{}>", items)
        }
        Some(Value::String(ty)) if ty == "object" => "Record<string, any>".to_string(),
        Some(Value::String(ty)) => ty.clone(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" | "),
        _ => "any".to_string(),
    }
}

/// `my-config_schema` to `MyConfigSchema`.
pub fn pascal_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut upper_next = true;
    let mut prev_lower = false;
    for c in input.chars() {
        if !c.is_ascii_alphanumeric() {
            upper_next = true;
            prev_lower = false;
            continue;
        }
        if upper_next || (prev_lower && c.is_ascii_uppercase()) {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        upper_next = false;
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
    }
    out
}
