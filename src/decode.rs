//! Tagged value decoder for pluggable widget configurations.
//!
//! A widget's configuration is a list of properties, each pairing a declared
//! value kind (`type.valueType.type`) with a kind-specific payload (`value`).
//! Decoding turns that into a plain tree:
//!
//! ```text
//! { <category>: { <key>: { "type": <wire tag>, "value": <decoded> } } }
//! ```
//!
//! `Object` payloads hold further property lists and are decoded through the
//! same rules, so the only recursion is over the configuration's own nesting.
pub mod kind;

use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::node::{Node, value_text};

pub use kind::ValueKind;

/// Substituted for payloads the decoder cannot interpret.
pub const UNKNOWN_MARKER: &str = "Unknown, check output";

/// Nesting limit for `Object` payloads. Real configurations stay in the
/// single digits; hitting this means the input is not a tree.
pub const MAX_DEPTH: usize = 256;

/// `category → key → {type, value}`
pub type PropertyMap = IndexMap<String, IndexMap<String, DecodedProperty>>;

#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    Null,
    Bool(bool),
    Text(String),
    EntityPath(Vec<PathStep>),
    Translations(Vec<Translation>),
    Objects(Vec<PropertyMap>),
    Unknown,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStep {
    pub association: Option<String>,
    pub destination_entity: Option<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Translation {
    pub language: Option<String>,
    pub text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct DecodedProperty {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Decoded,
}

/// A pluggable widget instance with its decoded configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub name: String,
    pub widget_id: Option<String>,
    pub properties: PropertyMap,
}

impl Serialize for Decoded {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Decoded::Null => serializer.serialize_none(),
            Decoded::Bool(b) => serializer.serialize_bool(*b),
            Decoded::Text(s) => serializer.serialize_str(s),
            Decoded::EntityPath(steps) => steps.serialize(serializer),
            Decoded::Translations(translations) => translations.serialize(serializer),
            Decoded::Objects(objects) => objects.serialize(serializer),
            Decoded::Unknown => serializer.serialize_str(UNKNOWN_MARKER),
        }
    }
}

// ------------------------------- Front API -------------------------------- //

pub fn decode(kind: &ValueKind, raw: &Value) -> Result<Decoded, DecodeError> {
    decode_at(kind, raw, 0)
}

/// Decode every property of a property set, keeping declaration order.
pub fn decode_property_set(properties: &[Value]) -> Result<PropertyMap, DecodeError> {
    decode_property_set_at(properties, 0)
}

/// Widget id and full configuration of a `CustomWidgets$CustomWidget` node.
pub fn decode_widget(node: Node<'_>, name: &str) -> Result<WidgetConfig, DecodeError> {
    let widget_id = node
        .property("type")
        .and_then(|p| p.raw().get("widgetId"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    let properties = node
        .property("object")
        .and_then(|p| p.raw().get("properties"))
        .and_then(Value::as_array)
        .map(|props| decode_property_set(props))
        .transpose()?
        .unwrap_or_default();

    Ok(WidgetConfig { name: name.to_string(), widget_id, properties })
}

// ------------------------------- Dispatch --------------------------------- //

fn decode_at(kind: &ValueKind, raw: &Value, depth: usize) -> Result<Decoded, DecodeError> {
    if depth > MAX_DEPTH {
        return Err(DecodeError::DepthExceeded { limit: MAX_DEPTH });
    }
    let decoded = match kind {
        ValueKind::String | ValueKind::Integer | ValueKind::Enumeration => {
            scalar(raw, "primitiveValue")
        }
        ValueKind::Boolean => Decoded::Bool(
            raw.get("primitiveValue").map(value_text).as_deref() == Some("true"),
        ),
        ValueKind::EntityRef => entity_ref(raw),
        ValueKind::EntityPathRef => path_only(raw, "entityPath"),
        ValueKind::EntityConstraint => scalar(raw, "xPathConstraint"),
        ValueKind::MicroflowRef => scalar(raw, "microflow"),
        ValueKind::TranslatableText => translations(raw),
        ValueKind::AttributeRef => attribute_ref(raw),
        ValueKind::AttributePathRef => path_only(raw, "attributePath"),
        ValueKind::ObjectList => object_list(raw, depth)?,
        ValueKind::Unknown(tag) => {
            warn!(kind = %tag, payload = %raw, "unrecognized widget value kind");
            Decoded::Unknown
        }
    };
    Ok(decoded)
}

fn decode_property_set_at(properties: &[Value], depth: usize) -> Result<PropertyMap, DecodeError> {
    let mut out = PropertyMap::new();
    for property in properties {
        let declared = property.get("type");
        let key = declared.and_then(|t| t.get("key")).map(value_text).unwrap_or_default();
        let category = declared.and_then(|t| t.get("category")).map(value_text).unwrap_or_default();
        let tag = declared
            .and_then(|t| t.get("valueType"))
            .and_then(|vt| vt.get("type"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        let raw = property.get("value").unwrap_or(&Value::Null);
        let value = decode_at(&ValueKind::from_tag(tag), raw, depth)?;

        out.entry(category.into_owned())
            .or_default()
            .insert(key.into_owned(), DecodedProperty { kind: tag.to_string(), value });
    }
    Ok(out)
}

// ------------------------------ Kind helpers ------------------------------ //

fn scalar(raw: &Value, field: &str) -> Decoded {
    match raw.get(field) {
        None | Some(Value::Null) => Decoded::Null,
        Some(value) => Decoded::Text(value_text(value).into_owned()),
    }
}

fn non_empty_str<'a>(raw: &'a Value, field: &str) -> Option<&'a str> {
    raw.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn unknown_shape(kind: &str, raw: &Value) -> Decoded {
    warn!(kind, payload = %raw, "widget value has no recognizable reference");
    Decoded::Unknown
}

fn path_only(raw: &Value, field: &str) -> Decoded {
    match raw.get(field).and_then(Value::as_str) {
        Some(path) => Decoded::Text(path.to_string()),
        None => unknown_shape(field, raw),
    }
}

fn entity_ref(raw: &Value) -> Decoded {
    if let Some(path) = non_empty_str(raw, "entityPath") {
        return Decoded::Text(path.to_string());
    }
    match raw.get("entityRef") {
        Some(Value::Null) => Decoded::Null,
        Some(reference) => {
            let steps = reference.get("steps").and_then(Value::as_array);
            match steps {
                Some(steps) if !steps.is_empty() => Decoded::EntityPath(
                    steps
                        .iter()
                        .map(|step| PathStep {
                            association: optional_text(step, "association"),
                            destination_entity: optional_text(step, "destinationEntity"),
                        })
                        .collect(),
                ),
                _ => match non_empty_str(reference, "entity") {
                    Some(entity) => Decoded::Text(entity.to_string()),
                    None => {
                        debug!(payload = %raw, "entity reference without steps");
                        Decoded::Null
                    }
                },
            }
        }
        None if raw.get("entityPath").is_some() => Decoded::Text(String::new()),
        None => unknown_shape("Entity", raw),
    }
}

fn attribute_ref(raw: &Value) -> Decoded {
    if let Some(path) = non_empty_str(raw, "attributePath") {
        return Decoded::Text(path.to_string());
    }
    match raw.get("attributeRef") {
        Some(Value::Null) => Decoded::Null,
        Some(reference) => match reference.get("attribute") {
            Some(attribute) if !attribute.is_null() => {
                Decoded::Text(value_text(attribute).into_owned())
            }
            _ => {
                debug!(payload = %raw, "attribute reference without attribute");
                Decoded::Null
            }
        },
        None if raw.get("attributePath").is_some() => Decoded::Text(String::new()),
        None => unknown_shape("Attribute", raw),
    }
}

fn translations(raw: &Value) -> Decoded {
    let Some(value) = raw.get("translatableValue").filter(|v| !v.is_null()) else {
        return Decoded::Null;
    };
    let entries = value
        .get("translations")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .map(|tr| Translation {
                    language: optional_text(tr, "languageCode"),
                    text: optional_text(tr, "text"),
                })
                .collect()
        })
        .unwrap_or_default();
    Decoded::Translations(entries)
}

fn object_list(raw: &Value, depth: usize) -> Result<Decoded, DecodeError> {
    let Some(objects) = raw.get("objects").and_then(Value::as_array) else {
        debug!(payload = %raw, "object list without objects");
        return Ok(Decoded::Objects(Vec::new()));
    };
    let mut out = Vec::with_capacity(objects.len());
    for object in objects {
        let properties = object
            .get("properties")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        out.push(decode_property_set_at(properties, depth + 1)?);
    }
    Ok(Decoded::Objects(out))
}

fn optional_text(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .filter(|v| !v.is_null())
        .map(|v| value_text(v).into_owned())
}

// ------------------------------- Tests ------------------------------------ //
