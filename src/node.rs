//! Read-only view over the nodes of an exported model tree.
//!
//! A node is any JSON object carrying a `$Type` tag. Properties are looked up
//! by name and come back as `Option`: a missing property is an ordinary
//! result, not an error.
use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

pub const TYPE_KEY: &str = "$Type";
pub const ID_KEY: &str = "$ID";

/// Properties that point at another document rather than contain nodes.
/// Traversal does not descend into them, even when the target is embedded.
pub const REFERENCE_KEYS: [&str; 4] = ["snippet", "layout", "page", "microflow"];

/// `Pages$DivContainer` → container `Pages`, name `DivContainer`.
static TYPE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<container>[A-Za-z0-9_]+)\$)?(?P<name>.*)$").unwrap()
});

#[derive(Clone, Copy, Debug)]
pub struct Node<'a> {
    fields: &'a Map<String, Value>,
    type_name: &'a str,
}

#[derive(Clone, Copy, Debug)]
pub struct Property<'a> {
    value: &'a Value,
}

impl<'a> Node<'a> {
    pub fn from_value(value: &'a Value) -> Option<Self> {
        let fields = value.as_object()?;
        let type_name = fields.get(TYPE_KEY)?.as_str()?;
        Some(Self { fields, type_name })
    }

    pub fn structure_type_name(&self) -> &'a str {
        self.type_name
    }

    /// Type name with its container prefix removed.
    pub fn short_type_name(&self) -> &'a str {
        TYPE_NAME
            .captures(self.type_name)
            .and_then(|caps| caps.name("name"))
            .map(|m| m.as_str())
            .unwrap_or(self.type_name)
    }

    pub fn is(&self, type_name: &str) -> bool {
        self.type_name == type_name
    }

    pub fn property(&self, name: &str) -> Option<Property<'a>> {
        if name == TYPE_KEY {
            return None;
        }
        self.fields.get(name).map(|value| Property { value })
    }

    /// Declared property names in document order.
    pub fn property_names(&self) -> Vec<&'a str> {
        self.fields
            .keys()
            .map(String::as_str)
            .filter(|k| *k != TYPE_KEY && *k != ID_KEY)
            .collect()
    }

    pub fn str_property(&self, name: &str) -> Option<&'a str> {
        self.property(name).and_then(|p| p.as_str())
    }

    /// Depth-first, pre-order walk over this node and every contained node.
    /// Objects without a type tag are descended into but not reported;
    /// [`REFERENCE_KEYS`] are never followed.
    pub fn traverse(&self, visit: &mut impl FnMut(Node<'a>)) {
        visit(*self);
        walk_fields(self.fields, visit);
    }

    /// The name/class/style capability, present only when the node declares
    /// both `name` and `class`.
    pub fn named_styled(&self) -> Option<StyledNode<'a>> {
        Some(StyledNode {
            name: self.property("name")?,
            class: self.property("class")?,
            style: self.property("style"),
        })
    }

    pub fn as_map(&self) -> &'a Map<String, Value> {
        self.fields
    }
}

fn walk_fields<'a>(fields: &'a Map<String, Value>, visit: &mut impl FnMut(Node<'a>)) {
    for (key, value) in fields {
        if key != TYPE_KEY && !REFERENCE_KEYS.contains(&key.as_str()) {
            walk_value(value, visit);
        }
    }
}

fn walk_value<'a>(value: &'a Value, visit: &mut impl FnMut(Node<'a>)) {
    match value {
        Value::Object(map) => match Node::from_value(value) {
            Some(node) => node.traverse(visit),
            None => walk_fields(map, visit),
        },
        Value::Array(items) => items.iter().for_each(|v| walk_value(v, visit)),
        _ => {}
    }
}

impl<'a> Property<'a> {
    pub fn raw(&self) -> &'a Value {
        self.value
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.value.as_str()
    }

    /// Scalar rendering for report cells; `null` becomes the empty string.
    pub fn text(&self) -> Cow<'a, str> {
        value_text(self.value)
    }
}

pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Nodes that expose `name`, `class` and `style`.
pub trait NamedStyledNode {
    fn name(&self) -> Cow<'_, str>;
    fn class(&self) -> Cow<'_, str>;
    fn style(&self) -> Cow<'_, str>;
}

#[derive(Clone, Copy, Debug)]
pub struct StyledNode<'a> {
    name: Property<'a>,
    class: Property<'a>,
    style: Option<Property<'a>>,
}

impl NamedStyledNode for StyledNode<'_> {
    fn name(&self) -> Cow<'_, str> {
        self.name.text()
    }

    fn class(&self) -> Cow<'_, str> {
        self.class.text()
    }

    fn style(&self) -> Cow<'_, str> {
        self.style.map(|p| p.text()).unwrap_or(Cow::Borrowed(""))
    }
}
