//! Model export: modules holding the four document collections.
use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::node::Node;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DocumentKind {
    Page,
    Fragment,
    Layout,
    Flow,
}

impl DocumentKind {
    /// Batch order: every reverse reference is registered before unused
    /// artifacts are computed.
    pub const BATCH_ORDER: [DocumentKind; 4] =
        [DocumentKind::Page, DocumentKind::Fragment, DocumentKind::Layout, DocumentKind::Flow];

    /// Label used in report rows and location ids.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Page => "Page",
            DocumentKind::Fragment => "Snippet",
            DocumentKind::Layout => "Layout",
            DocumentKind::Flow => "Microflow",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ModuleExport {
    pub name: String,
    #[serde(default)]
    pub pages: Vec<Value>,
    #[serde(default, alias = "fragments")]
    pub snippets: Vec<Value>,
    #[serde(default)]
    pub layouts: Vec<Value>,
    #[serde(default, alias = "flows")]
    pub microflows: Vec<Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProjectExport {
    pub modules: Vec<ModuleExport>,
}

impl ModuleExport {
    fn collection(&self, kind: DocumentKind) -> &[Value] {
        match kind {
            DocumentKind::Page => &self.pages,
            DocumentKind::Fragment => &self.snippets,
            DocumentKind::Layout => &self.layouts,
            DocumentKind::Flow => &self.microflows,
        }
    }
}

/// A top-level document with its resolved qualified name.
#[derive(Clone, Copy, Debug)]
pub struct Document<'a> {
    pub kind: DocumentKind,
    pub qualified_name: &'a str,
    pub node: Node<'a>,
}

impl<'a> Document<'a> {
    pub fn excluded(&self) -> bool {
        self.node
            .property("excluded")
            .and_then(|p| p.raw().as_bool())
            .unwrap_or(false)
    }

    pub fn class(&self) -> String {
        self.node.property("class").map(|p| p.text().into_owned()).unwrap_or_default()
    }

    pub fn style(&self) -> String {
        self.node.property("style").map(|p| p.text().into_owned()).unwrap_or_default()
    }

    /// Qualified name of the layout a page is built on.
    pub fn layout(&self) -> Option<&'a str> {
        let call = self.node.property("layoutCall")?.raw();
        call.get("layout")
            .and_then(Value::as_str)
            .or_else(|| call.get("layoutQualifiedName").and_then(Value::as_str))
            .filter(|name| !name.is_empty())
    }

    /// Location id recorded in usage sets, e.g. `Page:Shop.Home`.
    pub fn location(&self) -> String {
        format!("{}:{}", self.kind.label(), self.qualified_name)
    }

    pub fn in_module(&self, prefix: &str) -> bool {
        prefix.is_empty() || self.qualified_name.starts_with(prefix)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Model {
    modules: Vec<ModuleExport>,
    /// Qualified names per module, indexed by batch slot.
    names: Vec<[Vec<String>; 4]>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_modules(modules: impl IntoIterator<Item = ModuleExport>) -> Self {
        let mut model = Self::new();
        for module in modules {
            model.push(module);
        }
        model
    }

    pub fn push(&mut self, module: ModuleExport) {
        let names = DocumentKind::BATCH_ORDER.map(|kind| {
            module
                .collection(kind)
                .iter()
                .map(|doc| qualified_name(&module.name, doc))
                .collect::<Vec<_>>()
        });
        self.names.push(names);
        self.modules.push(module);
    }

    pub fn modules(&self) -> &[ModuleExport] {
        &self.modules
    }

    /// Documents of one kind in export order. Entries without a type tag are
    /// reported and skipped.
    pub fn documents(&self, kind: DocumentKind) -> Vec<Document<'_>> {
        let slot = batch_slot(kind);
        let mut out = Vec::new();
        for (module, names) in self.modules.iter().zip(&self.names) {
            for (value, qualified_name) in module.collection(kind).iter().zip(&names[slot]) {
                match Node::from_value(value) {
                    Some(node) => out.push(Document { kind, qualified_name, node }),
                    None => warn!(module = %module.name, %kind, "skipping document without a $Type tag"),
                }
            }
        }
        out
    }

    /// Every declared qualified name of one kind, deduplicated.
    pub fn declared(&self, kind: DocumentKind) -> IndexSet<String> {
        let slot = batch_slot(kind);
        self.names.iter().flat_map(|n| n[slot].iter().cloned()).collect()
    }
}

fn batch_slot(kind: DocumentKind) -> usize {
    DocumentKind::BATCH_ORDER
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default()
}

fn qualified_name(module: &str, document: &Value) -> String {
    if let Some(name) = document.get("qualifiedName").and_then(Value::as_str) {
        return name.to_string();
    }
    let name = document.get("name").and_then(Value::as_str).unwrap_or_default();
    format!("{module}.{name}")
}
