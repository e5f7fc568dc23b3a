//! Per-document traversal drivers.
//!
//! Pages, layouts and fragments share one element walk; flows are handled
//! in [`flow`]. Each driver appends rows to a [`VisitOutput`] and reports
//! usages to a [`UsageSink`].
pub mod flow;

use indexmap::IndexSet;
use serde_json::Value;
use tracing::{debug, warn};

use crate::decode;
use crate::error::DecodeError;
use crate::model::{Document, DocumentKind, Model};
use crate::node::{NamedStyledNode, Node};
use crate::report::WidgetInstance;
use crate::store::{Partition, UsageSink};

pub const FRAGMENT_CALL_TYPE: &str = "Pages$SnippetCallWidget";
pub const PLUGGABLE_WIDGET_TYPE: &str = "CustomWidgets$CustomWidget";

/// Cell written when a fragment reference cannot be resolved.
pub const UNRESOLVED_MARKER: &str = "-unknown-";

/// Read-only inputs shared by every document visit.
#[derive(Clone, Debug, Default)]
pub struct VisitContext {
    pub module_prefix: String,
    pub fragments: IndexSet<String>,
}

impl VisitContext {
    pub fn new(model: &Model, module_prefix: &str) -> Self {
        Self {
            module_prefix: module_prefix.to_string(),
            fragments: model.declared(DocumentKind::Fragment),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisitOutput {
    pub rows: Vec<Vec<String>>,
    pub widgets: Vec<WidgetInstance>,
    pub visited: bool,
}

pub fn visit_document(
    document: &Document<'_>,
    ctx: &VisitContext,
    usage: &mut impl UsageSink,
) -> Result<VisitOutput, DecodeError> {
    match document.kind {
        DocumentKind::Page => visit_page(document, ctx, usage),
        DocumentKind::Layout => visit_layout(document, ctx, usage),
        DocumentKind::Fragment => visit_fragment(document, ctx, usage),
        DocumentKind::Flow => Ok(flow::visit_flow(document, ctx)),
    }
}

pub fn visit_page(
    page: &Document<'_>,
    ctx: &VisitContext,
    usage: &mut impl UsageSink,
) -> Result<VisitOutput, DecodeError> {
    if !page.in_module(&ctx.module_prefix) {
        return Ok(VisitOutput::default());
    }
    if let Some(layout) = page.layout() {
        usage.register_usage(Partition::Layout, layout, &page.location());
    }
    visit_elements(page, ctx, usage)
}

pub fn visit_layout(
    layout: &Document<'_>,
    ctx: &VisitContext,
    usage: &mut impl UsageSink,
) -> Result<VisitOutput, DecodeError> {
    if !layout.in_module(&ctx.module_prefix) {
        return Ok(VisitOutput::default());
    }
    visit_elements(layout, ctx, usage)
}

pub fn visit_fragment(
    fragment: &Document<'_>,
    ctx: &VisitContext,
    usage: &mut impl UsageSink,
) -> Result<VisitOutput, DecodeError> {
    if !fragment.in_module(&ctx.module_prefix) {
        return Ok(VisitOutput::default());
    }
    visit_elements(fragment, ctx, usage)
}

fn visit_elements(
    document: &Document<'_>,
    ctx: &VisitContext,
    usage: &mut impl UsageSink,
) -> Result<VisitOutput, DecodeError> {
    let mut out = VisitOutput { visited: true, ..VisitOutput::default() };
    let label = document.kind.label();
    let excluded = document.excluded().to_string();
    let location = document.location();
    let class = document.class();

    debug!(
        name = document.qualified_name,
        layout = document.layout().unwrap_or_default(),
        class = %class,
        style = %document.style(),
        "{label}"
    );
    out.rows.push(vec![
        label.to_string(),
        excluded.clone(),
        document.qualified_name.to_string(),
        document.layout().unwrap_or_default().to_string(),
        "---".to_string(),
        "---".to_string(),
        class.clone(),
        document.style(),
    ]);
    usage.register_class_names(&class);

    let mut nodes = Vec::new();
    document.node.traverse(&mut |node| nodes.push(node));

    for node in nodes {
        if std::ptr::eq(node.as_map(), document.node.as_map()) {
            continue;
        }
        let Some(styled) = node.named_styled() else {
            continue;
        };
        let element_type = node.short_type_name();
        debug!(
            name = %styled.name(),
            element_type,
            class = %styled.class(),
            style = %styled.style(),
            "  element"
        );
        usage.register_class_names(&styled.class());

        let mut row = vec![
            label.to_string(),
            excluded.clone(),
            document.qualified_name.to_string(),
            String::new(),
            element_type.to_string(),
            styled.name().into_owned(),
            styled.class().into_owned(),
            styled.style().into_owned(),
        ];

        if node.is(FRAGMENT_CALL_TYPE) {
            match resolve_fragment(node, &ctx.fragments) {
                Some(fragment) => {
                    debug!(fragment, "    fragment");
                    usage.register_usage(Partition::Fragment, fragment, &location);
                    row.push(fragment.to_string());
                }
                None => {
                    warn!(
                        location = %location,
                        element = %styled.name(),
                        properties = ?node.property_names(),
                        "unresolved fragment reference"
                    );
                    row.push(UNRESOLVED_MARKER.to_string());
                }
            }
        } else {
            row.push(String::new());
        }

        if node.is(PLUGGABLE_WIDGET_TYPE) {
            let config = decode::decode_widget(node, &styled.name())?;
            match &config.widget_id {
                Some(widget_id) => {
                    debug!(widget = %widget_id, "    widget");
                    usage.register_usage(Partition::Widget, widget_id, &location);
                }
                None => warn!(
                    location = %location,
                    element = %styled.name(),
                    properties = ?node.property_names(),
                    "pluggable widget without a widget id"
                ),
            }
            row.push(config.widget_id.clone().unwrap_or_default());
            out.widgets.push(WidgetInstance { location: location.clone(), config });
        }

        out.rows.push(row);
    }
    Ok(out)
}

/// Target of a fragment call: the direct reference when it names a declared
/// fragment, else the raw qualified-name string.
pub fn resolve_fragment<'a>(node: Node<'a>, declared: &IndexSet<String>) -> Option<&'a str> {
    let call = node.property("snippetCall")?.raw();
    let direct = match call.get("snippet") {
        Some(Value::String(name)) if declared.contains(name.as_str()) => Some(name.as_str()),
        Some(target @ Value::Object(_)) => target.get("qualifiedName").and_then(Value::as_str),
        _ => None,
    };
    direct.or_else(|| {
        call.get("snippetQualifiedName")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Model, ModuleExport};
    use crate::store::Store;
    use serde_json::json;

    fn model() -> Model {
        let module: ModuleExport = serde_json::from_value(json!({
            "name": "Shop",
            "pages": [{
                "$Type": "Pages$Page",
                "name": "Home",
                "class": "page  home",
                "style": "",
                "layoutCall": { "$Type": "Pages$LayoutCall", "layout": "Atlas.Default" },
                "widgets": [
                    { "$Type": "Pages$DivContainer", "name": "container1", "class": "row", "style": "color: red",
                      "widgets": [
                        { "$Type": "Pages$SnippetCallWidget", "name": "snippetCall1", "class": "", "style": "",
                          "snippetCall": { "$Type": "Pages$SnippetCall", "snippet": "Shop.Header" } },
                        { "$Type": "Pages$SnippetCallWidget", "name": "snippetCall2", "class": "", "style": "",
                          "snippetCall": { "$Type": "Pages$SnippetCall", "snippet": "Gone.Missing",
                                           "snippetQualifiedName": "Gone.Missing" } },
                        { "$Type": "Pages$SnippetCallWidget", "name": "snippetCall3", "class": "", "style": "",
                          "snippetCall": { "$Type": "Pages$SnippetCall", "snippet": null } }
                      ] },
                    { "$Type": "CustomWidgets$CustomWidget", "name": "chart1", "class": "chart", "style": "",
                      "type": { "$Type": "CustomWidgets$CustomWidgetType", "widgetId": "com.acme.Chart" },
                      "object": { "$Type": "CustomWidgets$WidgetObject", "properties": [
                        { "$Type": "CustomWidgets$WidgetProperty",
                          "type": { "key": "showLegend", "category": "Appearance", "valueType": { "type": "Boolean" } },
                          "value": { "primitiveValue": "true" } }
                      ] } },
                    { "$Type": "Pages$Title", "caption": "no name or class" }
                ]
            }],
            "snippets": [{ "$Type": "Pages$Snippet", "name": "Header", "widgets": [] }]
        }))
        .unwrap();
        Model::from_modules([module])
    }

    #[test]
    fn page_rows_and_usages() {
        let model = model();
        let ctx = VisitContext::new(&model, "");
        let page = model.documents(DocumentKind::Page)[0];
        let mut store = Store::new();
        let out = visit_page(&page, &ctx, &mut store).unwrap();

        assert_eq!(out.rows.len(), 6);
        assert_eq!(
            out.rows[0],
            vec!["Page", "false", "Shop.Home", "Atlas.Default", "---", "---", "page  home", ""]
        );
        assert_eq!(
            out.rows[1],
            vec!["Page", "false", "Shop.Home", "", "DivContainer", "container1", "row", "color: red", ""]
        );
        assert_eq!(out.rows[2][8], "Shop.Header");
        assert_eq!(out.rows[3][8], "Gone.Missing");
        assert_eq!(out.rows[4][8], UNRESOLVED_MARKER);
        assert_eq!(out.rows[5][4], "CustomWidget");
        assert_eq!(out.rows[5][9], "com.acme.Chart");

        assert!(store.used(Partition::Layout, "Atlas.Default"));
        let header = store.get(Partition::Fragment, "Shop.Header").unwrap();
        assert_eq!(header.used_in.iter().collect::<Vec<_>>(), vec!["Page:Shop.Home"]);
        assert!(store.used(Partition::Widget, "com.acme.Chart"));
        assert_eq!(
            store.class_names().iter().collect::<Vec<_>>(),
            vec!["page", "home", "row", "chart"]
        );

        assert_eq!(out.widgets.len(), 1);
        assert_eq!(out.widgets[0].location, "Page:Shop.Home");
        assert_eq!(
            serde_json::to_value(&out.widgets[0]).unwrap()["properties"]["Appearance"]["showLegend"]["value"],
            json!(true)
        );
    }

    #[test]
    fn prefix_filter_skips_documents() {
        let model = model();
        let ctx = VisitContext::new(&model, "Admin");
        let page = model.documents(DocumentKind::Page)[0];
        let mut store = Store::new();
        let out = visit_page(&page, &ctx, &mut store).unwrap();
        assert!(!out.visited);
        assert!(out.rows.is_empty());
        assert!(!store.used(Partition::Layout, "Atlas.Default"));
    }

    #[test]
    fn fragment_document_has_summary_row_only() {
        let model = model();
        let ctx = VisitContext::new(&model, "Shop");
        let fragment = model.documents(DocumentKind::Fragment)[0];
        let mut store = Store::new();
        let out = visit_fragment(&fragment, &ctx, &mut store).unwrap();
        assert_eq!(out.rows, vec![vec!["Snippet", "false", "Shop.Header", "", "---", "---", "", ""]]);
    }

    fn shared_model() -> Model {
        let module: ModuleExport = serde_json::from_value(json!({
            "name": "Shop",
            "snippets": [
                { "$Type": "Pages$Snippet", "name": "Header", "widgets": [
                    { "$Type": "Pages$SnippetCallWidget", "name": "logoCall", "class": "logo", "style": "",
                      "snippetCall": { "$Type": "Pages$SnippetCall", "snippet": "Shop.Logo" } }
                ] },
                { "$Type": "Pages$Snippet", "name": "Logo", "widgets": [] }
            ],
            "layouts": [
                { "$Type": "Pages$Layout", "name": "Main", "class": "layout", "widgets": [
                    { "$Type": "Pages$DivContainer", "name": "header1", "class": "top", "style": "",
                      "widgets": [
                        { "$Type": "Pages$SnippetCallWidget", "name": "headerCall", "class": "", "style": "",
                          "snippetCall": { "$Type": "Pages$SnippetCall", "snippet": "Shop.Header" } }
                      ] }
                ] }
            ]
        }))
        .unwrap();
        Model::from_modules([module])
    }

    #[test]
    fn layout_elements_register_under_layout_location() {
        let model = shared_model();
        let ctx = VisitContext::new(&model, "");
        let layout = model.documents(DocumentKind::Layout)[0];
        let mut store = Store::new();
        let out = visit_layout(&layout, &ctx, &mut store).unwrap();

        assert_eq!(out.rows.len(), 3);
        assert_eq!(out.rows[0], vec!["Layout", "false", "Shop.Main", "", "---", "---", "layout", ""]);
        assert_eq!(
            out.rows[2],
            vec!["Layout", "false", "Shop.Main", "", "SnippetCallWidget", "headerCall", "", "", "Shop.Header"]
        );
        let header = store.get(Partition::Fragment, "Shop.Header").unwrap();
        assert_eq!(header.used_in.iter().collect::<Vec<_>>(), vec!["Layout:Shop.Main"]);
        assert_eq!(store.class_names().iter().collect::<Vec<_>>(), vec!["layout", "top"]);
    }

    #[test]
    fn fragment_elements_register_under_snippet_location() {
        let model = shared_model();
        let ctx = VisitContext::new(&model, "");
        let fragment = model.documents(DocumentKind::Fragment)[0];
        let mut store = Store::new();
        let out = visit_fragment(&fragment, &ctx, &mut store).unwrap();

        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[1][4], "SnippetCallWidget");
        assert_eq!(out.rows[1][8], "Shop.Logo");
        let logo = store.get(Partition::Fragment, "Shop.Logo").unwrap();
        assert_eq!(logo.used_in.iter().collect::<Vec<_>>(), vec!["Snippet:Shop.Header"]);
    }

    #[test]
    fn widget_without_id_leaves_column_empty() {
        let module: ModuleExport = serde_json::from_value(json!({
            "name": "Shop",
            "pages": [{ "$Type": "Pages$Page", "name": "Home", "class": "", "widgets": [
                { "$Type": "CustomWidgets$CustomWidget", "name": "mystery1", "class": "", "style": "",
                  "type": { "$Type": "CustomWidgets$CustomWidgetType" },
                  "object": { "$Type": "CustomWidgets$WidgetObject", "properties": [] } }
            ] }]
        }))
        .unwrap();
        let model = Model::from_modules([module]);
        let page = model.documents(DocumentKind::Page)[0];
        let mut store = Store::new();
        let out = visit_page(&page, &VisitContext::new(&model, ""), &mut store).unwrap();

        assert_eq!(out.rows[1][9], "");
        assert_eq!(store.entries(Partition::Widget).count(), 0);
        assert_eq!(out.widgets.len(), 1);
        assert_eq!(out.widgets[0].config.widget_id, None);
    }

    #[test]
    fn embedded_fragment_contents_are_not_page_elements() {
        let module: ModuleExport = serde_json::from_value(json!({
            "name": "Shop",
            "pages": [{ "$Type": "Pages$Page", "name": "Home", "class": "", "widgets": [
                { "$Type": "Pages$SnippetCallWidget", "name": "footerCall", "class": "", "style": "",
                  "snippetCall": { "$Type": "Pages$SnippetCall", "snippet": {
                    "$Type": "Pages$Snippet", "qualifiedName": "Shop.Footer", "name": "Footer", "class": "",
                    "widgets": [
                      { "$Type": "Pages$Text", "name": "footerText", "class": "footer-only", "style": "" },
                      { "$Type": "CustomWidgets$CustomWidget", "name": "badge1", "class": "", "style": "",
                        "type": { "widgetId": "com.acme.Badge" } }
                    ] } } }
            ] }]
        }))
        .unwrap();
        let model = Model::from_modules([module]);
        let page = model.documents(DocumentKind::Page)[0];
        let mut store = Store::new();
        let out = visit_page(&page, &VisitContext::new(&model, ""), &mut store).unwrap();

        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[1][5], "footerCall");
        assert_eq!(out.rows[1][8], "Shop.Footer");
        assert!(out.widgets.is_empty());
        assert!(store.class_names().is_empty());
        assert!(!store.used(Partition::Widget, "com.acme.Badge"));
    }

    #[test]
    fn embedded_fragment_reference() {
        let value = json!({
            "$Type": "Pages$SnippetCallWidget",
            "snippetCall": { "snippet": { "$Type": "Pages$Snippet", "qualifiedName": "Shop.Footer" } }
        });
        let node = Node::from_value(&value).unwrap();
        assert_eq!(resolve_fragment(node, &IndexSet::new()), Some("Shop.Footer"));
    }
}
