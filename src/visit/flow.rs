//! Flow documents: count action and loop nodes, list page/flow/external-action targets.
use serde_json::Value;
use tracing::debug;

use super::{VisitContext, VisitOutput};
use crate::model::Document;
use crate::node::Node;

pub const ACTION_TYPE: &str = "Microflows$ActionActivity";
pub const LOOP_TYPE: &str = "Microflows$LoopedActivity";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlowStats {
    pub actions: usize,
    pub loops: usize,
}

/// An action that points at another document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowTarget {
    OpenPage(String),
    CallFlow(String),
    ExternalAction(String),
}

impl FlowTarget {
    fn from_node(node: Node<'_>) -> Option<Self> {
        let short = node.short_type_name();
        let target = |property: &str, fields: &[&str]| -> Option<String> {
            let found = if fields.is_empty() {
                node.str_property(property)
            } else {
                let raw = node.property(property)?.raw();
                fields.iter().find_map(|f| raw.get(*f).and_then(Value::as_str))
            };
            found.filter(|s| !s.is_empty()).map(str::to_string)
        };

        if short.eq_ignore_ascii_case("ShowPageAction") {
            target("pageSettings", &["page", "pageQualifiedName"]).map(Self::OpenPage)
        } else if short.eq_ignore_ascii_case("MicroflowCallAction") {
            target("microflowCall", &["microflow", "microflowQualifiedName"]).map(Self::CallFlow)
        } else if short.eq_ignore_ascii_case("JavaActionCallAction") {
            target("javaAction", &[]).map(Self::ExternalAction)
        } else {
            None
        }
    }

    /// Column slot within the flows sheet.
    fn cells(&self) -> [&str; 3] {
        match self {
            FlowTarget::OpenPage(t) => [t.as_str(), "", ""],
            FlowTarget::CallFlow(t) => ["", t.as_str(), ""],
            FlowTarget::ExternalAction(t) => ["", "", t.as_str()],
        }
    }
}

pub fn visit_flow(flow: &Document<'_>, ctx: &VisitContext) -> VisitOutput {
    if !flow.in_module(&ctx.module_prefix) {
        return VisitOutput::default();
    }

    let mut stats = FlowStats::default();
    let mut targets = Vec::new();
    flow.node.traverse(&mut |node| {
        if node.is(ACTION_TYPE) {
            stats.actions += 1;
        } else if node.is(LOOP_TYPE) {
            stats.loops += 1;
        }
        if let Some(target) = FlowTarget::from_node(node) {
            targets.push(target);
        }
    });

    debug!(
        name = flow.qualified_name,
        actions = stats.actions,
        loops = stats.loops,
        targets = targets.len(),
        "Microflow"
    );

    let excluded = flow.excluded().to_string();
    let mut rows = Vec::with_capacity(targets.len() + 1);
    rows.push(vec![
        excluded.clone(),
        flow.qualified_name.to_string(),
        stats.actions.to_string(),
        stats.loops.to_string(),
    ]);
    for target in &targets {
        debug!(?target, "  action");
        let mut row = vec![excluded.clone(), flow.qualified_name.to_string(), String::new(), String::new()];
        row.extend(target.cells().iter().map(|c| c.to_string()));
        rows.push(row);
    }

    VisitOutput { rows, widgets: Vec::new(), visited: true }
}
