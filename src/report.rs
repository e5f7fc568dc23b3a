//! The cross-reference index written as JSON.
use std::path::Path;

use indexmap::IndexSet;
use serde::Serialize;

use crate::decode::WidgetConfig;
use crate::error::{ModelXrefError, Result};
use crate::store::Store;

/// A decoded widget together with the document it was found in.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WidgetInstance {
    pub location: String,
    #[serde(flatten)]
    pub config: WidgetConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Unused {
    pub fragment: IndexSet<String>,
    pub layout: IndexSet<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReference {
    #[serde(flatten)]
    pub store: Store,
    pub unused: Unused,
    pub widget_instances: Vec<WidgetInstance>,
    pub generated_at: String,
}

impl CrossReference {
    pub fn new(store: Store, unused: Unused, widget_instances: Vec<WidgetInstance>) -> Self {
        Self {
            store,
            unused,
            widget_instances,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ModelXrefError::Write { path: Default::default(), message: e.to_string() })
    }

    pub fn write_file(&self, path: &Path) -> Result<()> {
        let to_error = |e: std::io::Error| ModelXrefError::Write { path: path.to_path_buf(), message: e.to_string() };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(to_error)?;
        }
        std::fs::write(path, self.to_json()?).map_err(to_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Partition;

    #[test]
    fn json_layout() {
        let mut store = Store::new();
        store.register_usage(Partition::Fragment, "Shop.Header", "Page:Shop.Home");
        let unused = Unused {
            fragment: ["Shop.Footer".to_string()].into_iter().collect(),
            layout: IndexSet::new(),
        };
        let report = CrossReference::new(store, unused, Vec::new());
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["fragment"][0]["usedIn"][0], "Page:Shop.Home");
        assert_eq!(json["unused"]["fragment"], serde_json::json!(["Shop.Footer"]));
        assert_eq!(json["unused"]["layout"], serde_json::json!([]));
        assert!(json["generatedAt"].is_string());
        assert_eq!(json["widgetInstances"], serde_json::json!([]));
    }
}
