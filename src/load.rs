//! Reading model exports from disk.
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::model::{Model, ModuleExport, ProjectExport};

#[derive(Clone, Debug, Default)]
pub struct LoadSettings {
    /// Literal paths or glob patterns, in the order they are merged.
    pub inputs: Vec<String>,
    /// jq filter applied to every file before it is interpreted as an export.
    pub jq_expr: Option<String>,
}

pub fn load_model(settings: &LoadSettings) -> Result<Model, LoadError> {
    let mut model = Model::new();
    for path in resolve_file_path_patterns(&settings.inputs)? {
        let source = std::fs::read_to_string(&path)
            .map_err(|source| LoadError::Io { path: path.clone(), source })?;
        let modules = parse_export(&path, &source, settings.jq_expr.as_deref())?;
        info!(path = %path.display(), modules = modules.len(), "loaded export");
        for module in modules {
            model.push(module);
        }
    }
    Ok(model)
}

/// An export is either a single module or `{ "modules": [...] }`.
pub fn parse_export(path: &Path, source: &str, jq_expr: Option<&str>) -> Result<Vec<ModuleExport>, LoadError> {
    let parse_error = |message: String| LoadError::Parse { path: path.to_path_buf(), message };

    let documents = match jq_expr {
        None => vec![crate::path_de::from_str_with_path::<Value>(source).map_err(parse_error)?],
        Some(jq_expr) => {
            let value = crate::path_de::from_str_with_path::<Value>(source).map_err(parse_error)?;
            crate::jq_exec::run_jaq(jq_expr, &value)
                .map_err(|e| LoadError::Jq { path: path.to_path_buf(), message: e.to_string() })?
        }
    };

    let mut modules = Vec::new();
    for document in documents {
        if document.get("modules").is_some() {
            let project: ProjectExport = crate::path_de::from_value_with_path(document).map_err(parse_error)?;
            modules.extend(project.modules);
        } else {
            modules.push(crate::path_de::from_value_with_path(document).map_err(parse_error)?);
        }
    }
    debug!(path = %path.display(), modules = modules.len(), "parsed export");
    Ok(modules)
}

pub fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, LoadError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let entries = glob::glob(pattern)
                .map_err(|source| LoadError::Pattern { pattern: pattern.to_string(), source })?;
            let before = out.len();
            for entry in entries {
                out.push(entry?);
            }
            if out.len() == before {
                // An explicit glob that matched nothing is a mistake, not an empty model
                return Err(LoadError::NoMatches(pattern.to_string()));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentKind;

    const MODULE: &str = r#"{ "name": "Shop", "pages": [ { "$Type": "Pages$Page", "name": "Home" } ] }"#;

    #[test]
    fn single_module_and_project_exports() {
        let modules = parse_export(Path::new("a.json"), MODULE, None).unwrap();
        assert_eq!(modules.len(), 1);

        let project = format!(r#"{{ "modules": [ {MODULE}, {{ "name": "Admin" }} ] }}"#);
        let modules = parse_export(Path::new("b.json"), &project, None).unwrap();
        assert_eq!(modules.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(), vec!["Shop", "Admin"]);
    }

    #[test]
    fn jq_filter_reshapes_input() {
        let wrapped = format!(r#"{{ "data": {{ "export": {MODULE} }} }}"#);
        let modules = parse_export(Path::new("c.json"), &wrapped, Some(".data.export")).unwrap();
        assert_eq!(modules[0].pages.len(), 1);
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let err = parse_export(Path::new("bad.json"), r#"{ "name": "Shop", "layouts": 7 }"#, None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bad.json"), "{message}");
        assert!(message.contains("layouts"), "{message}");
    }

    #[test]
    fn loads_files_matched_by_glob() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), MODULE).unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{ "name": "Admin", "pages": [] }"#).unwrap();
        let pattern = dir.path().join("*.json").to_string_lossy().to_string();
        let model = load_model(&LoadSettings { inputs: vec![pattern], jq_expr: None }).unwrap();
        assert_eq!(model.modules().len(), 2);
        assert_eq!(model.documents(DocumentKind::Page)[0].qualified_name, "Shop.Home");
    }

    #[test]
    fn empty_glob_and_missing_file_fail() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = dir.path().join("*.json").to_string_lossy().to_string();
        assert!(matches!(
            load_model(&LoadSettings { inputs: vec![pattern], jq_expr: None }),
            Err(LoadError::NoMatches(_))
        ));
        let missing = dir.path().join("nope.json").to_string_lossy().to_string();
        assert!(matches!(
            load_model(&LoadSettings { inputs: vec![missing], jq_expr: None }),
            Err(LoadError::Io { .. })
        ));
    }
}
