use serde::de::DeserializeOwned;
use serde_json::Value;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

/// Same as [`from_str_with_path`] for an already-parsed document.
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, String> {
    match serde_path_to_error::deserialize::<_, T>(value) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModuleExport;

    #[test]
    fn error_names_the_failing_path() {
        let err = from_str_with_path::<ModuleExport>(r#"{ "name": "Shop", "pages": {} }"#).unwrap_err();
        assert!(err.starts_with("at JSON path pages"), "{err}");

        let err = from_value_with_path::<ModuleExport>(serde_json::json!({ "name": 3 })).unwrap_err();
        assert!(err.starts_with("at JSON path name"), "{err}");
    }
}
