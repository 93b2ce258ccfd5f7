use crate::error::{Result, SdkError};

/// One text input of an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// Query parameter read on POST (`suclu`).
    pub query_key: String,
    /// Placeholder name inside the GET link template (`sucluIsmi`).
    pub template_param: String,
    /// Input placeholder rendered by the wallet.
    pub label: String,
    /// Value used when the query parameter is missing or empty.
    pub default: String,
}

impl FieldSpec {
    pub fn new(query_key: &str, template_param: &str, label: &str, default: &str) -> Self {
        Self {
            query_key: query_key.to_string(),
            template_param: template_param.to_string(),
            label: label.to_string(),
            default: default.to_string(),
        }
    }
}

/// Resolved field values, in schema order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidatedFields(Vec<(String, String)>);

impl ValidatedFields {
    pub fn get(&self, query_key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == query_key)
            .map(|(_, value)| value.as_str())
    }
}

/// Resolve query parameters against a field schema.
///
/// The first occurrence of a key wins. A missing or empty parameter falls back to the
/// field default, and a field whose resolved value is still empty is rejected. Every
/// rejected field is reported, not just the first.
pub fn validate(fields: &[FieldSpec], params: &[(String, String)]) -> Result<ValidatedFields> {
    let mut resolved = Vec::with_capacity(fields.len());
    let mut invalid = Vec::new();

    for field in fields {
        let value = params
            .iter()
            .find(|(key, _)| *key == field.query_key)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
            .unwrap_or(field.default.as_str());

        if value.is_empty() {
            invalid.push(field.query_key.clone());
            continue;
        }
        resolved.push((field.query_key.clone(), value.to_string()));
    }

    if !invalid.is_empty() {
        return Err(SdkError::Validation(invalid));
    }
    Ok(ValidatedFields(resolved))
}
