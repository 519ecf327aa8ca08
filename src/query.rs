//! Query specs produced by the chat prompt.
//!
//! Generated text is expected to embed one JSON object describing a query
//! (model, view, fields, filters, limit, sorts). It is extracted, checked
//! against that schema, and only then turned into an inline-query body.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Result, ShapeError};

/// Largest row limit accepted from a generated query.
pub const MAX_LIMIT: u64 = 5000;

/// Pull the JSON object out of generated text.
///
/// A fenced ```json block wins; otherwise the span from the first `{` to
/// the last `}` is used.
pub fn extract_json(text: &str) -> Result<&str> {
    if let Some(block) = fenced_json_block(text) {
        if block.starts_with('{') {
            return Ok(block);
        }
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&text[start..=end]),
        _ => Err(ShapeError::json_extraction("no {...} span in generated text")),
    }
}

fn fenced_json_block(text: &str) -> Option<&str> {
    let fence = "```json";
    let start = text.find(fence)? + fence.len();
    let content_start = start + text[start..].find('\n')? + 1;
    let end = content_start + text[content_start..].find("```")?;
    Some(text[content_start..end].trim())
}

/// Extract and parse the query spec embedded in generated text.
pub fn parse_query_spec(text: &str) -> Result<QuerySpec> {
    let json = extract_json(text)?;
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ShapeError::json_extraction(format!("embedded JSON does not parse: {e}")))?;
    serde_json::from_value(value)
        .map_err(|e| ShapeError::validation(format!("query spec has the wrong shape: {e}")))
}

/// Query as written by the prompt. Keys may be prefixed (`query.model`) or
/// bare (`model`). `fields`, `sorts` and `filters` may also arrive as
/// JSON-encoded strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QuerySpec {
    #[serde(rename = "query.model", alias = "model", default)]
    pub model: String,
    #[serde(rename = "query.view", alias = "view", default)]
    pub view: String,
    #[serde(rename = "query.fields", alias = "fields", default, deserialize_with = "string_list")]
    pub fields: Vec<String>,
    #[serde(rename = "query.filters", alias = "filters", default, deserialize_with = "string_map")]
    pub filters: BTreeMap<String, String>,
    #[serde(rename = "query.limit", alias = "limit", default)]
    pub limit: Option<Value>,
    #[serde(rename = "query.sorts", alias = "sorts", default, deserialize_with = "string_list")]
    pub sorts: Vec<String>,
}

/// A query spec that passed [`QuerySpec::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuery {
    pub model: String,
    pub view: String,
    pub fields: Vec<String>,
    pub filters: BTreeMap<String, String>,
    pub limit: Option<u64>,
    pub sorts: Vec<String>,
}

impl QuerySpec {
    pub fn validate(&self) -> Result<ValidatedQuery> {
        let model = self.model.trim();
        if model.is_empty() {
            return Err(ShapeError::validation("query has no model"));
        }
        let view = self.view.trim();
        if view.is_empty() {
            return Err(ShapeError::validation("query has no view"));
        }
        if self.fields.is_empty() {
            return Err(ShapeError::validation("query has no fields"));
        }
        if self.fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ShapeError::validation("query has a blank field name"));
        }

        let limit = match &self.limit {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_limit(value)?),
        };

        for sort in &self.sorts {
            validate_sort(sort, &self.fields)?;
        }

        Ok(ValidatedQuery {
            model: model.to_string(),
            view: view.to_string(),
            fields: self.fields.iter().map(|f| f.trim().to_string()).collect(),
            filters: self.filters.clone(),
            limit,
            sorts: self.sorts.iter().map(|s| s.trim().to_string()).collect(),
        })
    }
}

fn parse_limit(value: &Value) -> Result<u64> {
    let limit = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match limit {
        Some(n) if (1..=MAX_LIMIT).contains(&n) => Ok(n),
        _ => Err(ShapeError::validation(format!(
            "limit must be a whole number between 1 and {MAX_LIMIT}, got {value}"
        ))),
    }
}

fn validate_sort(sort: &str, fields: &[String]) -> Result<()> {
    let parts: Vec<&str> = sort.split_whitespace().collect();
    let (field, direction) = match parts.as_slice() {
        [field] => (*field, None),
        [field, direction] => (*field, Some(*direction)),
        _ => return Err(ShapeError::validation(format!("malformed sort '{sort}'"))),
    };
    if let Some(d) = direction {
        if !d.eq_ignore_ascii_case("asc") && !d.eq_ignore_ascii_case("desc") {
            return Err(ShapeError::validation(format!(
                "sort direction must be asc or desc in '{sort}'"
            )));
        }
    }
    if !fields.iter().any(|f| f.trim() == field) {
        return Err(ShapeError::validation(format!(
            "sort field '{field}' is not among the selected fields"
        )));
    }
    Ok(())
}

/// Body of a `run_inline_query` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineQuery {
    pub model: String,
    pub view: String,
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<String>,
}

impl ValidatedQuery {
    pub fn to_inline_query(&self) -> InlineQuery {
        InlineQuery {
            model: self.model.clone(),
            view: self.view.clone(),
            fields: self.fields.clone(),
            filters: self.filters.clone(),
            limit: self.limit.map(|n| n.to_string()),
            sorts: self.sorts.clone(),
        }
    }
}

fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    list_from_value(value, true).map_err(serde::de::Error::custom)
}

fn list_from_value(value: Value, allow_encoded: bool) -> std::result::Result<Vec<String>, String> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(format!("expected a string, found {other}")),
            })
            .collect(),
        Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        Value::String(s) if allow_encoded => {
            let inner: Value =
                serde_json::from_str(&s).map_err(|e| format!("invalid encoded list '{s}': {e}"))?;
            list_from_value(inner, false)
        }
        other => Err(format!("expected a list of strings, found {other}")),
    }
}

fn string_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    map_from_value(value, true).map_err(serde::de::Error::custom)
}

fn map_from_value(value: Value, allow_encoded: bool) -> std::result::Result<BTreeMap<String, String>, String> {
    match value {
        Value::Null => Ok(BTreeMap::new()),
        Value::Object(entries) => entries
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k, s)),
                Value::Number(n) => Ok((k, n.to_string())),
                Value::Bool(b) => Ok((k, b.to_string())),
                other => Err(format!("filter '{k}' must be a string, found {other}")),
            })
            .collect(),
        Value::String(s) if s.trim().is_empty() => Ok(BTreeMap::new()),
        Value::String(s) if allow_encoded => {
            let inner: Value =
                serde_json::from_str(&s).map_err(|e| format!("invalid encoded filters '{s}': {e}"))?;
            map_from_value(inner, false)
        }
        other => Err(format!("expected an object of filters, found {other}")),
    }
}
