use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;

use crate::error::{Result, ShapeError};

/// A raw cell value as returned by the query engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// String used for labels and grouping keys.
    /// Numbers print without a trailing `.0`, so `100` groups as "100".
    pub fn as_key(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Numeric view of the cell; numeric strings are accepted.
    /// NaN and infinities count as non-numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Null | CellValue::Bool(_) => None,
        }
        .filter(|n| n.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Cell {
    #[serde(default)]
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered: Option<String>,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            rendered: None,
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::new(CellValue::Number(n))
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::new(CellValue::Text(s.to_string()))
    }
}

/// One result row: field name -> cell.
pub type Row = BTreeMap<String, Cell>;

/// Field metadata (`name` is the unique id, `label` is for display).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub label: String,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }

    /// Label shown to users, falling back to the field name.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Fields {
    #[serde(default)]
    pub dimensions: Vec<FieldDescriptor>,
    #[serde(default)]
    pub measures: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Metadata {
    pub fields: Fields,
}

/// A tabular query result. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QueryResult {
    pub metadata: Metadata,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn new(fields: Fields, rows: Vec<Row>) -> Self {
        Self {
            metadata: Metadata { fields },
            rows,
        }
    }

    pub fn fields(&self) -> &Fields {
        &self.metadata.fields
    }

    pub fn dimension(&self, name: &str) -> Option<&FieldDescriptor> {
        self.metadata.fields.dimensions.iter().find(|f| f.name == name)
    }

    pub fn measure(&self, name: &str) -> Option<&FieldDescriptor> {
        self.metadata.fields.measures.iter().find(|f| f.name == name)
    }

    /// Create a QueryResult from a `json_bi` style response object
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| ShapeError::malformed("response must be a JSON object"))?;

        let has_fields = obj
            .get("metadata")
            .and_then(|m| m.get("fields"))
            .is_some_and(Value::is_object);
        if !has_fields {
            return Err(ShapeError::malformed("response has no metadata.fields"));
        }
        if !obj.get("rows").is_some_and(Value::is_array) {
            return Err(ShapeError::malformed("response has no rows array"));
        }

        serde_json::from_value(value.clone())
            .map_err(|e| ShapeError::malformed(format!("unreadable response: {e}")))
    }

    /// Create a QueryResult from CSV. Columns listed in `measure_columns` become
    /// measures; every other column is a dimension.
    pub fn from_csv<R: Read>(reader: R, measure_columns: &[String]) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| ShapeError::malformed(format!("failed to read CSV headers: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        for m in measure_columns {
            if !headers.iter().any(|h| h == m) {
                return Err(ShapeError::unknown_field(m.clone()));
            }
        }

        let is_measure: Vec<bool> = headers
            .iter()
            .map(|h| measure_columns.iter().any(|m| m == h))
            .collect();

        let mut fields = Fields::default();
        for (header, measure) in headers.iter().zip(&is_measure) {
            let field = FieldDescriptor::new(header.clone(), header.clone());
            if *measure {
                fields.measures.push(field);
            } else {
                fields.dimensions.push(field);
            }
        }

        let mut rows = Vec::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record
                .map_err(|e| ShapeError::malformed(format!("bad CSV record {}: {e}", line + 1)))?;

            let mut row = Row::new();
            for ((header, measure), raw) in headers.iter().zip(&is_measure).zip(record.iter()) {
                let value = if raw.is_empty() {
                    CellValue::Null
                } else if *measure {
                    let n = raw
                        .parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite())
                        .ok_or_else(|| {
                            ShapeError::malformed(format!(
                                "measure '{header}' has non-numeric value '{raw}' on record {}",
                                line + 1
                            ))
                        })?;
                    CellValue::Number(n)
                } else {
                    CellValue::Text(raw.to_string())
                };
                row.insert(header.clone(), Cell::new(value));
            }
            rows.push(row);
        }

        Ok(Self::new(fields, rows))
    }
}
