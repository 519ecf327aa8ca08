use serde::{Deserialize, Serialize};

use crate::data::{FieldDescriptor, QueryResult, Row};

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    Table,
    #[default]
    Bar,
    Line,
}

impl ViewType {
    pub fn is_chart(self) -> bool {
        matches!(self, ViewType::Bar | ViewType::Line)
    }
}

/// What the user currently wants to see. Rebuilt on every control change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRequest {
    pub primary_dimension: String,
    #[serde(default)]
    pub pivot_dimension: Option<String>,
    /// Empty means every measure of the result.
    #[serde(default)]
    pub measures: Vec<FieldDescriptor>,
    /// `None` keeps first-seen label order.
    #[serde(default)]
    pub sort_direction: Option<SortDirection>,
    #[serde(default)]
    pub view_type: ViewType,
}

impl ShapeRequest {
    pub fn new(primary_dimension: impl Into<String>) -> Self {
        Self {
            primary_dimension: primary_dimension.into(),
            pivot_dimension: None,
            measures: Vec::new(),
            sort_direction: None,
            view_type: ViewType::default(),
        }
    }

    /// The view first shown for a fresh result: first dimension, all
    /// measures, no pivot, unsorted bar chart.
    pub fn default_for(result: &QueryResult) -> Self {
        let primary = result
            .fields()
            .dimensions
            .first()
            .map(|d| d.name.clone())
            .unwrap_or_default();
        Self::new(primary)
    }

    pub fn with_pivot(mut self, pivot: impl Into<String>) -> Self {
        self.pivot_dimension = Some(pivot.into());
        self
    }

    pub fn with_measures(mut self, measures: Vec<FieldDescriptor>) -> Self {
        self.measures = measures;
        self
    }

    pub fn with_sort(mut self, direction: SortDirection) -> Self {
        self.sort_direction = Some(direction);
        self
    }

    pub fn with_view(mut self, view_type: ViewType) -> Self {
        self.view_type = view_type;
        self
    }
}

// =============================================================================
// Classification
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    /// No dimensions: nothing to chart, ask for a text summary.
    MeasuresOnly,
    /// No measures: flat table of raw rows.
    DimensionsOnly,
    Mixed,
}

// =============================================================================
// Shaped output
// =============================================================================

/// One chart dataset. `values[i]` belongs to `labels[i]` of the owning chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub key: String,
    pub values: Vec<f64>,
    pub axis_id: String,
    /// `false` where no row fed the bucket and the value was zero-filled.
    pub present: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartData {
    /// Distinct axis ids in order of first use.
    pub fn axis_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for s in &self.series {
            if !ids.contains(&s.axis_id.as_str()) {
                ids.push(&s.axis_id);
            }
        }
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    /// Dimension columns first, then measure columns.
    pub columns: Vec<FieldDescriptor>,
    pub dimension_count: usize,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatCell {
    pub value: f64,
    pub present: bool,
    /// Linear position of `value` between the grid's min and max, in `[0, 1]`.
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotColumn {
    pub pivot_value: String,
    pub measure: FieldDescriptor,
}

impl PivotColumn {
    pub fn header(&self) -> String {
        format!("{} - {}", self.pivot_value, self.measure.display_label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRow {
    pub label: String,
    pub cells: Vec<HeatCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    pub primary: FieldDescriptor,
    pub columns: Vec<PivotColumn>,
    pub rows: Vec<PivotRow>,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShapedResult {
    Table(TableView),
    PivotTable(PivotTable),
    Chart {
        view: ViewType,
        #[serde(flatten)]
        data: ChartData,
    },
    /// Measures-only results: the rows as pretty JSON, for a text summary.
    Summary { text: String },
}

impl ShapedResult {
    pub fn as_chart(&self) -> Option<&ChartData> {
        match self {
            ShapedResult::Chart { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ShapedResult::Table(_) => "table",
            ShapedResult::PivotTable(_) => "pivotTable",
            ShapedResult::Chart { .. } => "chart",
            ShapedResult::Summary { .. } => "summary",
        }
    }
}
