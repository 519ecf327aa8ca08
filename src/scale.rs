use crate::ir::{ChartData, Series};

/// One axis domain. Categorical scales place label `i` at `i`, with half a
/// slot of room either side.
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    pub domain: (f64, f64),
    pub is_categorical: bool,
    pub categories: Vec<String>,
}

/// Scales for a chart: categories along x, the first axis id on the left,
/// every other axis id sharing the right.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartScales {
    pub x: Scale,
    pub primary_axis: String,
    pub left: Scale,
    pub right: Option<Scale>,
}

impl ChartScales {
    pub fn is_secondary(&self, series: &Series) -> bool {
        series.axis_id != self.primary_axis
    }
}

/// Build the scale system for a chart.
pub fn build_axes(data: &ChartData) -> ChartScales {
    let n = data.labels.len() as f64;
    let x = Scale {
        domain: (-0.5, n.max(1.0) - 0.5),
        is_categorical: true,
        categories: data.labels.clone(),
    };

    let primary_axis = data
        .axis_ids()
        .first()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "y0".to_string());

    let (left, right): (Vec<&Series>, Vec<&Series>) =
        data.series.iter().partition(|s| s.axis_id == primary_axis);

    ChartScales {
        x,
        left: value_scale(&left),
        right: if right.is_empty() { None } else { Some(value_scale(&right)) },
        primary_axis,
    }
}

fn value_scale(series: &[&Series]) -> Scale {
    let mm = series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .filter(|v| v.is_finite())
        .fold(MinMax::default(), MinMax::include);

    let domain = if mm.is_empty() {
        (0.0, 1.0)
    } else {
        // Bars grow from zero, so zero is always on the axis.
        pad_range(mm.min.min(0.0), mm.max.max(0.0))
    };

    Scale {
        domain,
        is_categorical: false,
        categories: Vec::new(),
    }
}

#[derive(Debug, Clone, Copy)]
struct MinMax {
    min: f64,
    max: f64,
}

impl Default for MinMax {
    fn default() -> Self {
        Self { min: f64::INFINITY, max: f64::NEG_INFINITY }
    }
}

impl MinMax {
    fn include(self, v: f64) -> Self {
        Self { min: self.min.min(v), max: self.max.max(v) }
    }

    fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(key: &str, axis: &str, values: Vec<f64>) -> Series {
        let present = vec![true; values.len()];
        Series {
            key: key.to_string(),
            values,
            axis_id: axis.to_string(),
            present,
        }
    }

    fn chart(series: Vec<Series>) -> ChartData {
        ChartData {
            labels: vec!["a".to_string(), "b".to_string()],
            series,
        }
    }

    #[test]
    fn test_scale_includes_zero_and_pads() {
        let scales = build_axes(&chart(vec![series("s", "y0", vec![10.0, 110.0])]));
        let (lo, hi) = scales.left.domain;
        assert!((lo + 5.5).abs() < 1e-9);
        assert!((hi - 115.5).abs() < 1e-9);
        assert!(scales.right.is_none());
    }

    #[test]
    fn test_scale_categorical() {
        let scales = build_axes(&chart(vec![series("s", "y0", vec![1.0, 2.0])]));
        assert!(scales.x.is_categorical);
        assert_eq!(scales.x.categories, vec!["a", "b"]);
        assert_eq!(scales.x.domain, (-0.5, 1.5));
    }

    #[test]
    fn test_scale_all_zero() {
        let scales = build_axes(&chart(vec![series("s", "y0", vec![0.0, 0.0])]));
        assert_eq!(scales.left.domain, (-1.0, 1.0));
    }

    #[test]
    fn test_secondary_axes_share_right() {
        let data = chart(vec![
            series("sales", "y0", vec![100.0, 200.0]),
            series("margin", "y1", vec![-0.5, 0.25]),
            series("units", "y2", vec![1.0, 3.0]),
        ]);
        let scales = build_axes(&data);
        assert_eq!(scales.primary_axis, "y0");
        assert!(!scales.is_secondary(&data.series[0]));
        assert!(scales.is_secondary(&data.series[2]));

        let right = scales.right.unwrap();
        assert!(right.domain.0 < -0.5);
        assert!(right.domain.1 > 3.0);
        assert!(scales.left.domain.1 > 200.0);
    }

    #[test]
    fn test_empty_chart() {
        let scales = build_axes(&ChartData { labels: vec![], series: vec![] });
        assert_eq!(scales.left.domain, (0.0, 1.0));
        assert_eq!(scales.x.domain, (-0.5, 0.5));
    }
}
