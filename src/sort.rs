use crate::ir::{ChartData, ShapedResult, SortDirection};

/// Reorder chart labels by their cross-series total.
///
/// The total of a label is the sum of every series' value at that label.
/// The sort is stable and carries each label's original index, so every
/// series keeps its `(label, value)` pairing even when totals tie or a
/// series repeats a value. Non-chart results are returned unchanged.
pub fn sort_by_total(shaped: &ShapedResult, direction: SortDirection) -> ShapedResult {
    match shaped {
        ShapedResult::Chart { view, data } => ShapedResult::Chart {
            view: *view,
            data: sort_chart_by_total(data, direction),
        },
        other => other.clone(),
    }
}

pub fn sort_chart_by_total(chart: &ChartData, direction: SortDirection) -> ChartData {
    let totals = label_totals(chart);

    let mut order: Vec<usize> = (0..chart.labels.len()).collect();
    order.sort_by(|&a, &b| {
        let ord = totals[a].total_cmp(&totals[b]);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    tracing::debug!(?direction, labels = order.len(), "sorted chart by total");

    ChartData {
        labels: order.iter().map(|&i| chart.labels[i].clone()).collect(),
        series: chart
            .series
            .iter()
            .map(|s| {
                let mut sorted = s.clone();
                // Short series read as absent zeros past their end.
                sorted.values = order.iter().map(|&i| s.values.get(i).copied().unwrap_or(0.0)).collect();
                sorted.present = order.iter().map(|&i| s.present.get(i).copied().unwrap_or(false)).collect();
                sorted
            })
            .collect(),
    }
}

/// Sum across all series at each label index.
pub fn label_totals(chart: &ChartData) -> Vec<f64> {
    (0..chart.labels.len())
        .map(|i| {
            chart
                .series
                .iter()
                .map(|s| s.values.get(i).copied().unwrap_or(0.0))
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Series, ViewType};
    use pretty_assertions::assert_eq;

    fn series(key: &str, values: &[f64]) -> Series {
        Series {
            key: key.to_string(),
            values: values.to_vec(),
            axis_id: "y0".to_string(),
            present: vec![true; values.len()],
        }
    }

    fn chart(labels: &[&str], series: Vec<Series>) -> ChartData {
        ChartData {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            series,
        }
    }

    #[test]
    fn test_sort_ascending_and_descending() {
        let data = chart(
            &["a", "b", "c"],
            vec![series("s1", &[10.0, 5.0, 15.0]), series("s2", &[20.0, 5.0, 5.0])],
        );
        // totals: a=30 b=10 c=20
        let asc = sort_chart_by_total(&data, SortDirection::Asc);
        assert_eq!(asc.labels, vec!["b", "c", "a"]);
        assert_eq!(asc.series[0].values, vec![5.0, 15.0, 10.0]);
        assert_eq!(asc.series[1].values, vec![5.0, 5.0, 20.0]);

        let desc = sort_chart_by_total(&data, SortDirection::Desc);
        assert_eq!(desc.labels, vec!["a", "c", "b"]);
        assert_eq!(desc.series[0].values, vec![10.0, 15.0, 5.0]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let data = chart(
            &["a", "b", "c", "d"],
            vec![series("s1", &[3.0, 1.0, 3.0, 2.0])],
        );
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let once = sort_chart_by_total(&data, direction);
            let twice = sort_chart_by_total(&once, direction);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_ties_and_duplicate_values_keep_pairing() {
        // a and c tie on total; s2 repeats the value 7 at different labels.
        let data = chart(
            &["a", "b", "c"],
            vec![series("s1", &[1.0, 0.0, 2.0]), series("s2", &[7.0, 9.0, 6.0])],
        );
        let sorted = sort_chart_by_total(&data, SortDirection::Desc);
        assert_eq!(sorted.labels, vec!["b", "a", "c"]);
        assert_eq!(sorted.series[0].values, vec![0.0, 1.0, 2.0]);
        assert_eq!(sorted.series[1].values, vec![9.0, 7.0, 6.0]);
    }

    #[test]
    fn test_present_mask_follows_values() {
        let mut s = series("s1", &[0.0, 4.0]);
        s.present = vec![false, true];
        let sorted = sort_chart_by_total(&chart(&["x", "y"], vec![s]), SortDirection::Desc);
        assert_eq!(sorted.labels, vec!["y", "x"]);
        assert_eq!(sorted.series[0].present, vec![true, false]);
    }

    #[test]
    fn test_non_chart_unchanged() {
        let summary = ShapedResult::Summary { text: "[]".to_string() };
        assert_eq!(sort_by_total(&summary, SortDirection::Asc), summary);

        let shaped = ShapedResult::Chart {
            view: ViewType::Line,
            data: chart(&["a", "b"], vec![series("s", &[2.0, 1.0])]),
        };
        match sort_by_total(&shaped, SortDirection::Asc) {
            ShapedResult::Chart { view, data } => {
                assert_eq!(view, ViewType::Line);
                assert_eq!(data.labels, vec!["b", "a"]);
            }
            other => panic!("expected chart, got {}", other.kind()),
        }
    }

    #[test]
    fn test_short_series_does_not_panic() {
        let mut short = series("s2", &[1.0]);
        short.present = vec![];
        let data = chart(&["a", "b"], vec![series("s1", &[1.0, 5.0]), short]);
        let sorted = sort_chart_by_total(&data, SortDirection::Desc);
        assert_eq!(sorted.labels, vec!["b", "a"]);
        assert_eq!(sorted.series[1].values, vec![0.0, 1.0]);
        assert_eq!(sorted.series[1].present, vec![false, false]);
    }
}
