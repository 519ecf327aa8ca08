use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::config::{OutputFormat, RenderOptions};
use crate::ir::{ChartData, Series, ViewType};
use crate::parser::ast::Labels;
use crate::scale::{build_axes, ChartScales};

/// Series colours, reused in order when there are more series than entries.
pub const PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

/// Total width of one category's group of dodged bars.
const GROUP_WIDTH: f64 = 0.8;

pub fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Render chart data as PNG or SVG bytes.
pub fn render_chart(
    data: &ChartData,
    view: ViewType,
    options: &RenderOptions,
    labels: &Labels,
) -> Result<Vec<u8>> {
    if !view.is_chart() {
        anyhow::bail!("Cannot render a {:?} view as a chart", view);
    }
    if data.labels.is_empty() || data.series.is_empty() {
        anyhow::bail!("Cannot render a chart with no data");
    }

    options.validate()?;

    let scales = build_axes(data);
    let (width, height) = (options.width, options.height);

    match options.format {
        OutputFormat::Png => {
            let len = (width as usize)
                .checked_mul(height as usize)
                .and_then(|n| n.checked_mul(3))
                .context("Image size is too large")?;
            let mut buffer = vec![0u8; len];
            {
                let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
                draw(&root, data, view, &scales, labels)?;
            }

            let mut png_bytes = Vec::new();
            image::codecs::png::PngEncoder::new(&mut png_bytes)
                .write_image(&buffer, width, height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
            Ok(png_bytes)
        }
        OutputFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
                draw(&root, data, view, &scales, labels)?;
            }
            Ok(svg.into_bytes())
        }
    }
}

fn draw<DB>(
    root: &DrawingArea<DB, Shift>,
    data: &ChartData,
    view: ViewType,
    scales: &ChartScales,
    labels: &Labels,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    let (x_min, x_max) = scales.x.domain;
    let (y_min, y_max) = scales.left.domain;
    let (r_min, r_max) = scales.right.as_ref().map_or(scales.left.domain, |s| s.domain);

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(10)
        .caption(labels.title.as_deref().unwrap_or(""), ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(60);
    if scales.right.is_some() {
        builder.right_y_label_area_size(60);
    }
    let mut chart = builder
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .context("Failed to build chart")?
        .set_secondary_coord(x_min..x_max, r_min..r_max);

    let categories = &scales.x.categories;
    let category_label = |x: &f64| {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        categories.get(idx as usize).cloned().unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&category_label)
        .x_desc(labels.x.as_deref().unwrap_or(""))
        .y_desc(labels.y.as_deref().unwrap_or(""))
        .draw()
        .context("Failed to draw mesh")?;

    if scales.right.is_some() {
        let right_desc = data
            .series
            .iter()
            .filter(|s| scales.is_secondary(s))
            .map(|s| s.key.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        chart
            .configure_secondary_axes()
            .y_desc(right_desc)
            .draw()
            .context("Failed to draw secondary axis")?;
    }

    let count = data.series.len();
    for (idx, series) in data.series.iter().enumerate() {
        let color = series_color(idx);
        let legend = move |(x, y): (i32, i32)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled());
        let secondary = scales.is_secondary(series);

        match view {
            ViewType::Line => {
                let points = line_points(series);
                let line = LineSeries::new(points.clone(), color.stroke_width(2));
                let markers = present_markers(series, &points, color);
                if secondary {
                    chart
                        .draw_secondary_series(line)
                        .context("Failed to draw line series")?
                        .label(series.key.clone())
                        .legend(legend);
                    chart
                        .draw_secondary_series(markers)
                        .context("Failed to draw line markers")?;
                } else {
                    chart
                        .draw_series(line)
                        .context("Failed to draw line series")?
                        .label(series.key.clone())
                        .legend(legend);
                    chart.draw_series(markers).context("Failed to draw line markers")?;
                }
            }
            _ => {
                let bars = dodged_bars(series, idx, count, color);
                if secondary {
                    chart
                        .draw_secondary_series(bars)
                        .context("Failed to draw bar series")?
                        .label(series.key.clone())
                        .legend(legend);
                } else {
                    chart
                        .draw_series(bars)
                        .context("Failed to draw bar series")?
                        .label(series.key.clone())
                        .legend(legend);
                }
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .context("Failed to draw legend")?;

    root.present().context("Failed to present drawing")?;
    Ok(())
}

/// Centre of bar `series_idx` within a category's group of `series_count` bars.
pub fn dodge_offset(series_idx: usize, series_count: usize) -> f64 {
    let bar_width = GROUP_WIDTH / series_count.max(1) as f64;
    (series_idx as f64 - (series_count as f64 - 1.0) / 2.0) * bar_width
}

fn dodged_bars(
    series: &Series,
    series_idx: usize,
    series_count: usize,
    color: RGBColor,
) -> Vec<Rectangle<(f64, f64)>> {
    let bar_width = GROUP_WIDTH / series_count.max(1) as f64;
    let offset = dodge_offset(series_idx, series_count);
    series
        .values
        .iter()
        .enumerate()
        .map(|(cat_idx, &v)| {
            let x_center = cat_idx as f64 + offset;
            Rectangle::new(
                [(x_center - bar_width / 2.0, 0.0), (x_center + bar_width / 2.0, v)],
                color.filled(),
            )
        })
        .collect()
}

fn line_points(series: &Series) -> Vec<(f64, f64)> {
    series
        .values
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect()
}

fn present_markers(series: &Series, points: &[(f64, f64)], color: RGBColor) -> Vec<Circle<(f64, f64), i32>> {
    points
        .iter()
        .zip(&series.present)
        .filter(|(_, present)| **present)
        .map(|(&p, _)| Circle::new(p, 3, color.filled()))
        .collect()
}
