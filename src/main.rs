use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::debug;

use resultshaper::graph::render_chart;
use resultshaper::parser::parse_request_spec;
use resultshaper::resolve::{resolve_labels, resolve_request};
use resultshaper::table::render_text;
use resultshaper::{logging, shape, OutputFormat, QueryResult, ShapedResult, ShaperConfig};

#[derive(Parser, Debug)]
#[command(name = "resultshaper")]
#[command(about = "Shape tabular query results into tables, pivot tables and charts", long_about = None)]
struct Args {
    /// Request DSL string (e.g., 'bar(x: orders.region, pivot: orders.quarter) | sort(desc)')
    request: String,

    /// Read the query result from this file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Input is CSV rather than a JSON query result
    #[arg(long)]
    csv: bool,

    /// CSV column to treat as a measure (repeatable)
    #[arg(long = "measure", requires = "csv")]
    measures: Vec<String>,

    #[arg(short, long, value_enum, default_value_t = Output::Json)]
    output: Output,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Json,
    Text,
    Png,
    Svg,
}

fn main() -> Result<()> {
    logging::init_stderr_logging();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ShaperConfig::load_from_file(path)?,
        None => ShaperConfig::default(),
    };
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }

    let raw = read_input(args.input.as_ref()).context("Failed to read input")?;
    config.render.validate().context("Invalid render size")?;
    let result = if args.csv {
        QueryResult::from_csv(raw.as_slice(), &args.measures).context("Failed to load CSV")?
    } else {
        let value: serde_json::Value =
            serde_json::from_slice(&raw).context("Input is not valid JSON")?;
        QueryResult::from_json(&value).context("Failed to load query result")?
    };
    debug!(rows = result.rows.len(), "loaded result");

    // Parse the request DSL
    let (_, spec) = parse_request_spec(&args.request)
        .map_err(|e| anyhow::anyhow!("Parse error: {e}"))?;

    let request = resolve_request(&spec, &result).context("Failed to resolve request")?;
    let shaped = shape(&result, &request).context("Failed to shape result")?;

    let bytes = match args.output {
        Output::Json => serde_json::to_vec_pretty(&shaped).context("Failed to serialize result")?,
        Output::Text => render_text(&shaped, &config.number_format).into_bytes(),
        Output::Png | Output::Svg => {
            let ShapedResult::Chart { view, data } = &shaped else {
                anyhow::bail!(
                    "A {} result cannot be rendered as an image; use --output json or text",
                    shaped.kind()
                );
            };
            config.render.format = if args.output == Output::Png {
                OutputFormat::Png
            } else {
                OutputFormat::Svg
            };
            let labels = resolve_labels(&spec, &request, &result);
            render_chart(data, *view, &config.render, &labels).context("Failed to render chart")?
        }
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(&bytes).context("Failed to write output to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    match path {
        Some(path) => {
            File::open(path)
                .with_context(|| format!("Cannot open {}", path.display()))?
                .read_to_end(&mut raw)?;
        }
        None => {
            io::stdin().read_to_end(&mut raw)?;
        }
    }
    Ok(raw)
}
