use std::path::Path;

use chrono::Local;
use handlebars::Handlebars;
use serde_json::{Value, json};

use crate::{
    benchmark::{parser::BenchmarkRecord, stats::MedianTable},
    core::{
        error::{Result, SnakeErrorKind},
        output::{ResultWriter, WriteData, ensure_parent_dir},
        utils::format_metric,
    },
};

const TEMPLATE_NAME: &str = "report";

const TPL_STR: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{title}}</title>
    <script src="https://cdn.jsdelivr.net/npm/echarts@5/dist/echarts.min.js"></script>
    <style>
        body { font-family: "Arial", sans-serif; line-height: 1.6; color: #333; background-color: #fdfdfd; margin: 40px; padding: 0;}
        h1 { font-size: 2em; font-weight: bold; color: #003366; border-bottom: 3px solid #003366; padding-bottom: 5px; margin-top: 30px;}
        table { width: 100%; border-collapse: collapse; margin: 20px 0; font-size: 1em; text-align: left; border: 1px solid #ddd; background-color: #fff;}
        th,td { padding: 10px; border: 1px solid #ccc;}
        th { background-color: #e6f0ff; color: #003366; font-weight: bold;}
        tr:nth-child(even) {background-color: #f9f9f9;}
    </style>
</head>
<body>
    <h1>{{title}}</h1>
    <p>{{record_count}} benchmark files from {{rule_count}} rules, generated on {{date}}. Pan and zoom on the graph to make busy areas more readable.</p>
    <div id="chart" style="width: {{chart_width}}px; height: {{chart_height}}px;"></div>
    <script>
        echarts.init(document.getElementById("chart")).setOption({{{chart_options}}});
    </script>
    <h1>Median values for each rule</h1>
    <p>See <a href="https://stackoverflow.com/a/66872577">stackoverflow</a> for the meaning of each column.</p>
    <table>
        <thead><tr>{{#each columns}}<th>{{this}}</th>{{/each}}</tr></thead>
        <tbody>
        {{#each rows}}
            <tr>{{#each this}}<td>{{this}}</td>{{/each}}</tr>
        {{/each}}
        </tbody>
    </table>
</body>
</html>
"#;

#[derive(Debug, Default)]
pub struct ReportWriter {}

impl ReportWriter {
    pub fn new() -> Self {
        Self {}
    }
}

impl ResultWriter for ReportWriter {
    fn write(&self, data: &WriteData, path: &Path) -> Result<()> {
        match data {
            WriteData::Report {
                records,
                medians,
                chart,
                chart_size,
                template_path,
            } => write_report(records, medians, chart, *chart_size, *template_path, path),
            _ => Err(SnakeErrorKind::UnsupportedWriteData { writer: "report" }.into()),
        }
    }
}

/// Render the HTML report to `path`
fn write_report(
    records: &[BenchmarkRecord],
    medians: &MedianTable,
    chart: &Value,
    (width, height): (u32, u32),
    template_path: Option<&Path>,
    path: &Path,
) -> Result<()> {
    let mut handlebars = Handlebars::new();
    match template_path {
        Some(template_path) => handlebars.register_template_file(TEMPLATE_NAME, template_path)?,
        None => handlebars.register_template_string(TEMPLATE_NAME, TPL_STR)?,
    }

    let rows: Vec<Vec<String>> = medians
        .rows
        .iter()
        .map(|row| {
            std::iter::once(row.rule.clone())
                .chain(row.values.iter().map(|value| format_metric(*value)))
                .collect()
        })
        .collect();

    // Keep the options from closing the surrounding <script> tag
    let chart_options = serde_json::to_string(chart)?.replace("</", "<\\/");

    let data = json!({
        "title": "Benchmarks for a snakemake pipeline",
        "date": Local::now().date_naive().to_string(),
        "record_count": records.len(),
        "rule_count": medians.rows.len(),
        "chart_options": chart_options,
        "chart_width": width,
        "chart_height": height,
        "columns": medians.header(),
        "rows": rows,
    });

    let rendered = handlebars.render(TEMPLATE_NAME, &data)?;

    ensure_parent_dir(path)?;
    std::fs::write(path, rendered)?;

    tracing::info!("Report written to {}", path.display());
    Ok(())
}
