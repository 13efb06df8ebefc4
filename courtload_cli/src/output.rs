use serde::Serialize;
use courtload_lib::{ExportedFile, RunReport, TableStats};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Self {
        match name {
            "json" => OutputFormat::Json,
            "markdown" | "md" => OutputFormat::Markdown,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct DatasetRow {
    #[tabled(rename = "Season")]
    #[serde(rename = "Season")]
    season: String,
    #[tabled(rename = "Dataset")]
    #[serde(rename = "Dataset")]
    dataset: String,
    #[tabled(rename = "Rows")]
    #[serde(rename = "Rows")]
    rows: usize,
}

#[derive(Tabled, Serialize)]
struct RequestRow {
    #[tabled(rename = "Season")]
    #[serde(rename = "Season")]
    season: String,
    #[tabled(rename = "Requests")]
    #[serde(rename = "Requests")]
    made: u64,
    #[tabled(rename = "Retried")]
    #[serde(rename = "Retried")]
    retried: u64,
    #[tabled(rename = "Failed")]
    #[serde(rename = "Failed")]
    failed: u64,
    #[tabled(rename = "Backoff (s)")]
    #[serde(rename = "Backoff")]
    backoff: String,
}

#[derive(Tabled, Serialize)]
struct StatsRow {
    #[tabled(rename = "Table")]
    #[serde(rename = "Table")]
    table: String,
    #[tabled(rename = "Rows")]
    #[serde(rename = "Rows")]
    rows: i64,
    #[tabled(rename = "Seasons")]
    #[serde(rename = "Seasons")]
    seasons: String,
}

#[derive(Tabled, Serialize)]
struct ExportRow {
    #[tabled(rename = "Table")]
    #[serde(rename = "Table")]
    table: String,
    #[tabled(rename = "Rows")]
    #[serde(rename = "Rows")]
    rows: usize,
    #[tabled(rename = "File")]
    #[serde(rename = "File")]
    path: String,
}

fn build_dataset_rows(report: &RunReport) -> Vec<DatasetRow> {
    report
        .seasons
        .iter()
        .flat_map(|s| {
            s.tables.iter().map(move |(dataset, rows)| DatasetRow {
                season: s.context.to_string(),
                dataset: dataset.clone(),
                rows: *rows,
            })
        })
        .collect()
}

fn build_request_rows(report: &RunReport) -> Vec<RequestRow> {
    report
        .seasons
        .iter()
        .filter_map(|s| {
            s.requests.as_ref().map(|r| RequestRow {
                season: s.context.to_string(),
                made: r.requests_made,
                retried: r.requests_retried,
                failed: r.requests_failed,
                backoff: format!("{:.1}", r.total_backoff_secs),
            })
        })
        .collect()
}

fn build_stats_rows(stats: &[TableStats]) -> Vec<StatsRow> {
    stats
        .iter()
        .map(|s| StatsRow {
            table: s.table.clone(),
            rows: s.rows,
            seasons: format_seasons(&s.seasons),
        })
        .collect()
}

fn build_export_rows(files: &[ExportedFile]) -> Vec<ExportRow> {
    files
        .iter()
        .map(|f| ExportRow {
            table: f.table.clone(),
            rows: f.rows,
            path: f.path.display().to_string(),
        })
        .collect()
}

/// `2025:1230, 2026:615`; `-` when the table has no season column.
fn format_seasons(seasons: &[(String, i64)]) -> String {
    if seasons.is_empty() {
        return "-".to_string();
    }
    seasons
        .iter()
        .map(|(season, rows)| format!("{}:{}", season, rows))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_rows<T: Tabled>(rows: Vec<T>, format: &OutputFormat) {
    let mut table = Table::new(rows);
    if matches!(format, OutputFormat::Markdown) {
        table.with(Style::markdown());
    }
    println!("{}", table);
}

pub fn print_run_report(report: &RunReport, format: &OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "datasets": build_dataset_rows(report),
            "requests": build_request_rows(report),
            "exported": build_export_rows(&report.exported),
        })),
        _ => {
            print_rows(build_dataset_rows(report), format);
            let requests = build_request_rows(report);
            if !requests.is_empty() {
                print_rows(requests, format);
            }
            if !report.exported.is_empty() {
                print_rows(build_export_rows(&report.exported), format);
            }
        }
    }
}

pub fn print_table_stats(stats: &[TableStats], format: &OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&build_stats_rows(stats)),
        _ => print_rows(build_stats_rows(stats), format),
    }
}

pub fn print_exported(files: &[ExportedFile], format: &OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&build_export_rows(files)),
        _ => print_rows(build_export_rows(files), format),
    }
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
