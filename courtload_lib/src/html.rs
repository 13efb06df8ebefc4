//! Locating data tables in reference-site HTML.
//!
//! Many tables on the scrape source ship inside HTML comments and are only
//! swapped into the page by script, so a table is looked up in the live DOM
//! first and then in every comment that contains markup for one.

use scraper::{ElementRef, Html};
use serde_json::Value;

use crate::table::RawTable;

/// Finds a table by `id` (or the first table when `id` is `None`) and reads
/// it into a [`RawTable`] with the page's own header labels.
///
/// Header labels come from the last header row, so grouping rows above it
/// are ignored. Header rows repeated inside the body are skipped.
pub fn locate_table(html: &str, dataset: &str, id: Option<&str>) -> Option<RawTable> {
    let document = Html::parse_document(html);
    if let Some(table) = find_table(document.root_element(), id) {
        return Some(read_table(table, dataset));
    }

    for node in document.tree.nodes() {
        let Some(comment) = node.value().as_comment() else {
            continue;
        };
        let text: &str = comment;
        if !text.contains("<table") {
            continue;
        }
        let fragment = Html::parse_fragment(text);
        if let Some(table) = find_table(fragment.root_element(), id) {
            tracing::debug!("table {:?} found inside a comment", id.unwrap_or("<first>"));
            return Some(read_table(table, dataset));
        }
    }
    None
}

fn find_table<'a>(root: ElementRef<'a>, id: Option<&str>) -> Option<ElementRef<'a>> {
    elements(root, "table").find(|t| match id {
        Some(id) => t.value().id() == Some(id),
        None => true,
    })
}

fn elements<'a>(root: ElementRef<'a>, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(move |e| e.value().name() == tag)
}

fn children<'a>(parent: ElementRef<'a>, tags: &'a [&'a str]) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |e| tags.contains(&e.value().name()))
}

fn has_class(row: ElementRef<'_>, class: &str) -> bool {
    row.value().classes().any(|c| c == class)
}

fn read_table(table: ElementRef<'_>, dataset: &str) -> RawTable {
    let header_rows: Vec<ElementRef<'_>> = children(table, &["thead"])
        .flat_map(|thead| children(thead, &["tr"]))
        .collect();
    let mut body_rows: Vec<ElementRef<'_>> = children(table, &["tbody"])
        .flat_map(|tbody| children(tbody, &["tr"]))
        .collect();
    // Tables without tbody put their rows directly under the table element.
    body_rows.extend(children(table, &["tr"]));

    let columns: Vec<String> = match header_rows.last() {
        Some(row) => cells(*row).into_iter().map(|c| c.text).collect(),
        None if !body_rows.is_empty() => {
            let first = body_rows.remove(0);
            cells(first).into_iter().map(|c| c.text).collect()
        }
        None => Vec::new(),
    };
    if columns.is_empty() {
        return RawTable::empty(dataset);
    }

    let width = columns.len();
    let rows = body_rows
        .into_iter()
        .filter(|row| !has_class(*row, "thead") && !has_class(*row, "over_header"))
        .filter_map(|row| {
            let mut values: Vec<Value> = cells(row).into_iter().map(|c| parse_cell(&c.text)).collect();
            if values.iter().all(Value::is_null) {
                return None;
            }
            values.resize(width, Value::Null);
            Some(values)
        })
        .collect();

    RawTable::new(dataset, columns, rows)
}

struct Cell {
    text: String,
}

/// Reads `th`/`td` cells in order; a `colspan` cell is followed by empty
/// cells so positions stay aligned with the header.
fn cells(row: ElementRef<'_>) -> Vec<Cell> {
    let mut out = Vec::new();
    for cell in children(row, &["th", "td"]) {
        let text = cell.text().collect::<String>().trim().to_string();
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        out.push(Cell { text });
        for _ in 1..span {
            out.push(Cell { text: String::new() });
        }
    }
    out
}

/// Empty cells become null; integers (with or without thousands
/// separators) and decimals become numbers; anything else stays text.
pub fn parse_cell(text: &str) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return Value::Null;
    }
    let plain = strip_thousands(text);
    let candidate = plain.as_deref().unwrap_or(text);
    if let Ok(n) = candidate.parse::<i64>() {
        return Value::from(n);
    }
    if looks_decimal(candidate) {
        if let Ok(f) = candidate.parse::<f64>() {
            if f.is_finite() {
                return Value::from(f);
            }
        }
    }
    Value::String(text.to_string())
}

/// `18,064` to `18064`. `None` unless every group after the first has
/// exactly three digits.
fn strip_thousands(text: &str) -> Option<String> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut groups = digits.split(',');
    let first = groups.next()?;
    let rest: Vec<&str> = groups.collect();
    if rest.is_empty() || first.is_empty() || first.len() > 3 {
        return None;
    }
    let all_digits = |g: &str| g.chars().all(|c| c.is_ascii_digit());
    if !all_digits(first) || !rest.iter().all(|g| g.len() == 3 && all_digits(g)) {
        return None;
    }
    Some(text.replace(',', ""))
}

/// Digits with at most one point and an optional sign; rejects `inf`, `NaN`
/// and exponents, which `f64::from_str` would otherwise accept.
fn looks_decimal(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    let mut points = 0;
    let mut digits = 0;
    for c in body.chars() {
        match c {
            '.' => points += 1,
            c if c.is_ascii_digit() => digits += 1,
            _ => return false,
        }
    }
    points <= 1 && digits > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = r#"
<html><body>
<table id="roster">
  <thead><tr><th>No.</th><th>Player</th><th>Pos</th><th>Wt</th></tr></thead>
  <tbody>
    <tr><th>23</th><td><a href="/p/j">LeBron James</a></td><td>F</td><td>250</td></tr>
    <tr><th>3</th><td>Anthony Davis</td><td>C</td><td></td></tr>
  </tbody>
</table>
<div id="all_totals">
<!--
<table id="totals_stats">
  <thead>
    <tr class="over_header"><th colspan="2"></th><th>Shooting</th></tr>
    <tr><th>Rk</th><th>Player</th><th>FG%</th></tr>
  </thead>
  <tbody>
    <tr><th>1</th><td>Precious Achiuwa</td><td>.456</td></tr>
    <tr class="thead"><th>Rk</th><th>Player</th><th>FG%</th></tr>
    <tr><th>2</th><td>Bam Adebayo</td><td>.521</td></tr>
  </tbody>
</table>
-->
</div>
</body></html>"#;

    #[test]
    fn finds_table_in_dom() {
        let table = locate_table(PAGE, "roster", Some("roster")).unwrap();
        assert_eq!(table.columns, vec!["No.", "Player", "Pos", "Wt"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec![json!(23), json!("LeBron James"), json!("F"), json!(250)]);
        assert_eq!(table.rows[1][3], Value::Null);
    }

    #[test]
    fn finds_table_inside_comment() {
        let table = locate_table(PAGE, "totals", Some("totals_stats")).unwrap();
        assert_eq!(table.columns, vec!["Rk", "Player", "FG%"]);
        assert_eq!(table.len(), 2, "repeated header row skipped");
        assert_eq!(table.rows[1], vec![json!(2), json!("Bam Adebayo"), json!(0.521)]);
    }

    #[test]
    fn missing_table_is_none() {
        assert!(locate_table(PAGE, "x", Some("schedule")).is_none());
        assert!(locate_table("<html></html>", "x", None).is_none());
    }

    #[test]
    fn first_table_without_id() {
        let table = locate_table(PAGE, "x", None).unwrap();
        assert_eq!(table.columns[1], "Player");
    }

    #[test]
    fn headerless_table_uses_first_row() {
        let html = "<table><tr><td>a</td><td>b</td></tr><tr><td>1</td><td>x</td></tr></table>";
        let table = locate_table(html, "t", None).unwrap();
        assert_eq!(table.columns, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec![json!(1), json!("x")]]);
    }

    #[test]
    fn cell_parsing() {
        assert_eq!(parse_cell("18,064"), json!(18064));
        assert_eq!(parse_cell("-7"), json!(-7));
        assert_eq!(parse_cell(".500"), json!(0.5));
        assert_eq!(parse_cell("1,23"), json!("1,23"));
        assert_eq!(parse_cell("inf"), json!("inf"));
        assert_eq!(parse_cell("Tue, Oct 22, 2024"), json!("Tue, Oct 22, 2024"));
        assert_eq!(parse_cell("  "), Value::Null);
    }
}
