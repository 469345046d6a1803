//! Output formatting helpers for the `mvt` CLI.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

/// Print a value as pretty-printed JSON to stdout.
pub fn output_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    // Ignore broken pipe errors (e.g., piped to `head`)
    let _ = writeln!(handle, "{json}");
    Ok(())
}

/// Print a simple table with headers and rows.
///
/// Column widths are computed from the data for alignment.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = handle.write_all(render_table(headers, rows).as_bytes());
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(|h| (*h).to_owned()).collect();
    push_row(&mut out, &header, &widths);
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &separator, &widths);
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, row: &[String], widths: &[usize]) {
    let cells: Vec<String> = row
        .iter()
        .enumerate()
        .map(|(i, cell)| match widths.get(i) {
            Some(&width) if i + 1 < row.len() => format!("{cell:<width$}"),
            _ => cell.clone(),
        })
        .collect();
    out.push_str(&cells.join("  "));
    out.push('\n');
}

/// Render a serialized record as aligned `field: value` lines, skipping
/// empty fields. Nested objects are shown by their name, title or key.
pub fn format_fields(value: &Value) -> String {
    let Value::Object(fields) = value else {
        return value.to_string();
    };
    let mut entries = Vec::new();
    for (name, field) in fields {
        let text = match field {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Object(nested) => ["key", "name", "title", "summary"]
                .iter()
                .find_map(|k| nested.get(*k).and_then(Value::as_str))
                .map(str::to_owned)
                .unwrap_or_else(|| field.to_string()),
            other => other.to_string(),
        };
        entries.push((format!("{name}:"), text));
    }
    let width = entries.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    entries
        .iter()
        .map(|(label, text)| format!("{label:<width$} {text}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn table_aligns_columns() {
        let rows = vec![
            vec!["1".to_owned(), "Backups".to_owned()],
            vec!["12".to_owned(), "TLS".to_owned()],
        ];
        insta::assert_snapshot!(render_table(&["ID", "SUMMARY"], &rows), @r"
        ID  SUMMARY
        --  -------
        1   Backups
        12  TLS
        ");
    }

    #[test]
    fn fields_skip_nulls_and_name_nested_objects() {
        let value = serde_json::json!({
            "id": 3,
            "summary": "TLS",
            "description": null,
            "jira_issue": {"key": "ACME-1", "summary": "Roll out TLS"},
        });
        assert_eq!(
            format_fields(&value),
            "id:         3\nsummary:    TLS\njira_issue: ACME-1"
        );
    }
}
