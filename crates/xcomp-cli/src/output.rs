use serde_json::Value;

use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::error::CliError;

pub fn render(result: &CommandResult, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => println!("{}", to_json(&result.data, pretty)?),
        OutputFormat::Table => {
            for line in &result.lines {
                println!("{line}");
            }
        }
    }

    Ok(())
}

fn to_json(data: &Value, pretty: bool) -> Result<String, CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(data)?
    } else {
        serde_json::to_string(data)?
    };
    Ok(payload)
}

/// Lay out `rows` under `headers` in left-aligned, space-separated columns.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths = headers.iter().map(|header| header.len()).collect::<Vec<_>>();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format_row(headers.iter().copied(), &widths));
    for row in rows {
        lines.push(format_row(row.iter().map(String::as_str), &widths));
    }
    lines
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Confidence bucket for a sample size.
pub const fn confidence_label(games: Option<u64>) -> &'static str {
    match games {
        None => "UNK",
        Some(games) if games >= 80 => "HIGH",
        Some(games) if games >= 40 => "MED",
        Some(_) => "LOW",
    }
}

pub fn format_close(close: f64) -> String {
    format!("{close:.2}")
}

pub fn format_games(games: Option<u64>) -> String {
    games.map_or_else(|| String::from("-"), |games| games.to_string())
}
