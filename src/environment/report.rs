// file: src/environment/report.rs
// version: 1.0.0
// guid: 28572c72-98f3-4386-879e-dc1f82c4f642

//! Status table accumulated by environment and tool checks

use colored::Colorize;
use console::measure_text_width;
use serde::Serialize;

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Failed,
    Info,
}

impl CheckStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            CheckStatus::Ok => "✅",
            CheckStatus::Failed => "❌",
            CheckStatus::Info => "👉",
        }
    }
}

/// One line of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRow {
    pub status: CheckStatus,
    pub name: String,
    pub value: String,
    pub notes: String,
}

impl CheckRow {
    pub fn new(
        status: CheckStatus,
        name: impl Into<String>,
        value: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            status,
            name: name.into(),
            value: value.into(),
            notes: notes.into(),
        }
    }
}

/// Ordered collection of check rows
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    rows: Vec<CheckRow>,
}

const HEADERS: [&str; 4] = ["Status", "Check", "Value", "Notes"];

impl CheckReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: CheckRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[CheckRow] {
        &self.rows
    }

    /// Number of rows marked as failed
    pub fn failure_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.status == CheckStatus::Failed)
            .count()
    }

    /// Render a boxed table with a styled header
    pub fn render(&self) -> String {
        let cells: Vec<[&str; 4]> = self
            .rows
            .iter()
            .map(|row| {
                [
                    row.status.symbol(),
                    row.name.as_str(),
                    row.value.as_str(),
                    row.notes.as_str(),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(measure_text_width);
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(measure_text_width(cell));
            }
        }

        let border = {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            segments.join("┼")
        };

        let mut out = String::new();
        out.push_str(&format!("┌{}┐\n", border.replace('┼', "┬")));
        out.push_str(&format_line(&HEADERS, &widths, true));
        out.push_str(&format!("├{}┤\n", border));
        for row in &cells {
            out.push_str(&format_line(row, &widths, false));
        }
        out.push_str(&format!("└{}┘\n", border.replace('┼', "┴")));
        out
    }

    /// Print the rendered table to stdout
    pub fn print(&self) {
        print!("{}", self.render());
    }
}

fn format_line(cells: &[&str; 4], widths: &[usize; 4], header: bool) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| {
            let pad = " ".repeat(width - measure_text_width(cell));
            if header {
                format!(" {}{} ", cell.bold(), pad)
            } else {
                format!(" {}{} ", cell, pad)
            }
        })
        .collect();
    format!("│{}│\n", padded.join("│"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_rows() {
        let mut report = CheckReport::new();
        report.push(CheckRow::new(CheckStatus::Ok, "python3", "Python 3.11.4", "required"));
        report.push(CheckRow::new(CheckStatus::Failed, "GALAXY_KEY", "", "required for publishing"));

        let rendered = report.render();
        assert!(rendered.contains("python3"));
        assert!(rendered.contains("Python 3.11.4"));
        assert!(rendered.contains("❌"));
        assert!(rendered.starts_with('┌'));
        assert_eq!(rendered.lines().count(), 6);
    }

    #[test]
    fn test_failure_count() {
        let mut report = CheckReport::new();
        report.push(CheckRow::new(CheckStatus::Ok, "a", "", ""));
        report.push(CheckRow::new(CheckStatus::Info, "b", "", ""));
        report.push(CheckRow::new(CheckStatus::Failed, "c", "", ""));
        assert_eq!(report.failure_count(), 1);
    }

    #[test]
    fn test_rows_align_with_wide_characters() {
        let mut report = CheckReport::new();
        report.push(CheckRow::new(CheckStatus::Ok, "locale", "日本語", "wide value"));
        report.push(CheckRow::new(CheckStatus::Info, "yq", "", "required for bump"));

        let rendered = report.render();
        let widths: Vec<usize> = rendered.lines().map(measure_text_width).collect();
        assert!(widths.iter().all(|w| *w == widths[0]), "{}", rendered);
    }

    #[test]
    fn test_report_serializes_status_lowercase() {
        let mut report = CheckReport::new();
        report.push(CheckRow::new(CheckStatus::Info, "HOME", "/home/dev", ""));
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"status\":\"info\""));
    }
}
