//! Scrolling renderer: one bordered Label/Value table per metric, per view.

use std::io::{self, Write};

use mview_core::DisplayRow;

use crate::format::{format_value, labels_display, truncate};
use crate::render::{Frame, Renderer};

const MIN_COLUMN: usize = 10;

pub struct LinePrinter<W: Write> {
    out: W,
}

impl<W: Write> LinePrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn metric_table(&mut self, group: &[DisplayRow], width: usize) -> io::Result<()> {
        let first = &group[0];
        match &first.description {
            Some(description) => writeln!(self.out, "<{}> {description}:", first.metric_name)?,
            None => writeln!(self.out, "<{}>:", first.metric_name)?,
        }

        let headers = ["Label".to_string(), "Value".to_string()];
        let rows: Vec<[String; 2]> = group
            .iter()
            .map(|r| [labels_display(r), format_value(&r.value)])
            .collect();
        let widths = column_widths(&headers, &rows, width);

        self.separator(&widths)?;
        self.row(&headers, &widths)?;
        self.separator(&widths)?;
        for row in &rows {
            self.row(row, &widths)?;
        }
        self.separator(&widths)?;
        writeln!(self.out)
    }

    fn separator(&mut self, widths: &[usize]) -> io::Result<()> {
        let mut line = String::from("+");
        for w in widths {
            line.push_str(&"-".repeat(w + 2));
            line.push('+');
        }
        writeln!(self.out, "{line}")
    }

    fn row(&mut self, cells: &[String], widths: &[usize]) -> io::Result<()> {
        let mut line = String::from("|");
        for (cell, &w) in cells.iter().zip(widths) {
            let cell = truncate(cell, w);
            line.push_str(&format!(" {cell:<w$} |"));
        }
        writeln!(self.out, "{line}")
    }
}

/// Natural column widths, shrunk evenly (down to a floor) to fit `total`.
fn column_widths(headers: &[String; 2], rows: &[[String; 2]], total: usize) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let used: usize = widths.iter().sum::<usize>() + 3 * widths.len() + 1;
    if used > total {
        let reduce = (used - total).div_ceil(widths.len());
        for w in &mut widths {
            *w = w.saturating_sub(reduce).max(MIN_COLUMN);
        }
    }
    widths
}

impl<W: Write> Renderer for LinePrinter<W> {
    fn render(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        let view = frame.view;
        if view.rows.is_empty() {
            if view.scraped_at.is_some() {
                writeln!(self.out, "No metrics match.")?;
            } else {
                writeln!(self.out, "No data available.")?;
            }
        }

        for group in view.rows.chunk_by(|a, b| a.metric_name == b.metric_name) {
            self.metric_table(group, frame.width)?;
        }

        if let Some(error) = &view.filter_error {
            writeln!(self.out, "{error}")?;
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::SystemTime;

    use mview_core::{SortSpec, View};

    use super::*;

    fn row(name: &str, description: Option<&str>, pl: &str, value: &str) -> DisplayRow {
        DisplayRow {
            metric_name: name.into(),
            metric_type: None,
            description: description.map(Into::into),
            labels: BTreeMap::from([("pl".to_string(), pl.to_string())]),
            value: value.into(),
        }
    }

    fn print(rows: Vec<DisplayRow>, width: usize) -> String {
        let view = View {
            sequence: 1,
            rows,
            columns: vec!["pl".into()],
            filter: String::new(),
            filter_error: None,
            sort: SortSpec::default(),
            scraped_at: Some(SystemTime::now()),
        };
        let mut printer = LinePrinter::new(Vec::new());
        printer
            .render(&Frame::new(&view, SystemTime::now(), width))
            .unwrap();
        String::from_utf8(printer.into_inner()).unwrap()
    }

    #[test]
    fn one_table_per_metric() {
        let out = print(
            vec![
                row("queue", Some("Requests in queue"), "a", "1"),
                row("queue", Some("Requests in queue"), "b", "2.25"),
                row("wait", None, "a", "3"),
            ],
            80,
        );
        assert!(out.starts_with("<queue> Requests in queue:\n+-------+-------+\n| Label | Value |\n"));
        assert!(out.contains("| pl=b  | 2.25  |"));
        assert!(out.contains("<wait>:\n"));
        assert_eq!(out.matches("| Label | Value |").count(), 2);
    }

    #[test]
    fn narrow_terminal_truncates_cells() {
        let long = "y".repeat(80);
        let out = print(vec![row("queue", None, &long, "1")], 40);
        assert!(out.contains("..."));
        assert!(!out.contains(&long));
    }

    #[test]
    fn widths_shrink_to_floor() {
        let headers = ["Label".to_string(), "Value".to_string()];
        let rows = vec![["a".repeat(50), "b".repeat(50)]];
        assert_eq!(column_widths(&headers, &rows, 200), vec![50, 50]);
        assert_eq!(column_widths(&headers, &rows, 47), vec![20, 20]);
        assert_eq!(column_widths(&headers, &rows, 5), vec![10, 10]);
    }

    #[test]
    fn empty_view_notice() {
        let out = print(vec![], 80);
        assert_eq!(out, "No metrics match.\n");
    }
}
