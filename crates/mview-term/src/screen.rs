//! Full-screen table renderer.
//!
//! Every frame clears the screen and redraws:
//!
//! ```text
//!  metrics-viewer 0.1.0                      last update 2 seconds ago   (title bar)
//!  apiserver_flowcontrol_current_inqueue_requests (gauge)                 (metric header)
//!    flow_schema=exempt priority_level=exempt                     0      (series rows)
//!  ...
//!  q: Quit  /: Filter  1/2/3: Sort [value desc]   Filter: none         (footer)
//! ```

use std::io::{self, Write};

use crate::format::{format_value, labels_display, truncate};
use crate::render::{Frame, Renderer};

const CLEAR: &str = "\x1b[H\x1b[2J";
const INVERSE: &str = "\x1b[7m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

const MIN_WIDTH: usize = 20;

pub struct ScreenTable<W: Write> {
    out: W,
    title: String,
}

impl<W: Write> ScreenTable<W> {
    pub fn new(out: W, title: impl Into<String>) -> Self {
        Self {
            out,
            title: title.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn bar(&mut self, left: &str, right: &str, width: usize) -> io::Result<()> {
        let gap = width.saturating_sub(left.chars().count() + right.chars().count());
        let line = truncate(&format!("{left}{}{right}", " ".repeat(gap.max(1))), width);
        writeln!(self.out, "{INVERSE}{line:<width$}{RESET}")
    }
}

fn sort_label(frame: &Frame<'_>) -> String {
    let sort = frame.view.sort;
    let direction = if sort.ascending { "asc" } else { "desc" };
    format!("{} {direction}", sort.column.title())
}

impl<W: Write> Renderer for ScreenTable<W> {
    fn render(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        let width = frame.width.max(MIN_WIDTH);
        let view = frame.view;

        write!(self.out, "{CLEAR}")?;
        let title = self.title.clone();
        self.bar(&title, &frame.last_update(), width)?;

        if view.rows.is_empty() {
            let notice = if view.scraped_at.is_none() {
                "No data available."
            } else {
                "No metrics match."
            };
            writeln!(self.out, "{notice}")?;
        }

        let value_width = view
            .rows
            .iter()
            .map(|r| format_value(&r.value).chars().count())
            .max()
            .unwrap_or(0)
            .max("Value".len());
        let label_width = width.saturating_sub(value_width + 3).max(1);

        let mut current: Option<&str> = None;
        for row in &view.rows {
            if current != Some(row.metric_name.as_str()) {
                let header = match &row.metric_type {
                    Some(t) => format!("{} ({t})", row.metric_name),
                    None => row.metric_name.clone(),
                };
                writeln!(self.out, "{BOLD}{}{RESET}", truncate(&header, width))?;
                current = Some(row.metric_name.as_str());
            }

            let labels = truncate(&labels_display(row), label_width);
            let value = format_value(&row.value);
            writeln!(self.out, "  {labels:<label_width$} {value:>value_width$}")?;
        }

        let filter = if view.filter.is_empty() {
            "none"
        } else {
            view.filter.as_str()
        };
        let help = format!("q: Quit  /: Filter  1/2/3: Sort [{}]", sort_label(frame));
        self.bar(&help, &format!("Filter: {filter}"), width)?;

        if let Some(error) = &view.filter_error {
            writeln!(self.out, "{RED}{}{RESET}", truncate(error, width))?;
        }
        if let Some(prompt) = frame.prompt {
            write!(self.out, "Filter (regex): {prompt}")?;
        }

        self.out.flush()
    }

    fn finish(&mut self) -> io::Result<()> {
        write!(self.out, "{CLEAR}")?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::{Duration, SystemTime};

    use mview_core::{DisplayRow, SortColumn, SortSpec, View};

    use super::*;

    fn row(name: &str, ty: Option<&str>, labels: &[(&str, &str)], value: &str) -> DisplayRow {
        DisplayRow {
            metric_name: name.into(),
            metric_type: ty.map(Into::into),
            description: None,
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            value: value.into(),
        }
    }

    fn view(rows: Vec<DisplayRow>, scraped_at: Option<SystemTime>) -> View {
        View {
            sequence: 2,
            rows,
            columns: vec!["pl".into()],
            filter: String::new(),
            filter_error: None,
            sort: SortSpec::default(),
            scraped_at,
        }
    }

    fn draw(view: &View, prompt: Option<&str>, now: SystemTime) -> String {
        let mut screen = ScreenTable::new(Vec::new(), "metrics-viewer test");
        let frame = Frame::new(view, now, 60).with_prompt(prompt);
        screen.render(&frame).unwrap();
        String::from_utf8(screen.into_inner()).unwrap()
    }

    #[test]
    fn draws_groups_and_values() {
        let now = SystemTime::now();
        let v = view(
            vec![
                row("queue", Some("gauge"), &[("pl", "a")], "1"),
                row("queue", Some("gauge"), &[("pl", "b")], "0.5"),
                row("wait", None, &[("pl", "a")], "3"),
            ],
            Some(now - Duration::from_secs(3)),
        );
        let out = draw(&v, None, now);

        assert!(out.starts_with(CLEAR));
        assert!(out.contains("metrics-viewer test"));
        assert!(out.contains("last update 3 seconds ago"));
        assert_eq!(out.matches("queue (gauge)").count(), 1);
        assert!(out.contains("wait"));
        assert!(out.contains("pl=b"));
        assert!(out.contains("0.50"));
        assert!(out.contains("Filter: none"));
        assert!(out.contains("[name asc]"));
    }

    #[test]
    fn empty_before_first_scrape() {
        let out = draw(&view(vec![], None), None, SystemTime::now());
        assert!(out.contains("No data available."));
        assert!(out.contains("waiting for first scrape"));
    }

    #[test]
    fn footer_shows_filter_error_and_prompt() {
        let mut v = view(vec![row("queue", None, &[("pl", "a")], "1")], None);
        v.filter = "(".into();
        v.filter_error = Some("invalid filter pattern".into());
        v.sort = SortSpec::new(SortColumn::Value, false);

        let out = draw(&v, Some("que"), SystemTime::now());
        assert!(out.contains("Filter: ("));
        assert!(out.contains("invalid filter pattern"));
        assert!(out.contains("[value desc]"));
        assert!(out.ends_with("Filter (regex): que"));
    }

    #[test]
    fn long_labels_are_truncated() {
        let long = "x".repeat(200);
        let v = view(vec![row("queue", None, &[("pl", &long)], "1")], None);
        let out = draw(&v, None, SystemTime::now());
        assert!(out.contains("..."));
        assert!(!out.contains(&long));
    }

    #[test]
    fn finish_clears() {
        let mut screen = ScreenTable::new(Vec::new(), "t");
        screen.finish().unwrap();
        assert_eq!(screen.into_inner(), CLEAR.as_bytes());
    }
}
