//! Exposition text parser.
//!
//! Translates raw scrape text into store updates, one line at a time,
//! restricted to the configured metric names. The parser is pure: it
//! returns events and warnings and leaves applying them to [`MetricStore`].
//!
//! Handled subset:
//!
//! ```text
//! # HELP <name> <description>
//! # TYPE <name> <type>
//! <name>{<k>="<v>",...} <value> [timestamp]
//! <name> <value> [timestamp]
//! ```
//!
//! [`MetricStore`]: crate::store::MetricStore

use crate::error::{ParseWarning, ParseWarningKind};
use crate::types::Label;

/// One update produced from a tracked line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    Description {
        name: String,
        description: String,
    },
    Type {
        name: String,
        metric_type: String,
    },
    Value {
        /// The tracked metric this line belongs to.
        name: String,
        /// The sample name as written (`name`, `name_total`, `name_sum`, ...).
        sample: String,
        labels: Vec<Label>,
        value: String,
    },
}

impl ParsedEvent {
    /// The tracked metric this event updates.
    pub fn metric_name(&self) -> &str {
        match self {
            ParsedEvent::Description { name, .. }
            | ParsedEvent::Type { name, .. }
            | ParsedEvent::Value { name, .. } => name,
        }
    }
}

/// Events and warnings from one scrape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutput {
    pub events: Vec<ParsedEvent>,
    pub warnings: Vec<ParseWarning>,
}

/// Parse `raw` and emit events for lines belonging to `tracked` metrics.
///
/// A value line belongs to every tracked name its sample name starts
/// with, so `cpu_seconds_total` is reported under `cpu_seconds`.
/// Malformed tracked value lines become [`ParseWarning`]s; processing
/// continues with the next line.
///
/// Histogram series are not filtered here. Dropping everything but
/// `<name>_sum` depends on the TYPE recorded so far, including earlier
/// scrapes, so [`MetricStore::apply`] does it.
///
/// [`MetricStore::apply`]: crate::store::MetricStore::apply
pub fn parse<S: AsRef<str>>(raw: &str, tracked: &[S]) -> ParseOutput {
    let mut out = ParseOutput::default();

    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            parse_comment(comment, tracked, &mut out.events);
            continue;
        }

        let sample = sample_name(line);
        let owners: Vec<&str> = tracked
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| belongs_to(sample, name))
            .collect();
        if owners.is_empty() {
            continue;
        }

        match parse_sample(&line[sample.len()..]) {
            Ok((labels, value)) => {
                for name in owners {
                    out.events.push(ParsedEvent::Value {
                        name: name.to_string(),
                        sample: sample.to_string(),
                        labels: labels.clone(),
                        value: value.clone(),
                    });
                }
            }
            Err(kind) => out.warnings.push(ParseWarning {
                line_number: idx + 1,
                line: line.to_string(),
                kind,
            }),
        }
    }

    out
}

/// Handle the text after a leading `#`. Only HELP and TYPE are meaningful.
fn parse_comment<S: AsRef<str>>(comment: &str, tracked: &[S], events: &mut Vec<ParsedEvent>) {
    let mut parts = comment.trim_start().splitn(2, char::is_whitespace);
    let keyword = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim_start();
    let (name, text) = match rest.split_once(char::is_whitespace) {
        Some((name, text)) => (name, text.trim()),
        None => (rest, ""),
    };

    if !tracked.iter().any(|t| t.as_ref() == name) {
        return;
    }

    match keyword {
        "HELP" => events.push(ParsedEvent::Description {
            name: name.to_string(),
            description: text.to_string(),
        }),
        "TYPE" => events.push(ParsedEvent::Type {
            name: name.to_string(),
            metric_type: text.to_string(),
        }),
        _ => {}
    }
}

/// The leading sample name: everything up to `{` or whitespace.
fn sample_name(line: &str) -> &str {
    let end = line
        .find(|c: char| c == '{' || c.is_whitespace())
        .unwrap_or(line.len());
    &line[..end]
}

/// Whether a sample named `sample` is a value line for metric `name`.
fn belongs_to(sample: &str, name: &str) -> bool {
    !name.is_empty() && sample.starts_with(name)
}

/// Parse the part of a value line after its sample name.
fn parse_sample(rest: &str) -> Result<(Vec<Label>, String), ParseWarningKind> {
    let (labels, tail) = match rest.strip_prefix('{') {
        Some(body) => {
            let close = closing_brace(body).ok_or(ParseWarningKind::UnterminatedLabels)?;
            (parse_labels(&body[..close])?, &body[close + 1..])
        }
        None => (Vec::new(), rest),
    };

    let value = tail
        .split_whitespace()
        .next()
        .ok_or(ParseWarningKind::MissingValue)?;
    Ok((labels, value.to_string()))
}

/// Byte offset of the `}` closing a label list, ignoring braces inside quotes.
fn closing_brace(body: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '}' if !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split a label list on `,` (outside quotes), then each pair on its first `=`.
fn parse_labels(body: &str) -> Result<Vec<Label>, ParseWarningKind> {
    let mut labels = Vec::new();
    for pair in split_pairs(body) {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| ParseWarningKind::MalformedLabel(pair.to_string()))?;
        labels.push(Label::new(key.trim(), unquote(value.trim())));
    }
    Ok(labels)
}

fn split_pairs(body: &str) -> Vec<&str> {
    let mut pairs = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                pairs.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pairs.push(&body[start..]);
    pairs
}

/// Strip surrounding quotes and resolve `\\`, `\"` and `\n` escapes.
fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
