//! Key decoding for the interactive view.
//!
//! Works on single bytes from a raw-mode stdin. Multi-byte sequences are not
//! decoded, so an arrow key (ESC `[` ...) counts as ESC.

use mview_core::{SortColumn, SortSpec};

const CTRL_C: u8 = 0x03;
const BACKSPACE: u8 = 0x08;
const ESC: u8 = 0x1b;
const DEL: u8 = 0x7f;

/// What the caller should do after a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    /// Submit through `PipelineHandle::set_sort`.
    Sort(SortSpec),
    /// Submit through `PipelineHandle::on_filter_changed`.
    Filter(String),
    /// Local state changed (prompt text); redraw without a new view.
    Redraw,
}

#[derive(Debug, Default)]
pub struct KeyInput {
    sort: SortSpec,
    filter: String,
    prompt: Option<String>,
}

impl KeyInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter text being edited, if the prompt is open.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    /// Last submitted filter.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn feed(&mut self, byte: u8) -> Action {
        if byte == CTRL_C {
            return Action::Quit;
        }
        match self.prompt.take() {
            Some(text) => self.feed_prompt(text, byte),
            None => self.feed_normal(byte),
        }
    }

    fn feed_normal(&mut self, byte: u8) -> Action {
        match byte {
            b'q' | b'Q' | ESC => Action::Quit,
            b'1' => self.toggle_sort(SortColumn::Name),
            b'2' => self.toggle_sort(SortColumn::Labels),
            b'3' => self.toggle_sort(SortColumn::Value),
            b'/' => {
                self.prompt = Some(self.filter.clone());
                Action::Redraw
            }
            _ => Action::None,
        }
    }

    fn feed_prompt(&mut self, mut text: String, byte: u8) -> Action {
        match byte {
            ESC => Action::Redraw,
            b'\r' | b'\n' => {
                self.filter = text.clone();
                Action::Filter(text)
            }
            BACKSPACE | DEL => {
                text.pop();
                self.prompt = Some(text);
                Action::Redraw
            }
            0x20..=0x7e => {
                text.push(byte as char);
                self.prompt = Some(text);
                Action::Redraw
            }
            _ => {
                self.prompt = Some(text);
                Action::None
            }
        }
    }

    /// Same column flips direction; a new column starts ascending.
    fn toggle_sort(&mut self, column: SortColumn) -> Action {
        self.sort = if self.sort.column == column {
            SortSpec::new(column, !self.sort.ascending)
        } else {
            SortSpec::new(column, true)
        };
        Action::Sort(self.sort)
    }
}
