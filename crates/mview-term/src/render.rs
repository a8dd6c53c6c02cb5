use std::io;
use std::time::SystemTime;

use mview_core::View;

use crate::format::human_duration;

/// Everything a renderer needs for one draw.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub view: &'a View,
    /// Filter text while the prompt is open.
    pub prompt: Option<&'a str>,
    pub now: SystemTime,
    /// Terminal columns.
    pub width: usize,
}

impl<'a> Frame<'a> {
    pub fn new(view: &'a View, now: SystemTime, width: usize) -> Self {
        Self {
            view,
            prompt: None,
            now,
            width,
        }
    }

    pub fn with_prompt(mut self, prompt: Option<&'a str>) -> Self {
        self.prompt = prompt;
        self
    }

    /// "last update N seconds ago", or a waiting notice before the first scrape.
    pub fn last_update(&self) -> String {
        match self.view.scraped_at {
            Some(at) => {
                let elapsed = self.now.duration_since(at).unwrap_or_default();
                format!("last update {}", human_duration(elapsed))
            }
            None => "waiting for first scrape".to_string(),
        }
    }
}

/// A sink for frames. Implementations own their output stream.
pub trait Renderer {
    fn render(&mut self, frame: &Frame<'_>) -> io::Result<()>;

    /// Called once on exit.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}
