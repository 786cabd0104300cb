use super::color::ChatColor;
use chrono::{DateTime, Local};

/// Resolved style of a run. `color: None` means the renderer's default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StyleAttributes {
    pub color: Option<ChatColor>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub reset: bool,
}

impl StyleAttributes {
    pub fn colored(color: ChatColor) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }

    pub fn reset() -> Self {
        Self {
            reset: true,
            ..Self::default()
        }
    }

    pub fn has_modifiers(&self) -> bool {
        self.bold || self.italic || self.underline || self.strikethrough
    }

    /// True when the run renders with default color and no modifiers.
    pub fn is_plain(&self) -> bool {
        self.color.is_none() && !self.has_modifiers()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub style: StyleAttributes,
}

impl StyledRun {
    pub fn new(text: impl Into<String>, style: StyleAttributes) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, StyleAttributes::default())
    }
}

/// Runs in display order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyledMessage {
    runs: Vec<StyledRun>,
}

impl StyledMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, run: StyledRun) {
        self.runs.push(run);
    }

    pub fn runs(&self) -> &[StyledRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The message text with all styling removed.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

impl From<Vec<StyledRun>> for StyledMessage {
    fn from(runs: Vec<StyledRun>) -> Self {
        Self { runs }
    }
}

/// A decoded inbound chat line as delivered to the session.
#[derive(Clone, Debug)]
pub struct ChatMessage {
    pub plain: String,
    pub styled: StyledMessage,
    pub timestamp: DateTime<Local>,
}
