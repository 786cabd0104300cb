//! Turns raw chat payloads into styled runs.
//!
//! Legacy payloads are folded over a fixed code table: every code updates the
//! active style, and every segment with text emits one run in that style.
//! Structured payloads map each `extra` fragment to one run. Decoding never
//! fails; anything unrecognized comes out as default-styled text.

use crate::models::{
    color::ChatColor,
    message::{StyleAttributes, StyledMessage, StyledRun},
    payload::{ExtraFragment, LEGACY_MARKER, RawChatPayload, RichText},
};

/// Style flags a legacy code can switch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modifier {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

/// What a single legacy code does to the active style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegacyCode {
    Color(ChatColor),
    Modifier(Modifier),
    Reset,
}

/// Non-color codes. Colors `0`-`f` come from [`ChatColor::from_code`].
const STYLE_CODES: [(char, LegacyCode); 5] = [
    ('l', LegacyCode::Modifier(Modifier::Bold)),
    ('m', LegacyCode::Modifier(Modifier::Strikethrough)),
    ('n', LegacyCode::Modifier(Modifier::Underline)),
    ('o', LegacyCode::Modifier(Modifier::Italic)),
    ('r', LegacyCode::Reset),
];

/// Looks up a legacy code, ignoring ASCII case. `None` for codes outside the
/// 21-entry table, such as `k`.
pub fn legacy_code(code: char) -> Option<LegacyCode> {
    let code = code.to_ascii_lowercase();
    if let Some(color) = ChatColor::from_code(code) {
        return Some(LegacyCode::Color(color));
    }
    STYLE_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, action)| *action)
}

impl LegacyCode {
    /// Returns the style in effect after this code.
    pub fn apply(self, active: StyleAttributes) -> StyleAttributes {
        match self {
            LegacyCode::Color(color) => StyleAttributes::colored(color),
            LegacyCode::Reset => StyleAttributes::reset(),
            LegacyCode::Modifier(modifier) => {
                let mut next = StyleAttributes {
                    reset: false,
                    ..active
                };
                match modifier {
                    Modifier::Bold => next.bold = true,
                    Modifier::Italic => next.italic = true,
                    Modifier::Underline => next.underline = true,
                    Modifier::Strikethrough => next.strikethrough = true,
                }
                next
            }
        }
    }
}

pub fn decode(payload: &RawChatPayload) -> StyledMessage {
    match payload {
        RawChatPayload::Legacy(text) => decode_legacy(text),
        RawChatPayload::Structured(rich) => decode_structured(rich),
    }
}

fn decode_legacy(text: &str) -> StyledMessage {
    let mut message = StyledMessage::new();
    let mut segments = text.split(LEGACY_MARKER);

    // Text ahead of the first marker has no code.
    if let Some(lead) = segments.next().filter(|lead| !lead.is_empty()) {
        message.push(StyledRun::plain(lead));
    }

    let mut active = StyleAttributes::default();
    for segment in segments {
        let mut chars = segment.chars();
        let Some(code) = chars.next() else {
            continue;
        };

        active = match legacy_code(code) {
            Some(action) => action.apply(active),
            None => {
                tracing::trace!(%code, "Unknown legacy chat code");
                StyleAttributes::default()
            }
        };

        let body = chars.as_str();
        if !body.is_empty() {
            message.push(StyledRun::new(body, active));
        }
    }

    message
}

fn decode_structured(rich: &RichText) -> StyledMessage {
    let Some(extra) = &rich.extra else {
        let mut message = StyledMessage::new();
        if !rich.text.is_empty() {
            message.push(StyledRun::plain(rich.text.as_str()));
        }
        return message;
    };

    extra
        .iter()
        .filter_map(|fragment| match fragment {
            ExtraFragment::Plain(text) => Some(StyledRun::plain(text.as_str())),
            ExtraFragment::Colored(colored) => Some(StyledRun::new(
                colored.text.as_str(),
                named_style(colored.color.as_deref()),
            )),
            ExtraFragment::Other(value) => ExtraFragment::fallback_text(value).map(StyledRun::plain),
        })
        .filter(|run| !run.text.is_empty())
        .collect::<Vec<_>>()
        .into()
}

fn named_style(name: Option<&str>) -> StyleAttributes {
    match name {
        Some("reset") => StyleAttributes::reset(),
        Some(name) => ChatColor::from_name(name)
            .map(StyleAttributes::colored)
            .unwrap_or_default(),
        None => StyleAttributes::default(),
    }
}
