use serde::Deserialize;
use serde_json::Value;

/// Delimiter introducing a legacy color/style code.
pub const LEGACY_MARKER: char = '\u{00A7}';

/// A chat payload as received from the session, in one of its two encodings.
#[derive(Clone, Debug, PartialEq)]
pub enum RawChatPayload {
    Legacy(String),
    Structured(RichText),
}

/// Root text plus an optional ordered list of fragments.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub extra: Option<Vec<ExtraFragment>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExtraFragment {
    Plain(String),
    Colored(ColoredFragment),
    /// Anything that is neither a string nor a `{color, text}` object.
    Other(Value),
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ColoredFragment {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "text_or_scalar")]
    pub text: String,
}

/// Accepts numbers and booleans as fragment text.
fn text_or_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(ExtraFragment::fallback_text(&value).unwrap_or_default())
}

impl ExtraFragment {
    /// Best-effort text of a malformed fragment.
    pub fn fallback_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Object(map) => map.get("text").and_then(Self::fallback_text),
            Value::Null | Value::Array(_) => None,
        }
    }
}

impl RawChatPayload {
    /// Classifies already-flattened chat text.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.contains(LEGACY_MARKER) {
            RawChatPayload::Legacy(text)
        } else {
            RawChatPayload::Structured(RichText { text, extra: None })
        }
    }

    /// Classifies a JSON chat component. The legacy encoding wins whenever
    /// the flattened text carries a marker.
    pub fn from_component(component: &Value) -> Self {
        let flattened = flatten_component(component);
        if flattened.contains(LEGACY_MARKER) {
            return RawChatPayload::Legacy(flattened);
        }

        match component {
            Value::Object(_) => match RichText::deserialize(component) {
                Ok(rich) => RawChatPayload::Structured(rich),
                Err(e) => {
                    tracing::debug!("Unparseable chat component, using plain text: {}", e);
                    RawChatPayload::from_text(flattened)
                }
            },
            _ => RawChatPayload::from_text(flattened),
        }
    }
}

/// Concatenates a component's root text and every nested fragment's text.
pub fn flatten_component(component: &Value) -> String {
    let mut out = String::new();
    flatten_into(component, &mut out);
    out
}

fn flatten_into(component: &Value, out: &mut String) {
    match component {
        Value::Object(map) => {
            if let Some(text) = map.get("text").and_then(ExtraFragment::fallback_text) {
                out.push_str(&text);
            }
            if let Some(Value::Array(extra)) = map.get("extra") {
                for fragment in extra {
                    flatten_into(fragment, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        other => {
            if let Some(text) = ExtraFragment::fallback_text(other) {
                out.push_str(&text);
            }
        }
    }
}
