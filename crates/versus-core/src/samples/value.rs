//! Rendering of dynamic values for reports and span attributes

use serde::Serialize;

/// Placeholder used when a value cannot be serialized
pub const UNSERIALIZABLE: &str = "<unserializable>";

/// Render a value in compact JSON form, falling back to a placeholder
pub fn render_value<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| UNSERIALIZABLE.to_string())
}

/// Truncate a rendered value for fixed-width tables
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
