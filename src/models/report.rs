//! Report models and payload normalization rules.
//!
//! The backend's report payload has evolved: section headings moved from
//! `title` to `heading`, key figures changed from a name-to-value mapping to
//! an ordered sequence, and section content may arrive as a string, number,
//! or nested structure. Everything is normalized here, in one place, so the
//! rest of the client only ever sees the canonical shapes below.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single extracted metric.
///
/// Canonical form of both key-figure wire schemas. Records migrated from
/// the legacy mapping have an empty unit and no context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFigure {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// A report section with display-ready content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub heading: String,
    pub content: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// The AI-generated report for a completed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub document_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub key_figures: Vec<KeyFigure>,
    #[serde(default)]
    pub sections: Vec<ReportSection>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
}

/// Render a scalar JSON value for display without JSON quoting.
pub fn scalar_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Normalize arbitrary section content to a display string.
///
/// Objects become one `"• key: value"` bullet line per entry, with
/// underscores in keys replaced by spaces. Anything else that is not a
/// scalar falls back to pretty-printed JSON.
pub fn normalize_content(content: &Value) -> String {
    match content {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| {
                format!("• {}: {}", key.replace('_', " "), scalar_to_display(value))
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Map a key-figure unit string to a display symbol.
///
/// This is a static lookup for the units the reporting pipeline actually
/// emits, not a currency converter. Unrecognized units pass through.
pub fn unit_symbol(unit: &str) -> &str {
    const EURO_MARKERS: [&str; 5] = ["tausend", "million", "mio", "bn", "eur"];

    let lower = unit.to_lowercase();
    if EURO_MARKERS.iter().any(|marker| lower.contains(marker)) {
        "€"
    } else if lower.contains("usd") {
        "$"
    } else {
        unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_string_and_number() {
        assert_eq!(normalize_content(&json!("plain text")), "plain text");
        assert_eq!(normalize_content(&json!(42)), "42");
        assert_eq!(normalize_content(&json!(null)), "");
    }

    #[test]
    fn test_normalize_object_to_bullets() {
        let normalized = normalize_content(&json!({"revenue": 100, "growth": "5%"}));
        let lines: Vec<&str> = normalized.lines().collect();
        assert!(lines.contains(&"• revenue: 100"));
        assert!(lines.contains(&"• growth: 5%"));
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_normalize_underscores_in_keys() {
        let normalized = normalize_content(&json!({"net_profit_margin": "12%"}));
        assert_eq!(normalized, "• net profit margin: 12%");
    }

    #[test]
    fn test_normalize_array_falls_back_to_pretty_json() {
        let normalized = normalize_content(&json!(["a", "b"]));
        assert!(normalized.contains("\"a\""));
        assert!(normalized.contains('\n'));
    }

    #[test]
    fn test_unit_symbol_euro_markers() {
        assert_eq!(unit_symbol("EUR"), "€");
        assert_eq!(unit_symbol("Million"), "€");
        assert_eq!(unit_symbol("Mio. EUR"), "€");
        assert_eq!(unit_symbol("Tausend"), "€");
        assert_eq!(unit_symbol("bn"), "€");
    }

    #[test]
    fn test_unit_symbol_usd_and_passthrough() {
        assert_eq!(unit_symbol("USD"), "$");
        assert_eq!(unit_symbol("ratio"), "ratio");
        assert_eq!(unit_symbol("%"), "%");
    }
}
