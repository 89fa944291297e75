// src/composer/query_parser.rs
// Keyword extraction for text/voice queries and the context merge that makes
// short follow-up queries inherit signals from the previous search turn.

use chrono::DateTime;
use tracing::warn;

use crate::models::{ParsedQuery, SearchContext};

const STYLE_KEYWORDS: [(&str, &[&str]); 6] = [
    ("modern", &["modern", "contemporary", "minimalist", "clean"]),
    ("traditional", &["traditional", "classic", "vintage", "antique"]),
    ("scandinavian", &["scandinavian", "nordic", "minimal", "hygge"]),
    ("industrial", &["industrial", "urban", "loft", "raw"]),
    ("bohemian", &["bohemian", "eclectic", "boho", "vibrant"]),
    ("rustic", &["rustic", "farmhouse", "country", "natural"]),
];

const COLOR_KEYWORDS: [(&str, &[&str]); 4] = [
    ("neutral", &["neutral", "beige", "white", "gray", "cream"]),
    ("warm", &["warm", "brown", "tan", "gold", "orange"]),
    ("cool", &["cool", "blue", "green", "purple", "teal"]),
    ("bold", &["bold", "bright", "vibrant", "colorful", "pop"]),
];

const ROOM_KEYWORDS: [(&str, &[&str]); 5] = [
    ("living_room", &["living room", "lounge", "sitting room"]),
    ("bedroom", &["bedroom", "sleeping room"]),
    ("kitchen", &["kitchen", "cooking"]),
    ("dining_room", &["dining room", "eating room"]),
    ("office", &["office", "study", "workspace"]),
];

/// Extract style, color, and room signals from a free-text query.
pub fn parse_text_query(query: &str) -> ParsedQuery {
    let lower = query.to_lowercase();

    let detected_styles = STYLE_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(style, _)| style.to_string())
        .collect();

    let detected_colors = COLOR_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(color, _)| color.to_string())
        .collect();

    let detected_room = ROOM_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(room, _)| room.to_string())
        .unwrap_or_else(|| "living_room".to_string());

    ParsedQuery {
        detected_styles,
        detected_colors,
        detected_room,
        original_query: query.to_string(),
        context_enhanced: false,
        previous_query: None,
    }
}

/// Merge the previous turn's signals into the current parse. Styles and
/// colors are unioned with current-query entries first; queries shorter than
/// three words additionally inherit the previous room and, when the current
/// parse found no style at all, the previous styles.
pub fn merge_with_context(
    mut parsed: ParsedQuery,
    previous: &SearchContext,
    current_query: &str,
) -> ParsedQuery {
    let prev = &previous.parsed_query;

    if !prev.detected_styles.is_empty() {
        parsed.detected_styles = union_preserving_order(&parsed.detected_styles, &prev.detected_styles);
    }
    if !prev.detected_colors.is_empty() {
        parsed.detected_colors = union_preserving_order(&parsed.detected_colors, &prev.detected_colors);
    }

    parsed.context_enhanced = true;
    parsed.previous_query = Some(previous.query.clone());

    if current_query.split_whitespace().count() < 3 {
        if !prev.detected_room.is_empty() {
            parsed.detected_room = prev.detected_room.clone();
        }
        if parsed.detected_styles.is_empty() {
            parsed.detected_styles = if prev.detected_styles.is_empty() {
                vec!["modern".to_string()]
            } else {
                prev.detected_styles.clone()
            };
        }
    }

    parsed
}

/// One-line summary of the previous search turn, shown back to the user when
/// their query was context-enhanced.
pub fn context_summary(context: &SearchContext) -> String {
    let formatted_time = match DateTime::parse_from_rfc3339(&context.timestamp) {
        Ok(dt) => dt.format("%B %d, %Y at %I:%M %p").to_string(),
        Err(e) => {
            warn!(timestamp = %context.timestamp, "Unparseable context timestamp: {e}");
            "recently".to_string()
        }
    };

    let mut parts = Vec::new();
    if !context.query.is_empty() {
        parts.push(format!(
            "Your last {} query was: '{}'",
            context.query_type, context.query
        ));
    }
    parts.push(format!("Search context from {formatted_time}"));
    if !context.parsed_query.detected_styles.is_empty() {
        parts.push(format!(
            "Previous style preferences: {}",
            context.parsed_query.detected_styles.join(", ")
        ));
    }

    parts.join(" | ")
}

fn union_preserving_order(current: &[String], previous: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = current.to_vec();
    for item in previous {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn context_with_styles(query: &str, styles: &[&str], room: &str) -> SearchContext {
        SearchContext {
            query: query.to_string(),
            parsed_query: ParsedQuery {
                detected_styles: styles.iter().map(|s| s.to_string()).collect(),
                detected_colors: vec!["neutral".to_string()],
                detected_room: room.to_string(),
                original_query: query.to_string(),
                context_enhanced: false,
                previous_query: None,
            },
            location: None,
            query_type: "text".to_string(),
            audio_sample: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn parses_styles_colors_and_room() {
        let parsed = parse_text_query("Bright bohemian art for my home office");
        assert_eq!(parsed.detected_styles, vec!["bohemian"]);
        assert_eq!(parsed.detected_colors, vec!["bold"]);
        assert_eq!(parsed.detected_room, "office");
        assert!(!parsed.context_enhanced);
    }

    #[test]
    fn defaults_to_living_room() {
        let parsed = parse_text_query("abstract canvas under 200");
        assert_eq!(parsed.detected_room, "living_room");
        assert!(parsed.detected_styles.is_empty());
    }

    #[test]
    fn merge_unions_styles_with_current_priority() {
        let query = "rustic prints for the kitchen please";
        let parsed = parse_text_query(query);
        let previous = context_with_styles("modern wall art", &["modern"], "living_room");

        let merged = merge_with_context(parsed, &previous, query);
        assert_eq!(merged.detected_styles, vec!["rustic", "modern"]);
        assert_eq!(merged.detected_room, "kitchen");
        assert!(merged.context_enhanced);
        assert_eq!(merged.previous_query.as_deref(), Some("modern wall art"));
    }

    #[test]
    fn short_query_inherits_previous_signals() {
        let query = "something cheaper";
        let parsed = parse_text_query(query);
        let previous = context_with_styles("modern bedroom art", &["modern"], "bedroom");

        let merged = merge_with_context(parsed, &previous, query);
        assert_eq!(merged.detected_styles, vec!["modern"]);
        assert_eq!(merged.detected_room, "bedroom");
    }

    #[test]
    fn long_query_keeps_its_own_room() {
        let query = "colorful art for my kitchen walls";
        let parsed = parse_text_query(query);
        let previous = context_with_styles("bedroom prints", &[], "bedroom");

        let merged = merge_with_context(parsed, &previous, query);
        assert_eq!(merged.detected_room, "kitchen");
    }

    #[test]
    fn summary_names_query_and_styles() {
        let previous = context_with_styles("modern wall art", &["modern"], "living_room");
        let summary = context_summary(&previous);
        assert!(summary.contains("Your last text query was: 'modern wall art'"));
        assert!(summary.contains("Previous style preferences: modern"));
    }
}
