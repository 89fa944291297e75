// src/composer/reasoning.rs
// Deterministic sentence assembly for the final reasoning field. Same inputs
// always produce the same text, so cached whole results stay stable.

use crate::models::{Recommendation, RoomAnalysis, SearchContext, TrendInsight};

/// Reasoning for the room-image flow: aesthetic match, dominant color,
/// lighting, top recommendation, trend note.
pub fn room_analysis_reasoning(
    analysis: &RoomAnalysis,
    recommendations: &[Recommendation],
    trends: &TrendInsight,
) -> String {
    let mut parts = Vec::new();

    if !analysis.aesthetic_style.style.is_empty() {
        parts.push(format!(
            "Your room has a {} aesthetic with {:.1}% confidence.",
            analysis.aesthetic_style.style,
            analysis.aesthetic_style.confidence * 100.0
        ));
    }

    if let Some(dominant) = analysis.color_palette.first() {
        parts.push(format!(
            "The dominant color in your space is {}.",
            dominant.hex
        ));
    }

    parts.push(format!(
        "Your space has {} lighting conditions.",
        analysis.lighting.condition
    ));

    if let Some(top) = recommendations.first() {
        parts.push(format!(
            "Our top recommendation is '{}' which perfectly complements your space.",
            top.artwork.title
        ));
    }

    if !trends.evolution_insights.is_empty() {
        parts.push(
            "Based on current trends, we've also considered evolving design preferences."
                .to_string(),
        );
    }

    if parts.is_empty() {
        "We've analyzed your space and provided personalized recommendations.".to_string()
    } else {
        parts.join(" ")
    }
}

/// Reasoning for the text/voice flow, with continuity sentences when a
/// previous search context informed this turn.
pub fn query_reasoning(
    query: &str,
    recommendations: &[Recommendation],
    trends: &TrendInsight,
    previous: Option<&SearchContext>,
) -> String {
    let mut parts = vec![format!(
        "Based on your request: '{query}', we've curated recommendations that \
         match your described preferences."
    )];

    if let Some(context) = previous {
        if !context.query.is_empty() {
            parts.push(format!(
                "Building on your previous search for '{}', I've refined these \
                 recommendations to better match your evolving preferences.",
                context.query
            ));
        }
        if !context.parsed_query.detected_styles.is_empty() {
            parts.push(format!(
                "Maintaining consistency with your preferred {} style.",
                context.parsed_query.detected_styles.join(", ")
            ));
        }
    }

    if let Some(top) = recommendations.first() {
        parts.push(format!(
            "Our top suggestion is '{}' which aligns with your style preferences.",
            top.artwork.title
        ));
    }

    if !trends.evolution_insights.is_empty() {
        parts.push("We've also included trending elements that complement your style.".to_string());
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fallback_insight;
    use crate::models::{
        AestheticStyle, ColorSwatch, Detections, Lighting, ParsedQuery,
    };
    use chrono::Utc;

    fn sample_analysis() -> RoomAnalysis {
        RoomAnalysis {
            detections: Detections::default(),
            color_palette: vec![ColorSwatch {
                rgb: [200, 180, 160],
                hex: "#c8b4a0".to_string(),
                percentage: 35.2,
            }],
            lighting: Lighting {
                mean_brightness: 125.5,
                std_brightness: 45.2,
                contrast: 45.2,
                condition: "moderate".to_string(),
            },
            style_embeddings: vec![0.0; 8],
            aesthetic_style: AestheticStyle {
                style: "modern minimalist interior design".to_string(),
                confidence: 0.87,
                all_scores: vec![0.87],
            },
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn image_reasoning_covers_style_color_and_lighting() {
        let text = room_analysis_reasoning(&sample_analysis(), &[], &fallback_insight());
        assert!(text.contains("modern minimalist interior design"));
        assert!(text.contains("87.0% confidence"));
        assert!(text.contains("#c8b4a0"));
        assert!(text.contains("moderate lighting"));
    }

    #[test]
    fn query_reasoning_mentions_previous_search() {
        let previous = SearchContext {
            query: "modern wall art".to_string(),
            parsed_query: ParsedQuery {
                detected_styles: vec!["modern".to_string()],
                ..Default::default()
            },
            location: None,
            query_type: "text".to_string(),
            audio_sample: None,
            timestamp: Utc::now().to_rfc3339(),
        };
        let text = query_reasoning(
            "something cheaper",
            &[],
            &fallback_insight(),
            Some(&previous),
        );
        assert!(text.contains("Building on your previous search for 'modern wall art'"));
        assert!(text.contains("preferred modern style"));
    }

    #[test]
    fn query_reasoning_is_deterministic() {
        let a = query_reasoning("rustic prints", &[], &fallback_insight(), None);
        let b = query_reasoning("rustic prints", &[], &fallback_insight(), None);
        assert_eq!(a, b);
    }
}
