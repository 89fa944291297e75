// src/models.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub class: u32,
    pub confidence: f32,
    pub bbox: [u32; 4],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detections {
    pub walls: Vec<Detection>,
    pub windows: Vec<Detection>,
    pub furniture: Vec<Detection>,
    pub other: Vec<Detection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorSwatch {
    pub rgb: [u8; 3],
    pub hex: String,
    pub percentage: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lighting {
    pub mean_brightness: f32,
    pub std_brightness: f32,
    pub contrast: f32,
    pub condition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AestheticStyle {
    pub style: String,
    pub confidence: f32,
    pub all_scores: Vec<f32>,
}

/// Full output of the vision collaborator for one room image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomAnalysis {
    pub detections: Detections,
    pub color_palette: Vec<ColorSwatch>,
    pub lighting: Lighting,
    pub style_embeddings: Vec<f32>,
    pub aesthetic_style: AestheticStyle,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub aesthetic_style: String,
    pub preferred_colors: Vec<String>,
    pub max_price: f64,
    pub room_type: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            aesthetic_style: "modern".to_string(),
            preferred_colors: vec!["#2c3e50".to_string(), "#3498db".to_string()],
            max_price: 500.0,
            room_type: "living_room".to_string(),
        }
    }
}

/// Partial preference update; unset fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    pub aesthetic_style: Option<String>,
    pub preferred_colors: Option<Vec<String>>,
    pub max_price: Option<f64>,
    pub room_type: Option<String>,
}

impl UserPreferences {
    pub fn apply(&mut self, update: &PreferencesUpdate) {
        if let Some(style) = &update.aesthetic_style {
            self.aesthetic_style = style.clone();
        }
        if let Some(colors) = &update.preferred_colors {
            self.preferred_colors = colors.clone();
        }
        if let Some(price) = update.max_price {
            self.max_price = price;
        }
        if let Some(room) = &update.room_type {
            self.room_type = room.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub preferences: UserPreferences,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artwork {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub style: String,
    pub colors: Vec<String>,
    pub price: f64,
    pub size: String,
    pub medium: String,
    pub description: String,
    pub image_url: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub artwork: Artwork,
    pub match_score: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendItem {
    pub title: String,
    pub content: String,
    pub relevance_score: f32,
    pub trend_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalAdaptations {
    pub season: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendInsight {
    pub evolution_insights: String,
    pub trending_complements: Vec<String>,
    pub seasonal_adaptations: SeasonalAdaptations,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub name: String,
    pub address: String,
    pub rating: f32,
    pub types: Vec<String>,
    pub phone: String,
    pub is_open: bool,
    pub place_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_rating: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineStore {
    pub name: String,
    pub url: String,
    pub price_range: String,
    pub shipping: String,
    pub rating: f32,
}

/// Turn-by-turn route to a store. The fallback shape carries placeholder
/// addresses so clients always render something.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Directions {
    pub distance: String,
    pub duration: String,
    pub steps: Vec<String>,
    pub start_address: String,
    pub end_address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationSuggestions {
    pub nearby_shops: Vec<Shop>,
    pub online_alternatives: Vec<OnlineStore>,
    pub location: String,
    pub timestamp: String,
}

/// Style signals extracted from a text or voice query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub detected_styles: Vec<String>,
    pub detected_colors: Vec<String>,
    pub detected_room: String,
    pub original_query: String,
    pub context_enhanced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_query: Option<String>,
}

/// Last search turn for a user, merged into short follow-up queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchContext {
    pub query: String,
    pub parsed_query: ParsedQuery,
    pub location: Option<String>,
    pub query_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_sample: Option<String>,
    pub timestamp: String,
}

/// Append-only record of one completed request. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub room_analysis: Option<RoomAnalysis>,
    pub recommendations: Vec<Recommendation>,
    pub trend_insights: Option<TrendInsight>,
    pub location_suggestions: Option<LocationSuggestions>,
    pub final_reasoning: String,
    pub created_at: String,
}

/// Response envelope for the room-image flow. Failure keeps every field
/// present with empty defaults so callers never branch on shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub room_analysis: Option<RoomAnalysis>,
    pub recommendations: Vec<Recommendation>,
    pub trend_insights: Option<TrendInsight>,
    pub location_suggestions: Option<LocationSuggestions>,
    pub final_reasoning: String,
    pub session_id: Option<String>,
}

impl AnalysisResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            room_analysis: None,
            recommendations: Vec::new(),
            trend_insights: None,
            location_suggestions: None,
            final_reasoning: String::new(),
            session_id: None,
        }
    }
}

/// Response envelope for text and voice queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub query: String,
    pub parsed_query: Option<ParsedQuery>,
    pub recommendations: Vec<Recommendation>,
    pub trend_insights: Option<TrendInsight>,
    pub location_suggestions: Option<LocationSuggestions>,
    pub final_reasoning: String,
    pub context_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_apply_merges_only_set_fields() {
        let mut prefs = UserPreferences::default();
        prefs.apply(&PreferencesUpdate {
            aesthetic_style: Some("rustic".into()),
            max_price: Some(250.0),
            ..Default::default()
        });
        assert_eq!(prefs.aesthetic_style, "rustic");
        assert_eq!(prefs.max_price, 250.0);
        assert_eq!(prefs.room_type, "living_room");
        assert_eq!(prefs.preferred_colors.len(), 2);
    }

    #[test]
    fn failure_envelope_has_empty_defaults() {
        let resp = AnalysisResponse::failure("boom");
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("boom"));
        assert!(resp.recommendations.is_empty());
        assert!(resp.final_reasoning.is_empty());

        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("recommendations").is_some());
        assert!(json.get("trend_insights").is_some());
        assert!(json.get("location_suggestions").is_some());
    }
}
