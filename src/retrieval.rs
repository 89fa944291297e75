// src/retrieval.rs
// Artwork catalog and personalized recommendation ranking.

use async_trait::async_trait;
use tracing::info;

use crate::agents::AgentError;
use crate::models::{Artwork, ParsedQuery, Recommendation, RoomAnalysis, UserPreferences};

/// Style signals driving a recommendation query: either a full room analysis
/// (image flow) or parsed query signals (text/voice flow).
#[derive(Debug, Clone, Copy)]
pub enum StyleSignals<'a> {
    Room(&'a RoomAnalysis),
    Query(&'a ParsedQuery),
}

impl StyleSignals<'_> {
    /// Primary detected style, lowercased. Falls back to the first token of a
    /// long style description ("modern minimalist interior design" -> "modern").
    pub fn detected_style(&self) -> Option<String> {
        match self {
            StyleSignals::Room(analysis) => analysis
                .aesthetic_style
                .style
                .split_whitespace()
                .next()
                .map(|s| s.to_lowercase()),
            StyleSignals::Query(parsed) => {
                parsed.detected_styles.first().map(|s| s.to_lowercase())
            }
        }
    }
}

#[async_trait]
pub trait ArtworkRetrieval: Send + Sync {
    async fn personalized_recommendations(
        &self,
        signals: StyleSignals<'_>,
        preferences: &UserPreferences,
        k: usize,
    ) -> Result<Vec<Recommendation>, AgentError>;

    /// Keyword search over title, description, and tags.
    fn search_by_keywords(&self, keywords: &[String], k: usize) -> Vec<Recommendation>;
}

/// Built-in artwork catalog with style/price filtering.
pub struct ArtworkCatalog {
    artworks: Vec<Artwork>,
}

impl ArtworkCatalog {
    pub fn new() -> Self {
        let catalog = Self {
            artworks: sample_catalog(),
        };
        info!("Loaded {} artworks into catalog", catalog.artworks.len());
        catalog
    }
}

impl Default for ArtworkCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtworkRetrieval for ArtworkCatalog {
    async fn personalized_recommendations(
        &self,
        signals: StyleSignals<'_>,
        preferences: &UserPreferences,
        k: usize,
    ) -> Result<Vec<Recommendation>, AgentError> {
        let detected = signals.detected_style();
        let preferred = preferences.aesthetic_style.to_lowercase();
        let max_price = preferences.max_price;
        info!(?detected, preferred, "Computing artwork recommendations");

        let mut matches: Vec<Recommendation> = self
            .artworks
            .iter()
            .filter_map(|artwork| {
                if artwork.price > max_price {
                    return None;
                }
                let style = artwork.style.to_lowercase();
                let detected_match = detected.as_deref().is_some_and(|d| style.contains(d));
                let preferred_match = style.contains(&preferred);
                if !detected_match && !preferred_match {
                    return None;
                }

                let style_label = detected.as_deref().unwrap_or(&preferred).to_string();
                Some(Recommendation {
                    artwork: artwork.clone(),
                    match_score: if detected_match { 0.9 } else { 0.75 },
                    reasoning: format!(
                        "Matches your {style_label} style and fits your budget"
                    ),
                })
            })
            .collect();

        // Budget-friendly first within the style matches
        matches.sort_by(|a, b| {
            a.artwork
                .price
                .partial_cmp(&b.artwork.price)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);
        Ok(matches)
    }

    fn search_by_keywords(&self, keywords: &[String], k: usize) -> Vec<Recommendation> {
        let keywords: Vec<String> = keywords.iter().map(|kw| kw.to_lowercase()).collect();

        self.artworks
            .iter()
            .filter(|artwork| {
                let title = artwork.title.to_lowercase();
                let description = artwork.description.to_lowercase();
                keywords.iter().any(|kw| {
                    title.contains(kw)
                        || description.contains(kw)
                        || artwork.tags.iter().any(|tag| tag.to_lowercase().contains(kw))
                })
            })
            .take(k)
            .map(|artwork| Recommendation {
                artwork: artwork.clone(),
                match_score: 1.0,
                reasoning: "Matches your search keywords".to_string(),
            })
            .collect()
    }
}

fn sample_catalog() -> Vec<Artwork> {
    vec![
        artwork(
            "art_001",
            "Abstract Modern Canvas",
            "Contemporary Artist",
            "modern",
            &["#2c3e50", "#3498db", "#e74c3c"],
            150.0,
            "24x36 inches",
            "Acrylic on Canvas",
            "Bold abstract composition with vibrant colors",
            "https://example.com/art1.jpg",
            &["abstract", "modern", "colorful", "contemporary"],
        ),
        artwork(
            "art_002",
            "Minimalist Landscape",
            "Nature Artist",
            "minimalist",
            &["#f8f9fa", "#6c757d", "#495057"],
            200.0,
            "30x40 inches",
            "Oil on Canvas",
            "Serene minimalist landscape with soft tones",
            "https://example.com/art2.jpg",
            &["minimalist", "landscape", "serene", "neutral"],
        ),
        artwork(
            "art_003",
            "Vintage Botanical Print",
            "Botanical Illustrator",
            "traditional",
            &["#28a745", "#6f42c1", "#fd7e14"],
            85.0,
            "18x24 inches",
            "Digital Print",
            "Classic botanical illustration with vintage charm",
            "https://example.com/art3.jpg",
            &["botanical", "vintage", "traditional", "nature"],
        ),
        artwork(
            "art_004",
            "Geometric Abstract",
            "Geometric Artist",
            "contemporary",
            &["#dc3545", "#ffc107", "#17a2b8"],
            120.0,
            "20x20 inches",
            "Mixed Media",
            "Bold geometric patterns with contrasting colors",
            "https://example.com/art4.jpg",
            &["geometric", "abstract", "bold", "contemporary"],
        ),
        artwork(
            "art_005",
            "Scandinavian Textile Art",
            "Nordic Designer",
            "scandinavian",
            &["#f8f9fa", "#343a40", "#007bff"],
            95.0,
            "16x20 inches",
            "Textile Art",
            "Clean Scandinavian design with natural textures",
            "https://example.com/art5.jpg",
            &["scandinavian", "textile", "clean", "natural"],
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn artwork(
    id: &str,
    title: &str,
    artist: &str,
    style: &str,
    colors: &[&str],
    price: f64,
    size: &str,
    medium: &str,
    description: &str,
    image_url: &str,
    tags: &[&str],
) -> Artwork {
    Artwork {
        id: id.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
        style: style.to_string(),
        colors: colors.iter().map(|c| c.to_string()).collect(),
        price,
        size: size.to_string(),
        medium: medium.to_string(),
        description: description.to_string(),
        image_url: image_url.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParsedQuery;

    fn parsed(styles: &[&str]) -> ParsedQuery {
        ParsedQuery {
            detected_styles: styles.iter().map(|s| s.to_string()).collect(),
            detected_room: "living_room".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn recommendations_filter_by_style_and_price() {
        let catalog = ArtworkCatalog::new();
        let query = parsed(&["modern"]);
        let prefs = UserPreferences {
            max_price: 160.0,
            ..Default::default()
        };

        let recs = catalog
            .personalized_recommendations(StyleSignals::Query(&query), &prefs, 5)
            .await
            .unwrap();

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].artwork.title, "Abstract Modern Canvas");
        assert!(recs[0].reasoning.contains("modern"));
        assert!(recs[0].match_score > 0.0);
    }

    #[tokio::test]
    async fn recommendations_are_price_sorted_and_capped() {
        let catalog = ArtworkCatalog::new();
        let query = parsed(&["scandinavian"]);
        let prefs = UserPreferences {
            aesthetic_style: "contemporary".to_string(),
            max_price: 500.0,
            ..Default::default()
        };

        let recs = catalog
            .personalized_recommendations(StyleSignals::Query(&query), &prefs, 1)
            .await
            .unwrap();

        // Scandinavian (95) beats contemporary (120) on price
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].artwork.id, "art_005");
    }

    #[tokio::test]
    async fn no_style_match_yields_empty_set() {
        let catalog = ArtworkCatalog::new();
        let query = parsed(&["baroque"]);
        let prefs = UserPreferences {
            aesthetic_style: "baroque".to_string(),
            ..Default::default()
        };
        let recs = catalog
            .personalized_recommendations(StyleSignals::Query(&query), &prefs, 5)
            .await
            .unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn keyword_search_scans_tags() {
        let catalog = ArtworkCatalog::new();
        let results = catalog.search_by_keywords(&["botanical".to_string()], 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].artwork.id, "art_003");
    }
}
