// src/agents/geo.rs

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::agents::{AgentError, GeoAgent};
use crate::models::{Directions, LocationSuggestions, OnlineStore, Shop, UserPreferences};

/// Nearby-store and online-alternative suggestions; stands in for the places
/// API integration.
pub struct GeoFinderAgent;

impl GeoFinderAgent {
    pub fn new() -> Self {
        info!("Geo agent initialized (mock mode)");
        Self
    }

    fn find_nearby_art_shops(&self, location: &str) -> Vec<Shop> {
        info!(location, "Finding nearby art shops");
        vec![
            shop(
                "Local Art Gallery",
                "123 Main Street, Your City",
                4.2,
                &["art_gallery", "store"],
                "(555) 123-4567",
                true,
                "place_1",
            ),
            shop(
                "Home Decor Store",
                "456 Oak Avenue, Your City",
                4.0,
                &["home_goods_store", "furniture_store"],
                "(555) 234-5678",
                true,
                "place_2",
            ),
            shop(
                "Modern Art Supply",
                "789 Pine Street, Your City",
                4.5,
                &["art_supply_store"],
                "(555) 345-6789",
                false,
                "place_3",
            ),
        ]
    }

    fn find_online_alternatives(&self, query: &str) -> Vec<OnlineStore> {
        vec![
            online(
                "Wayfair",
                &format!("https://www.wayfair.com/keyword.php?keyword={query}"),
                "$50-$500",
                "Free shipping on orders over $35",
                4.2,
            ),
            online(
                "Etsy",
                &format!("https://www.etsy.com/search?q={query}"),
                "$20-$200",
                "Varies by seller",
                4.5,
            ),
            online(
                "Amazon",
                &format!("https://www.amazon.com/s?k={query}"),
                "$15-$300",
                "Prime delivery available",
                4.0,
            ),
            online(
                "Society6",
                &format!("https://society6.com/search?q={query}"),
                "$25-$150",
                "Worldwide shipping",
                4.3,
            ),
        ]
    }

    /// Keep decor-relevant shops and rank by preference-adjusted rating.
    fn filter_shops_by_preferences(
        &self,
        shops: Vec<Shop>,
        preferences: &UserPreferences,
    ) -> Vec<Shop> {
        let mut filtered: Vec<Shop> = shops
            .into_iter()
            .filter(|shop| {
                let types = shop.types.join(" ").to_lowercase();
                ["art", "decor", "furniture", "interior"]
                    .iter()
                    .any(|kw| types.contains(kw))
            })
            .map(|mut shop| {
                shop.adjusted_rating = Some(adjust_rating_for_price(
                    shop.rating,
                    preferences.max_price,
                ));
                shop
            })
            .collect();

        filtered.sort_by(|a, b| {
            b.adjusted_rating
                .unwrap_or(0.0)
                .partial_cmp(&a.adjusted_rating.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        filtered
    }
}

impl Default for GeoFinderAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeoAgent for GeoFinderAgent {
    async fn location_recommendations(
        &self,
        location: &str,
        preferences: &UserPreferences,
    ) -> Result<LocationSuggestions, AgentError> {
        let nearby = self.find_nearby_art_shops(location);
        let mut filtered = self.filter_shops_by_preferences(nearby, preferences);
        filtered.truncate(5);

        let style = &preferences.aesthetic_style;
        let online_alternatives =
            self.find_online_alternatives(&format!("{style} wall art").replace(' ', "+"));

        Ok(LocationSuggestions {
            nearby_shops: filtered,
            online_alternatives,
            location: location.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        })
    }

    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        mode: &str,
    ) -> Result<Directions, AgentError> {
        info!(origin, destination, mode, "Getting directions");
        Ok(Directions {
            start_address: origin.to_string(),
            end_address: destination.to_string(),
            ..fallback_directions()
        })
    }
}

/// Route shape served when the directions provider is unavailable.
pub fn fallback_directions() -> Directions {
    Directions {
        distance: "2.5 miles".to_string(),
        duration: "8 minutes".to_string(),
        steps: vec![
            "Head north on Main Street".to_string(),
            "Turn right on Oak Avenue".to_string(),
            "Destination on the left".to_string(),
        ],
        start_address: "Your Location".to_string(),
        end_address: "Store Location".to_string(),
    }
}

/// Budget-driven nudge: boost ratings for budget shoppers, dampen for
/// shoppers with a high ceiling (pricier boutiques compete there anyway).
fn adjust_rating_for_price(rating: f32, max_price: f64) -> f32 {
    let adjustment = if max_price < 150.0 {
        0.1
    } else if max_price > 1000.0 {
        -0.1
    } else {
        0.0
    };
    (rating + adjustment).clamp(0.0, 5.0)
}

fn shop(
    name: &str,
    address: &str,
    rating: f32,
    types: &[&str],
    phone: &str,
    is_open: bool,
    place_id: &str,
) -> Shop {
    Shop {
        name: name.to_string(),
        address: address.to_string(),
        rating,
        types: types.iter().map(|t| t.to_string()).collect(),
        phone: phone.to_string(),
        is_open,
        place_id: place_id.to_string(),
        adjusted_rating: None,
    }
}

fn online(name: &str, url: &str, price_range: &str, shipping: &str, rating: f32) -> OnlineStore {
    OnlineStore {
        name: name.to_string(),
        url: url.to_string(),
        price_range: price_range.to_string(),
        shipping: shipping.to_string(),
        rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn suggestions_are_filtered_and_ranked() {
        let agent = GeoFinderAgent::new();
        let prefs = UserPreferences::default();

        let suggestions = agent
            .location_recommendations("Berlin", &prefs)
            .await
            .unwrap();

        assert_eq!(suggestions.location, "Berlin");
        assert!(!suggestions.nearby_shops.is_empty());
        assert_eq!(suggestions.online_alternatives.len(), 4);

        // Ranked descending by adjusted rating
        let ratings: Vec<f32> = suggestions
            .nearby_shops
            .iter()
            .filter_map(|s| s.adjusted_rating)
            .collect();
        assert!(ratings.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn budget_adjustment_is_bounded() {
        assert_eq!(adjust_rating_for_price(5.0, 100.0), 5.0);
        assert!(adjust_rating_for_price(4.0, 100.0) > 4.0);
        assert!(adjust_rating_for_price(4.0, 2000.0) < 4.0);
    }

    #[tokio::test]
    async fn directions_echo_the_requested_endpoints() {
        let agent = GeoFinderAgent::new();
        let directions = agent
            .directions("Alexanderplatz", "Local Art Gallery", "walking")
            .await
            .unwrap();

        assert_eq!(directions.start_address, "Alexanderplatz");
        assert_eq!(directions.end_address, "Local Art Gallery");
        assert!(!directions.steps.is_empty());

        let fallback = fallback_directions();
        assert_eq!(fallback.start_address, "Your Location");
        assert_eq!(fallback.end_address, "Store Location");
    }

    #[tokio::test]
    async fn online_query_embeds_preferred_style() {
        let agent = GeoFinderAgent::new();
        let prefs = UserPreferences {
            aesthetic_style: "rustic".to_string(),
            ..Default::default()
        };
        let suggestions = agent
            .location_recommendations("Oslo", &prefs)
            .await
            .unwrap();
        assert!(suggestions.online_alternatives[0].url.contains("rustic"));
    }
}
