// src/composer/mod.rs
// The result composer: multi-stage pipeline turning a room image or a text
// query into a complete recommendation response. Each stage checks its cache
// domain first, and stage failures degrade to documented fallbacks rather
// than failing the request.

pub mod query_parser;
pub mod reasoning;

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::agents::{fallback_insight, GeoAgent, TrendAgent, VisionAgent};
use crate::cache::invalidation::CacheInvalidationService;
use crate::cache::store::CacheStore;
use crate::cache::{cache_key, CacheDomain};
use crate::models::{
    AestheticStyle, AnalysisResponse, ColorSwatch, LocationSuggestions, PreferencesUpdate,
    QueryResponse, Recommendation, RoomAnalysis, SearchContext, SessionRecord, TrendInsight,
    UserPreferences,
};
use crate::profile::ProfileStore;
use crate::retrieval::{ArtworkRetrieval, StyleSignals};

/// Voice transcription is stubbed in this deployment; the hosted audio model
/// sits behind the same interface.
const TRANSCRIPTION_STUB: &str = "I need modern wall art for my living room";

/// How much of a voice payload is kept in the search context for reference.
const AUDIO_SAMPLE_CHARS: usize = 100;

pub struct ResultComposer {
    cache: Arc<CacheStore>,
    invalidation: Arc<CacheInvalidationService>,
    vision: Arc<dyn VisionAgent>,
    trend: Arc<dyn TrendAgent>,
    geo: Arc<dyn GeoAgent>,
    retrieval: Arc<dyn ArtworkRetrieval>,
    profiles: Arc<dyn ProfileStore>,
    page_size: usize,
}

impl ResultComposer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cache: Arc<CacheStore>,
        invalidation: Arc<CacheInvalidationService>,
        vision: Arc<dyn VisionAgent>,
        trend: Arc<dyn TrendAgent>,
        geo: Arc<dyn GeoAgent>,
        retrieval: Arc<dyn ArtworkRetrieval>,
        profiles: Arc<dyn ProfileStore>,
        page_size: usize,
    ) -> Self {
        Self {
            cache,
            invalidation,
            vision,
            trend,
            geo,
            retrieval,
            profiles,
            page_size,
        }
    }

    /// Full room-image pipeline. Errors escaping the vision stage are the
    /// only ones that fail the request; everything downstream degrades.
    pub async fn process_room_analysis(
        &self,
        image_path: &Path,
        user_id: &str,
        location: Option<&str>,
    ) -> AnalysisResponse {
        match self.run_room_analysis(image_path, user_id, location).await {
            Ok(response) => response,
            Err(e) => {
                error!(user_id, "Room analysis failed: {e}");
                AnalysisResponse::failure(e.to_string())
            }
        }
    }

    pub async fn process_text_query(
        &self,
        query: &str,
        user_id: &str,
        location: Option<&str>,
    ) -> QueryResponse {
        self.run_query(query, user_id, location, "text", None).await
    }

    pub async fn process_voice_query(
        &self,
        audio_data: &str,
        user_id: &str,
        location: Option<&str>,
    ) -> QueryResponse {
        let sample: String = audio_data.chars().take(AUDIO_SAMPLE_CHARS).collect();
        let sample = if sample.len() < audio_data.len() {
            format!("{sample}...")
        } else {
            sample
        };
        self.run_query(TRANSCRIPTION_STUB, user_id, location, "voice", Some(sample))
            .await
    }

    /// Merge-write preferences, then drop the cached preference entry and the
    /// user's recommendation entries so the next read recomputes.
    pub async fn update_user_preferences(
        &self,
        user_id: &str,
        update: &PreferencesUpdate,
    ) -> bool {
        match self.profiles.update_preferences(user_id, update).await {
            Ok(_) => {
                self.invalidation
                    .invalidate_exact(CacheDomain::UserPreferences, &[user_id])
                    .await;
                let removed = self
                    .invalidation
                    .invalidate_user(user_id, Some(&[CacheDomain::ArtworkRecommendations]))
                    .await;
                debug!(user_id, removed, "Invalidated caches after preference update");
                true
            }
            Err(e) => {
                error!(user_id, "Preference update failed: {e}");
                false
            }
        }
    }

    async fn run_room_analysis(
        &self,
        image_path: &Path,
        user_id: &str,
        location: Option<&str>,
    ) -> Result<AnalysisResponse, crate::agents::AgentError> {
        let image_hash = self.hash_image(image_path).await;

        let whole_key = cache_key(CacheDomain::RoomAnalysis, &[&image_hash, user_id]);
        if let Some(cached) = self.cache.get::<AnalysisResponse>(&whole_key).await {
            info!(user_id, "Returning cached room analysis result");
            return Ok(cached);
        }
        info!(user_id, "Cache miss, running full analysis pipeline");

        let room_analysis = self.vision_stage(image_path, &image_hash).await?;
        let preferences = self.preferences_stage(user_id).await;

        let (recommendations, trend_insights, location_suggestions) = tokio::join!(
            self.recommendations_stage(user_id, StyleSignals::Room(&room_analysis), &preferences),
            self.trend_stage(&preferences),
            self.location_stage(location, &preferences),
        );

        let final_reasoning =
            reasoning::room_analysis_reasoning(&room_analysis, &recommendations, &trend_insights);

        // Session persistence is best-effort: a storage failure is logged and
        // the response ships without a session id.
        let record = SessionRecord {
            user_id: user_id.to_string(),
            room_analysis: Some(room_analysis.clone()),
            recommendations: recommendations.clone(),
            trend_insights: Some(trend_insights.clone()),
            location_suggestions: location_suggestions.clone(),
            final_reasoning: final_reasoning.clone(),
            created_at: Utc::now().to_rfc3339(),
        };
        let session_id = match self.profiles.save_session(record.clone()).await {
            Ok(id) => {
                let session_key = cache_key(CacheDomain::SessionData, &[user_id, &id]);
                let ttl = self.cache.ttl_for(CacheDomain::SessionData);
                self.cache.set(&session_key, &record, Some(ttl)).await;
                Some(id)
            }
            Err(e) => {
                warn!(user_id, "Failed to persist session: {e}");
                None
            }
        };

        let response = AnalysisResponse {
            success: true,
            error: None,
            room_analysis: Some(room_analysis),
            recommendations,
            trend_insights: Some(trend_insights),
            location_suggestions,
            final_reasoning,
            session_id,
        };

        let ttl = self.cache.ttl_for(CacheDomain::RoomAnalysis);
        self.cache.set(&whole_key, &response, Some(ttl)).await;

        Ok(response)
    }

    async fn run_query(
        &self,
        query: &str,
        user_id: &str,
        location: Option<&str>,
        query_type: &str,
        audio_sample: Option<String>,
    ) -> QueryResponse {
        info!(user_id, query_type, "Processing query");

        let preferences = self.preferences_stage(user_id).await;

        let previous = match self.profiles.get_search_context(user_id).await {
            Ok(context) => context,
            Err(e) => {
                warn!(user_id, "Search context lookup failed: {e}");
                None
            }
        };

        let mut parsed = query_parser::parse_text_query(query);
        if let Some(context) = &previous {
            parsed = query_parser::merge_with_context(parsed, context, query);
            info!(user_id, "Enhanced query with previous search context");
        }

        let (recommendations, trend_insights, location_suggestions) = tokio::join!(
            self.query_recommendations(StyleSignals::Query(&parsed), &preferences),
            self.trend_stage(&preferences),
            self.location_stage(location, &preferences),
        );

        let final_reasoning =
            reasoning::query_reasoning(query, &recommendations, &trend_insights, previous.as_ref());

        let context = SearchContext {
            query: query.to_string(),
            parsed_query: parsed.clone(),
            location: location.map(|l| l.to_string()),
            query_type: query_type.to_string(),
            audio_sample,
            timestamp: Utc::now().to_rfc3339(),
        };
        if let Err(e) = self.profiles.save_search_context(user_id, context).await {
            warn!(user_id, "Failed to save search context: {e}");
        }

        let context_summary = previous.as_ref().map(query_parser::context_summary);

        QueryResponse {
            success: true,
            error: None,
            query: query.to_string(),
            parsed_query: Some(parsed),
            recommendations,
            trend_insights: Some(trend_insights),
            location_suggestions,
            final_reasoning,
            context_used: previous.is_some(),
            context_summary,
        }
    }

    /// Content hash of the image, falling back to a hash of the path string
    /// when the file cannot be read.
    async fn hash_image(&self, image_path: &Path) -> String {
        match tokio::fs::read(image_path).await {
            Ok(bytes) => format!("{:016x}", seahash::hash(&bytes)),
            Err(e) => {
                warn!(path = %image_path.display(), "Hashing path instead of content: {e}");
                format!(
                    "{:016x}",
                    seahash::hash(image_path.to_string_lossy().as_bytes())
                )
            }
        }
    }

    /// Vision analysis with component caching. When both the embedding and
    /// the palette are warm, the full analysis never runs: only the cheap
    /// detections and lighting passes are recomputed.
    async fn vision_stage(
        &self,
        image_path: &Path,
        image_hash: &str,
    ) -> Result<RoomAnalysis, crate::agents::AgentError> {
        let embeddings_key = cache_key(CacheDomain::StyleEmbeddings, &[image_hash]);
        let palette_key = cache_key(CacheDomain::ColorPalette, &[image_hash]);

        let cached_embeddings = self.cache.get::<Vec<f32>>(&embeddings_key).await;
        let cached_palette = self.cache.get::<Vec<ColorSwatch>>(&palette_key).await;

        if let (Some(style_embeddings), Some(color_palette)) = (cached_embeddings, cached_palette) {
            info!("Reusing cached vision components");
            return Ok(RoomAnalysis {
                detections: self.vision.detect_surfaces(image_path),
                color_palette,
                lighting: self.vision.analyze_lighting(image_path),
                style_embeddings,
                aesthetic_style: AestheticStyle {
                    style: "modern".to_string(),
                    confidence: 0.8,
                    all_scores: Vec::new(),
                },
                timestamp: Utc::now().to_rfc3339(),
            });
        }

        info!("Performing full vision analysis");
        let analysis = self.vision.analyze_room(image_path).await?;

        if !analysis.style_embeddings.is_empty() {
            let ttl = self.cache.ttl_for(CacheDomain::StyleEmbeddings);
            self.cache
                .set(&embeddings_key, &analysis.style_embeddings, Some(ttl))
                .await;
        }
        if !analysis.color_palette.is_empty() {
            let ttl = self.cache.ttl_for(CacheDomain::ColorPalette);
            self.cache
                .set(&palette_key, &analysis.color_palette, Some(ttl))
                .await;
        }

        Ok(analysis)
    }

    async fn preferences_stage(&self, user_id: &str) -> UserPreferences {
        let key = cache_key(CacheDomain::UserPreferences, &[user_id]);
        if let Some(preferences) = self.cache.get::<UserPreferences>(&key).await {
            debug!(user_id, "Using cached user preferences");
            return preferences;
        }

        match self.profiles.get_user_profile(user_id).await {
            Ok(profile) => {
                let ttl = self.cache.ttl_for(CacheDomain::UserPreferences);
                self.cache.set(&key, &profile.preferences, Some(ttl)).await;
                profile.preferences
            }
            Err(e) => {
                warn!(user_id, "Profile lookup failed, using default preferences: {e}");
                UserPreferences::default()
            }
        }
    }

    /// Image-flow recommendations, cached per (user, preferred style).
    async fn recommendations_stage(
        &self,
        user_id: &str,
        signals: StyleSignals<'_>,
        preferences: &UserPreferences,
    ) -> Vec<Recommendation> {
        let key = cache_key(
            CacheDomain::ArtworkRecommendations,
            &[user_id, &preferences.aesthetic_style],
        );
        if let Some(recommendations) = self.cache.get::<Vec<Recommendation>>(&key).await {
            info!(user_id, "Using cached artwork recommendations");
            return recommendations;
        }

        match self
            .retrieval
            .personalized_recommendations(signals, preferences, self.page_size)
            .await
        {
            Ok(recommendations) => {
                let ttl = self.cache.ttl_for(CacheDomain::ArtworkRecommendations);
                self.cache.set(&key, &recommendations, Some(ttl)).await;
                recommendations
            }
            Err(e) => {
                warn!(user_id, "Recommendation retrieval failed: {e}");
                Vec::new()
            }
        }
    }

    /// Query-flow recommendations are never cached: the parsed signals vary
    /// per query text, so a (user, style) key would serve stale mixes.
    async fn query_recommendations(
        &self,
        signals: StyleSignals<'_>,
        preferences: &UserPreferences,
    ) -> Vec<Recommendation> {
        match self
            .retrieval
            .personalized_recommendations(signals, preferences, self.page_size)
            .await
        {
            Ok(recommendations) => recommendations,
            Err(e) => {
                warn!("Recommendation retrieval failed: {e}");
                Vec::new()
            }
        }
    }

    async fn trend_stage(&self, preferences: &UserPreferences) -> TrendInsight {
        let topic = format!("style_evolution_{}", preferences.aesthetic_style);
        let key = cache_key(CacheDomain::TrendData, &[&topic]);
        if let Some(insight) = self.cache.get::<TrendInsight>(&key).await {
            debug!(%topic, "Using cached trend insights");
            return insight;
        }

        match self.trend.analyze_style_evolution(preferences).await {
            Ok(insight) => {
                let ttl = self.cache.ttl_for(CacheDomain::TrendData);
                self.cache.set(&key, &insight, Some(ttl)).await;
                insight
            }
            Err(e) => {
                warn!("Trend analysis failed, serving fallback insight: {e}");
                fallback_insight()
            }
        }
    }

    async fn location_stage(
        &self,
        location: Option<&str>,
        preferences: &UserPreferences,
    ) -> Option<LocationSuggestions> {
        let location = location?;

        let key = cache_key(CacheDomain::LocationData, &[location]);
        if let Some(suggestions) = self.cache.get::<LocationSuggestions>(&key).await {
            debug!(location, "Using cached location suggestions");
            return Some(suggestions);
        }

        match self.geo.location_recommendations(location, preferences).await {
            Ok(suggestions) => {
                let ttl = self.cache.ttl_for(CacheDomain::LocationData);
                self.cache.set(&key, &suggestions, Some(ttl)).await;
                Some(suggestions)
            }
            Err(e) => {
                warn!(location, "Location lookup failed: {e}");
                Some(LocationSuggestions {
                    location: location.to_string(),
                    ..Default::default()
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{GeoFinderAgent, TrendIntelAgent, VisionMatchAgent};
    use crate::profile::InMemoryProfileStore;
    use crate::retrieval::ArtworkCatalog;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn composer_with_disabled_cache() -> ResultComposer {
        let store = Arc::new(CacheStore::disabled());
        ResultComposer::new(
            Arc::clone(&store),
            Arc::new(CacheInvalidationService::new(store)),
            Arc::new(VisionMatchAgent::new()),
            Arc::new(TrendIntelAgent::new()),
            Arc::new(GeoFinderAgent::new()),
            Arc::new(ArtworkCatalog::new()),
            Arc::new(InMemoryProfileStore::new()),
            5,
        )
    }

    #[tokio::test]
    async fn image_flow_produces_complete_response() {
        let composer = composer_with_disabled_cache();
        let mut image = NamedTempFile::new().unwrap();
        image.write_all(b"not a real jpeg, content only matters for hashing").unwrap();

        let response = composer
            .process_room_analysis(image.path(), "user_1", Some("Amsterdam"))
            .await;

        assert!(response.success);
        assert!(response.room_analysis.is_some());
        assert!(!response.final_reasoning.is_empty());
        assert!(response.session_id.is_some());
        assert!(response.location_suggestions.is_some());
    }

    #[tokio::test]
    async fn text_flow_saves_context_for_next_turn() {
        let composer = composer_with_disabled_cache();

        let first = composer
            .process_text_query("modern wall art for my living room", "user_2", None)
            .await;
        assert!(first.success);
        assert!(!first.context_used);

        let second = composer.process_text_query("something cheaper", "user_2", None).await;
        assert!(second.context_used);
        let parsed = second.parsed_query.unwrap();
        assert!(parsed.context_enhanced);
        assert_eq!(parsed.detected_styles, vec!["modern"]);
        assert!(second.context_summary.unwrap().contains("modern wall art"));
    }

    #[tokio::test]
    async fn voice_flow_uses_stub_transcription() {
        let composer = composer_with_disabled_cache();
        let response = composer.process_voice_query("base64audio", "user_3", None).await;
        assert!(response.success);
        assert_eq!(response.query, TRANSCRIPTION_STUB);
    }

    #[tokio::test]
    async fn preference_update_reports_success() {
        let composer = composer_with_disabled_cache();
        let ok = composer
            .update_user_preferences(
                "user_4",
                &PreferencesUpdate {
                    aesthetic_style: Some("rustic".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(ok);
    }
}
