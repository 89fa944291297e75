use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

use decor::agents::{
    fallback_insight, AgentError, GeoFinderAgent, TrendAgent, TrendIntelAgent, VisionAgent,
    VisionMatchAgent,
};
use decor::cache::invalidation::CacheInvalidationService;
use decor::cache::memory_cache::MemoryBackend;
use decor::cache::store::CacheStore;
use decor::cache::{cache_key, CacheDomain, TtlTable};
use decor::composer::ResultComposer;
use decor::models::{
    Detections, Lighting, PreferencesUpdate, RoomAnalysis, SearchContext, SessionRecord,
    TrendInsight, TrendItem, UserPreferences, UserProfile,
};
use decor::profile::{InMemoryProfileStore, ProfileStore, StoredSession};
use decor::retrieval::ArtworkCatalog;

/// Vision double that counts full analyses separately from the cheap
/// per-request passes, delegating the actual work to the built-in agent.
struct CountingVision {
    inner: VisionMatchAgent,
    full_analyses: AtomicUsize,
    cheap_passes: AtomicUsize,
}

impl CountingVision {
    fn new() -> Self {
        Self {
            inner: VisionMatchAgent::new(),
            full_analyses: AtomicUsize::new(0),
            cheap_passes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VisionAgent for CountingVision {
    async fn analyze_room(&self, image_path: &Path) -> Result<RoomAnalysis, AgentError> {
        self.full_analyses.fetch_add(1, Ordering::SeqCst);
        self.inner.analyze_room(image_path).await
    }

    fn detect_surfaces(&self, image_path: &Path) -> Detections {
        self.cheap_passes.fetch_add(1, Ordering::SeqCst);
        self.inner.detect_surfaces(image_path)
    }

    fn analyze_lighting(&self, image_path: &Path) -> Lighting {
        self.cheap_passes.fetch_add(1, Ordering::SeqCst);
        self.inner.analyze_lighting(image_path)
    }
}

struct FailingTrend;

#[async_trait]
impl TrendAgent for FailingTrend {
    async fn analyze_style_evolution(
        &self,
        _preferences: &UserPreferences,
    ) -> Result<TrendInsight, AgentError> {
        Err(AgentError::Upstream("trend service unreachable".into()))
    }

    async fn search_trending_styles(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> Result<Vec<TrendItem>, AgentError> {
        Err(AgentError::Upstream("trend service unreachable".into()))
    }
}

/// Profile store double counting session persists.
struct CountingProfiles {
    inner: InMemoryProfileStore,
    session_saves: AtomicUsize,
}

impl CountingProfiles {
    fn new() -> Self {
        Self {
            inner: InMemoryProfileStore::new(),
            session_saves: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProfileStore for CountingProfiles {
    async fn get_user_profile(&self, user_id: &str) -> Result<UserProfile, AgentError> {
        self.inner.get_user_profile(user_id).await
    }

    async fn update_preferences(
        &self,
        user_id: &str,
        update: &PreferencesUpdate,
    ) -> Result<UserProfile, AgentError> {
        self.inner.update_preferences(user_id, update).await
    }

    async fn save_session(&self, record: SessionRecord) -> Result<String, AgentError> {
        self.session_saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save_session(record).await
    }

    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredSession>, AgentError> {
        self.inner.recent_sessions(user_id, limit).await
    }

    async fn get_search_context(
        &self,
        user_id: &str,
    ) -> Result<Option<SearchContext>, AgentError> {
        self.inner.get_search_context(user_id).await
    }

    async fn save_search_context(
        &self,
        user_id: &str,
        context: SearchContext,
    ) -> Result<(), AgentError> {
        self.inner.save_search_context(user_id, context).await
    }
}

fn memory_store() -> Arc<CacheStore> {
    Arc::new(CacheStore::with_backend(
        Arc::new(MemoryBackend::new()),
        TtlTable::with_defaults(),
    ))
}

fn build_composer(
    store: Arc<CacheStore>,
    vision: Arc<dyn VisionAgent>,
    trend: Arc<dyn TrendAgent>,
    profiles: Arc<dyn ProfileStore>,
) -> ResultComposer {
    ResultComposer::new(
        Arc::clone(&store),
        Arc::new(CacheInvalidationService::new(store)),
        vision,
        trend,
        Arc::new(GeoFinderAgent::new()),
        Arc::new(ArtworkCatalog::new()),
        profiles,
        5,
    )
}

fn temp_image(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp image");
    file.write_all(content).expect("Failed to write temp image");
    file
}

#[tokio::test]
async fn whole_result_cache_short_circuits_the_pipeline() {
    let store = memory_store();
    let vision = Arc::new(CountingVision::new());
    let profiles = Arc::new(CountingProfiles::new());
    let composer = build_composer(
        Arc::clone(&store),
        vision.clone(),
        Arc::new(TrendIntelAgent::new()),
        profiles.clone(),
    );

    let image = temp_image(b"room photo bytes");

    let first = composer
        .process_room_analysis(image.path(), "alice", None)
        .await;
    assert!(first.success);
    assert_eq!(vision.full_analyses.load(Ordering::SeqCst), 1);
    assert_eq!(profiles.session_saves.load(Ordering::SeqCst), 1);

    // The reasoning names the detected style and the best catalog match.
    assert!(first.final_reasoning.contains("modern"));
    assert!(first.final_reasoning.contains("Abstract Modern Canvas"));

    // The persisted session is also cached under the user's session keys.
    assert!(!store.keys_matching("session_data:alice:*").await.is_empty());

    let second = composer
        .process_room_analysis(image.path(), "alice", None)
        .await;
    assert!(second.success);
    assert_eq!(second.final_reasoning, first.final_reasoning);

    // Served entirely from cache: no new analysis, no second session.
    assert_eq!(vision.full_analyses.load(Ordering::SeqCst), 1);
    assert_eq!(profiles.session_saves.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn warm_components_skip_the_full_vision_analysis() {
    let store = memory_store();
    let vision = Arc::new(CountingVision::new());
    let composer = build_composer(
        Arc::clone(&store),
        vision.clone(),
        Arc::new(TrendIntelAgent::new()),
        Arc::new(InMemoryProfileStore::new()),
    );

    let image = temp_image(b"another room");

    let first = composer
        .process_room_analysis(image.path(), "bob", None)
        .await;
    assert!(first.success);
    assert_eq!(vision.full_analyses.load(Ordering::SeqCst), 1);
    assert_eq!(vision.cheap_passes.load(Ordering::SeqCst), 0);

    // Drop the whole-result entry; the per-image components stay warm.
    for key in store.keys_matching("room_analysis:*").await {
        store.delete(&key).await;
    }

    let second = composer
        .process_room_analysis(image.path(), "bob", None)
        .await;
    assert!(second.success);

    // Synthesized from cached embedding + palette: only the cheap passes ran.
    assert_eq!(vision.full_analyses.load(Ordering::SeqCst), 1);
    assert_eq!(vision.cheap_passes.load(Ordering::SeqCst), 2);

    let analysis = second.room_analysis.expect("analysis present");
    assert_eq!(analysis.color_palette.len(), 5);
    assert!(!analysis.style_embeddings.is_empty());
}

#[tokio::test]
async fn trend_failure_degrades_to_fallback_insight() {
    let composer = build_composer(
        memory_store(),
        Arc::new(VisionMatchAgent::new()),
        Arc::new(FailingTrend),
        Arc::new(InMemoryProfileStore::new()),
    );

    let response = composer
        .process_text_query("modern wall art for my living room", "carol", None)
        .await;

    assert!(response.success);
    assert!(response.error.is_none());
    let insight = response.trend_insights.expect("fallback insight present");
    assert_eq!(
        insight.evolution_insights,
        fallback_insight().evolution_insights
    );
}

#[tokio::test]
async fn query_reasoning_names_the_best_catalog_match() {
    let composer = build_composer(
        memory_store(),
        Arc::new(VisionMatchAgent::new()),
        Arc::new(TrendIntelAgent::new()),
        Arc::new(InMemoryProfileStore::new()),
    );

    let response = composer
        .process_text_query("scandinavian prints for the bedroom", "dave", None)
        .await;

    assert!(response.success);
    let parsed = response.parsed_query.expect("parsed query present");
    assert_eq!(parsed.detected_styles, vec!["scandinavian"]);
    assert_eq!(parsed.detected_room, "bedroom");
    assert!(response
        .final_reasoning
        .contains("Scandinavian Textile Art"));
}

#[tokio::test]
async fn follow_up_query_inherits_previous_styles() {
    let composer = build_composer(
        memory_store(),
        Arc::new(VisionMatchAgent::new()),
        Arc::new(TrendIntelAgent::new()),
        Arc::new(InMemoryProfileStore::new()),
    );

    composer
        .process_text_query("rustic farmhouse art for my kitchen", "erin", None)
        .await;

    let follow_up = composer.process_text_query("anything cheaper", "erin", None).await;
    assert!(follow_up.context_used);
    let parsed = follow_up.parsed_query.expect("parsed query present");
    assert!(parsed.context_enhanced);
    assert_eq!(parsed.detected_styles, vec!["rustic"]);
    assert_eq!(parsed.detected_room, "kitchen");
    assert!(follow_up
        .context_summary
        .expect("summary present")
        .contains("rustic farmhouse art"));
}

#[tokio::test]
async fn preference_update_drops_cached_entries() {
    let store = memory_store();
    let composer = build_composer(
        Arc::clone(&store),
        Arc::new(VisionMatchAgent::new()),
        Arc::new(TrendIntelAgent::new()),
        Arc::new(InMemoryProfileStore::new()),
    );

    let image = temp_image(b"frank's room");
    let response = composer
        .process_room_analysis(image.path(), "frank", None)
        .await;
    assert!(response.success);

    let prefs_key = cache_key(CacheDomain::UserPreferences, &["frank"]);
    assert!(store.exists(&prefs_key).await);
    assert!(!store
        .keys_matching("artwork_recommendations:*frank*")
        .await
        .is_empty());

    let updated = composer
        .update_user_preferences(
            "frank",
            &PreferencesUpdate {
                aesthetic_style: Some("rustic".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(updated);

    // The stale preference and recommendation entries are gone; the next
    // request recomputes from the merged profile.
    assert!(!store.exists(&prefs_key).await);
    assert!(store
        .keys_matching("artwork_recommendations:*frank*")
        .await
        .is_empty());
}
