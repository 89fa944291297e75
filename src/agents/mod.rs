// src/agents/mod.rs
// Collaborator seams for the composition pipeline. Each agent is a shared,
// stateless singleton injected into the composer at startup; request data
// flows only through arguments and return values.

pub mod geo;
pub mod trend;
pub mod vision;

pub use geo::{fallback_directions, GeoFinderAgent};
pub use trend::{fallback_insight, TrendIntelAgent};
pub use vision::VisionMatchAgent;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::models::{
    Detections, Directions, Lighting, LocationSuggestions, RoomAnalysis, TrendInsight, TrendItem,
    UserPreferences,
};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("image not readable: {0}")]
    ImageUnreadable(String),
    #[error("model inference failed: {0}")]
    Inference(String),
    #[error("upstream service failed: {0}")]
    Upstream(String),
    #[error("storage failed: {0}")]
    Storage(String),
}

#[async_trait]
pub trait VisionAgent: Send + Sync {
    /// Full room analysis: detections, palette, lighting, embedding, style.
    async fn analyze_room(&self, image_path: &Path) -> Result<RoomAnalysis, AgentError>;

    /// Cheap per-request fields, recomputed when the expensive components
    /// (embedding, palette) are served from cache.
    fn detect_surfaces(&self, image_path: &Path) -> Detections;
    fn analyze_lighting(&self, image_path: &Path) -> Lighting;
}

#[async_trait]
pub trait TrendAgent: Send + Sync {
    async fn analyze_style_evolution(
        &self,
        preferences: &UserPreferences,
    ) -> Result<TrendInsight, AgentError>;

    async fn search_trending_styles(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<TrendItem>, AgentError>;
}

#[async_trait]
pub trait GeoAgent: Send + Sync {
    async fn location_recommendations(
        &self,
        location: &str,
        preferences: &UserPreferences,
    ) -> Result<LocationSuggestions, AgentError>;

    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        mode: &str,
    ) -> Result<Directions, AgentError>;
}
