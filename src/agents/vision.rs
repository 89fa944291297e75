// src/agents/vision.rs

use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use tracing::info;

use crate::agents::{AgentError, VisionAgent};
use crate::models::{
    AestheticStyle, ColorSwatch, Detection, Detections, Lighting, RoomAnalysis,
};

pub const EMBEDDING_DIM: usize = 512;

const STYLE_DESCRIPTIONS: [&str; 8] = [
    "modern minimalist interior design",
    "traditional classic home decor",
    "scandinavian nordic style",
    "industrial loft aesthetic",
    "bohemian eclectic design",
    "contemporary luxury interior",
    "rustic farmhouse style",
    "mid-century modern design",
];

/// Deterministic stand-in for the pretrained detection/embedding models.
/// Produces stable, catalog-compatible outputs for any readable image.
pub struct VisionMatchAgent;

impl VisionMatchAgent {
    pub fn new() -> Self {
        info!("Vision agent initialized (mock mode)");
        Self
    }

    fn extract_color_palette(&self, _image_path: &Path) -> Vec<ColorSwatch> {
        vec![
            swatch([200, 180, 160], "#c8b4a0", 35.2),
            swatch([120, 100, 80], "#786450", 28.7),
            swatch([240, 230, 220], "#f0e6dc", 20.1),
            swatch([80, 60, 40], "#503c28", 12.3),
            swatch([160, 140, 120], "#a08c78", 3.7),
        ]
    }

    fn extract_style_embeddings(&self, _image_path: &Path) -> Vec<f32> {
        // Fixed-seed pseudo-random walk so repeated analyses of the same
        // image produce byte-identical embeddings.
        let mut state: u64 = 42;
        (0..EMBEDDING_DIM)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
                (unit * 2.0 - 1.0) as f32
            })
            .collect()
    }

    fn match_aesthetic_style(&self, _embedding: &[f32]) -> AestheticStyle {
        AestheticStyle {
            style: STYLE_DESCRIPTIONS[0].to_string(),
            confidence: 0.87,
            all_scores: vec![0.87, 0.65, 0.72, 0.58, 0.43, 0.69, 0.34, 0.61],
        }
    }
}

impl Default for VisionMatchAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisionAgent for VisionMatchAgent {
    async fn analyze_room(&self, image_path: &Path) -> Result<RoomAnalysis, AgentError> {
        info!("Starting room analysis for {}", image_path.display());

        let detections = self.detect_surfaces(image_path);
        let color_palette = self.extract_color_palette(image_path);
        let lighting = self.analyze_lighting(image_path);
        let style_embeddings = self.extract_style_embeddings(image_path);
        let aesthetic_style = self.match_aesthetic_style(&style_embeddings);

        Ok(RoomAnalysis {
            detections,
            color_palette,
            lighting,
            style_embeddings,
            aesthetic_style,
            timestamp: Utc::now().to_rfc3339(),
        })
    }

    fn detect_surfaces(&self, _image_path: &Path) -> Detections {
        Detections {
            walls: vec![Detection {
                class: 0,
                confidence: 0.95,
                bbox: [0, 0, 800, 600],
            }],
            windows: vec![Detection {
                class: 1,
                confidence: 0.87,
                bbox: [200, 100, 400, 300],
            }],
            furniture: vec![Detection {
                class: 2,
                confidence: 0.82,
                bbox: [100, 400, 300, 550],
            }],
            other: Vec::new(),
        }
    }

    fn analyze_lighting(&self, _image_path: &Path) -> Lighting {
        Lighting {
            mean_brightness: 125.5,
            std_brightness: 45.2,
            contrast: 45.2,
            condition: "moderate".to_string(),
        }
    }
}

fn swatch(rgb: [u8; 3], hex: &str, percentage: f32) -> ColorSwatch {
    ColorSwatch {
        rgb,
        hex: hex.to_string(),
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn analysis_has_expected_shape() {
        let agent = VisionMatchAgent::new();
        let result = agent.analyze_room(Path::new("room.jpg")).await.unwrap();

        assert_eq!(result.style_embeddings.len(), EMBEDDING_DIM);
        assert_eq!(result.color_palette.len(), 5);
        assert_eq!(result.color_palette[0].hex, "#c8b4a0");
        assert!(result.aesthetic_style.confidence > 0.0);
        assert!(!result.detections.walls.is_empty());
    }

    #[tokio::test]
    async fn embeddings_are_deterministic() {
        let agent = VisionMatchAgent::new();
        let a = agent.analyze_room(Path::new("room.jpg")).await.unwrap();
        let b = agent.analyze_room(Path::new("room.jpg")).await.unwrap();
        assert_eq!(a.style_embeddings, b.style_embeddings);
    }
}
