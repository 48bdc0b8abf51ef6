//! Custom certificate designs generated from a student's description and color mood.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Name prefix shared by every generated design.
pub const DESIGN_NAME_PREFIX: &str = "ai_design_";

const DEFAULT_MOOD: &str = "vibrant";
const DEFAULT_STYLE: &str = "modern";

/// Fixed mood -> palette lookup. Unknown moods resolve to `vibrant`.
const MOOD_PALETTES: &[(&str, [&str; 5])] = &[
    ("vibrant", ["#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7"]),
    ("pastel", ["#FFB3BA", "#BAFFC9", "#BAE1FF", "#FFFFBA", "#FFDFBA"]),
    ("monochrome", ["#2C3E50", "#34495E", "#7F8C8D", "#BDC3C7", "#ECF0F1"]),
    ("gradient", ["#667eea", "#764ba2", "#f093fb", "#f5576c", "#4facfe"]),
    ("neon", ["#00FFF0", "#FF00FF", "#00FF00", "#FFFF00", "#FF0080"]),
    ("earthy", ["#8B4513", "#A0522D", "#CD853F", "#DEB887", "#F4A460"]),
];

/// Resolve the 5-color palette for a color mood.
pub fn palette_for_mood(mood: &str) -> Vec<String> {
    let colors = MOOD_PALETTES
        .iter()
        .find(|(name, _)| *name == mood)
        .or_else(|| MOOD_PALETTES.iter().find(|(name, _)| *name == DEFAULT_MOOD))
        .map_or(&MOOD_PALETTES[0].1, |(_, colors)| colors);

    colors.iter().map(|c| c.to_string()).collect()
}

/// A user-generated palette and metadata bundle, selectable as a certificate template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomDesign {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub style_preference: String,
    pub color_mood: String,
    pub color_palette: Vec<String>,
    pub created_at: String,
}

impl CustomDesign {
    /// Build a design from a request at the given local time.
    pub fn generate(request: &GenerateDesignRequest, now: DateTime<Local>) -> Self {
        let color_mood = request
            .color_mood
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MOOD.to_string());
        let style_preference = request
            .style_preference
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STYLE.to_string());

        Self {
            name: format!("{}{}", DESIGN_NAME_PREFIX, now.format("%Y%m%d_%H%M%S")),
            display_name: format!("AI Design {}", now.format("%H:%M")),
            description: request.design_description.trim().to_string(),
            style_preference,
            color_palette: palette_for_mood(&color_mood),
            color_mood,
            created_at: now.to_rfc3339(),
        }
    }
}

/// Request body for generating a custom design.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDesignRequest {
    #[serde(default)]
    pub design_description: String,
    #[serde(default)]
    pub style_preference: Option<String>,
    #[serde(default)]
    pub color_mood: Option<String>,
}
