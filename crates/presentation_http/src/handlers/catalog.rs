//! Story form options

use axum::{Json, extract::State};
use domain::{AgeGroup, LanguageCode, PRESET_THEMES};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct AgeGroupOption {
    pub id: &'static str,
    pub label: &'static str,
    /// Narration length, e.g. "8-12 minutes"
    pub duration: String,
    pub min_minutes: u64,
    pub max_minutes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceOption {
    pub id: String,
    pub label: String,
    /// Language codes; empty means every supported language
    pub languages: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageOption {
    pub code: &'static str,
    pub name: &'static str,
}

/// Everything the story form needs to render its pickers
#[derive(Debug, Clone, Serialize)]
pub struct CatalogResponse {
    pub age_groups: Vec<AgeGroupOption>,
    pub themes: Vec<&'static str>,
    /// Value of `theme` that enables `custom_theme`
    pub custom_theme: &'static str,
    pub voices: Vec<VoiceOption>,
    pub languages: Vec<LanguageOption>,
    pub daily_limit: u32,
}

pub const CUSTOM_THEME: &str = "Custom";

pub async fn get_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    let age_groups = AgeGroup::ALL
        .iter()
        .map(|group| {
            let band = group.duration_band();
            AgeGroupOption {
                id: group.as_str(),
                label: group.label(),
                duration: band.describe(),
                min_minutes: band.min.as_secs() / 60,
                max_minutes: band.max.as_secs() / 60,
            }
        })
        .collect();

    let voices = state
        .pipeline
        .catalog()
        .voices()
        .iter()
        .map(|voice| VoiceOption {
            id: voice.id.to_string(),
            label: voice.label.clone(),
            languages: voice.languages.iter().map(LanguageCode::as_str).collect(),
        })
        .collect();

    let languages = LanguageCode::all()
        .map(|lang| LanguageOption {
            code: lang.as_str(),
            name: lang.display_name(),
        })
        .collect();

    Json(CatalogResponse {
        age_groups,
        themes: PRESET_THEMES.to_vec(),
        custom_theme: CUSTOM_THEME,
        voices,
        languages,
        daily_limit: state.pipeline.daily_limit(),
    })
}
