//! Story creation endpoint

use application::ApplicationError;
use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, header},
    response::{IntoResponse, Response},
};
use domain::{LanguageCode, StoryRequest};
use serde::Deserialize;
use tracing::{info, instrument};
use validator::Validate;

use super::catalog::CUSTOM_THEME;
use crate::{
    error::ApiError,
    middleware::{ClientIdentity, ValidatedJson},
    state::AppState,
};

pub const STORY_DURATION_HEADER: &str = "x-story-duration-seconds";
pub const QUOTA_REMAINING_HEADER: &str = "x-quota-remaining";

/// Story form submission
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStoryRequest {
    #[validate(length(min = 1, max = 100, message = "Please enter your child's name"))]
    pub child_name: String,

    #[validate(length(min = 1, max = 32, message = "Please choose an age group"))]
    pub age_group: String,

    #[validate(length(min = 1, max = 100, message = "Please choose a theme"))]
    pub theme: String,

    #[serde(default)]
    #[validate(length(max = 200, message = "Custom theme is too long"))]
    pub custom_theme: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Please choose a voice"))]
    pub voice: String,

    /// ISO 639-1 code; English when omitted
    #[serde(default)]
    pub language: Option<String>,
}

impl CreateStoryRequest {
    /// Resolve the custom theme choice and build the domain request
    fn into_story_request(self) -> Result<StoryRequest, ApplicationError> {
        let theme = if self.theme.trim().eq_ignore_ascii_case(CUSTOM_THEME) {
            self.custom_theme
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| {
                    ApplicationError::Validation(
                        "Please describe your custom theme".to_string(),
                    )
                })?
        } else {
            self.theme
        };

        let language = self
            .language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| LanguageCode::english().as_str().to_string());

        Ok(StoryRequest::parse(
            &self.child_name,
            &self.age_group,
            &theme,
            &self.voice,
            &language,
        )?)
    }
}

/// Generate and return one narrated story
#[instrument(skip_all, fields(identity = %identity))]
pub async fn create_story(
    State(state): State<AppState>,
    ClientIdentity(identity): ClientIdentity,
    ValidatedJson(body): ValidatedJson<CreateStoryRequest>,
) -> Result<Response, ApiError> {
    let request = body.into_story_request()?;
    let daily_limit = state.pipeline.daily_limit();

    let story = state
        .pipeline
        .generate(&request, &identity)
        .await
        .map_err(|e| ApiError::from(e).with_daily_limit(daily_limit))?;

    let artifact = story.artifact;
    info!(
        job_id = %story.job_id,
        bytes = artifact.size_bytes(),
        duration = %artifact.duration_label(),
        remaining = story.remaining_today,
        "Story delivered"
    );

    let pairs = [
        (header::CONTENT_TYPE, artifact.format.mime_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.file_name),
        ),
        (
            HeaderName::from_static(STORY_DURATION_HEADER),
            artifact.duration.as_secs().to_string(),
        ),
        (
            HeaderName::from_static(QUOTA_REMAINING_HEADER),
            story.remaining_today.to_string(),
        ),
    ];

    let mut response = artifact.audio.into_response();
    let headers = response.headers_mut();
    for (name, value) in pairs {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }

    Ok(response)
}
