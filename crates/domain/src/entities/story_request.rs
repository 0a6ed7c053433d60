//! Story request entity

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{AgeGroup, ChildName, LanguageCode, Theme, VoiceId};

/// A validated, immutable request for one story
///
/// Construction validates every field; once built a request cannot change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRequest {
    child_name: ChildName,
    age_group: AgeGroup,
    theme: Theme,
    voice_id: VoiceId,
    language: LanguageCode,
}

impl StoryRequest {
    /// Assemble a request from already-validated parts
    #[must_use]
    pub const fn new(
        child_name: ChildName,
        age_group: AgeGroup,
        theme: Theme,
        voice_id: VoiceId,
        language: LanguageCode,
    ) -> Self {
        Self {
            child_name,
            age_group,
            theme,
            voice_id,
            language,
        }
    }

    /// Validate raw form fields, stopping at the first invalid one
    ///
    /// # Examples
    ///
    /// ```
    /// use domain::{AgeGroup, StoryRequest};
    ///
    /// let request =
    ///     StoryRequest::parse("emma", "young", "Pirates & Treasure", "warm_female", "en").unwrap();
    /// assert_eq!(request.child_name().as_str(), "Emma");
    /// assert_eq!(request.age_group(), AgeGroup::Young);
    /// ```
    pub fn parse(
        child_name: &str,
        age_group: &str,
        theme: &str,
        voice_id: &str,
        language: &str,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            child_name: ChildName::new(child_name)?,
            age_group: age_group.parse()?,
            theme: Theme::new(theme)?,
            voice_id: VoiceId::new(voice_id)?,
            language: LanguageCode::new(language)?,
        })
    }

    pub const fn child_name(&self) -> &ChildName {
        &self.child_name
    }

    pub const fn age_group(&self) -> AgeGroup {
        self.age_group
    }

    pub const fn theme(&self) -> &Theme {
        &self.theme
    }

    pub const fn voice_id(&self) -> &VoiceId {
        &self.voice_id
    }

    pub const fn language(&self) -> LanguageCode {
        self.language
    }
}
