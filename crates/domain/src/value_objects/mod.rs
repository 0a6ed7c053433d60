//! Value Objects - Immutable, identity-less domain primitives

mod age_group;
mod child_name;
mod identity;
mod language_code;
mod theme;
mod voice_id;

pub use age_group::{AgeGroup, DurationBand};
pub use child_name::{ChildName, MAX_CHILD_NAME_CHARS};
pub use identity::Identity;
pub use language_code::{LanguageCode, SUPPORTED_LANGUAGES};
pub use theme::{MAX_THEME_CHARS, PRESET_THEMES, Theme};
pub use voice_id::VoiceId;
