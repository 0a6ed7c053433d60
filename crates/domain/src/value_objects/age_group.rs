//! Age group value object and its narration profile

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Listening-time band expected for an age group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationBand {
    /// Shortest acceptable narration
    pub min: Duration,
    /// Longest acceptable narration
    pub max: Duration,
}

impl DurationBand {
    /// Build a band from whole minutes
    #[must_use]
    pub const fn minutes(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_secs(min * 60),
            max: Duration::from_secs(max * 60),
        }
    }

    /// Whether the duration lies inside the band (inclusive)
    #[must_use]
    pub fn contains(&self, duration: Duration) -> bool {
        duration >= self.min && duration <= self.max
    }

    /// Human readable form, e.g. "8-12 minutes"
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "{}-{} minutes",
            self.min.as_secs() / 60,
            self.max.as_secs() / 60
        )
    }
}

/// Age group of the listener; drives story length and style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    /// Ages 2-3
    Toddler,
    /// Ages 3-5
    Young,
    /// Ages 5-7
    Middle,
    /// Ages 7 and up
    Preteen,
}

impl AgeGroup {
    /// All age groups, youngest first
    pub const ALL: [Self; 4] = [Self::Toddler, Self::Young, Self::Middle, Self::Preteen];

    /// Display label shown to parents
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Toddler => "Toddler (2-3)",
            Self::Young => "Preschool (3-5)",
            Self::Middle => "Early Reader (5-7)",
            Self::Preteen => "Older Kids (7+)",
        }
    }

    /// Approximate story length the generator is asked for
    #[must_use]
    pub const fn target_words(&self) -> u32 {
        match self {
            Self::Toddler => 850,
            Self::Young => 1300,
            Self::Middle => 1750,
            Self::Preteen => 2250,
        }
    }

    /// Expected listening time of the finished audio
    #[must_use]
    pub const fn duration_band(&self) -> DurationBand {
        match self {
            Self::Toddler => DurationBand::minutes(5, 8),
            Self::Young => DurationBand::minutes(8, 12),
            Self::Middle => DurationBand::minutes(12, 15),
            Self::Preteen => DurationBand::minutes(15, 20),
        }
    }

    /// Writing style guidance for the generator
    #[must_use]
    pub const fn style(&self) -> &'static str {
        match self {
            Self::Toddler => {
                "very simple sentences, lots of repetition, familiar objects and animals, \
                 gentle and reassuring tone"
            },
            Self::Young => {
                "short paragraphs, a basic adventure with a happy resolution, simple dialogue, \
                 colorful descriptions"
            },
            Self::Middle => {
                "light dialogue between characters, simple problem-solving, positive messages, \
                 mild excitement with a calm ending"
            },
            Self::Preteen => {
                "a fuller narrative arc, character development, gentle life lessons, an \
                 engaging plot with a satisfying resolution"
            },
        }
    }

    /// Stable key used in requests and configuration
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Toddler => "toddler",
            Self::Young => "young",
            Self::Middle => "middle",
            Self::Preteen => "preteen",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "toddler" => Ok(Self::Toddler),
            "young" | "preschool" => Ok(Self::Young),
            "middle" | "early_reader" => Ok(Self::Middle),
            "preteen" | "older_kids" => Ok(Self::Preteen),
            _ => Err(DomainError::InvalidAgeGroup(format!(
                "'{s}' is not one of toddler, young, middle, preteen"
            ))),
        }
    }
}
