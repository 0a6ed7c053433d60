//! Story pipeline stages

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a failed story request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    QuotaExceeded,
    /// Text or speech provider unavailable after retries
    Provider,
    /// Generator refused the content
    ContentPolicy,
    /// A chunk could not be synthesized
    Synthesis,
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Provider => "provider",
            Self::ContentPolicy => "content_policy",
            Self::Synthesis => "synthesis",
            Self::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// Position of a request in the story pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Checking the request against the catalog
    Validating,
    /// Reserving a daily quota slot
    QuotaCheck,
    /// Generating story text
    Composing,
    /// Turning text into audio
    Synthesizing,
    /// Releasing temporary resources
    Cleanup,
    /// Artifact handed back
    Done,
    /// Stopped with an error
    Failed(FailureKind),
}

impl PipelineStage {
    /// Check if the stage indicates completion
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    /// Whether `next` may follow this stage
    ///
    /// Stages advance strictly in order. Work stages may jump to cleanup when
    /// they fail, and any non-terminal stage may end as failed.
    #[must_use]
    pub const fn can_advance_to(&self, next: &Self) -> bool {
        matches!(
            (self, next),
            (Self::Validating, Self::QuotaCheck)
                | (Self::QuotaCheck, Self::Composing)
                | (Self::Composing, Self::Synthesizing)
                | (
                    Self::QuotaCheck | Self::Composing | Self::Synthesizing,
                    Self::Cleanup
                )
                | (Self::Cleanup, Self::Done)
                | (
                    Self::Validating
                        | Self::QuotaCheck
                        | Self::Composing
                        | Self::Synthesizing
                        | Self::Cleanup,
                    Self::Failed(_)
                )
        )
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validating => write!(f, "validating"),
            Self::QuotaCheck => write!(f, "quota_check"),
            Self::Composing => write!(f, "composing"),
            Self::Synthesizing => write!(f, "synthesizing"),
            Self::Cleanup => write!(f, "cleanup"),
            Self::Done => write!(f, "done"),
            Self::Failed(kind) => write!(f, "failed({kind})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_order() {
        let path = [
            PipelineStage::Validating,
            PipelineStage::QuotaCheck,
            PipelineStage::Composing,
            PipelineStage::Synthesizing,
            PipelineStage::Cleanup,
            PipelineStage::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(&pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn stages_cannot_be_skipped() {
        assert!(!PipelineStage::Validating.can_advance_to(&PipelineStage::Composing));
        assert!(!PipelineStage::QuotaCheck.can_advance_to(&PipelineStage::Done));
    }

    #[test]
    fn terminal_stages_are_final() {
        let failed = PipelineStage::Failed(FailureKind::Synthesis);
        assert!(failed.is_terminal());
        assert!(PipelineStage::Done.is_terminal());
        assert!(!failed.can_advance_to(&PipelineStage::Cleanup));
        assert!(!PipelineStage::Done.can_advance_to(&failed));
    }

    #[test]
    fn any_active_stage_can_fail() {
        let failed = PipelineStage::Failed(FailureKind::Provider);
        assert!(PipelineStage::Validating.can_advance_to(&failed));
        assert!(PipelineStage::Synthesizing.can_advance_to(&failed));
    }

    #[test]
    fn failed_work_still_cleans_up() {
        assert!(PipelineStage::Composing.can_advance_to(&PipelineStage::Cleanup));
        assert!(PipelineStage::QuotaCheck.can_advance_to(&PipelineStage::Cleanup));
        assert!(!PipelineStage::Validating.can_advance_to(&PipelineStage::Cleanup));
    }

    #[test]
    fn display_includes_failure_kind() {
        let failed = PipelineStage::Failed(FailureKind::QuotaExceeded);
        assert_eq!(failed.to_string(), "failed(quota_exceeded)");
    }
}
