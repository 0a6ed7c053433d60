//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod clock;
mod quota_store;
mod speech_synthesis_port;
mod story_generation_port;

pub use clock::{Clock, ManualClock, SystemClock};
#[cfg(test)]
pub use quota_store::MockQuotaStorePort;
pub use quota_store::{QuotaStorePort, Reservation};
#[cfg(test)]
pub use speech_synthesis_port::MockSpeechSynthesisPort;
pub use speech_synthesis_port::{SpeechSynthesisPort, SynthesisVoice, SynthesizedAudio};
#[cfg(test)]
pub use story_generation_port::MockStoryGenerationPort;
pub use story_generation_port::{GeneratedText, GenerationRequest, StoryGenerationPort};
