//! Deterministic prompt construction for story generation

use std::fmt::Write as _;

use domain::StoryRequest;

/// System prompt sent with every story request
pub const STORYTELLER_SYSTEM_PROMPT: &str = "You are a professional children's author who \
writes bedtime stories.\nYour stories are:\n- Warm, gentle, and reassuring\n- Age-appropriate \
and engaging\n- Made to help children drift off to sleep\n- Full of wonder and positive \
messages\n\nYou follow the requirements you are given exactly and never include scary or \
inappropriate content.";

/// System and user prompt for one story
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryPrompt {
    pub system: String,
    pub user: String,
}

impl StoryPrompt {
    /// Build the prompt for `request`
    ///
    /// The same request always yields the same prompt.
    #[must_use]
    pub fn for_request(request: &StoryRequest) -> Self {
        let name = request.child_name().as_str();
        let theme = request.theme().as_str();
        let age = request.age_group();
        let language = request.language();

        let mut user = String::with_capacity(2048);
        let _ = writeln!(
            user,
            "You are a warm, caring children's storyteller. Write a bedtime story for a {} child.",
            age.label().to_lowercase()
        );
        let _ = writeln!(user);
        let _ = writeln!(user, "STORY REQUIREMENTS:");
        let _ = writeln!(user, "- Main character name: {name}");
        let _ = writeln!(user, "- Theme: {theme}");
        let _ = writeln!(
            user,
            "- Target length: approximately {} words ({} when read aloud)",
            age.target_words(),
            age.duration_band().describe()
        );
        let _ = writeln!(user, "- Writing style: {}", age.style());

        if !language.is_english() {
            let language_name = language.display_name();
            let _ = writeln!(user);
            let _ = writeln!(user, "LANGUAGE REQUIREMENT:");
            let _ = writeln!(user, "- Write the ENTIRE story in {language_name}");
            let _ = writeln!(
                user,
                "- Use natural, fluent {language_name} appropriate for children"
            );
            let _ = writeln!(
                user,
                "- Keep cultural references appropriate for {language_name}-speaking audiences"
            );
        }

        let _ = writeln!(user);
        let _ = writeln!(user, "STORY STRUCTURE:");
        let _ = writeln!(
            user,
            "1. GENTLE OPENING: Introduce {name} in a cozy, familiar setting"
        );
        let _ = writeln!(
            user,
            "2. DISCOVERY: {name} discovers something exciting related to {theme}"
        );
        let _ = writeln!(
            user,
            "3. SMALL ADVENTURE: A fun, age-appropriate adventure unfolds with no real danger"
        );
        let _ = writeln!(user, "4. POSITIVE RESOLUTION: Everything works out wonderfully");
        let _ = writeln!(
            user,
            "5. CALM ENDING: {name} returns home happy and sleepy, ready for dreams"
        );
        let _ = writeln!(user);
        let _ = writeln!(user, "IMPORTANT RULES:");
        let _ = writeln!(
            user,
            "- Use {name}'s name naturally throughout (at least 8-10 times)"
        );
        let _ = writeln!(user, "- NO scary content, villains, monsters, or danger");
        let _ = writeln!(user, "- NO violence, conflict, or sad moments");
        let _ = writeln!(user, "- NO complex vocabulary; keep it age-appropriate");
        let _ = writeln!(
            user,
            "- NO cliffhangers; the story must have a complete, satisfying ending"
        );
        let _ = writeln!(user, "- The ending should be calming and sleep-inducing");
        let _ = writeln!(user, "- Use warm, reassuring language throughout");
        let _ = writeln!(user);
        let _ = write!(
            user,
            "Write the complete story now. Do not include a title; start directly with the story text."
        );

        Self {
            system: STORYTELLER_SYSTEM_PROMPT.to_string(),
            user,
        }
    }
}
