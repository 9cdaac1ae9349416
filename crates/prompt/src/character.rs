use serde::{Deserialize, Serialize};

const MAX_EXAMPLE_INTERACTIONS: usize = 3;
const MAX_STYLE_NOTES: usize = 6;

/// Persona fed into the Prompt Assembler's character block (§10.6). Loaded
/// once at pipeline construction, not per request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub name: String,
    pub bio: Vec<String>,
    pub adjectives: Vec<String>,
    pub style_notes: Vec<String>,
    pub example_interactions: Vec<String>,
}

impl CharacterProfile {
    /// Renders the character block the way `create_character_prompt` in the
    /// original telegram bot does: one labelled line per populated field,
    /// each bounded so a long character card can't dominate the prompt.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();

        if !self.name.is_empty() {
            lines.push(format!("NAME: {}", self.name));
        }
        if !self.bio.is_empty() {
            lines.push(format!("BIO: {}", self.bio.join(" | ")));
        }
        if !self.adjectives.is_empty() {
            lines.push(format!("PERSONALITY: {}", self.adjectives.join(", ")));
        }
        if !self.style_notes.is_empty() {
            let notes: Vec<&String> = self.style_notes.iter().take(MAX_STYLE_NOTES).collect();
            lines.push(format!(
                "STYLE: {}",
                notes.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" | ")
            ));
        }
        if !self.example_interactions.is_empty() {
            let examples: Vec<&String> =
                self.example_interactions.iter().take(MAX_EXAMPLE_INTERACTIONS).collect();
            lines.push(format!(
                "EXAMPLE RESPONSES: {}",
                examples.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" | ")
            ));
        }

        lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.bio.is_empty()
            && self.adjectives.is_empty()
            && self.style_notes.is_empty()
            && self.example_interactions.is_empty()
    }

    /// Falls back to "the assistant" when no persona name is configured.
    pub fn persona_label(&self) -> &str {
        if self.name.is_empty() {
            "the assistant"
        } else {
            &self.name
        }
    }
}
