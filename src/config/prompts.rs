//! Prompt templates for PodEcho.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub extract: ExtractPrompts,
    pub deep_dive: DeepDivePrompts,
    pub chat_summary: ChatSummaryPrompts,
    pub session_summary: SessionSummaryPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for one-shot insight extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractPrompts {
    pub system: String,
}

impl Default for ExtractPrompts {
    fn default() -> Self {
        Self {
            system: "You are an expert editor. Your task is to extract the core insight from the given text. \
Remove filler words, keep it concise (1-2 sentences), and do not add any intro/outro."
                .to_string(),
        }
    }
}

/// Prompts for the Socratic deep-dive conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepDivePrompts {
    /// System prompt; `{{excerpt}}` is the anchored passage.
    pub system: String,
    /// First assistant turn; `{{excerpt}}` is the truncated passage.
    pub greeting: String,
}

impl Default for DeepDivePrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a Socratic learning coach. The user is learning from a podcast and has highlighted this text:
"{{excerpt}}"

Your task is to:
1. Deepen their understanding through follow-up questions.
2. Connect to their personal experience.
3. Help them apply the knowledge.

Guidelines:
- Do not lecture; ask guiding questions.
- Ask one specific question at a time.
- Based on the user's answer, dig deeper.
- Be warm and encouraging.
- When the user gains an insight, summarize it briefly.

Keep your responses concise and conversational (under 150 words)."#
                .to_string(),

            greeting: r#"Hi! I see you're interested in this quote: "{{excerpt}}...". What are your thoughts on it?"#
                .to_string(),
        }
    }
}

/// Prompts for condensing a finished deep dive into a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSummaryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for ChatSummaryPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful learning assistant. You turn a reflective conversation into a short, \
personal learning note written to the user (\"You ...\"). Use markdown sparingly: bold for the key idea, \
a short list if there are several takeaways."
                .to_string(),

            user: r#"The user reflected on this podcast excerpt:
"{{excerpt}}"

Conversation:
{{conversation}}

Summarize what the user realized in 2-4 sentences, followed by at most three bullet points they want to remember."#
                .to_string(),
        }
    }
}

/// Prompts for the end-of-session learning summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSummaryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SessionSummaryPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful learning assistant. Output JSON only.".to_string(),

            user: r#"Please generate a learning summary for the podcast "{{title}}".

User Stats:
- Highlights: {{highlight_count}}
- Extracts: {{extract_count}}
- Deep Dives: {{deep_dive_count}}
{{shownotes}}
All Notes:
{{notes}}

Please generate a warm, encouraging summary (JSON format) with:
1. **core_insights** (2-3 sentences): What touched the user most?
2. **personal_growth** (3 points, 15-25 words each): New thinking/connections.
3. **actionable_tips** (1-2 points, 20-30 words each): Specific actions.

Tone: Warm, "You" focused.
Output strictly valid JSON."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let extract_path = custom_path.join("extract.toml");
            if extract_path.exists() {
                let content = std::fs::read_to_string(&extract_path)?;
                prompts.extract = toml::from_str(&content)?;
            }

            let deep_dive_path = custom_path.join("deep_dive.toml");
            if deep_dive_path.exists() {
                let content = std::fs::read_to_string(&deep_dive_path)?;
                prompts.deep_dive = toml::from_str(&content)?;
            }

            let chat_summary_path = custom_path.join("chat_summary.toml");
            if chat_summary_path.exists() {
                let content = std::fs::read_to_string(&chat_summary_path)?;
                prompts.chat_summary = toml::from_str(&content)?;
            }

            let session_summary_path = custom_path.join("session_summary.toml");
            if session_summary_path.exists() {
                let content = std::fs::read_to_string(&session_summary_path)?;
                prompts.session_summary = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are substituted in a single pass; substituted text is
    /// copied as-is. Unknown placeholders are left in place.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after = &rest[open + 2..];

            match after.find("}}").and_then(|close| {
                vars.get(&after[..close]).map(|value| (value, close))
            }) {
                Some((value, close)) => {
                    result.push_str(value);
                    rest = &after[close + 2..];
                }
                None => {
                    result.push_str("{{");
                    rest = after;
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// The opening assistant turn for a deep dive on `excerpt`.
    ///
    /// Only the first `max_chars` characters of the excerpt are echoed.
    pub fn deep_dive_greeting(&self, excerpt: &str, max_chars: usize) -> String {
        let prefix: String = excerpt.chars().take(max_chars).collect();
        let mut vars = std::collections::HashMap::new();
        vars.insert("excerpt".to_string(), prefix);
        self.render_with_custom(&self.deep_dive.greeting, &vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.extract.system.is_empty());
        assert!(prompts.deep_dive.system.contains("{{excerpt}}"));
        assert!(prompts.session_summary.user.contains("{{notes}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} notes.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 notes.");
    }

    #[test]
    fn test_render_leaves_substituted_text_alone() {
        let template = ChatSummaryPrompts::default().user;
        let mut vars = HashMap::new();
        vars.insert("excerpt".to_string(), "ANCHOR".to_string());
        vars.insert(
            "conversation".to_string(),
            "User: I wrote {{excerpt}} literally".to_string(),
        );

        let result = Prompts::render(&template, &vars);
        assert!(result.contains("\"ANCHOR\""));
        assert!(result.contains("User: I wrote {{excerpt}} literally"));
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());

        let result = Prompts::render("{{ name }} {{other}} {{name}} {{", &vars);
        assert_eq!(result, "{{ name }} {{other}} Alice {{");
    }

    #[test]
    fn test_greeting_does_not_expand_excerpt() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("tone".to_string(), "formal".to_string());

        let greeting = prompts.deep_dive_greeting("Say it in a {{tone}} way", 50);
        assert!(greeting.contains("Say it in a {{tone}} way"));
        assert!(!greeting.contains("formal"));
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("tone".to_string(), "formal".to_string());
        prompts.variables.insert("name".to_string(), "Bob".to_string());

        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());

        let result = prompts.render_with_custom("{{name}} / {{tone}}", &vars);
        assert_eq!(result, "Alice / formal");
    }

    #[test]
    fn test_greeting_truncates_excerpt_by_chars() {
        let prompts = Prompts::default();
        let excerpt = "é".repeat(80);

        let greeting = prompts.deep_dive_greeting(&excerpt, 50);
        assert!(greeting.contains(&"é".repeat(50)));
        assert!(!greeting.contains(&"é".repeat(51)));
        assert!(greeting.starts_with("Hi! I see you're interested in this quote:"));
    }

    #[test]
    fn test_load_custom_dir_overrides_one_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("extract.toml"),
            "system = \"Be brief.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.extract.system, "Be brief.");
        assert_eq!(
            prompts.deep_dive.greeting,
            DeepDivePrompts::default().greeting
        );
    }
}
