//! Narration script generation.
//!
//! The generator is asked for two labeled sections, `Hook:` and `Script:`.
//! Anything else (missing label, empty section, failed call) yields the
//! fixed fallback pair.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use reel_models::NarrationScript;

use crate::client::TextGenerator;
use crate::types::{ChatMessage, ChatRequest};

/// Caption used when the source post has none.
pub const EMPTY_CAPTION_FALLBACK: &str = "Check out this amazing satisfying moment!";

const SCRIPT_MAX_TOKENS: u32 = 120;
const SCRIPT_TEMPERATURE: f32 = 0.7;

fn hook_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)Hook:(.*?)Script:").expect("valid hook regex"))
}

fn script_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)Script:(.*)").expect("valid script regex"))
}

/// Strip whitespace plus markdown emphasis and quotes around a section.
pub(crate) fn clean_section(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '*' || c == '"')
}

/// Build the prompt for a caption.
pub fn script_request(caption: &str) -> ChatRequest {
    let caption = if caption.trim().is_empty() {
        EMPTY_CAPTION_FALLBACK
    } else {
        caption.trim()
    };

    let prompt = format!(
        "Create a viral video hook and short spoken script.\n\n\
         Instagram caption:\n\"{caption}\"\n\n\
         Rules:\n\
         - Hook: max 6 words\n\
         - Script: max 30 words\n\
         - Simple spoken English\n\
         - No emojis, no hashtags, no brand promotions\n\n\
         Return ONLY in this format:\n\
         Hook: ...\n\
         Script: ..."
    );

    ChatRequest {
        messages: vec![ChatMessage::user(prompt)],
        max_tokens: SCRIPT_MAX_TOKENS,
        temperature: SCRIPT_TEMPERATURE,
    }
}

/// Parse generator output into a script.
///
/// Returns `None` unless both labels are present with non-empty text.
pub fn parse_script(text: &str) -> Option<NarrationScript> {
    let hook = hook_pattern()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| clean_section(m.as_str()))?;
    let narration = script_pattern()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| clean_section(m.as_str()))?;

    if hook.is_empty() || narration.is_empty() {
        return None;
    }
    Some(NarrationScript::new(hook, narration))
}

/// Generate a hook and narration for a caption. Never fails.
pub async fn generate_script(generator: &dyn TextGenerator, caption: &str) -> NarrationScript {
    let request = script_request(caption);

    match generator.complete(&request).await {
        Ok(text) => match parse_script(&text) {
            Some(script) => {
                info!(hook = %script.hook, "Generated narration script");
                script
            }
            None => {
                warn!(response = %text, "Script response missing labeled sections, using fallback");
                NarrationScript::fallback()
            }
        },
        Err(e) => {
            warn!(error = %e, "Script generation failed, using fallback");
            NarrationScript::fallback()
        }
    }
}
